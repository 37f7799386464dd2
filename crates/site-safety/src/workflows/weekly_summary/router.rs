use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::HeaderMap,
    response::{IntoResponse, Response},
    routing::post,
    Router,
};

use super::service::{WeeklySummaryError, WeeklySummaryService};
use crate::domain::ClientId;
use crate::http::{ApiError, RequestContext};
use crate::persistence::PersistenceGateway;

/// Router builder for on-demand weekly summaries.
pub fn weekly_summary_router<G>(service: Arc<WeeklySummaryService<G>>) -> Router
where
    G: PersistenceGateway + 'static,
{
    Router::new()
        .route(
            "/api/v1/clients/:client_id/weekly-summary",
            post(send_handler::<G>),
        )
        .route("/api/v1/weekly-summaries", post(send_all_handler::<G>))
        .with_state(service)
}

pub(crate) async fn send_handler<G>(
    State(service): State<Arc<WeeklySummaryService<G>>>,
    headers: HeaderMap,
    Path(client_id): Path<ClientId>,
) -> Result<Response, ApiError>
where
    G: PersistenceGateway + 'static,
{
    let context = RequestContext::from_headers(&headers)?;
    let result = service.send(context.tenant, client_id).await?;
    Ok(axum::Json(result).into_response())
}

pub(crate) async fn send_all_handler<G>(
    State(service): State<Arc<WeeklySummaryService<G>>>,
    headers: HeaderMap,
) -> Result<Response, ApiError>
where
    G: PersistenceGateway + 'static,
{
    let context = RequestContext::from_headers(&headers)?;
    let summaries = service.send_all(context.tenant).await?;
    Ok(axum::Json(summaries).into_response())
}

impl From<WeeklySummaryError> for ApiError {
    fn from(value: WeeklySummaryError) -> Self {
        match value {
            WeeklySummaryError::NotFound(_) => ApiError::NotFound(value.to_string()),
            WeeklySummaryError::Repository(error) => error.into(),
            WeeklySummaryError::Email(_) | WeeklySummaryError::Timeout(_) => {
                ApiError::Internal(value.to_string())
            }
        }
    }
}
