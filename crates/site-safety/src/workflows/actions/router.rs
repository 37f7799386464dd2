use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::HeaderMap,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::Deserialize;

use super::service::{ActionService, ActionServiceError, CloseAction, ReopenAction};
use crate::domain::{ActionId, ActionStatus, ClientId};
use crate::http::{ApiError, RequestContext};
use crate::persistence::{ActionQuery, PersistenceGateway};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionFilter {
    pub client_id: Option<ClientId>,
    pub status: Option<ActionStatus>,
}

/// Router builder for corrective action tracking.
pub fn action_router<G>(service: Arc<ActionService<G>>) -> Router
where
    G: PersistenceGateway + 'static,
{
    Router::new()
        .route("/api/v1/actions", get(list_handler::<G>))
        .route("/api/v1/actions/:action_id", get(detail_handler::<G>))
        .route("/api/v1/actions/:action_id/close", post(close_handler::<G>))
        .route("/api/v1/actions/:action_id/reopen", post(reopen_handler::<G>))
        .with_state(service)
}

pub(crate) async fn list_handler<G>(
    State(service): State<Arc<ActionService<G>>>,
    headers: HeaderMap,
    Query(filter): Query<ActionFilter>,
) -> Result<Response, ApiError>
where
    G: PersistenceGateway + 'static,
{
    let context = RequestContext::from_headers(&headers)?;
    let actions = service.list(
        context.tenant,
        ActionQuery {
            client: filter.client_id,
            status: filter.status,
        },
    )?;
    Ok(axum::Json(actions).into_response())
}

pub(crate) async fn detail_handler<G>(
    State(service): State<Arc<ActionService<G>>>,
    headers: HeaderMap,
    Path(action_id): Path<ActionId>,
) -> Result<Response, ApiError>
where
    G: PersistenceGateway + 'static,
{
    let context = RequestContext::from_headers(&headers)?;
    let detail = service.get(context.tenant, action_id)?;
    Ok(axum::Json(detail).into_response())
}

pub(crate) async fn close_handler<G>(
    State(service): State<Arc<ActionService<G>>>,
    headers: HeaderMap,
    Path(action_id): Path<ActionId>,
    axum::Json(request): axum::Json<CloseAction>,
) -> Result<Response, ApiError>
where
    G: PersistenceGateway + 'static,
{
    let context = RequestContext::from_headers(&headers)?;
    let action = service.close(context.tenant, action_id, context.user, request)?;
    Ok(axum::Json(action).into_response())
}

pub(crate) async fn reopen_handler<G>(
    State(service): State<Arc<ActionService<G>>>,
    headers: HeaderMap,
    Path(action_id): Path<ActionId>,
    axum::Json(request): axum::Json<ReopenAction>,
) -> Result<Response, ApiError>
where
    G: PersistenceGateway + 'static,
{
    let context = RequestContext::from_headers(&headers)?;
    let action = service.reopen(context.tenant, action_id, context.user, request)?;
    Ok(axum::Json(action).into_response())
}

impl From<ActionServiceError> for ApiError {
    fn from(value: ActionServiceError) -> Self {
        match value {
            ActionServiceError::NotFound(_) => ApiError::NotFound(value.to_string()),
            ActionServiceError::Conflict { .. } => ApiError::Conflict(value.to_string()),
            ActionServiceError::Validation(message) => ApiError::Validation(message),
            ActionServiceError::Repository(error) => error.into(),
        }
    }
}
