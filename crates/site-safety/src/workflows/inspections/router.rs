use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};

use super::records::{
    InspectionChanges, InspectionRecordService, NewFinding, NewInspection, RecordServiceError,
};
use super::submission::{InspectionSubmitService, SubmissionError, SubmitInspectionRequest};
use crate::domain::InspectionId;
use crate::http::{ApiError, RequestContext};
use crate::persistence::PersistenceGateway;

pub struct InspectionState<G> {
    pub records: Arc<InspectionRecordService<G>>,
    pub submissions: Arc<InspectionSubmitService<G>>,
}

impl<G> Clone for InspectionState<G> {
    fn clone(&self) -> Self {
        Self {
            records: Arc::clone(&self.records),
            submissions: Arc::clone(&self.submissions),
        }
    }
}

/// Router builder exposing inspection records, findings, and submission.
pub fn inspection_router<G>(
    records: Arc<InspectionRecordService<G>>,
    submissions: Arc<InspectionSubmitService<G>>,
) -> Router
where
    G: PersistenceGateway + 'static,
{
    Router::new()
        .route(
            "/api/v1/inspections",
            post(create_handler::<G>).get(list_handler::<G>),
        )
        .route(
            "/api/v1/inspections/:inspection_id",
            get(detail_handler::<G>).patch(update_handler::<G>),
        )
        .route(
            "/api/v1/inspections/:inspection_id/findings",
            post(add_finding_handler::<G>).get(findings_handler::<G>),
        )
        .route(
            "/api/v1/inspections/:inspection_id/submit",
            post(submit_handler::<G>),
        )
        .with_state(InspectionState {
            records,
            submissions,
        })
}

pub(crate) async fn create_handler<G>(
    State(state): State<InspectionState<G>>,
    headers: HeaderMap,
    axum::Json(request): axum::Json<NewInspection>,
) -> Result<Response, ApiError>
where
    G: PersistenceGateway + 'static,
{
    let context = RequestContext::from_headers(&headers)?;
    let inspection = state.records.create(context.tenant, request)?;
    Ok((StatusCode::CREATED, axum::Json(inspection)).into_response())
}

pub(crate) async fn list_handler<G>(
    State(state): State<InspectionState<G>>,
    headers: HeaderMap,
) -> Result<Response, ApiError>
where
    G: PersistenceGateway + 'static,
{
    let context = RequestContext::from_headers(&headers)?;
    let inspections = state.records.list(context.tenant)?;
    Ok(axum::Json(inspections).into_response())
}

pub(crate) async fn detail_handler<G>(
    State(state): State<InspectionState<G>>,
    headers: HeaderMap,
    Path(inspection_id): Path<InspectionId>,
) -> Result<Response, ApiError>
where
    G: PersistenceGateway + 'static,
{
    let context = RequestContext::from_headers(&headers)?;
    let detail = state.records.get(context.tenant, inspection_id)?;
    Ok(axum::Json(detail).into_response())
}

pub(crate) async fn update_handler<G>(
    State(state): State<InspectionState<G>>,
    headers: HeaderMap,
    Path(inspection_id): Path<InspectionId>,
    axum::Json(changes): axum::Json<InspectionChanges>,
) -> Result<Response, ApiError>
where
    G: PersistenceGateway + 'static,
{
    let context = RequestContext::from_headers(&headers)?;
    let inspection = state
        .records
        .update(context.tenant, inspection_id, changes)?;
    Ok(axum::Json(inspection).into_response())
}

pub(crate) async fn add_finding_handler<G>(
    State(state): State<InspectionState<G>>,
    headers: HeaderMap,
    Path(inspection_id): Path<InspectionId>,
    axum::Json(request): axum::Json<NewFinding>,
) -> Result<Response, ApiError>
where
    G: PersistenceGateway + 'static,
{
    let context = RequestContext::from_headers(&headers)?;
    let finding = state
        .records
        .add_finding(context.tenant, inspection_id, request)?;
    Ok((StatusCode::CREATED, axum::Json(finding)).into_response())
}

pub(crate) async fn findings_handler<G>(
    State(state): State<InspectionState<G>>,
    headers: HeaderMap,
    Path(inspection_id): Path<InspectionId>,
) -> Result<Response, ApiError>
where
    G: PersistenceGateway + 'static,
{
    let context = RequestContext::from_headers(&headers)?;
    let findings = state.records.findings(context.tenant, inspection_id)?;
    Ok(axum::Json(findings).into_response())
}

pub(crate) async fn submit_handler<G>(
    State(state): State<InspectionState<G>>,
    headers: HeaderMap,
    Path(inspection_id): Path<InspectionId>,
    axum::Json(request): axum::Json<SubmitInspectionRequest>,
) -> Result<Response, ApiError>
where
    G: PersistenceGateway + 'static,
{
    let context = RequestContext::from_headers(&headers)?;
    let outcome = state
        .submissions
        .submit(context.tenant, inspection_id, context.user, request)
        .await?;
    Ok(axum::Json(outcome).into_response())
}

impl From<RecordServiceError> for ApiError {
    fn from(value: RecordServiceError) -> Self {
        match value {
            RecordServiceError::NotFound(_) => ApiError::NotFound(value.to_string()),
            RecordServiceError::Finalized(_) => ApiError::Conflict(value.to_string()),
            RecordServiceError::Validation(message) => ApiError::Validation(message),
            RecordServiceError::Repository(error) => error.into(),
        }
    }
}

impl From<SubmissionError> for ApiError {
    fn from(value: SubmissionError) -> Self {
        match value {
            SubmissionError::NotFound(_) => ApiError::NotFound(value.to_string()),
            SubmissionError::Validation(_) => ApiError::Validation(value.to_string()),
            SubmissionError::Conflict { .. } => ApiError::Conflict(value.to_string()),
            SubmissionError::Internal(_) => ApiError::Internal(value.to_string()),
        }
    }
}
