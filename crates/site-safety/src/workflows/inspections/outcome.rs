use std::future::Future;
use std::time::Duration;

use serde::Serialize;

use super::documents::RenderError;
use crate::domain::{FindingId, InspectionId, InspectionStatus, ProjectId};
use crate::integrations::AdapterError;
use crate::persistence::RepositoryError;

/// Best-effort steps of a submission, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionStep {
    LoadFindings,
    RenderDocument,
    LookupSubmitter,
    EmailSubmitter,
    ResolveProject,
    LogTime,
    EmailReport,
    UploadReport,
    CreateAction,
}

impl SubmissionStep {
    pub fn label(&self) -> &'static str {
        match self {
            SubmissionStep::LoadFindings => "load_findings",
            SubmissionStep::RenderDocument => "render_document",
            SubmissionStep::LookupSubmitter => "lookup_submitter",
            SubmissionStep::EmailSubmitter => "email_submitter",
            SubmissionStep::ResolveProject => "resolve_project",
            SubmissionStep::LogTime => "log_time",
            SubmissionStep::EmailReport => "email_report",
            SubmissionStep::UploadReport => "upload_report",
            SubmissionStep::CreateAction => "create_action",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum StepStatus {
    Completed { detail: String },
    Skipped { reason: String },
    Failed { error: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StepReport {
    pub step: SubmissionStep,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finding_id: Option<FindingId>,
    #[serde(flatten)]
    pub status: StepStatus,
}

impl StepReport {
    pub fn is_failed(&self) -> bool {
        matches!(self.status, StepStatus::Failed { .. })
    }
}

/// Result of a submission, including what happened to each optional step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionOutcome {
    pub status: InspectionStatus,
    pub inspection_id: InspectionId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actions_created: Option<usize>,
    pub message: String,
    pub steps: Vec<StepReport>,
}

impl SubmissionOutcome {
    pub fn step(&self, step: SubmissionStep) -> Option<&StepReport> {
        self.steps.iter().find(|report| report.step == step)
    }

    pub fn failed_steps(&self) -> impl Iterator<Item = &StepReport> {
        self.steps.iter().filter(|report| report.is_failed())
    }
}

/// Failure of a single best-effort step.
#[derive(Debug, thiserror::Error)]
pub enum StepError {
    #[error("timed out after {0:?}")]
    Timeout(Duration),
    #[error(transparent)]
    Adapter(#[from] AdapterError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error(transparent)]
    Render(#[from] RenderError),
    #[error("project {0} not found")]
    ProjectNotFound(ProjectId),
}

pub(crate) enum StepResolution {
    Completed(String),
    Skipped(&'static str),
}

/// Accumulates step reports and logs every swallowed failure.
pub(crate) struct StepRecorder {
    inspection: InspectionId,
    steps: Vec<StepReport>,
}

impl StepRecorder {
    pub(crate) fn new(inspection: InspectionId) -> Self {
        Self {
            inspection,
            steps: Vec::new(),
        }
    }

    pub(crate) fn record(
        &mut self,
        step: SubmissionStep,
        finding_id: Option<FindingId>,
        result: Result<StepResolution, StepError>,
    ) {
        let status = match result {
            Ok(StepResolution::Completed(detail)) => StepStatus::Completed { detail },
            Ok(StepResolution::Skipped(reason)) => StepStatus::Skipped {
                reason: reason.to_string(),
            },
            Err(error) => {
                tracing::warn!(
                    inspection_id = %self.inspection,
                    step = step.label(),
                    finding_id = ?finding_id,
                    error = %error,
                    "submission step failed"
                );
                StepStatus::Failed {
                    error: error.to_string(),
                }
            }
        };
        self.steps.push(StepReport {
            step,
            finding_id,
            status,
        });
    }

    pub(crate) fn skipped(&mut self, step: SubmissionStep, reason: &'static str) {
        self.record(step, None, Ok(StepResolution::Skipped(reason)));
    }

    pub(crate) fn failures(&self) -> usize {
        self.steps.iter().filter(|report| report.is_failed()).count()
    }

    pub(crate) fn into_steps(self) -> Vec<StepReport> {
        self.steps
    }
}

/// Runs an adapter call under `limit`; expiry counts as a step failure.
pub(crate) async fn bounded<T, F>(limit: Duration, call: F) -> Result<T, StepError>
where
    F: Future<Output = Result<T, AdapterError>>,
{
    match tokio::time::timeout(limit, call).await {
        Ok(result) => result.map_err(StepError::from),
        Err(_) => Err(StepError::Timeout(limit)),
    }
}
