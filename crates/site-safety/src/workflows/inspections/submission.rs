use std::sync::Arc;

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use serde::{Deserialize, Serialize};
use validator::ValidateEmail;

use super::documents::{DocumentRenderer, RenderedDocument};
use super::guard::SubmissionGuard;
use super::outcome::{
    bounded, StepError, StepRecorder, StepResolution, SubmissionOutcome, SubmissionStep,
};
use crate::config::WorkflowConfig;
use crate::domain::{
    Action, ActionId, ActionStatus, Finding, Inspection, InspectionId, InspectionStatus, Project,
    TenantId, UserId,
};
use crate::integrations::{EmailAttachment, EmailMessage, Integrations, TimeEntry};
use crate::persistence::{PersistenceGateway, RepositoryError};

pub const FINAL_MESSAGE: &str = "Inspection finalized, report generated, and actions created.";
pub const DRAFT_EMAILED_MESSAGE: &str = "Draft saved and emailed to submitter.";
pub const DRAFT_NOT_EMAILED_MESSAGE: &str = "Draft saved; submitter was not emailed.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SubmitType {
    Draft,
    Final,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitInspectionRequest {
    pub submit_type: SubmitType,
    #[serde(default)]
    pub contact_emails: Option<Vec<String>>,
    /// Hours to log against the project.
    #[serde(default)]
    pub time_entry: Option<f64>,
}

impl SubmitInspectionRequest {
    pub fn draft() -> Self {
        Self {
            submit_type: SubmitType::Draft,
            contact_emails: None,
            time_entry: None,
        }
    }

    pub fn finalize(contact_emails: Vec<String>, time_entry: Option<f64>) -> Self {
        Self {
            submit_type: SubmitType::Final,
            contact_emails: Some(contact_emails),
            time_entry,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(hours) = self.time_entry {
            if !hours.is_finite() || hours < 0.0 {
                return Err(ValidationError::InvalidHours(hours));
            }
        }
        for address in self.recipients() {
            if !address.validate_email() {
                return Err(ValidationError::InvalidEmail(address.clone()));
            }
        }
        Ok(())
    }

    fn recipients(&self) -> &[String] {
        self.contact_emails.as_deref().unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("'{0}' is not a valid email address")]
    InvalidEmail(String),
    #[error("time entry must be a non-negative number of hours (got {0})")]
    InvalidHours(f64),
}

#[derive(Debug, thiserror::Error)]
pub enum SubmissionError {
    #[error("inspection {0} not found")]
    NotFound(InspectionId),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("inspection {inspection} {reason}")]
    Conflict {
        inspection: InspectionId,
        reason: &'static str,
    },
    #[error("submission failed: {0}")]
    Internal(#[from] RepositoryError),
}

/// Drives Draft and Final submissions over the gateway and the adapters.
pub struct InspectionSubmitService<G> {
    gateway: Arc<G>,
    integrations: Integrations,
    renderer: Arc<dyn DocumentRenderer>,
    config: WorkflowConfig,
    guard: SubmissionGuard,
}

impl<G> InspectionSubmitService<G>
where
    G: PersistenceGateway + 'static,
{
    pub fn new(
        gateway: Arc<G>,
        integrations: Integrations,
        renderer: Arc<dyn DocumentRenderer>,
        config: WorkflowConfig,
    ) -> Self {
        Self {
            gateway,
            integrations,
            renderer,
            config,
            guard: SubmissionGuard::new(),
        }
    }

    pub fn guard(&self) -> &SubmissionGuard {
        &self.guard
    }

    pub async fn submit(
        &self,
        tenant: TenantId,
        inspection_id: InspectionId,
        submitted_by: UserId,
        request: SubmitInspectionRequest,
    ) -> Result<SubmissionOutcome, SubmissionError> {
        request.validate()?;
        let inspection = self
            .gateway
            .inspection(tenant, inspection_id)?
            .ok_or(SubmissionError::NotFound(inspection_id))?;

        match request.submit_type {
            // Drafts never mutate the inspection, even once it is final.
            SubmitType::Draft => Ok(self.submit_draft(&inspection, submitted_by).await),
            SubmitType::Final if inspection.is_final() => Err(SubmissionError::Conflict {
                inspection: inspection_id,
                reason: "is already final",
            }),
            SubmitType::Final => self.submit_final(&inspection, submitted_by, &request).await,
        }
    }

    async fn submit_draft(
        &self,
        inspection: &Inspection,
        submitted_by: UserId,
    ) -> SubmissionOutcome {
        let tenant = inspection.tenant_id;
        let mut recorder = StepRecorder::new(inspection.id);

        let findings = match self.gateway.findings_for_inspection(tenant, inspection.id) {
            Ok(findings) => {
                recorder.record(
                    SubmissionStep::LoadFindings,
                    None,
                    Ok(StepResolution::Completed(format!("{} findings", findings.len()))),
                );
                Some(findings)
            }
            Err(error) => {
                recorder.record(SubmissionStep::LoadFindings, None, Err(error.into()));
                None
            }
        };
        let document = match findings {
            Some(findings) => self.render(&mut recorder, inspection, &findings, SubmitType::Draft),
            None => {
                recorder.skipped(SubmissionStep::RenderDocument, "findings unavailable");
                None
            }
        };

        let submitter = match self.gateway.user(tenant, submitted_by) {
            Ok(Some(user)) => {
                recorder.record(
                    SubmissionStep::LookupSubmitter,
                    None,
                    Ok(StepResolution::Completed(user.email.clone())),
                );
                Some(user)
            }
            Ok(None) => {
                recorder.skipped(SubmissionStep::LookupSubmitter, "submitter not found");
                None
            }
            Err(error) => {
                recorder.record(SubmissionStep::LookupSubmitter, None, Err(error.into()));
                None
            }
        };

        let emailed = match (submitter, document) {
            (Some(submitter), Some(document)) => {
                let message = EmailMessage {
                    to: vec![submitter.email],
                    subject: format!("Draft Inspection Report - {}", inspection.id),
                    body: "Your draft inspection report is attached.".to_string(),
                    attachments: vec![attachment(&document)],
                };
                let result = bounded(
                    self.config.adapter_timeout,
                    self.integrations.email.send(tenant, message),
                )
                .await
                .map(|receipt| StepResolution::Completed(receipt.message_id));
                let sent = result.is_ok();
                recorder.record(SubmissionStep::EmailSubmitter, None, result);
                sent
            }
            (None, _) => {
                recorder.skipped(SubmissionStep::EmailSubmitter, "submitter unknown");
                false
            }
            (Some(_), None) => {
                recorder.skipped(SubmissionStep::EmailSubmitter, "no draft document");
                false
            }
        };

        tracing::info!(
            tenant_id = %tenant,
            inspection_id = %inspection.id,
            emailed,
            "draft inspection submitted"
        );
        SubmissionOutcome {
            status: InspectionStatus::Draft,
            inspection_id: inspection.id,
            actions_created: None,
            message: if emailed {
                DRAFT_EMAILED_MESSAGE
            } else {
                DRAFT_NOT_EMAILED_MESSAGE
            }
            .to_string(),
            steps: recorder.into_steps(),
        }
    }

    async fn submit_final(
        &self,
        inspection: &Inspection,
        submitted_by: UserId,
        request: &SubmitInspectionRequest,
    ) -> Result<SubmissionOutcome, SubmissionError> {
        let tenant = inspection.tenant_id;
        let _claim = self
            .guard
            .try_claim(tenant, inspection.id)
            .ok_or(SubmissionError::Conflict {
                inspection: inspection.id,
                reason: "already has a final submission in progress",
            })?;
        let mut recorder = StepRecorder::new(inspection.id);

        let findings = self.gateway.findings_for_inspection(tenant, inspection.id)?;
        recorder.record(
            SubmissionStep::LoadFindings,
            None,
            Ok(StepResolution::Completed(format!("{} findings", findings.len()))),
        );
        let document = self.render(&mut recorder, inspection, &findings, SubmitType::Final);

        let project = match self.gateway.project(tenant, inspection.project_id) {
            Ok(Some(project)) => {
                recorder.record(
                    SubmissionStep::ResolveProject,
                    None,
                    Ok(StepResolution::Completed(format!("client {}", project.client_id))),
                );
                Some(project)
            }
            Ok(None) => {
                recorder.record(
                    SubmissionStep::ResolveProject,
                    None,
                    Err(StepError::ProjectNotFound(inspection.project_id)),
                );
                None
            }
            Err(error) => {
                recorder.record(SubmissionStep::ResolveProject, None, Err(error.into()));
                None
            }
        };

        let now = Utc::now();
        let (time_log, report_email, upload) = tokio::join!(
            self.log_time(inspection, project.as_ref(), submitted_by, request.time_entry, now),
            self.email_report(inspection, request.recipients(), document.as_ref()),
            self.upload_report(inspection, project.as_ref(), document.as_ref()),
        );
        recorder.record(SubmissionStep::LogTime, None, time_log);
        recorder.record(SubmissionStep::EmailReport, None, report_email);
        recorder.record(SubmissionStep::UploadReport, None, upload);

        let actions_created = match &project {
            Some(project) => {
                self.create_actions(&mut recorder, inspection, project, &findings, now)
            }
            None => {
                recorder.skipped(SubmissionStep::CreateAction, "project unresolved");
                0
            }
        };

        self.gateway
            .finalize_inspection(tenant, inspection.id, Utc::now())
            .map_err(|error| match error {
                RepositoryError::Conflict => SubmissionError::Conflict {
                    inspection: inspection.id,
                    reason: "was finalized by a concurrent submission",
                },
                RepositoryError::NotFound => SubmissionError::NotFound(inspection.id),
                other => SubmissionError::Internal(other),
            })?;

        let failures = recorder.failures();
        tracing::info!(
            tenant_id = %tenant,
            inspection_id = %inspection.id,
            actions_created,
            failures,
            "inspection finalized"
        );
        Ok(SubmissionOutcome {
            status: InspectionStatus::Final,
            inspection_id: inspection.id,
            actions_created: Some(actions_created),
            message: if failures == 0 {
                FINAL_MESSAGE.to_string()
            } else {
                format!("Inspection finalized with {failures} incomplete step(s).")
            },
            steps: recorder.into_steps(),
        })
    }

    fn render(
        &self,
        recorder: &mut StepRecorder,
        inspection: &Inspection,
        findings: &[Finding],
        kind: SubmitType,
    ) -> Option<RenderedDocument> {
        let rendered = match kind {
            SubmitType::Draft => self.renderer.render_draft(inspection, findings),
            SubmitType::Final => self.renderer.render_final(inspection, findings),
        };
        match rendered {
            Ok(document) => {
                recorder.record(
                    SubmissionStep::RenderDocument,
                    None,
                    Ok(StepResolution::Completed(document.file_name.clone())),
                );
                Some(document)
            }
            Err(error) => {
                recorder.record(SubmissionStep::RenderDocument, None, Err(error.into()));
                None
            }
        }
    }

    async fn log_time(
        &self,
        inspection: &Inspection,
        project: Option<&Project>,
        submitted_by: UserId,
        hours: Option<f64>,
        now: DateTime<Utc>,
    ) -> Result<StepResolution, StepError> {
        let Some(hours) = hours else {
            return Ok(StepResolution::Skipped("no time entry"));
        };
        let project_id = project
            .and_then(|project| project.bigtime_project_id.clone())
            .unwrap_or_else(|| inspection.project_id.to_string());
        let entry = TimeEntry {
            project_id,
            user_id: submitted_by.to_string(),
            hours,
            date: now,
            note: Some(format!("Inspection {}", inspection.id)),
        };
        let receipt = bounded(
            self.config.adapter_timeout,
            self.integrations
                .time_tracker
                .log_time(inspection.tenant_id, entry),
        )
        .await?;
        Ok(StepResolution::Completed(receipt.entry_id))
    }

    async fn email_report(
        &self,
        inspection: &Inspection,
        recipients: &[String],
        document: Option<&RenderedDocument>,
    ) -> Result<StepResolution, StepError> {
        if recipients.is_empty() {
            return Ok(StepResolution::Skipped("no contact emails"));
        }
        let Some(document) = document else {
            return Ok(StepResolution::Skipped("no report document"));
        };
        let message = EmailMessage {
            to: recipients.to_vec(),
            subject: format!("Final Inspection Report - {}", inspection.id),
            body: "The final inspection report is attached.".to_string(),
            attachments: vec![attachment(document)],
        };
        let receipt = bounded(
            self.config.adapter_timeout,
            self.integrations.email.send(inspection.tenant_id, message),
        )
        .await?;
        Ok(StepResolution::Completed(receipt.message_id))
    }

    async fn upload_report(
        &self,
        inspection: &Inspection,
        project: Option<&Project>,
        document: Option<&RenderedDocument>,
    ) -> Result<StepResolution, StepError> {
        let Some(document) = document else {
            return Ok(StepResolution::Skipped("no report document"));
        };
        let folder = project.and_then(|project| project.sharepoint_folder_id.as_deref());
        let file_name = format!("inspection-{}.pdf", inspection.id);
        let receipt = bounded(
            self.config.adapter_timeout,
            self.integrations.storage.upload(
                inspection.tenant_id,
                folder,
                &file_name,
                document.bytes.clone(),
            ),
        )
        .await?;
        Ok(StepResolution::Completed(receipt.file_url))
    }

    /// One action per `Issue` finding; each insert succeeds or fails on its own.
    fn create_actions(
        &self,
        recorder: &mut StepRecorder,
        inspection: &Inspection,
        project: &Project,
        findings: &[Finding],
        now: DateTime<Utc>,
    ) -> usize {
        let due_date = now + ChronoDuration::days(self.config.action_due_days);
        let mut created = 0;
        for finding in findings.iter().filter(|finding| finding.is_issue()) {
            let action = Action {
                id: ActionId::new(),
                tenant_id: inspection.tenant_id,
                client_id: project.client_id,
                site_id: inspection.site_id,
                inspection_id: inspection.id,
                finding_id: finding.id,
                description: format!(
                    "Corrective action for {} - {}",
                    finding.category,
                    finding.risk_type.label()
                ),
                responsible_name: self.config.responsible_placeholder.clone(),
                responsible_email: None,
                due_date,
                status: ActionStatus::Open,
                closed_by: None,
                closed_at: None,
                created_at: now,
            };
            let result = self
                .gateway
                .insert_action(action)
                .map(|stored| StepResolution::Completed(stored.id.to_string()))
                .map_err(StepError::from);
            if result.is_ok() {
                created += 1;
            }
            recorder.record(SubmissionStep::CreateAction, Some(finding.id), result);
        }
        created
    }
}

fn attachment(document: &RenderedDocument) -> EmailAttachment {
    EmailAttachment {
        filename: document.file_name.clone(),
        content_type: document.content_type.clone(),
        content: document.bytes.clone(),
    }
}
