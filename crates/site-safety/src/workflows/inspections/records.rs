use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::domain::{
    Finding, FindingId, FindingStatus, Inspection, InspectionId, InspectionStatus, ProjectId,
    ReportType, RiskType, Severity, SiteId, TenantId, WorkItemId,
};
use crate::persistence::{PersistenceGateway, RepositoryError};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewInspection {
    pub project_id: ProjectId,
    pub site_id: SiteId,
    #[serde(default)]
    pub work_item_id: Option<WorkItemId>,
    pub report_type: ReportType,
}

/// Partial edit applied while the inspection is still a draft.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InspectionChanges {
    pub project_id: Option<ProjectId>,
    pub site_id: Option<SiteId>,
    pub work_item_id: Option<WorkItemId>,
    pub report_type: Option<ReportType>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewFinding {
    pub category: String,
    #[serde(default)]
    pub observation: Option<String>,
    #[serde(default)]
    pub comment: Option<String>,
    pub status: FindingStatus,
    pub severity: Severity,
    pub risk_type: RiskType,
    #[serde(default, alias = "oshaRef")]
    pub regulatory_ref: Option<String>,
    #[serde(default)]
    pub corrected_on_site: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InspectionDetail {
    #[serde(flatten)]
    pub inspection: Inspection,
    pub findings: Vec<Finding>,
}

#[derive(Debug, thiserror::Error)]
pub enum RecordServiceError {
    #[error("inspection {0} not found")]
    NotFound(InspectionId),
    #[error("inspection {0} is final and can no longer be edited")]
    Finalized(InspectionId),
    #[error("{0}")]
    Validation(String),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Inspection and finding bookkeeping outside of submission.
pub struct InspectionRecordService<G> {
    gateway: Arc<G>,
}

impl<G> InspectionRecordService<G>
where
    G: PersistenceGateway + 'static,
{
    pub fn new(gateway: Arc<G>) -> Self {
        Self { gateway }
    }

    pub fn create(
        &self,
        tenant: TenantId,
        request: NewInspection,
    ) -> Result<Inspection, RecordServiceError> {
        let inspection = Inspection {
            id: InspectionId::new(),
            tenant_id: tenant,
            work_item_id: request.work_item_id,
            project_id: request.project_id,
            site_id: request.site_id,
            report_type: request.report_type,
            status: InspectionStatus::Draft,
            submitted_at: None,
            created_at: Utc::now(),
        };
        let stored = self
            .gateway
            .insert_inspection(inspection)
            .map_err(reference_error)?;
        tracing::info!(tenant_id = %tenant, inspection_id = %stored.id, "inspection created");
        Ok(stored)
    }

    pub fn list(&self, tenant: TenantId) -> Result<Vec<Inspection>, RecordServiceError> {
        Ok(self.gateway.inspections(tenant)?)
    }

    pub fn get(
        &self,
        tenant: TenantId,
        id: InspectionId,
    ) -> Result<InspectionDetail, RecordServiceError> {
        let inspection = self.fetch(tenant, id)?;
        let findings = self.gateway.findings_for_inspection(tenant, id)?;
        Ok(InspectionDetail {
            inspection,
            findings,
        })
    }

    pub fn update(
        &self,
        tenant: TenantId,
        id: InspectionId,
        changes: InspectionChanges,
    ) -> Result<Inspection, RecordServiceError> {
        let mut inspection = self.fetch(tenant, id)?;
        if inspection.is_final() {
            return Err(RecordServiceError::Finalized(id));
        }

        if let Some(project_id) = changes.project_id {
            inspection.project_id = project_id;
        }
        if let Some(site_id) = changes.site_id {
            inspection.site_id = site_id;
        }
        if let Some(work_item_id) = changes.work_item_id {
            inspection.work_item_id = Some(work_item_id);
        }
        if let Some(report_type) = changes.report_type {
            inspection.report_type = report_type;
        }

        match self.gateway.update_inspection(inspection) {
            Err(RepositoryError::Conflict) => Err(RecordServiceError::Finalized(id)),
            Err(RepositoryError::NotFound) => Err(RecordServiceError::NotFound(id)),
            other => other.map_err(reference_error),
        }
    }

    pub fn add_finding(
        &self,
        tenant: TenantId,
        inspection_id: InspectionId,
        request: NewFinding,
    ) -> Result<Finding, RecordServiceError> {
        let inspection = self.fetch(tenant, inspection_id)?;
        if inspection.is_final() {
            return Err(RecordServiceError::Finalized(inspection_id));
        }
        let category = request.category.trim();
        if category.is_empty() {
            return Err(RecordServiceError::Validation(
                "finding category must not be empty".to_string(),
            ));
        }

        let finding = Finding {
            id: FindingId::new(),
            tenant_id: tenant,
            inspection_id,
            category: category.to_string(),
            observation: request.observation,
            comment: request.comment,
            status: request.status,
            severity: request.severity,
            risk_type: request.risk_type,
            regulatory_ref: request.regulatory_ref,
            corrected_on_site: request.corrected_on_site,
        };
        Ok(self.gateway.insert_finding(finding)?)
    }

    pub fn findings(
        &self,
        tenant: TenantId,
        inspection_id: InspectionId,
    ) -> Result<Vec<Finding>, RecordServiceError> {
        self.fetch(tenant, inspection_id)?;
        Ok(self
            .gateway
            .findings_for_inspection(tenant, inspection_id)?)
    }

    fn fetch(&self, tenant: TenantId, id: InspectionId) -> Result<Inspection, RecordServiceError> {
        self.gateway
            .inspection(tenant, id)?
            .ok_or(RecordServiceError::NotFound(id))
    }
}

fn reference_error(error: RepositoryError) -> RecordServiceError {
    match error {
        RepositoryError::MissingReference(entity) => {
            RecordServiceError::Validation(format!("unknown {entity} for this tenant"))
        }
        other => RecordServiceError::Repository(other),
    }
}
