use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};

use crate::config::WorkflowConfig;
use crate::domain::{
    Action, ActionAuditEntry, ActionId, Client, ClientId, Contact, Finding, FindingId,
    Inspection, InspectionId, Project, ProjectId, Site, SiteId, Tenant, TenantId, User, UserId,
    WorkItem, WorkItemId,
};
use crate::persistence::{ActionQuery, MemoryGateway, PersistenceGateway, RepositoryError};
pub(super) use crate::workflows::fixtures::{
    assert_status, read_json_body, seeded, Fixture, RecordedUpload, Recorders,
    RecordingTimeTracker,
};
use crate::workflows::inspections::{
    InspectionRecordService, InspectionSubmitService, PlaceholderRenderer,
};

pub(super) fn submit_service<G>(
    gateway: Arc<G>,
    recorders: &Recorders,
    config: WorkflowConfig,
) -> InspectionSubmitService<G>
where
    G: PersistenceGateway + 'static,
{
    InspectionSubmitService::new(
        gateway,
        recorders.integrations(),
        Arc::new(PlaceholderRenderer),
        config,
    )
}

pub(super) fn record_service<G>(gateway: Arc<G>) -> InspectionRecordService<G>
where
    G: PersistenceGateway + 'static,
{
    InspectionRecordService::new(gateway)
}

/// Memory gateway with switchable faults for the lookups the workflow depends on.
#[derive(Default)]
pub(super) struct FlakyGateway {
    pub inner: Arc<MemoryGateway>,
    pub hide_projects: bool,
    pub users_unavailable: bool,
    pub findings_unavailable: bool,
    pub rejected_findings: Mutex<HashSet<FindingId>>,
}

impl FlakyGateway {
    pub fn wrap(inner: Arc<MemoryGateway>) -> Self {
        Self {
            inner,
            ..Self::default()
        }
    }

    pub fn reject_action_for(&self, finding: FindingId) {
        self.rejected_findings.lock().expect("lock").insert(finding);
    }
}

fn unavailable() -> RepositoryError {
    RepositoryError::Unavailable("injected fault".to_string())
}

impl PersistenceGateway for FlakyGateway {
    fn insert_tenant(&self, tenant: Tenant) -> Result<Tenant, RepositoryError> {
        self.inner.insert_tenant(tenant)
    }

    fn insert_user(&self, user: User) -> Result<User, RepositoryError> {
        self.inner.insert_user(user)
    }

    fn user(&self, tenant: TenantId, id: UserId) -> Result<Option<User>, RepositoryError> {
        if self.users_unavailable {
            return Err(unavailable());
        }
        self.inner.user(tenant, id)
    }

    fn insert_client(&self, client: Client) -> Result<Client, RepositoryError> {
        self.inner.insert_client(client)
    }

    fn client(&self, tenant: TenantId, id: ClientId) -> Result<Option<Client>, RepositoryError> {
        self.inner.client(tenant, id)
    }

    fn clients(&self, tenant: TenantId) -> Result<Vec<Client>, RepositoryError> {
        self.inner.clients(tenant)
    }

    fn insert_contact(&self, contact: Contact) -> Result<Contact, RepositoryError> {
        self.inner.insert_contact(contact)
    }

    fn contacts_for_client(
        &self,
        tenant: TenantId,
        client: ClientId,
    ) -> Result<Vec<Contact>, RepositoryError> {
        self.inner.contacts_for_client(tenant, client)
    }

    fn insert_site(&self, site: Site) -> Result<Site, RepositoryError> {
        self.inner.insert_site(site)
    }

    fn site(&self, tenant: TenantId, id: SiteId) -> Result<Option<Site>, RepositoryError> {
        self.inner.site(tenant, id)
    }

    fn insert_project(&self, project: Project) -> Result<Project, RepositoryError> {
        self.inner.insert_project(project)
    }

    fn project(&self, tenant: TenantId, id: ProjectId) -> Result<Option<Project>, RepositoryError> {
        if self.hide_projects {
            return Ok(None);
        }
        self.inner.project(tenant, id)
    }

    fn insert_work_item(&self, item: WorkItem) -> Result<WorkItem, RepositoryError> {
        self.inner.insert_work_item(item)
    }

    fn work_item(
        &self,
        tenant: TenantId,
        id: WorkItemId,
    ) -> Result<Option<WorkItem>, RepositoryError> {
        self.inner.work_item(tenant, id)
    }

    fn insert_inspection(&self, inspection: Inspection) -> Result<Inspection, RepositoryError> {
        self.inner.insert_inspection(inspection)
    }

    fn inspection(
        &self,
        tenant: TenantId,
        id: InspectionId,
    ) -> Result<Option<Inspection>, RepositoryError> {
        self.inner.inspection(tenant, id)
    }

    fn inspections(&self, tenant: TenantId) -> Result<Vec<Inspection>, RepositoryError> {
        self.inner.inspections(tenant)
    }

    fn update_inspection(&self, inspection: Inspection) -> Result<Inspection, RepositoryError> {
        self.inner.update_inspection(inspection)
    }

    fn finalize_inspection(
        &self,
        tenant: TenantId,
        id: InspectionId,
        submitted_at: DateTime<Utc>,
    ) -> Result<Inspection, RepositoryError> {
        self.inner.finalize_inspection(tenant, id, submitted_at)
    }

    fn insert_finding(&self, finding: Finding) -> Result<Finding, RepositoryError> {
        self.inner.insert_finding(finding)
    }

    fn findings_for_inspection(
        &self,
        tenant: TenantId,
        inspection: InspectionId,
    ) -> Result<Vec<Finding>, RepositoryError> {
        if self.findings_unavailable {
            return Err(unavailable());
        }
        self.inner.findings_for_inspection(tenant, inspection)
    }

    fn insert_action(&self, action: Action) -> Result<Action, RepositoryError> {
        if self
            .rejected_findings
            .lock()
            .expect("lock")
            .contains(&action.finding_id)
        {
            return Err(unavailable());
        }
        self.inner.insert_action(action)
    }

    fn action(&self, tenant: TenantId, id: ActionId) -> Result<Option<Action>, RepositoryError> {
        self.inner.action(tenant, id)
    }

    fn actions(
        &self,
        tenant: TenantId,
        query: ActionQuery,
    ) -> Result<Vec<Action>, RepositoryError> {
        self.inner.actions(tenant, query)
    }

    fn transition_action(
        &self,
        action: Action,
        entry: ActionAuditEntry,
    ) -> Result<Action, RepositoryError> {
        self.inner.transition_action(action, entry)
    }

    fn action_audit(
        &self,
        tenant: TenantId,
        action: ActionId,
    ) -> Result<Vec<ActionAuditEntry>, RepositoryError> {
        self.inner.action_audit(tenant, action)
    }
}
