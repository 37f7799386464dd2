use chrono::{DateTime, Utc};

use crate::domain::{
    Action, ActionAuditEntry, ActionId, ActionStatus, Client, ClientId, Contact, Finding,
    Inspection, InspectionId, Project, ProjectId, Site, SiteId, Tenant, TenantId, User, UserId,
    WorkItem, WorkItemId,
};

/// Storage abstraction so workflows can be exercised in isolation.
///
/// Every lookup takes the caller's tenant and behaves as if records of other tenants do not
/// exist. Inserts verify that referenced records exist inside the same tenant.
pub trait PersistenceGateway: Send + Sync {
    fn insert_tenant(&self, tenant: Tenant) -> Result<Tenant, RepositoryError>;

    fn insert_user(&self, user: User) -> Result<User, RepositoryError>;
    fn user(&self, tenant: TenantId, id: UserId) -> Result<Option<User>, RepositoryError>;

    fn insert_client(&self, client: Client) -> Result<Client, RepositoryError>;
    fn client(&self, tenant: TenantId, id: ClientId) -> Result<Option<Client>, RepositoryError>;
    fn clients(&self, tenant: TenantId) -> Result<Vec<Client>, RepositoryError>;

    fn insert_contact(&self, contact: Contact) -> Result<Contact, RepositoryError>;
    fn contacts_for_client(
        &self,
        tenant: TenantId,
        client: ClientId,
    ) -> Result<Vec<Contact>, RepositoryError>;

    fn insert_site(&self, site: Site) -> Result<Site, RepositoryError>;
    fn site(&self, tenant: TenantId, id: SiteId) -> Result<Option<Site>, RepositoryError>;

    fn insert_project(&self, project: Project) -> Result<Project, RepositoryError>;
    fn project(&self, tenant: TenantId, id: ProjectId) -> Result<Option<Project>, RepositoryError>;

    fn insert_work_item(&self, item: WorkItem) -> Result<WorkItem, RepositoryError>;
    fn work_item(
        &self,
        tenant: TenantId,
        id: WorkItemId,
    ) -> Result<Option<WorkItem>, RepositoryError>;

    fn insert_inspection(&self, inspection: Inspection) -> Result<Inspection, RepositoryError>;
    fn inspection(
        &self,
        tenant: TenantId,
        id: InspectionId,
    ) -> Result<Option<Inspection>, RepositoryError>;
    fn inspections(&self, tenant: TenantId) -> Result<Vec<Inspection>, RepositoryError>;
    /// Replaces a `Draft` inspection. Finalized inspections are rejected with `Conflict`.
    fn update_inspection(&self, inspection: Inspection) -> Result<Inspection, RepositoryError>;
    /// Compare-and-swap `Draft -> Final`. A second caller observes `Conflict`.
    fn finalize_inspection(
        &self,
        tenant: TenantId,
        id: InspectionId,
        submitted_at: DateTime<Utc>,
    ) -> Result<Inspection, RepositoryError>;

    fn insert_finding(&self, finding: Finding) -> Result<Finding, RepositoryError>;
    fn findings_for_inspection(
        &self,
        tenant: TenantId,
        inspection: InspectionId,
    ) -> Result<Vec<Finding>, RepositoryError>;

    fn insert_action(&self, action: Action) -> Result<Action, RepositoryError>;
    fn action(&self, tenant: TenantId, id: ActionId) -> Result<Option<Action>, RepositoryError>;
    /// Matching actions ordered by due date, earliest first.
    fn actions(&self, tenant: TenantId, query: ActionQuery)
        -> Result<Vec<Action>, RepositoryError>;
    /// Replaces the action and appends `entry` in one step, provided the stored status still
    /// equals `entry.previous_status`. Otherwise nothing is written and `Conflict` is returned.
    fn transition_action(
        &self,
        action: Action,
        entry: ActionAuditEntry,
    ) -> Result<Action, RepositoryError>;
    fn action_audit(
        &self,
        tenant: TenantId,
        action: ActionId,
    ) -> Result<Vec<ActionAuditEntry>, RepositoryError>;
}

/// Optional filters applied when listing actions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ActionQuery {
    pub client: Option<ClientId>,
    pub status: Option<ActionStatus>,
}

impl ActionQuery {
    pub fn open_for_client(client: ClientId) -> Self {
        Self {
            client: Some(client),
            status: Some(ActionStatus::Open),
        }
    }

    pub fn matches(&self, action: &Action) -> bool {
        self.client.map_or(true, |client| action.client_id == client)
            && self.status.map_or(true, |status| action.status == status)
    }
}

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("referenced {0} does not exist for this tenant")]
    MissingReference(&'static str),
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}
