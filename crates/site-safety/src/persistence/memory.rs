use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};

use super::gateway::{ActionQuery, PersistenceGateway, RepositoryError};
use crate::domain::{
    Action, ActionAuditEntry, ActionId, Client, ClientId, Contact, ContactId, Finding, FindingId,
    Inspection, InspectionId, InspectionStatus, Project, ProjectId, Site, SiteId, Tenant,
    TenantId, User, UserId, WorkItem, WorkItemId,
};

#[derive(Default)]
struct Tables {
    tenants: HashMap<TenantId, Tenant>,
    users: HashMap<UserId, User>,
    clients: HashMap<ClientId, Client>,
    contacts: HashMap<ContactId, Contact>,
    sites: HashMap<SiteId, Site>,
    projects: HashMap<ProjectId, Project>,
    work_items: HashMap<WorkItemId, WorkItem>,
    inspections: HashMap<InspectionId, Inspection>,
    findings: HashMap<FindingId, Finding>,
    actions: HashMap<ActionId, Action>,
    action_audit: Vec<ActionAuditEntry>,
}

/// Tenant-scoped records sharing one owning id column.
trait Scoped {
    fn tenant(&self) -> TenantId;
}

macro_rules! scoped {
    ($($record:ty),*) => {
        $(impl Scoped for $record {
            fn tenant(&self) -> TenantId {
                self.tenant_id
            }
        })*
    };
}

scoped!(User, Client, Contact, Site, Project, WorkItem, Inspection, Finding, Action);

fn scoped_get<K, V>(table: &HashMap<K, V>, tenant: TenantId, id: &K) -> Option<V>
where
    K: Eq + Hash,
    V: Scoped + Clone,
{
    table
        .get(id)
        .filter(|record| record.tenant() == tenant)
        .cloned()
}

fn require<K, V>(
    table: &HashMap<K, V>,
    tenant: TenantId,
    id: &K,
    entity: &'static str,
) -> Result<(), RepositoryError>
where
    K: Eq + Hash,
    V: Scoped,
{
    match table.get(id) {
        Some(record) if record.tenant() == tenant => Ok(()),
        _ => Err(RepositoryError::MissingReference(entity)),
    }
}

fn insert_unique<K, V>(table: &mut HashMap<K, V>, id: K, record: V) -> Result<V, RepositoryError>
where
    K: Eq + Hash,
    V: Clone,
{
    if table.contains_key(&id) {
        return Err(RepositoryError::Conflict);
    }
    table.insert(id, record.clone());
    Ok(record)
}

/// Mutex-guarded in-process gateway used by the service binary and the test suites.
#[derive(Default)]
pub struct MemoryGateway {
    tables: Mutex<Tables>,
}

impl MemoryGateway {
    pub fn new() -> Self {
        Self::default()
    }

    fn tables(&self) -> Result<MutexGuard<'_, Tables>, RepositoryError> {
        self.tables
            .lock()
            .map_err(|_| RepositoryError::Unavailable("gateway mutex poisoned".to_string()))
    }
}

impl PersistenceGateway for MemoryGateway {
    fn insert_tenant(&self, tenant: Tenant) -> Result<Tenant, RepositoryError> {
        let mut tables = self.tables()?;
        insert_unique(&mut tables.tenants, tenant.id, tenant)
    }

    fn insert_user(&self, user: User) -> Result<User, RepositoryError> {
        let mut tables = self.tables()?;
        if !tables.tenants.contains_key(&user.tenant_id) {
            return Err(RepositoryError::MissingReference("tenant"));
        }
        let duplicate_email = tables
            .users
            .values()
            .any(|existing| existing.email.eq_ignore_ascii_case(&user.email));
        if duplicate_email {
            return Err(RepositoryError::Conflict);
        }
        insert_unique(&mut tables.users, user.id, user)
    }

    fn user(&self, tenant: TenantId, id: UserId) -> Result<Option<User>, RepositoryError> {
        Ok(scoped_get(&self.tables()?.users, tenant, &id))
    }

    fn insert_client(&self, client: Client) -> Result<Client, RepositoryError> {
        let mut tables = self.tables()?;
        if !tables.tenants.contains_key(&client.tenant_id) {
            return Err(RepositoryError::MissingReference("tenant"));
        }
        insert_unique(&mut tables.clients, client.id, client)
    }

    fn client(&self, tenant: TenantId, id: ClientId) -> Result<Option<Client>, RepositoryError> {
        Ok(scoped_get(&self.tables()?.clients, tenant, &id))
    }

    fn clients(&self, tenant: TenantId) -> Result<Vec<Client>, RepositoryError> {
        let tables = self.tables()?;
        let mut clients: Vec<Client> = tables
            .clients
            .values()
            .filter(|client| client.tenant_id == tenant)
            .cloned()
            .collect();
        clients.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(clients)
    }

    fn insert_contact(&self, contact: Contact) -> Result<Contact, RepositoryError> {
        let mut tables = self.tables()?;
        require(&tables.clients, contact.tenant_id, &contact.client_id, "client")?;
        insert_unique(&mut tables.contacts, contact.id, contact)
    }

    fn contacts_for_client(
        &self,
        tenant: TenantId,
        client: ClientId,
    ) -> Result<Vec<Contact>, RepositoryError> {
        let tables = self.tables()?;
        let mut contacts: Vec<Contact> = tables
            .contacts
            .values()
            .filter(|contact| contact.tenant_id == tenant && contact.client_id == client)
            .cloned()
            .collect();
        contacts.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(contacts)
    }

    fn insert_site(&self, site: Site) -> Result<Site, RepositoryError> {
        let mut tables = self.tables()?;
        require(&tables.clients, site.tenant_id, &site.client_id, "client")?;
        insert_unique(&mut tables.sites, site.id, site)
    }

    fn site(&self, tenant: TenantId, id: SiteId) -> Result<Option<Site>, RepositoryError> {
        Ok(scoped_get(&self.tables()?.sites, tenant, &id))
    }

    fn insert_project(&self, project: Project) -> Result<Project, RepositoryError> {
        let mut tables = self.tables()?;
        require(&tables.clients, project.tenant_id, &project.client_id, "client")?;
        insert_unique(&mut tables.projects, project.id, project)
    }

    fn project(&self, tenant: TenantId, id: ProjectId) -> Result<Option<Project>, RepositoryError> {
        Ok(scoped_get(&self.tables()?.projects, tenant, &id))
    }

    fn insert_work_item(&self, item: WorkItem) -> Result<WorkItem, RepositoryError> {
        let mut tables = self.tables()?;
        require(&tables.clients, item.tenant_id, &item.client_id, "client")?;
        require(&tables.projects, item.tenant_id, &item.project_id, "project")?;
        require(&tables.sites, item.tenant_id, &item.site_id, "site")?;
        if let Some(user) = item.assigned_to {
            require(&tables.users, item.tenant_id, &user, "user")?;
        }
        insert_unique(&mut tables.work_items, item.id, item)
    }

    fn work_item(
        &self,
        tenant: TenantId,
        id: WorkItemId,
    ) -> Result<Option<WorkItem>, RepositoryError> {
        Ok(scoped_get(&self.tables()?.work_items, tenant, &id))
    }

    fn insert_inspection(&self, inspection: Inspection) -> Result<Inspection, RepositoryError> {
        let mut tables = self.tables()?;
        check_inspection_references(&tables, &inspection)?;
        insert_unique(&mut tables.inspections, inspection.id, inspection)
    }

    fn inspection(
        &self,
        tenant: TenantId,
        id: InspectionId,
    ) -> Result<Option<Inspection>, RepositoryError> {
        Ok(scoped_get(&self.tables()?.inspections, tenant, &id))
    }

    fn inspections(&self, tenant: TenantId) -> Result<Vec<Inspection>, RepositoryError> {
        let tables = self.tables()?;
        let mut inspections: Vec<Inspection> = tables
            .inspections
            .values()
            .filter(|inspection| inspection.tenant_id == tenant)
            .cloned()
            .collect();
        inspections.sort_by_key(|inspection| inspection.created_at);
        Ok(inspections)
    }

    fn update_inspection(&self, inspection: Inspection) -> Result<Inspection, RepositoryError> {
        let mut tables = self.tables()?;
        match scoped_get(&tables.inspections, inspection.tenant_id, &inspection.id) {
            None => Err(RepositoryError::NotFound),
            Some(existing) if existing.is_final() => Err(RepositoryError::Conflict),
            Some(_) => {
                check_inspection_references(&tables, &inspection)?;
                tables.inspections.insert(inspection.id, inspection.clone());
                Ok(inspection)
            }
        }
    }

    fn finalize_inspection(
        &self,
        tenant: TenantId,
        id: InspectionId,
        submitted_at: DateTime<Utc>,
    ) -> Result<Inspection, RepositoryError> {
        let mut tables = self.tables()?;
        let inspection = tables
            .inspections
            .get_mut(&id)
            .filter(|inspection| inspection.tenant_id == tenant)
            .ok_or(RepositoryError::NotFound)?;
        if inspection.status != InspectionStatus::Draft {
            return Err(RepositoryError::Conflict);
        }
        inspection.status = InspectionStatus::Final;
        inspection.submitted_at = Some(submitted_at);
        Ok(inspection.clone())
    }

    fn insert_finding(&self, finding: Finding) -> Result<Finding, RepositoryError> {
        let mut tables = self.tables()?;
        require(
            &tables.inspections,
            finding.tenant_id,
            &finding.inspection_id,
            "inspection",
        )?;
        insert_unique(&mut tables.findings, finding.id, finding)
    }

    fn findings_for_inspection(
        &self,
        tenant: TenantId,
        inspection: InspectionId,
    ) -> Result<Vec<Finding>, RepositoryError> {
        let tables = self.tables()?;
        let mut findings: Vec<Finding> = tables
            .findings
            .values()
            .filter(|finding| finding.tenant_id == tenant && finding.inspection_id == inspection)
            .cloned()
            .collect();
        findings.sort_by(|a, b| a.category.cmp(&b.category).then(a.id.cmp(&b.id)));
        Ok(findings)
    }

    fn insert_action(&self, action: Action) -> Result<Action, RepositoryError> {
        let mut tables = self.tables()?;
        require(&tables.clients, action.tenant_id, &action.client_id, "client")?;
        require(&tables.sites, action.tenant_id, &action.site_id, "site")?;
        require(
            &tables.inspections,
            action.tenant_id,
            &action.inspection_id,
            "inspection",
        )?;
        require(&tables.findings, action.tenant_id, &action.finding_id, "finding")?;
        let spawned = tables
            .actions
            .values()
            .any(|existing| existing.finding_id == action.finding_id);
        if spawned {
            return Err(RepositoryError::Conflict);
        }
        insert_unique(&mut tables.actions, action.id, action)
    }

    fn action(&self, tenant: TenantId, id: ActionId) -> Result<Option<Action>, RepositoryError> {
        Ok(scoped_get(&self.tables()?.actions, tenant, &id))
    }

    fn actions(
        &self,
        tenant: TenantId,
        query: ActionQuery,
    ) -> Result<Vec<Action>, RepositoryError> {
        let tables = self.tables()?;
        let mut actions: Vec<Action> = tables
            .actions
            .values()
            .filter(|action| action.tenant_id == tenant && query.matches(action))
            .cloned()
            .collect();
        actions.sort_by_key(|action| (action.due_date, action.created_at));
        Ok(actions)
    }

    fn transition_action(
        &self,
        action: Action,
        entry: ActionAuditEntry,
    ) -> Result<Action, RepositoryError> {
        let mut tables = self.tables()?;
        let stored = scoped_get(&tables.actions, action.tenant_id, &action.id)
            .ok_or(RepositoryError::NotFound)?;
        if entry.tenant_id != action.tenant_id || entry.action_id != action.id {
            return Err(RepositoryError::MissingReference("action"));
        }
        if stored.status != entry.previous_status {
            return Err(RepositoryError::Conflict);
        }
        tables.actions.insert(action.id, action.clone());
        tables.action_audit.push(entry);
        Ok(action)
    }

    fn action_audit(
        &self,
        tenant: TenantId,
        action: ActionId,
    ) -> Result<Vec<ActionAuditEntry>, RepositoryError> {
        let tables = self.tables()?;
        Ok(tables
            .action_audit
            .iter()
            .filter(|entry| entry.tenant_id == tenant && entry.action_id == action)
            .cloned()
            .collect())
    }
}

fn check_inspection_references(
    tables: &Tables,
    inspection: &Inspection,
) -> Result<(), RepositoryError> {
    let tenant = inspection.tenant_id;
    require(&tables.projects, tenant, &inspection.project_id, "project")?;
    require(&tables.sites, tenant, &inspection.site_id, "site")?;
    if let Some(work_item) = inspection.work_item_id {
        require(&tables.work_items, tenant, &work_item, "work item")?;
    }
    Ok(())
}
