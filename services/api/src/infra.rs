use chrono::{Duration, Utc};
use metrics_exporter_prometheus::PrometheusHandle;
use site_safety::config::WorkflowConfig;
use site_safety::domain::{
    Client, ClientId, Contact, ContactId, Finding, FindingId, FindingStatus, Inspection,
    InspectionId, InspectionStatus, Project, ProjectId, ReportType, RiskType, Severity, Site,
    SiteId, Tenant, TenantId, User, UserId, UserRole, WorkItem, WorkItemId, WorkItemKind,
};
use site_safety::integrations::Integrations;
use site_safety::persistence::{MemoryGateway, PersistenceGateway, RepositoryError};
use site_safety::workflows::actions::ActionService;
use site_safety::workflows::inspections::{
    InspectionRecordService, InspectionSubmitService, PlaceholderRenderer,
};
use site_safety::workflows::weekly_summary::WeeklySummaryService;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Every workflow service, sharing one gateway and one adapter bundle.
pub(crate) struct Services<G> {
    pub(crate) records: Arc<InspectionRecordService<G>>,
    pub(crate) submissions: Arc<InspectionSubmitService<G>>,
    pub(crate) actions: Arc<ActionService<G>>,
    pub(crate) summaries: Arc<WeeklySummaryService<G>>,
}

impl<G> Services<G>
where
    G: PersistenceGateway + 'static,
{
    pub(crate) fn build(
        gateway: Arc<G>,
        integrations: Integrations,
        workflow: WorkflowConfig,
    ) -> Self {
        let summaries = WeeklySummaryService::new(
            gateway.clone(),
            integrations.email.clone(),
            workflow.clone(),
        );
        let submissions = InspectionSubmitService::new(
            gateway.clone(),
            integrations,
            Arc::new(PlaceholderRenderer),
            workflow,
        );
        Self {
            records: Arc::new(InspectionRecordService::new(gateway.clone())),
            submissions: Arc::new(submissions),
            actions: Arc::new(ActionService::new(gateway)),
            summaries: Arc::new(summaries),
        }
    }
}

/// Ids of the records created by [`seed_demo_tenant`].
#[derive(Debug, Clone, Copy)]
pub(crate) struct DemoTenant {
    pub(crate) tenant: TenantId,
    pub(crate) admin: UserId,
    pub(crate) inspector: UserId,
    pub(crate) client: ClientId,
    pub(crate) inspection: InspectionId,
}

/// Seeds one tenant with two clients, their contacts, sites and projects, and a Draft
/// inspection carrying a mix of issue and positive findings.
pub(crate) fn seed_demo_tenant(gateway: &MemoryGateway) -> Result<DemoTenant, RepositoryError> {
    let tenant = gateway
        .insert_tenant(Tenant {
            id: TenantId::new(),
            name: "Great Lakes Environmental".to_string(),
        })?
        .id;
    let admin = insert_user(gateway, tenant, "admin@greatlakes.com", UserRole::Admin)?;
    let inspector = insert_user(gateway, tenant, "inspector@greatlakes.com", UserRole::Staff)?;

    let acme = insert_client(gateway, tenant, "Acme Construction", true)?;
    let safe_build = insert_client(gateway, tenant, "SafeBuild Industries", false)?;
    insert_contact(gateway, tenant, acme, "Roger Smith", "roger@acme.com", true)?;
    insert_contact(gateway, tenant, acme, "Jane Miller", "jane@acme.com", false)?;
    insert_contact(gateway, tenant, safe_build, "Tom Davis", "tom@safebuild.com", true)?;

    let acme_project = insert_project(gateway, tenant, acme, "1001", Some("SP-ACME-001"))?;
    insert_project(gateway, tenant, safe_build, "1002", None)?;
    let downtown = insert_site(gateway, tenant, acme, "Downtown Tower Project")?;
    insert_site(gateway, tenant, acme, "Highway Bridge Site")?;
    insert_site(gateway, tenant, safe_build, "Warehouse Renovation")?;

    let work_item = gateway
        .insert_work_item(WorkItem {
            id: WorkItemId::new(),
            tenant_id: tenant,
            client_id: acme,
            project_id: acme_project,
            site_id: downtown,
            kind: WorkItemKind::Inspection,
            assigned_to: Some(inspector),
            scheduled_on: Some(Utc::now().date_naive()),
        })?
        .id;
    let inspection = gateway
        .insert_inspection(Inspection {
            id: InspectionId::new(),
            tenant_id: tenant,
            work_item_id: Some(work_item),
            project_id: acme_project,
            site_id: downtown,
            report_type: ReportType::StandardPdf,
            status: InspectionStatus::Draft,
            submitted_at: None,
            created_at: Utc::now() - Duration::hours(2),
        })?
        .id;

    let findings = [
        (
            "Fall Protection",
            "Open edge on level 4 without guardrail",
            FindingStatus::Issue,
            Severity::High,
            RiskType::Osha,
            Some("1926.501(b)(1)"),
        ),
        (
            "Housekeeping",
            "Walkways clear and materials stacked",
            FindingStatus::Positive,
            Severity::Low,
            RiskType::Behavioral,
            None,
        ),
        (
            "Electrical",
            "Damaged extension cord in use at stair 2",
            FindingStatus::Issue,
            Severity::Medium,
            RiskType::Equipment,
            Some("1926.405(a)(2)(ii)(I)"),
        ),
    ];
    for (category, observation, status, severity, risk_type, regulatory_ref) in findings {
        gateway.insert_finding(Finding {
            id: FindingId::new(),
            tenant_id: tenant,
            inspection_id: inspection,
            category: category.to_string(),
            observation: Some(observation.to_string()),
            comment: None,
            status,
            severity,
            risk_type,
            regulatory_ref: regulatory_ref.map(str::to_string),
            corrected_on_site: false,
        })?;
    }

    Ok(DemoTenant {
        tenant,
        admin,
        inspector,
        client: acme,
        inspection,
    })
}

fn insert_user(
    gateway: &MemoryGateway,
    tenant: TenantId,
    email: &str,
    role: UserRole,
) -> Result<UserId, RepositoryError> {
    Ok(gateway
        .insert_user(User {
            id: UserId::new(),
            tenant_id: tenant,
            email: email.to_string(),
            role,
        })?
        .id)
}

fn insert_client(
    gateway: &MemoryGateway,
    tenant: TenantId,
    name: &str,
    weekly_summary_enabled: bool,
) -> Result<ClientId, RepositoryError> {
    Ok(gateway
        .insert_client(Client {
            id: ClientId::new(),
            tenant_id: tenant,
            name: name.to_string(),
            weekly_summary_enabled,
        })?
        .id)
}

fn insert_contact(
    gateway: &MemoryGateway,
    tenant: TenantId,
    client: ClientId,
    name: &str,
    email: &str,
    receive_inspections_default: bool,
) -> Result<ContactId, RepositoryError> {
    Ok(gateway
        .insert_contact(Contact {
            id: ContactId::new(),
            tenant_id: tenant,
            client_id: client,
            name: name.to_string(),
            email: email.to_string(),
            receive_inspections_default,
        })?
        .id)
}

fn insert_project(
    gateway: &MemoryGateway,
    tenant: TenantId,
    client: ClientId,
    bigtime_project_id: &str,
    sharepoint_folder_id: Option<&str>,
) -> Result<ProjectId, RepositoryError> {
    Ok(gateway
        .insert_project(Project {
            id: ProjectId::new(),
            tenant_id: tenant,
            client_id: client,
            bigtime_project_id: Some(bigtime_project_id.to_string()),
            sharepoint_folder_id: sharepoint_folder_id.map(str::to_string),
        })?
        .id)
}

fn insert_site(
    gateway: &MemoryGateway,
    tenant: TenantId,
    client: ClientId,
    name: &str,
) -> Result<SiteId, RepositoryError> {
    Ok(gateway
        .insert_site(Site {
            id: SiteId::new(),
            tenant_id: tenant,
            client_id: client,
            name: name.to_string(),
            address: None,
        })?
        .id)
}
