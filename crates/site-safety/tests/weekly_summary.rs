use std::sync::Arc;

use chrono::{Duration, Utc};
use site_safety::config::WorkflowConfig;
use site_safety::domain::{
    Action, ActionId, ActionStatus, Client, ClientId, Contact, ContactId, Finding, FindingId,
    FindingStatus, Inspection, InspectionId, InspectionStatus, Project, ProjectId, ReportType,
    RiskType, Severity, Site, SiteId, Tenant, TenantId,
};
use site_safety::integrations::StubEmailSender;
use site_safety::persistence::{MemoryGateway, PersistenceGateway};
use site_safety::workflows::weekly_summary::{ActionCounts, WeeklySummaryService};

struct Seeded {
    gateway: Arc<MemoryGateway>,
    tenant: TenantId,
    client: ClientId,
    site: SiteId,
    inspection: InspectionId,
}

fn seeded() -> Seeded {
    let gateway = Arc::new(MemoryGateway::new());
    let tenant = TenantId::new();
    gateway
        .insert_tenant(Tenant {
            id: tenant,
            name: "Great Lakes Environmental".to_string(),
        })
        .expect("tenant inserted");
    let client = gateway
        .insert_client(Client {
            id: ClientId::new(),
            tenant_id: tenant,
            name: "Acme Construction".to_string(),
            weekly_summary_enabled: true,
        })
        .expect("client inserted")
        .id;
    let site = gateway
        .insert_site(Site {
            id: SiteId::new(),
            tenant_id: tenant,
            client_id: client,
            name: "Riverside Warehouse".to_string(),
            address: None,
        })
        .expect("site inserted")
        .id;
    let project = gateway
        .insert_project(Project {
            id: ProjectId::new(),
            tenant_id: tenant,
            client_id: client,
            bigtime_project_id: None,
            sharepoint_folder_id: None,
        })
        .expect("project inserted")
        .id;
    let inspection = gateway
        .insert_inspection(Inspection {
            id: InspectionId::new(),
            tenant_id: tenant,
            work_item_id: None,
            project_id: project,
            site_id: site,
            report_type: ReportType::StandardPdf,
            status: InspectionStatus::Final,
            submitted_at: Some(Utc::now()),
            created_at: Utc::now(),
        })
        .expect("inspection inserted")
        .id;
    gateway
        .insert_contact(Contact {
            id: ContactId::new(),
            tenant_id: tenant,
            client_id: client,
            name: "Morgan Superintendent".to_string(),
            email: "morgan@acme.com".to_string(),
            receive_inspections_default: true,
        })
        .expect("contact inserted");

    Seeded {
        gateway,
        tenant,
        client,
        site,
        inspection,
    }
}

fn open_action(seeded: &Seeded, description: &str, due_in_days: i64) {
    let finding = seeded
        .gateway
        .insert_finding(Finding {
            id: FindingId::new(),
            tenant_id: seeded.tenant,
            inspection_id: seeded.inspection,
            category: description.to_string(),
            observation: None,
            comment: None,
            status: FindingStatus::Issue,
            severity: Severity::Medium,
            risk_type: RiskType::Osha,
            regulatory_ref: None,
            corrected_on_site: false,
        })
        .expect("finding inserted");
    seeded
        .gateway
        .insert_action(Action {
            id: ActionId::new(),
            tenant_id: seeded.tenant,
            client_id: seeded.client,
            site_id: seeded.site,
            inspection_id: seeded.inspection,
            finding_id: finding.id,
            description: description.to_string(),
            responsible_name: "TBD".to_string(),
            responsible_email: None,
            due_date: Utc::now() + Duration::days(due_in_days),
            status: ActionStatus::Open,
            closed_by: None,
            closed_at: None,
            created_at: Utc::now(),
        })
        .expect("action inserted");
}

#[tokio::test]
async fn summary_counts_backlog_for_every_enabled_client() {
    let seeded = seeded();
    open_action(&seeded, "Repair stair rail", -4);
    open_action(&seeded, "Replace fire extinguisher tags", -1);
    open_action(&seeded, "Mark forklift lanes", 3);
    open_action(&seeded, "Annual rack inspection", 45);
    let service = WeeklySummaryService::new(
        seeded.gateway.clone(),
        Arc::new(StubEmailSender),
        WorkflowConfig::default(),
    );

    let summaries = service
        .send_all(seeded.tenant)
        .await
        .expect("summaries sent");

    assert_eq!(summaries.len(), 1);
    let summary = &summaries[0];
    assert_eq!(summary.client_id, seeded.client);
    assert!(summary.result.sent);
    assert_eq!(summary.result.recipient_count, Some(1));
    assert_eq!(
        summary.result.action_counts,
        Some(ActionCounts {
            overdue: 2,
            due_soon: 1,
            future: 1,
        })
    );

    let payload = serde_json::to_value(summary).expect("summary serializes");
    assert_eq!(payload["clientName"], "Acme Construction");
    assert_eq!(payload["actionCounts"]["dueSoon"], 1);
}
