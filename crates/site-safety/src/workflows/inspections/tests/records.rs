use super::common::*;
use crate::config::WorkflowConfig;
use crate::domain::{
    FindingStatus, InspectionStatus, ProjectId, ReportType, RiskType, Severity, SiteId,
};
use crate::workflows::inspections::{
    InspectionChanges, NewFinding, NewInspection, RecordServiceError, SubmitInspectionRequest,
};

fn new_finding(category: &str) -> NewFinding {
    NewFinding {
        category: category.to_string(),
        observation: Some("Open edge on level 4".to_string()),
        comment: None,
        status: FindingStatus::Issue,
        severity: Severity::High,
        risk_type: RiskType::Osha,
        regulatory_ref: Some("1926.501".to_string()),
        corrected_on_site: false,
    }
}

#[test]
fn create_starts_inspections_in_draft() {
    let fixture = seeded(None);
    let service = record_service(fixture.gateway.clone());

    let inspection = service
        .create(
            fixture.tenant,
            NewInspection {
                project_id: fixture.project,
                site_id: fixture.site,
                work_item_id: None,
                report_type: ReportType::DraftWord,
            },
        )
        .expect("inspection created");

    assert_eq!(inspection.status, InspectionStatus::Draft);
    assert_eq!(inspection.submitted_at, None);
    assert_eq!(service.list(fixture.tenant).expect("list").len(), 2);
}

#[test]
fn create_rejects_references_outside_the_tenant() {
    let fixture = seeded(None);
    let service = record_service(fixture.gateway.clone());

    let result = service.create(
        fixture.tenant,
        NewInspection {
            project_id: ProjectId::new(),
            site_id: fixture.site,
            work_item_id: None,
            report_type: ReportType::StandardPdf,
        },
    );
    match result {
        Err(RecordServiceError::Validation(message)) => assert!(message.contains("project")),
        other => panic!("expected validation error, got {other:?}"),
    }
}

#[test]
fn findings_are_returned_with_the_inspection() {
    let fixture = seeded(None);
    let service = record_service(fixture.gateway.clone());

    let finding = service
        .add_finding(fixture.tenant, fixture.inspection, new_finding("  Fall Protection "))
        .expect("finding added");
    assert_eq!(finding.category, "Fall Protection");

    let detail = service
        .get(fixture.tenant, fixture.inspection)
        .expect("detail");
    assert_eq!(detail.findings, vec![finding]);
    assert_eq!(
        service
            .findings(fixture.tenant, fixture.inspection)
            .expect("findings")
            .len(),
        1
    );
}

#[test]
fn blank_categories_are_rejected() {
    let fixture = seeded(None);
    let service = record_service(fixture.gateway.clone());

    assert!(matches!(
        service.add_finding(fixture.tenant, fixture.inspection, new_finding("   ")),
        Err(RecordServiceError::Validation(_))
    ));
}

#[test]
fn update_applies_partial_changes_while_draft() {
    let fixture = seeded(None);
    let service = record_service(fixture.gateway.clone());

    let updated = service
        .update(
            fixture.tenant,
            fixture.inspection,
            InspectionChanges {
                report_type: Some(ReportType::DraftWord),
                ..InspectionChanges::default()
            },
        )
        .expect("update succeeds");
    assert_eq!(updated.report_type, ReportType::DraftWord);
    assert_eq!(updated.project_id, fixture.project);

    let result = service.update(
        fixture.tenant,
        fixture.inspection,
        InspectionChanges {
            site_id: Some(SiteId::new()),
            ..InspectionChanges::default()
        },
    );
    assert!(matches!(result, Err(RecordServiceError::Validation(_))));
}

#[tokio::test]
async fn final_inspections_reject_edits_and_new_findings() {
    let fixture = seeded(None);
    let recorders = Recorders::default();
    submit_service(fixture.gateway.clone(), &recorders, WorkflowConfig::default())
        .submit(
            fixture.tenant,
            fixture.inspection,
            fixture.user,
            SubmitInspectionRequest::finalize(Vec::new(), None),
        )
        .await
        .expect("finalizes");
    let service = record_service(fixture.gateway.clone());

    assert!(matches!(
        service.update(
            fixture.tenant,
            fixture.inspection,
            InspectionChanges::default()
        ),
        Err(RecordServiceError::Finalized(_))
    ));
    assert!(matches!(
        service.add_finding(fixture.tenant, fixture.inspection, new_finding("Electrical")),
        Err(RecordServiceError::Finalized(_))
    ));
}

#[test]
fn other_tenants_cannot_read_inspections() {
    let fixture = seeded(None);
    let other = seeded(None);
    let service = record_service(fixture.gateway.clone());

    assert!(matches!(
        service.get(other.tenant, fixture.inspection),
        Err(RecordServiceError::NotFound(_))
    ));
    assert!(service.list(other.tenant).expect("list").is_empty());
}
