use std::sync::Arc;
use std::time::Duration as StdDuration;

use async_trait::async_trait;
use axum::http::{Method, StatusCode};
use chrono::{Duration, Utc};
use tower::ServiceExt;

use super::{weekly_summary_router, ActionCounts, WeeklySummaryError, WeeklySummaryService};
use crate::config::WorkflowConfig;
use crate::domain::{Client, ClientId, TenantId};
use crate::integrations::{AdapterError, EmailMessage, EmailReceipt, EmailSender};
use crate::persistence::{MemoryGateway, PersistenceGateway};
use crate::workflows::actions::{ActionService, CloseAction};
use crate::workflows::fixtures::{
    assert_status, read_json_body, seeded, Fixture, RecordingEmail,
};

fn service(
    fixture: &Fixture<MemoryGateway>,
    email: Arc<dyn EmailSender>,
) -> WeeklySummaryService<MemoryGateway> {
    WeeklySummaryService::new(fixture.gateway.clone(), email, WorkflowConfig::default())
}

fn add_client(fixture: &Fixture<MemoryGateway>, name: &str, enabled: bool) -> ClientId {
    fixture
        .gateway
        .insert_client(Client {
            id: ClientId::new(),
            tenant_id: fixture.tenant,
            name: name.to_string(),
            weekly_summary_enabled: enabled,
        })
        .expect("client")
        .id
}

#[derive(Debug)]
struct StalledEmail;

#[async_trait]
impl EmailSender for StalledEmail {
    async fn send(
        &self,
        _tenant: TenantId,
        _message: EmailMessage,
    ) -> Result<EmailReceipt, AdapterError> {
        tokio::time::sleep(StdDuration::from_secs(30)).await;
        Err(AdapterError::Transport("never reached".to_string()))
    }
}

#[tokio::test]
async fn emails_bucketed_backlog_to_opted_in_contacts() {
    let fixture = seeded(None);
    let now = Utc::now();
    fixture.add_action("Replace frayed sling", now - Duration::days(3));
    fixture.add_action("Post confined space permit", now + Duration::days(2));
    fixture.add_action("Refresh ladder training", now + Duration::days(30));
    let closed = fixture.add_action("Sweep debris", now - Duration::days(9));
    ActionService::new(fixture.gateway.clone())
        .close(fixture.tenant, closed, fixture.user, CloseAction::default())
        .expect("close succeeds");
    fixture.add_contact("Dana Site Lead", "dana@acme.test", true);
    fixture.add_contact("Sam Accounts", "sam@acme.test", false);
    fixture.add_contact("Riley Safety", "riley@acme.test", true);
    let email = Arc::new(RecordingEmail::default());

    let result = service(&fixture, email.clone())
        .send(fixture.tenant, fixture.client)
        .await
        .expect("summary sends");

    assert!(result.sent);
    assert_eq!(result.reason, None);
    assert_eq!(result.recipient_count, Some(2));
    assert_eq!(
        result.action_counts,
        Some(ActionCounts {
            overdue: 1,
            due_soon: 1,
            future: 1,
        })
    );

    let messages = email.messages();
    assert_eq!(messages.len(), 1);
    let message = &messages[0];
    assert_eq!(message.to, vec!["dana@acme.test", "riley@acme.test"]);
    assert_eq!(message.subject, "Weekly Safety Summary - Acme Construction");
    assert!(message
        .body
        .starts_with("Weekly Safety Action Summary for Acme Construction\n\nOVERDUE (1):\n"));
    assert!(message.body.contains("Site: Downtown Tower Project"));
    assert!(!message.body.contains("Sweep debris"));
    assert!(message.attachments.is_empty());
}

#[tokio::test]
async fn empty_backlog_still_sends_the_all_clear() {
    let fixture = seeded(None);
    fixture.add_contact("Dana Site Lead", "dana@acme.test", true);
    let email = Arc::new(RecordingEmail::default());

    let result = service(&fixture, email.clone())
        .send(fixture.tenant, fixture.client)
        .await
        .expect("summary sends");

    assert_eq!(result.action_counts, Some(ActionCounts::default()));
    assert!(email.messages()[0]
        .body
        .ends_with("No open corrective actions. Great work!\n"));
}

#[tokio::test]
async fn disabled_clients_and_missing_recipients_are_not_emailed() {
    let fixture = seeded(None);
    let quiet = add_client(&fixture, "Quiet Builders", false);
    let email = Arc::new(RecordingEmail::default());
    let service = service(&fixture, email.clone());

    let disabled = service
        .send(fixture.tenant, quiet)
        .await
        .expect("summary resolves");
    assert!(!disabled.sent);
    assert!(disabled.reason.is_some());

    fixture.add_contact("Sam Accounts", "sam@acme.test", false);
    let unsubscribed = service
        .send(fixture.tenant, fixture.client)
        .await
        .expect("summary resolves");
    assert!(!unsubscribed.sent);
    assert_eq!(
        unsubscribed.reason.as_deref(),
        Some("No contacts configured to receive summaries")
    );
    assert_eq!(unsubscribed.recipient_count, None);

    assert!(email.messages().is_empty());
}

#[tokio::test]
async fn unknown_or_foreign_clients_are_not_found() {
    let fixture = seeded(None);
    let other = seeded(None);
    let service = service(&fixture, Arc::new(RecordingEmail::default()));

    let unknown = ClientId::new();
    assert!(matches!(
        service.send(fixture.tenant, unknown).await,
        Err(WeeklySummaryError::NotFound(id)) if id == unknown
    ));
    assert!(matches!(
        service.send(other.tenant, fixture.client).await,
        Err(WeeklySummaryError::NotFound(_))
    ));
}

#[tokio::test]
async fn email_failures_and_timeouts_propagate() {
    let fixture = seeded(None);
    fixture.add_contact("Dana Site Lead", "dana@acme.test", true);

    let failing = Arc::new(RecordingEmail {
        fail: true,
        ..RecordingEmail::default()
    });
    assert!(matches!(
        service(&fixture, failing)
            .send(fixture.tenant, fixture.client)
            .await,
        Err(WeeklySummaryError::Email(AdapterError::Transport(_)))
    ));

    let config = WorkflowConfig {
        adapter_timeout: StdDuration::from_millis(50),
        ..WorkflowConfig::default()
    };
    let stalled =
        WeeklySummaryService::new(fixture.gateway.clone(), Arc::new(StalledEmail), config);
    assert!(matches!(
        stalled.send(fixture.tenant, fixture.client).await,
        Err(WeeklySummaryError::Timeout(_))
    ));
}

#[tokio::test]
async fn send_all_covers_only_enabled_clients() {
    let fixture = seeded(None);
    add_client(&fixture, "Quiet Builders", false);
    let harbor = add_client(&fixture, "Harbor Works", true);
    fixture.add_contact("Dana Site Lead", "dana@acme.test", true);
    let email = Arc::new(RecordingEmail::default());

    let summaries = service(&fixture, email.clone())
        .send_all(fixture.tenant)
        .await
        .expect("summaries run");

    assert_eq!(summaries.len(), 2);
    let acme = summaries
        .iter()
        .find(|summary| summary.client_id == fixture.client)
        .expect("acme summary present");
    assert_eq!(acme.client_name, "Acme Construction");
    assert!(acme.result.sent);
    let harbor = summaries
        .iter()
        .find(|summary| summary.client_id == harbor)
        .expect("harbor summary present");
    assert!(!harbor.result.sent);
    assert_eq!(email.messages().len(), 1);
}

#[tokio::test]
async fn routes_report_summary_results() {
    let fixture = seeded(None);
    fixture.add_action("Replace frayed sling", Utc::now() - Duration::days(1));
    fixture.add_contact("Dana Site Lead", "dana@acme.test", true);
    let app = weekly_summary_router(Arc::new(service(
        &fixture,
        Arc::new(RecordingEmail::default()),
    )));

    let single = app
        .clone()
        .oneshot(fixture.request(
            Method::POST,
            &format!("/api/v1/clients/{}/weekly-summary", fixture.client),
            None,
        ))
        .await
        .expect("route executes");
    assert_status(&single, StatusCode::OK);
    let payload = read_json_body(single).await;
    assert_eq!(payload["sent"], true);
    assert_eq!(payload["recipientCount"], 1);
    assert_eq!(payload["actionCounts"]["overdue"], 1);
    assert_eq!(payload["actionCounts"]["dueSoon"], 0);
    assert!(payload.get("reason").is_none());

    let all = app
        .clone()
        .oneshot(fixture.request(Method::POST, "/api/v1/weekly-summaries", None))
        .await
        .expect("route executes");
    assert_status(&all, StatusCode::OK);
    let payload = read_json_body(all).await;
    assert_eq!(payload[0]["clientId"], fixture.client.to_string());
    assert_eq!(payload[0]["clientName"], "Acme Construction");
    assert_eq!(payload[0]["sent"], true);

    let missing = app
        .oneshot(fixture.request(
            Method::POST,
            &format!("/api/v1/clients/{}/weekly-summary", ClientId::new()),
            None,
        ))
        .await
        .expect("route executes");
    assert_status(&missing, StatusCode::NOT_FOUND);
}
