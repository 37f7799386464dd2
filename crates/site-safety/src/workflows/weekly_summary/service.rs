use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde::Serialize;

use super::digest::{summary_subject, ActionBacklog, ActionCounts, DigestLine};
use crate::config::WorkflowConfig;
use crate::domain::{Client, ClientId, SiteId, TenantId};
use crate::integrations::{AdapterError, EmailMessage, EmailSender};
use crate::persistence::{ActionQuery, PersistenceGateway, RepositoryError};

const DISABLED_REASON: &str = "Weekly summary disabled for this client";
const NO_RECIPIENTS_REASON: &str = "No contacts configured to receive summaries";

/// Result of one client's summary run. `reason` is set only when nothing was sent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryResult {
    pub sent: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recipient_count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action_counts: Option<ActionCounts>,
}

impl SummaryResult {
    fn skipped(reason: &str) -> Self {
        Self {
            sent: false,
            reason: Some(reason.to_string()),
            recipient_count: None,
            action_counts: None,
        }
    }

    fn delivered(recipient_count: usize, action_counts: ActionCounts) -> Self {
        Self {
            sent: true,
            reason: None,
            recipient_count: Some(recipient_count),
            action_counts: Some(action_counts),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientSummary {
    pub client_id: ClientId,
    pub client_name: String,
    #[serde(flatten)]
    pub result: SummaryResult,
}

#[derive(Debug, thiserror::Error)]
pub enum WeeklySummaryError {
    #[error("client {0} not found")]
    NotFound(ClientId),
    #[error("summary email failed: {0}")]
    Email(#[from] AdapterError),
    #[error("summary email timed out after {0:?}")]
    Timeout(Duration),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Emails each client's open corrective-action backlog to its opted-in contacts.
pub struct WeeklySummaryService<G> {
    gateway: Arc<G>,
    email: Arc<dyn EmailSender>,
    config: WorkflowConfig,
}

impl<G> WeeklySummaryService<G>
where
    G: PersistenceGateway + 'static,
{
    pub fn new(gateway: Arc<G>, email: Arc<dyn EmailSender>, config: WorkflowConfig) -> Self {
        Self {
            gateway,
            email,
            config,
        }
    }

    pub async fn send(
        &self,
        tenant: TenantId,
        client_id: ClientId,
    ) -> Result<SummaryResult, WeeklySummaryError> {
        let client = self
            .gateway
            .client(tenant, client_id)?
            .ok_or(WeeklySummaryError::NotFound(client_id))?;
        self.send_for(tenant, &client).await
    }

    /// Runs the summary for every client with the feature enabled, stopping at the first error.
    pub async fn send_all(
        &self,
        tenant: TenantId,
    ) -> Result<Vec<ClientSummary>, WeeklySummaryError> {
        let clients = self.gateway.clients(tenant)?;
        let mut summaries = Vec::new();
        for client in clients.into_iter().filter(|client| client.weekly_summary_enabled) {
            let result = self.send_for(tenant, &client).await?;
            summaries.push(ClientSummary {
                client_id: client.id,
                client_name: client.name,
                result,
            });
        }
        Ok(summaries)
    }

    async fn send_for(
        &self,
        tenant: TenantId,
        client: &Client,
    ) -> Result<SummaryResult, WeeklySummaryError> {
        if !client.weekly_summary_enabled {
            tracing::debug!(
                tenant_id = %tenant,
                client_id = %client.id,
                "weekly summary disabled"
            );
            return Ok(SummaryResult::skipped(DISABLED_REASON));
        }

        let backlog = self.backlog(tenant, client)?;
        let recipients: Vec<String> = self
            .gateway
            .contacts_for_client(tenant, client.id)?
            .into_iter()
            .filter(|contact| contact.receive_inspections_default)
            .map(|contact| contact.email)
            .collect();
        if recipients.is_empty() {
            tracing::info!(
                tenant_id = %tenant,
                client_id = %client.id,
                "weekly summary skipped; no opted-in contacts"
            );
            return Ok(SummaryResult::skipped(NO_RECIPIENTS_REASON));
        }

        let recipient_count = recipients.len();
        let message = EmailMessage {
            to: recipients,
            subject: summary_subject(&client.name),
            body: backlog.render(&client.name),
            attachments: Vec::new(),
        };
        let limit = self.config.adapter_timeout;
        let receipt = tokio::time::timeout(limit, self.email.send(tenant, message))
            .await
            .map_err(|_| WeeklySummaryError::Timeout(limit))??;

        let counts = backlog.counts();
        tracing::info!(
            tenant_id = %tenant,
            client_id = %client.id,
            message_id = %receipt.message_id,
            recipients = recipient_count,
            overdue = counts.overdue,
            due_soon = counts.due_soon,
            future = counts.future,
            "weekly summary sent"
        );
        Ok(SummaryResult::delivered(recipient_count, counts))
    }

    fn backlog(
        &self,
        tenant: TenantId,
        client: &Client,
    ) -> Result<ActionBacklog, WeeklySummaryError> {
        let actions = self
            .gateway
            .actions(tenant, ActionQuery::open_for_client(client.id))?;
        let mut site_names: HashMap<SiteId, Option<String>> = HashMap::new();
        let mut lines = Vec::with_capacity(actions.len());
        for action in &actions {
            let site_name = match site_names.get(&action.site_id) {
                Some(name) => name.clone(),
                None => {
                    let name = self
                        .gateway
                        .site(tenant, action.site_id)?
                        .map(|site| site.name);
                    site_names.insert(action.site_id, name.clone());
                    name
                }
            };
            lines.push(DigestLine::new(action, site_name));
        }
        Ok(ActionBacklog::bucket(
            lines,
            Utc::now(),
            self.config.summary_due_soon_days,
        ))
    }
}
