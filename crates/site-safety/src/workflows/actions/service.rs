use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{
    Action, ActionAuditEntry, ActionId, ActionStatus, ClientId, TenantId, UserId,
};
use crate::persistence::{ActionQuery, PersistenceGateway, RepositoryError};

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CloseAction {
    #[serde(default)]
    pub note: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReopenAction {
    pub new_due_date: DateTime<Utc>,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionDetail {
    #[serde(flatten)]
    pub action: Action,
    pub audit_trail: Vec<ActionAuditEntry>,
}

#[derive(Debug, thiserror::Error)]
pub enum ActionServiceError {
    #[error("action {0} not found")]
    NotFound(ActionId),
    #[error("action {id} is already {}", .status.label())]
    Conflict { id: ActionId, status: ActionStatus },
    #[error("{0}")]
    Validation(String),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Corrective action tracking: listing, close, and reopen with an audit trail.
pub struct ActionService<G> {
    gateway: Arc<G>,
}

impl<G> ActionService<G>
where
    G: PersistenceGateway + 'static,
{
    pub fn new(gateway: Arc<G>) -> Self {
        Self { gateway }
    }

    /// Actions ordered by due date, optionally narrowed to one client or status.
    pub fn list(
        &self,
        tenant: TenantId,
        query: ActionQuery,
    ) -> Result<Vec<Action>, ActionServiceError> {
        Ok(self.gateway.actions(tenant, query)?)
    }

    pub fn open_for_client(
        &self,
        tenant: TenantId,
        client: ClientId,
    ) -> Result<Vec<Action>, ActionServiceError> {
        self.list(tenant, ActionQuery::open_for_client(client))
    }

    pub fn get(&self, tenant: TenantId, id: ActionId) -> Result<ActionDetail, ActionServiceError> {
        let action = self.fetch(tenant, id)?;
        let audit_trail = self.gateway.action_audit(tenant, id)?;
        Ok(ActionDetail {
            action,
            audit_trail,
        })
    }

    pub fn close(
        &self,
        tenant: TenantId,
        id: ActionId,
        closed_by: UserId,
        request: CloseAction,
    ) -> Result<Action, ActionServiceError> {
        let mut action = self.fetch(tenant, id)?;
        if action.status == ActionStatus::Closed {
            return Err(ActionServiceError::Conflict {
                id,
                status: ActionStatus::Closed,
            });
        }

        let now = Utc::now();
        action.status = ActionStatus::Closed;
        action.closed_by = Some(closed_by);
        action.closed_at = Some(now);
        let entry = ActionAuditEntry {
            tenant_id: tenant,
            action_id: id,
            previous_status: ActionStatus::Open,
            new_status: ActionStatus::Closed,
            changed_by: closed_by,
            note: request.note.filter(|note| !note.trim().is_empty()),
            recorded_at: now,
        };
        let updated = self.transition(action, entry)?;
        tracing::info!(tenant_id = %tenant, action_id = %id, "action closed");
        Ok(updated)
    }

    pub fn reopen(
        &self,
        tenant: TenantId,
        id: ActionId,
        reopened_by: UserId,
        request: ReopenAction,
    ) -> Result<Action, ActionServiceError> {
        let reason = request.reason.trim();
        if reason.is_empty() {
            return Err(ActionServiceError::Validation(
                "a reason is required to reopen an action".to_string(),
            ));
        }
        let mut action = self.fetch(tenant, id)?;
        if action.status == ActionStatus::Open {
            return Err(ActionServiceError::Conflict {
                id,
                status: ActionStatus::Open,
            });
        }

        action.status = ActionStatus::Open;
        action.due_date = request.new_due_date;
        action.closed_by = None;
        action.closed_at = None;
        let entry = ActionAuditEntry {
            tenant_id: tenant,
            action_id: id,
            previous_status: ActionStatus::Closed,
            new_status: ActionStatus::Open,
            changed_by: reopened_by,
            note: Some(reason.to_string()),
            recorded_at: Utc::now(),
        };
        let updated = self.transition(action, entry)?;
        tracing::info!(
            tenant_id = %tenant,
            action_id = %id,
            due_date = %updated.due_date,
            "action reopened"
        );
        Ok(updated)
    }

    /// A lost race surfaces as the status the winner already wrote.
    fn transition(
        &self,
        action: Action,
        entry: ActionAuditEntry,
    ) -> Result<Action, ActionServiceError> {
        let id = action.id;
        let status = entry.new_status;
        self.gateway
            .transition_action(action, entry)
            .map_err(|err| match err {
                RepositoryError::Conflict => ActionServiceError::Conflict { id, status },
                RepositoryError::NotFound => ActionServiceError::NotFound(id),
                other => ActionServiceError::Repository(other),
            })
    }

    fn fetch(&self, tenant: TenantId, id: ActionId) -> Result<Action, ActionServiceError> {
        self.gateway
            .action(tenant, id)?
            .ok_or(ActionServiceError::NotFound(id))
    }
}
