//! Outbound capability adapters: email, document storage, and time tracking.
//!
//! Each capability is a single trait with a stub implementation (logs and reports success) and a
//! live implementation that talks to the real system. [`Integrations::from_config`] picks one
//! implementation per capability at startup; workflows only ever see the trait objects.

pub mod email;
pub mod storage;
pub mod time_tracking;

use std::sync::Arc;
use std::time::Duration;

use crate::config::{
    EmailBackend, IntegrationsConfig, StorageBackend, TimeTrackingBackend, WorkflowConfig,
};

pub use email::{
    EmailAttachment, EmailMessage, EmailReceipt, EmailSender, SmtpEmailSender, StubEmailSender,
};
pub use storage::{
    DocumentStorage, FolderEntry, SharePointStorage, StubDocumentStorage, UploadReceipt,
};
pub use time_tracking::{BigTimeTracker, StubTimeTracker, TimeEntry, TimeEntryReceipt, TimeTracker};

/// Error surfaced by any adapter call.
#[derive(Debug, thiserror::Error)]
pub enum AdapterError {
    #[error("adapter transport unavailable: {0}")]
    Transport(String),
    #[error("remote service rejected request with status {status}: {detail}")]
    Rejected { status: u16, detail: String },
    #[error("invalid adapter request: {0}")]
    InvalidRequest(String),
    #[error("adapter misconfigured: {0}")]
    Configuration(String),
}

impl From<reqwest::Error> for AdapterError {
    fn from(value: reqwest::Error) -> Self {
        match value.status() {
            Some(status) => AdapterError::Rejected {
                status: status.as_u16(),
                detail: value.to_string(),
            },
            None => AdapterError::Transport(value.to_string()),
        }
    }
}

/// One implementation per external capability, selected once at startup.
#[derive(Clone)]
pub struct Integrations {
    pub email: Arc<dyn EmailSender>,
    pub storage: Arc<dyn DocumentStorage>,
    pub time_tracker: Arc<dyn TimeTracker>,
}

impl std::fmt::Debug for Integrations {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Integrations")
            .field("email", &self.email)
            .field("storage", &self.storage)
            .field("time_tracker", &self.time_tracker)
            .finish()
    }
}

impl Integrations {
    pub fn stub(workflow: &WorkflowConfig) -> Self {
        Self {
            email: Arc::new(StubEmailSender),
            storage: Arc::new(StubDocumentStorage::new(workflow.catch_all_folder.clone())),
            time_tracker: Arc::new(StubTimeTracker),
        }
    }

    pub fn from_config(
        config: &IntegrationsConfig,
        workflow: &WorkflowConfig,
    ) -> Result<Self, AdapterError> {
        let email: Arc<dyn EmailSender> = match &config.email {
            EmailBackend::Stub => Arc::new(StubEmailSender),
            EmailBackend::Smtp(settings) => Arc::new(SmtpEmailSender::from_settings(settings)?),
        };

        let storage: Arc<dyn DocumentStorage> = match &config.storage {
            StorageBackend::Stub => {
                Arc::new(StubDocumentStorage::new(workflow.catch_all_folder.clone()))
            }
            StorageBackend::SharePoint(settings) => Arc::new(SharePointStorage::from_settings(
                settings,
                workflow.catch_all_folder.clone(),
                http_client(workflow.adapter_timeout)?,
            )),
        };

        let time_tracker: Arc<dyn TimeTracker> = match &config.time_tracking {
            TimeTrackingBackend::Stub => Arc::new(StubTimeTracker),
            TimeTrackingBackend::BigTime(settings) => Arc::new(BigTimeTracker::from_settings(
                settings,
                http_client(workflow.adapter_timeout)?,
            )),
        };

        tracing::info!(
            email = ?email,
            storage = ?storage,
            time_tracker = ?time_tracker,
            "integration adapters selected"
        );

        Ok(Self {
            email,
            storage,
            time_tracker,
        })
    }
}

fn http_client(timeout: Duration) -> Result<reqwest::Client, AdapterError> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|err| AdapterError::Configuration(err.to_string()))
}
