use std::fmt::Debug;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::AdapterError;
use crate::config::BigTimeSettings;
use crate::domain::TenantId;

/// Billable time booked against an external project.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeEntry {
    pub project_id: String,
    pub user_id: String,
    pub hours: f64,
    pub date: DateTime<Utc>,
    pub note: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeEntryReceipt {
    pub success: bool,
    pub entry_id: String,
}

#[async_trait]
pub trait TimeTracker: Send + Sync + Debug {
    async fn log_time(
        &self,
        tenant: TenantId,
        entry: TimeEntry,
    ) -> Result<TimeEntryReceipt, AdapterError>;

    /// Hours already booked against the project.
    async fn project_hours(&self, tenant: TenantId, project_id: &str)
        -> Result<f64, AdapterError>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct StubTimeTracker;

#[async_trait]
impl TimeTracker for StubTimeTracker {
    async fn log_time(
        &self,
        tenant: TenantId,
        entry: TimeEntry,
    ) -> Result<TimeEntryReceipt, AdapterError> {
        info!(
            %tenant,
            project = %entry.project_id,
            hours = entry.hours,
            "stub time entry accepted"
        );
        Ok(TimeEntryReceipt {
            success: true,
            entry_id: format!("BT-{}", Utc::now().timestamp_millis()),
        })
    }

    async fn project_hours(
        &self,
        _tenant: TenantId,
        _project_id: &str,
    ) -> Result<f64, AdapterError> {
        Ok(24.5)
    }
}

/// BigTime REST client authenticated with a firm-scoped API token.
pub struct BigTimeTracker {
    http: reqwest::Client,
    base_url: String,
    firm_id: String,
    api_token: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct BigTimeEntryBody<'a> {
    dt: String,
    hours_in: f64,
    notes: &'a str,
    staff_link_value: &'a str,
    staff_link_type: u8,
    projectsid: i64,
}

#[derive(Debug, Deserialize)]
struct BigTimeEntryResponse {
    #[serde(rename = "TimeSID")]
    time_sid: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct BigTimeProject {
    #[serde(rename = "InputHours", default)]
    input_hours: f64,
}

const STAFF_LINK_TYPE: u8 = 3;

impl BigTimeTracker {
    pub fn from_settings(settings: &BigTimeSettings, http: reqwest::Client) -> Self {
        Self {
            http,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            firm_id: settings.firm_id.clone(),
            api_token: settings.api_token.clone(),
        }
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        self.http
            .request(method, format!("{}{}", self.base_url, path))
            .header("X-Auth-ApiToken", &self.api_token)
            .header("X-Auth-Realm", &self.firm_id)
    }

    async fn fetch_project_hours(&self, project_id: &str) -> Result<f64, AdapterError> {
        let project: BigTimeProject = self
            .request(reqwest::Method::GET, &format!("/project/{project_id}"))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(project.input_hours)
    }
}

fn entry_body(entry: &TimeEntry) -> Result<BigTimeEntryBody<'_>, AdapterError> {
    let projectsid = entry.project_id.trim().parse::<i64>().map_err(|_| {
        AdapterError::InvalidRequest(format!(
            "BigTime project id '{}' is not numeric",
            entry.project_id
        ))
    })?;
    Ok(BigTimeEntryBody {
        dt: entry.date.format("%Y-%m-%d").to_string(),
        hours_in: entry.hours,
        notes: entry.note.as_deref().unwrap_or_default(),
        staff_link_value: &entry.user_id,
        staff_link_type: STAFF_LINK_TYPE,
        projectsid,
    })
}

impl Debug for BigTimeTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BigTimeTracker")
            .field("base_url", &self.base_url)
            .field("firm_id", &self.firm_id)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl TimeTracker for BigTimeTracker {
    async fn log_time(
        &self,
        tenant: TenantId,
        entry: TimeEntry,
    ) -> Result<TimeEntryReceipt, AdapterError> {
        let body = entry_body(&entry)?;
        let response: BigTimeEntryResponse = self
            .request(reqwest::Method::POST, "/time")
            .json(&body)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let entry_id = match response.time_sid {
            serde_json::Value::String(value) => value,
            other => other.to_string(),
        };
        info!(%tenant, project = %entry.project_id, entry_id, "time logged in bigtime");
        Ok(TimeEntryReceipt {
            success: true,
            entry_id,
        })
    }

    async fn project_hours(
        &self,
        tenant: TenantId,
        project_id: &str,
    ) -> Result<f64, AdapterError> {
        match self.fetch_project_hours(project_id).await {
            Ok(hours) => Ok(hours),
            Err(err) => {
                warn!(%tenant, project_id, error = %err, "bigtime project lookup failed");
                Ok(0.0)
            }
        }
    }
}
