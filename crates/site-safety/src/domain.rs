//! Tenant-scoped records shared by the persistence gateway and the workflows.
//!
//! Every record carries the owning [`TenantId`]; the gateway refuses to resolve a record for any
//! other tenant, so the workflows never have to re-check ownership themselves.

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

macro_rules! record_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub Uuid);

        impl $name {
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }
    };
}

record_id!(
    /// Isolation boundary shared by every other record.
    TenantId
);
record_id!(UserId);
record_id!(ClientId);
record_id!(ContactId);
record_id!(SiteId);
record_id!(
    /// Internal id of a BigTime-linked project row (not the BigTime system id).
    ProjectId
);
record_id!(WorkItemId);
record_id!(InspectionId);
record_id!(FindingId);
record_id!(ActionId);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tenant {
    pub id: TenantId,
    pub name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UserRole {
    Admin,
    Staff,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub tenant_id: TenantId,
    pub email: String,
    pub role: UserRole,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Client {
    pub id: ClientId,
    pub tenant_id: TenantId,
    pub name: String,
    pub weekly_summary_enabled: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contact {
    pub id: ContactId,
    pub tenant_id: TenantId,
    pub client_id: ClientId,
    pub name: String,
    pub email: String,
    /// Opt-in flag for inspection reports and the weekly digest.
    pub receive_inspections_default: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Site {
    pub id: SiteId,
    pub tenant_id: TenantId,
    pub client_id: ClientId,
    pub name: String,
    pub address: Option<String>,
}

/// Link between an inspection and a BigTime project owned by one client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: ProjectId,
    pub tenant_id: TenantId,
    pub client_id: ClientId,
    /// Project identifier inside BigTime, e.g. `BT-001`.
    pub bigtime_project_id: Option<String>,
    pub sharepoint_folder_id: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WorkItemKind {
    Inspection,
    Training,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkItem {
    pub id: WorkItemId,
    pub tenant_id: TenantId,
    pub client_id: ClientId,
    pub project_id: ProjectId,
    pub site_id: SiteId,
    pub kind: WorkItemKind,
    pub assigned_to: Option<UserId>,
    pub scheduled_on: Option<NaiveDate>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReportType {
    #[serde(rename = "StandardPDF")]
    StandardPdf,
    DraftWord,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InspectionStatus {
    Draft,
    Final,
}

impl InspectionStatus {
    pub fn label(&self) -> &'static str {
        match self {
            InspectionStatus::Draft => "Draft",
            InspectionStatus::Final => "Final",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Inspection {
    pub id: InspectionId,
    pub tenant_id: TenantId,
    pub work_item_id: Option<WorkItemId>,
    pub project_id: ProjectId,
    pub site_id: SiteId,
    pub report_type: ReportType,
    pub status: InspectionStatus,
    pub submitted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Inspection {
    pub fn is_final(&self) -> bool {
        self.status == InspectionStatus::Final
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FindingStatus {
    Issue,
    Positive,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Severity {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskType {
    #[serde(rename = "OSHA")]
    Osha,
    Behavioral,
    Equipment,
    Process,
}

impl RiskType {
    pub fn label(&self) -> &'static str {
        match self {
            RiskType::Osha => "OSHA",
            RiskType::Behavioral => "Behavioral",
            RiskType::Equipment => "Equipment",
            RiskType::Process => "Process",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Finding {
    pub id: FindingId,
    pub tenant_id: TenantId,
    pub inspection_id: InspectionId,
    pub category: String,
    pub observation: Option<String>,
    pub comment: Option<String>,
    pub status: FindingStatus,
    pub severity: Severity,
    pub risk_type: RiskType,
    /// Regulatory citation such as an OSHA standard number.
    pub regulatory_ref: Option<String>,
    pub corrected_on_site: bool,
}

impl Finding {
    pub fn is_issue(&self) -> bool {
        self.status == FindingStatus::Issue
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActionStatus {
    Open,
    Closed,
}

impl ActionStatus {
    pub fn label(&self) -> &'static str {
        match self {
            ActionStatus::Open => "Open",
            ActionStatus::Closed => "Closed",
        }
    }
}

/// Corrective task spawned from exactly one `Issue` finding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Action {
    pub id: ActionId,
    pub tenant_id: TenantId,
    pub client_id: ClientId,
    pub site_id: SiteId,
    pub inspection_id: InspectionId,
    pub finding_id: FindingId,
    pub description: String,
    pub responsible_name: String,
    pub responsible_email: Option<String>,
    pub due_date: DateTime<Utc>,
    pub status: ActionStatus,
    pub closed_by: Option<UserId>,
    pub closed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionAuditEntry {
    pub tenant_id: TenantId,
    pub action_id: ActionId,
    pub previous_status: ActionStatus,
    pub new_status: ActionStatus,
    pub changed_by: UserId,
    pub note: Option<String>,
    pub recorded_at: DateTime<Utc>,
}
