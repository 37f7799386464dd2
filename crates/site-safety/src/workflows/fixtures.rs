//! Seeded tenants shared by the workflow test suites.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::response::Response;
use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::domain::{
    Action, ActionId, ActionStatus, Client, ClientId, Contact, ContactId, Finding, FindingId,
    FindingStatus, Inspection, InspectionId, InspectionStatus, Project, ProjectId, ReportType,
    RiskType, Severity, Site, SiteId, Tenant, TenantId, User, UserId, UserRole,
};
use crate::http::{TENANT_HEADER, USER_HEADER};
use crate::integrations::{
    AdapterError, DocumentStorage, EmailMessage, EmailReceipt, EmailSender, FolderEntry,
    Integrations, TimeEntry, TimeEntryReceipt, TimeTracker, UploadReceipt,
};
use crate::persistence::{ActionQuery, MemoryGateway, PersistenceGateway};

#[derive(Debug, Default)]
pub(crate) struct RecordingEmail {
    pub fail: bool,
    pub sent: Mutex<Vec<EmailMessage>>,
}

impl RecordingEmail {
    pub fn messages(&self) -> Vec<EmailMessage> {
        self.sent.lock().expect("lock").clone()
    }
}

#[async_trait]
impl EmailSender for RecordingEmail {
    async fn send(
        &self,
        _tenant: TenantId,
        message: EmailMessage,
    ) -> Result<EmailReceipt, AdapterError> {
        self.sent.lock().expect("lock").push(message);
        if self.fail {
            return Err(AdapterError::Transport("smtp relay refused".to_string()));
        }
        Ok(EmailReceipt {
            success: true,
            message_id: "EMAIL-test".to_string(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RecordedUpload {
    pub folder: Option<String>,
    pub file_name: String,
}

#[derive(Debug, Default)]
pub(crate) struct RecordingStorage {
    pub fail: bool,
    pub uploads: Mutex<Vec<RecordedUpload>>,
}

impl RecordingStorage {
    pub fn uploads(&self) -> Vec<RecordedUpload> {
        self.uploads.lock().expect("lock").clone()
    }
}

#[async_trait]
impl DocumentStorage for RecordingStorage {
    async fn upload(
        &self,
        _tenant: TenantId,
        folder_id: Option<&str>,
        file_name: &str,
        _content: Vec<u8>,
    ) -> Result<UploadReceipt, AdapterError> {
        self.uploads.lock().expect("lock").push(RecordedUpload {
            folder: folder_id.map(str::to_string),
            file_name: file_name.to_string(),
        });
        if self.fail {
            return Err(AdapterError::Rejected {
                status: 503,
                detail: "graph unavailable".to_string(),
            });
        }
        Ok(UploadReceipt {
            success: true,
            file_url: format!("https://files.test/{file_name}"),
        })
    }

    async fn list_folder(
        &self,
        _tenant: TenantId,
        _folder_id: &str,
    ) -> Result<Vec<FolderEntry>, AdapterError> {
        Ok(Vec::new())
    }
}

#[derive(Debug, Default)]
pub(crate) struct RecordingTimeTracker {
    pub fail: bool,
    pub stall: Option<Duration>,
    pub entries: Mutex<Vec<TimeEntry>>,
}

impl RecordingTimeTracker {
    pub fn entries(&self) -> Vec<TimeEntry> {
        self.entries.lock().expect("lock").clone()
    }
}

#[async_trait]
impl TimeTracker for RecordingTimeTracker {
    async fn log_time(
        &self,
        _tenant: TenantId,
        entry: TimeEntry,
    ) -> Result<TimeEntryReceipt, AdapterError> {
        self.entries.lock().expect("lock").push(entry);
        if let Some(stall) = self.stall {
            tokio::time::sleep(stall).await;
        }
        if self.fail {
            return Err(AdapterError::Transport("bigtime unreachable".to_string()));
        }
        Ok(TimeEntryReceipt {
            success: true,
            entry_id: "BT-test".to_string(),
        })
    }

    async fn project_hours(
        &self,
        _tenant: TenantId,
        _project_id: &str,
    ) -> Result<f64, AdapterError> {
        Ok(0.0)
    }
}

#[derive(Debug, Default)]
pub(crate) struct Recorders {
    pub email: Arc<RecordingEmail>,
    pub storage: Arc<RecordingStorage>,
    pub time: Arc<RecordingTimeTracker>,
}

impl Recorders {
    pub fn failing() -> Self {
        Self {
            email: Arc::new(RecordingEmail {
                fail: true,
                ..RecordingEmail::default()
            }),
            storage: Arc::new(RecordingStorage {
                fail: true,
                ..RecordingStorage::default()
            }),
            time: Arc::new(RecordingTimeTracker {
                fail: true,
                ..RecordingTimeTracker::default()
            }),
        }
    }

    pub fn integrations(&self) -> Integrations {
        Integrations {
            email: self.email.clone(),
            storage: self.storage.clone(),
            time_tracker: self.time.clone(),
        }
    }
}

pub(crate) struct Fixture<G> {
    pub gateway: Arc<G>,
    pub tenant: TenantId,
    pub user: UserId,
    pub client: ClientId,
    pub site: SiteId,
    pub project: ProjectId,
    pub inspection: InspectionId,
}

/// Tenant with one submitter, one client/site/project, and a Draft inspection.
pub(crate) fn seeded(folder: Option<&str>) -> Fixture<MemoryGateway> {
    let gateway = Arc::new(MemoryGateway::new());
    let tenant = TenantId::new();
    gateway
        .insert_tenant(Tenant {
            id: tenant,
            name: "Great Lakes Environmental".to_string(),
        })
        .expect("tenant");
    let user = gateway
        .insert_user(User {
            id: UserId::new(),
            tenant_id: tenant,
            email: format!("inspector-{}@greatlakes.com", tenant),
            role: UserRole::Staff,
        })
        .expect("user")
        .id;
    let client = gateway
        .insert_client(Client {
            id: ClientId::new(),
            tenant_id: tenant,
            name: "Acme Construction".to_string(),
            weekly_summary_enabled: true,
        })
        .expect("client")
        .id;
    let site = gateway
        .insert_site(Site {
            id: SiteId::new(),
            tenant_id: tenant,
            client_id: client,
            name: "Downtown Tower Project".to_string(),
            address: None,
        })
        .expect("site")
        .id;
    let project = gateway
        .insert_project(Project {
            id: ProjectId::new(),
            tenant_id: tenant,
            client_id: client,
            bigtime_project_id: Some("1042".to_string()),
            sharepoint_folder_id: folder.map(str::to_string),
        })
        .expect("project")
        .id;
    let inspection = gateway
        .insert_inspection(Inspection {
            id: InspectionId::new(),
            tenant_id: tenant,
            work_item_id: None,
            project_id: project,
            site_id: site,
            report_type: ReportType::StandardPdf,
            status: InspectionStatus::Draft,
            submitted_at: None,
            created_at: Utc::now(),
        })
        .expect("inspection")
        .id;

    Fixture {
        gateway,
        tenant,
        user,
        client,
        site,
        project,
        inspection,
    }
}

impl<G: PersistenceGateway> Fixture<G> {
    pub fn add_finding(&self, category: &str, status: FindingStatus, risk: RiskType) -> FindingId {
        self.gateway
            .insert_finding(Finding {
                id: FindingId::new(),
                tenant_id: self.tenant,
                inspection_id: self.inspection,
                category: category.to_string(),
                observation: None,
                comment: None,
                status,
                severity: Severity::Medium,
                risk_type: risk,
                regulatory_ref: None,
                corrected_on_site: false,
            })
            .expect("finding")
            .id
    }

    /// Open action due at `due_date`, backed by a fresh `Issue` finding.
    pub fn add_action(&self, description: &str, due_date: DateTime<Utc>) -> ActionId {
        let finding = self.add_finding(description, FindingStatus::Issue, RiskType::Process);
        self.gateway
            .insert_action(Action {
                id: ActionId::new(),
                tenant_id: self.tenant,
                client_id: self.client,
                site_id: self.site,
                inspection_id: self.inspection,
                finding_id: finding,
                description: description.to_string(),
                responsible_name: "TBD".to_string(),
                responsible_email: None,
                due_date,
                status: ActionStatus::Open,
                closed_by: None,
                closed_at: None,
                created_at: Utc::now(),
            })
            .expect("action")
            .id
    }

    pub fn add_contact(&self, name: &str, email: &str, receives_reports: bool) -> ContactId {
        self.gateway
            .insert_contact(Contact {
                id: ContactId::new(),
                tenant_id: self.tenant,
                client_id: self.client,
                name: name.to_string(),
                email: email.to_string(),
                receive_inspections_default: receives_reports,
            })
            .expect("contact")
            .id
    }

    pub fn stored_inspection(&self) -> Inspection {
        self.gateway
            .inspection(self.tenant, self.inspection)
            .expect("lookup")
            .expect("inspection present")
    }

    pub fn actions(&self) -> Vec<Action> {
        self.gateway
            .actions(self.tenant, ActionQuery::default())
            .expect("actions")
    }

    /// Re-wraps the seeded gateway, keeping the seeded ids.
    pub fn map_gateway<H>(self, wrap: impl FnOnce(Arc<G>) -> H) -> Fixture<H> {
        Fixture {
            gateway: Arc::new(wrap(self.gateway)),
            tenant: self.tenant,
            user: self.user,
            client: self.client,
            site: self.site,
            project: self.project,
            inspection: self.inspection,
        }
    }
}

impl<G> Fixture<G> {
    /// Request carrying the seeded tenant and user headers.
    pub fn request(&self, method: Method, uri: &str, body: Option<Value>) -> Request<Body> {
        let builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(TENANT_HEADER, self.tenant.to_string())
            .header(USER_HEADER, self.user.to_string());
        match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(serde_json::to_vec(&body).expect("json body")))
                .expect("request builds"),
            None => builder.body(Body::empty()).expect("request builds"),
        }
    }
}

pub(crate) async fn read_json_body(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body collects");
    serde_json::from_slice(&bytes).expect("valid json")
}

pub(crate) fn assert_status(response: &Response, expected: StatusCode) {
    assert_eq!(response.status(), expected, "unexpected response status");
}
