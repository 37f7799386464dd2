use std::fmt::Debug;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::info;

use super::AdapterError;
use crate::config::SharePointSettings;
use crate::domain::TenantId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadReceipt {
    pub success: bool,
    pub file_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FolderEntry {
    pub name: String,
    pub url: String,
}

/// Document library that receives finalized inspection reports.
#[async_trait]
pub trait DocumentStorage: Send + Sync + Debug {
    /// Uploads into `folder_id`, or into the catch-all folder when `None`.
    async fn upload(
        &self,
        tenant: TenantId,
        folder_id: Option<&str>,
        file_name: &str,
        content: Vec<u8>,
    ) -> Result<UploadReceipt, AdapterError>;

    async fn list_folder(
        &self,
        tenant: TenantId,
        folder_id: &str,
    ) -> Result<Vec<FolderEntry>, AdapterError>;
}

#[derive(Debug, Clone)]
pub struct StubDocumentStorage {
    catch_all_folder: String,
}

impl StubDocumentStorage {
    pub fn new(catch_all_folder: impl Into<String>) -> Self {
        Self {
            catch_all_folder: catch_all_folder.into(),
        }
    }
}

#[async_trait]
impl DocumentStorage for StubDocumentStorage {
    async fn upload(
        &self,
        tenant: TenantId,
        folder_id: Option<&str>,
        file_name: &str,
        content: Vec<u8>,
    ) -> Result<UploadReceipt, AdapterError> {
        let folder = folder_id.unwrap_or(self.catch_all_folder.as_str());
        info!(%tenant, folder, file_name, bytes = content.len(), "stub upload accepted");
        Ok(UploadReceipt {
            success: true,
            file_url: format!("https://sharepoint.stub/{folder}/{file_name}"),
        })
    }

    async fn list_folder(
        &self,
        _tenant: TenantId,
        _folder_id: &str,
    ) -> Result<Vec<FolderEntry>, AdapterError> {
        Ok(vec![FolderEntry {
            name: "example-report.pdf".to_string(),
            url: "https://sharepoint.stub/example-report.pdf".to_string(),
        }])
    }
}

/// SharePoint document library reached through Microsoft Graph drive items.
pub struct SharePointStorage {
    http: reqwest::Client,
    graph_url: String,
    drive_id: String,
    access_token: String,
    catch_all_folder: String,
}

#[derive(Debug, Deserialize)]
struct DriveItem {
    name: String,
    #[serde(rename = "webUrl")]
    web_url: String,
}

#[derive(Debug, Deserialize)]
struct DriveItemPage {
    value: Vec<DriveItem>,
}

impl SharePointStorage {
    pub fn from_settings(
        settings: &SharePointSettings,
        catch_all_folder: String,
        http: reqwest::Client,
    ) -> Self {
        Self {
            http,
            graph_url: settings.graph_url.trim_end_matches('/').to_string(),
            drive_id: settings.drive_id.clone(),
            access_token: settings.access_token.clone(),
            catch_all_folder,
        }
    }

    /// Folder ids address existing drive items; the catch-all folder is addressed by path.
    fn upload_url(&self, folder_id: Option<&str>, file_name: &str) -> String {
        match folder_id {
            Some(folder) => format!(
                "{}/drives/{}/items/{}:/{}:/content",
                self.graph_url, self.drive_id, folder, file_name
            ),
            None => format!(
                "{}/drives/{}/root:/{}/{}:/content",
                self.graph_url, self.drive_id, self.catch_all_folder, file_name
            ),
        }
    }
}

impl Debug for SharePointStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharePointStorage")
            .field("graph_url", &self.graph_url)
            .field("drive_id", &self.drive_id)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl DocumentStorage for SharePointStorage {
    async fn upload(
        &self,
        tenant: TenantId,
        folder_id: Option<&str>,
        file_name: &str,
        content: Vec<u8>,
    ) -> Result<UploadReceipt, AdapterError> {
        let item: DriveItem = self
            .http
            .put(self.upload_url(folder_id, file_name))
            .bearer_auth(&self.access_token)
            .header(
                reqwest::header::CONTENT_TYPE,
                mime::APPLICATION_OCTET_STREAM.as_ref(),
            )
            .body(content)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        info!(%tenant, file_name, url = %item.web_url, "document uploaded to sharepoint");
        Ok(UploadReceipt {
            success: true,
            file_url: item.web_url,
        })
    }

    async fn list_folder(
        &self,
        _tenant: TenantId,
        folder_id: &str,
    ) -> Result<Vec<FolderEntry>, AdapterError> {
        let url = format!(
            "{}/drives/{}/items/{}/children",
            self.graph_url, self.drive_id, folder_id
        );
        let page: DriveItemPage = self
            .http
            .get(url)
            .bearer_auth(&self.access_token)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(page
            .value
            .into_iter()
            .map(|item| FolderEntry {
                name: item.name,
                url: item.web_url,
            })
            .collect())
    }
}
