use async_trait::async_trait;
use axum::body::Bytes;
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;
use url::Url;

use crate::config::{BackendConfig, UploadConfig};
use crate::storage::{ObjectStorage, StorageError};

const LIST_PAGE_SIZE: usize = 100;

#[derive(Debug, Serialize)]
struct ListRequest<'a> {
    prefix: &'a str,
    limit: usize,
    offset: usize,
    #[serde(rename = "sortBy")]
    sort_by: SortBy,
}

#[derive(Debug, Serialize)]
struct SortBy {
    column: &'static str,
    order: &'static str,
}

#[derive(Debug, Deserialize)]
struct ListEntry {
    name: String,
    // Folders come back without an object id
    id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SignResponse {
    #[serde(rename = "signedURL")]
    signed_url: String,
}

/// Storage REST API of the hosted platform, authenticated with the service
/// role key.
pub struct SupabaseStorage {
    client: Client,
    base_url: Url,
    bucket: String,
    service_key: String,
}

impl SupabaseStorage {
    pub fn new(backend: &BackendConfig, upload: &UploadConfig) -> Result<Self, StorageError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(backend.http_timeout_secs))
            .build()?;
        let base_url = Url::parse(&backend.url).map_err(|e| StorageError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            base_url,
            bucket: upload.bucket.clone(),
            service_key: backend.service_role_key.clone(),
        })
    }

    /// `{base}/storage/v1/{action...}/{bucket}/{path...}` with each segment
    /// percent-encoded.
    fn endpoint(&self, action: &[&str], path: Option<&str>) -> Result<Url, StorageError> {
        let mut url = self.base_url.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| StorageError::Transport("storage base URL cannot have a path".to_string()))?;
            segments.pop_if_empty().extend(["storage", "v1"]).extend(action).push(&self.bucket);
            if let Some(path) = path {
                segments.extend(path.split('/').filter(|s| !s.is_empty()));
            }
        }
        Ok(url)
    }

    fn authorized(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        request
            .bearer_auth(&self.service_key)
            .header("apikey", &self.service_key)
    }

    async fn check(response: Response, path: &str) -> Result<Response, StorageError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let message = response.text().await.unwrap_or_default();
        if status.as_u16() == 409 || message.contains("Duplicate") {
            return Err(StorageError::AlreadyExists(path.to_string()));
        }
        if status.as_u16() == 404 {
            return Err(StorageError::NotFound(path.to_string()));
        }
        Err(StorageError::Rejected { status: status.as_u16(), message })
    }

    async fn list_level(&self, prefix: &str) -> Result<Vec<ListEntry>, StorageError> {
        let url = self.endpoint(&["object", "list"], None)?;
        let mut entries = Vec::new();
        let mut offset = 0;

        loop {
            let body = ListRequest {
                prefix,
                limit: LIST_PAGE_SIZE,
                offset,
                sort_by: SortBy { column: "name", order: "asc" },
            };
            let response = self.authorized(self.client.post(url.clone())).json(&body).send().await?;
            let page: Vec<ListEntry> = Self::check(response, prefix).await?.json().await?;
            let fetched = page.len();
            entries.extend(page);
            if fetched < LIST_PAGE_SIZE {
                break;
            }
            offset += fetched;
        }

        Ok(entries)
    }
}

#[async_trait]
impl ObjectStorage for SupabaseStorage {
    async fn upload(&self, path: &str, bytes: Bytes, content_type: &str) -> Result<(), StorageError> {
        let url = self.endpoint(&["object"], Some(path))?;
        let response = self
            .authorized(self.client.post(url))
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .header("x-upsert", "false")
            .body(bytes)
            .send()
            .await?;
        Self::check(response, path).await?;
        Ok(())
    }

    async fn signed_url(&self, path: &str, ttl_secs: u64) -> Result<String, StorageError> {
        let url = self.endpoint(&["object", "sign"], Some(path))?;
        let response = self
            .authorized(self.client.post(url))
            .json(&json!({ "expiresIn": ttl_secs }))
            .send()
            .await?;
        let signed: SignResponse = Self::check(response, path).await?.json().await?;

        // The API answers with a path relative to /storage/v1
        Ok(format!(
            "{}/storage/v1{}",
            self.base_url.as_str().trim_end_matches('/'),
            signed.signed_url
        ))
    }

    async fn list(&self, prefix: &str) -> Result<Vec<String>, StorageError> {
        let mut files = Vec::new();
        let mut pending = vec![prefix.trim_end_matches('/').to_string()];

        while let Some(folder) = pending.pop() {
            for entry in self.list_level(&folder).await? {
                let full = format!("{}/{}", folder, entry.name);
                if entry.id.is_some() {
                    files.push(full);
                } else {
                    pending.push(full);
                }
            }
        }

        Ok(files)
    }

    async fn remove(&self, paths: &[String]) -> Result<(), StorageError> {
        if paths.is_empty() {
            return Ok(());
        }
        let url = self.endpoint(&["object"], None)?;
        let response = self
            .authorized(self.client.delete(url))
            .json(&json!({ "prefixes": paths }))
            .send()
            .await?;
        Self::check(response, &paths.join(", ")).await?;
        Ok(())
    }
}
