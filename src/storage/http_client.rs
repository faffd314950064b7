//! HTTP blob store
//!
//! Handles are absolute URLs. Fetches are plain GETs; uploads PUT the bytes
//! to a configured base URL.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};

use super::types::{unguessable_name, DocumentHandle, StorageError, StorageResult};
use super::BlobStore;

/// Blob store addressed by URL
#[derive(Clone)]
pub struct HttpBlobStore {
    client: Client,
    upload_url: Option<String>,
    token: Option<String>,
    timeout_secs: u64,
}

impl HttpBlobStore {
    /// Create a store; `upload_url` may be omitted for fetch-only deployments
    pub fn new(
        upload_url: Option<String>,
        token: Option<String>,
        timeout: Duration,
    ) -> StorageResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| StorageError::ConnectionFailed(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            upload_url: upload_url.map(|u| u.trim_end_matches('/').to_string()),
            token,
            timeout_secs: timeout.as_secs(),
        })
    }

    fn map_send_error(&self, e: reqwest::Error) -> StorageError {
        if e.is_timeout() {
            StorageError::Timeout(self.timeout_secs)
        } else {
            StorageError::ConnectionFailed(e.to_string())
        }
    }
}

#[async_trait]
impl BlobStore for HttpBlobStore {
    async fn upload(&self, data: Vec<u8>, name: &str) -> StorageResult<DocumentHandle> {
        let base = self.upload_url.as_ref().ok_or(StorageError::UploadUnavailable)?;
        let object_name = unguessable_name(name);
        let url = format!("{}/{}", base, urlencoding::encode(&object_name));

        let mut request = self
            .client
            .put(&url)
            .header(reqwest::header::CONTENT_TYPE, "application/pdf")
            .body(data);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(|e| self.map_send_error(e))?;
        let status = response.status();
        if !status.is_success() {
            return Err(StorageError::Status {
                status: status.as_u16(),
                handle: url,
            });
        }

        // Blob services usually answer with the canonical public URL
        let handle = response
            .json::<serde_json::Value>()
            .await
            .ok()
            .and_then(|body| body.get("url").and_then(|u| u.as_str()).map(str::to_string))
            .unwrap_or(url);

        tracing::debug!("Uploaded {} to {}", name, handle);
        Ok(DocumentHandle::new(handle))
    }

    async fn fetch(&self, handle: &DocumentHandle) -> StorageResult<Vec<u8>> {
        let mut request = self.client.get(handle.as_str());
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(|e| self.map_send_error(e))?;
        match response.status() {
            StatusCode::NOT_FOUND => Err(StorageError::NotFound(handle.to_string())),
            status if !status.is_success() => Err(StorageError::Status {
                status: status.as_u16(),
                handle: handle.to_string(),
            }),
            _ => {
                let bytes = response.bytes().await.map_err(|e| self.map_send_error(e))?;
                Ok(bytes.to_vec())
            }
        }
    }
}
