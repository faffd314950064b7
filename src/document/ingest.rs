//! Document ingestion
//!
//! Stores an uploaded PDF in the blob store and records how many pages it
//! has. The page count is best effort: a document MuPDF cannot count is still
//! accepted with a count of 0, which page requests treat as "unknown".

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::time::timeout;

use crate::storage::{BlobStore, DocumentHandle};

use super::error::{DocumentError, DocumentResult};
use super::traits::PdfEngine;

/// Result of an upload
#[derive(Debug, Clone, Serialize)]
pub struct IngestedDocument {
    pub handle: DocumentHandle,
    /// 0 when the page count could not be determined
    pub page_count: u32,
    pub size: usize,
}

pub struct DocumentIngest {
    store: Arc<dyn BlobStore>,
    engine: Arc<dyn PdfEngine>,
    parse_timeout: Duration,
}

impl DocumentIngest {
    pub fn new(store: Arc<dyn BlobStore>, engine: Arc<dyn PdfEngine>, parse_timeout: Duration) -> Self {
        Self {
            store,
            engine,
            parse_timeout,
        }
    }

    pub async fn ingest(&self, data: Vec<u8>, filename: &str) -> DocumentResult<IngestedDocument> {
        let size = data.len();
        let page_count = match self.read_page_count(data.clone()).await {
            Ok(count) => count,
            Err(e) => {
                tracing::warn!("Could not count pages of {}: {}", filename, e);
                0
            }
        };

        let handle = self.store.upload(data, filename).await?;
        tracing::info!("Ingested {} as {} ({} pages, {} bytes)", filename, handle, page_count, size);

        Ok(IngestedDocument {
            handle,
            page_count,
            size,
        })
    }

    async fn read_page_count(&self, data: Vec<u8>) -> DocumentResult<u32> {
        let engine = self.engine.clone();
        let doc = timeout(
            self.parse_timeout,
            tokio::task::spawn_blocking(move || engine.parse(data)),
        )
        .await
        .map_err(|_| DocumentError::Timeout(self.parse_timeout.as_secs()))???;

        Ok(u32::try_from(doc.page_count()).unwrap_or(u32::MAX))
    }
}
