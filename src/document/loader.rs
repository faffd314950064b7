//! Blob-backed document loader
//!
//! Fetches the original bytes for a handle and parses them. Pure mapping
//! from bytes to structure: no caching and no global state here.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::timeout;

use crate::storage::{BlobStore, DocumentHandle};

use super::error::{DocumentError, DocumentResult};
use super::traits::{DocumentLoader, DocumentModel, PdfEngine};

/// Loads documents from a [`BlobStore`] through a [`PdfEngine`]
pub struct BlobDocumentLoader {
    store: Arc<dyn BlobStore>,
    engine: Arc<dyn PdfEngine>,
    fetch_timeout: Duration,
    parse_timeout: Duration,
}

impl BlobDocumentLoader {
    pub fn new(
        store: Arc<dyn BlobStore>,
        engine: Arc<dyn PdfEngine>,
        fetch_timeout: Duration,
        parse_timeout: Duration,
    ) -> Self {
        Self {
            store,
            engine,
            fetch_timeout,
            parse_timeout,
        }
    }
}

#[async_trait]
impl DocumentLoader for BlobDocumentLoader {
    async fn load(&self, handle: &DocumentHandle) -> DocumentResult<Arc<dyn DocumentModel>> {
        let data = timeout(self.fetch_timeout, self.store.fetch(handle))
            .await
            .map_err(|_| {
                DocumentError::Fetch(format!(
                    "Fetching {} timed out after {} seconds",
                    handle,
                    self.fetch_timeout.as_secs()
                ))
            })??;

        tracing::debug!("Fetched {} bytes for {}", data.len(), handle);

        // The blocking thread may keep running past the timeout, but the
        // request still gets an answer.
        let engine = self.engine.clone();
        let parsed = timeout(
            self.parse_timeout,
            tokio::task::spawn_blocking(move || engine.parse(data)),
        )
        .await
        .map_err(|_| DocumentError::Timeout(self.parse_timeout.as_secs()))???;

        tracing::debug!("Parsed {} ({} pages)", handle, parsed.page_count());
        Ok(parsed)
    }
}
