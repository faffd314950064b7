//! Blob storage for original PDF bytes
//!
//! Supports plain HTTP object URLs (Vercel Blob style), S3-compatible
//! buckets (MinIO, Cloudflare R2, AWS S3) and an in-process store.
//!
//! The page pipeline only ever calls [`BlobStore::fetch`]; `upload`
//! belongs to the ingestion path.

mod http_client;
mod memory;
mod s3_client;
mod types;

use async_trait::async_trait;

pub use http_client::HttpBlobStore;
pub use memory::MemoryBlobStore;
pub use s3_client::S3BlobStore;
pub use types::{DocumentHandle, StorageError, StorageResult};

/// Durable object storage for uploaded documents
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store raw bytes under a fresh, unguessable name and return its handle
    async fn upload(&self, data: Vec<u8>, name: &str) -> StorageResult<DocumentHandle>;

    /// Fetch the bytes behind a handle
    async fn fetch(&self, handle: &DocumentHandle) -> StorageResult<Vec<u8>>;
}
