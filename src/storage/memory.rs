//! In-process blob store for tests and local development

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;

use super::types::{unguessable_name, DocumentHandle, StorageError, StorageResult};
use super::BlobStore;

const SCHEME: &str = "mem://";

/// Blob store backed by a process-local map
#[derive(Clone, Default)]
pub struct MemoryBlobStore {
    objects: Arc<RwLock<HashMap<String, Arc<Vec<u8>>>>>,
    fetches: Arc<AtomicUsize>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert bytes under a caller-chosen handle
    pub fn insert(&self, handle: impl Into<String>, data: Vec<u8>) -> DocumentHandle {
        let handle = handle.into();
        self.objects.write().insert(handle.clone(), Arc::new(data));
        DocumentHandle::new(handle)
    }

    /// Number of `fetch` calls served so far, successful or not
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    pub fn len(&self) -> usize {
        self.objects.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.read().is_empty()
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn upload(&self, data: Vec<u8>, name: &str) -> StorageResult<DocumentHandle> {
        let handle = format!("{}{}", SCHEME, unguessable_name(name));
        Ok(self.insert(handle, data))
    }

    async fn fetch(&self, handle: &DocumentHandle) -> StorageResult<Vec<u8>> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.objects
            .read()
            .get(handle.as_str())
            .map(|data| data.as_ref().clone())
            .ok_or_else(|| StorageError::NotFound(handle.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_upload_then_fetch() {
        let store = MemoryBlobStore::new();
        let handle = store.upload(vec![1, 2, 3], "notes.pdf").await.unwrap();

        assert!(handle.as_str().starts_with("mem://"));
        assert!(handle.as_str().ends_with("-notes.pdf"));
        assert_eq!(store.fetch(&handle).await.unwrap(), vec![1, 2, 3]);
        assert_eq!(store.fetch_count(), 1);
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_fetch_missing_is_not_found() {
        let store = MemoryBlobStore::new();
        let err = store.fetch(&DocumentHandle::from("mem://nope")).await.unwrap_err();
        assert!(matches!(err, StorageError::NotFound(_)));
        assert_eq!(store.fetch_count(), 1);
    }
}
