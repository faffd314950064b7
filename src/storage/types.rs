//! Storage types

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Opaque reference to the original PDF bytes in the blob store.
///
/// Depending on the backend this is a URL, an object key or an in-memory token.
/// The pipeline never interprets it; only the backend that issued it does.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentHandle(String);

impl DocumentHandle {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DocumentHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DocumentHandle {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for DocumentHandle {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Blob store errors
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Object not found: {0}")]
    NotFound(String),

    #[error("Blob store returned status {status} for {handle}")]
    Status { status: u16, handle: String },

    #[error("Blob store request timed out after {0} seconds")]
    Timeout(u64),

    #[error("Blob store connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Upload is not configured for this backend")]
    UploadUnavailable,

    #[error("S3 SDK error: {0}")]
    SdkError(String),
}

pub type StorageResult<T> = std::result::Result<T, StorageError>;

/// Prefix a filename with a random token so handles cannot be guessed.
pub(crate) fn unguessable_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_' { c } else { '_' })
        .collect();
    let cleaned = if cleaned.is_empty() { "document.pdf".to_string() } else { cleaned };
    format!("{}-{}", uuid::Uuid::new_v4().simple(), cleaned)
}
