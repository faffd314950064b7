//! Document error types
//!
//! Failures while fetching, parsing or rendering a single document.

use thiserror::Error;

use crate::storage::StorageError;

/// Document pipeline error type
#[derive(Debug, Error)]
pub enum DocumentError {
    /// Blob store has no object behind the handle
    #[error("Document not found: {0}")]
    NotFound(String),

    /// Blob store unreachable, non-success status or timeout
    #[error("Fetch error: {0}")]
    Fetch(String),

    /// Bytes are not a well-formed PDF
    #[error("Parse error: {0}")]
    Parse(String),

    /// Page number outside the parsed document
    #[error("Page {page} not found (document has {total} pages)")]
    PageOutOfRange { page: u32, total: usize },

    /// Drawing a specific page failed
    #[error("Render error: {0}")]
    Render(String),

    /// Image encoding error
    #[error("Image error: {0}")]
    Image(String),

    /// Timeout error
    #[error("Operation timed out after {0} seconds")]
    Timeout(u64),

    /// Blocking task panicked or was cancelled
    #[error("Task join error: {0}")]
    Join(String),
}

/// Result type alias for document operations
pub type DocumentResult<T> = std::result::Result<T, DocumentError>;

impl From<StorageError> for DocumentError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound(key) => DocumentError::NotFound(key),
            other => DocumentError::Fetch(other.to_string()),
        }
    }
}

impl From<mupdf::Error> for DocumentError {
    fn from(err: mupdf::Error) -> Self {
        DocumentError::Render(err.to_string())
    }
}

impl From<tokio::task::JoinError> for DocumentError {
    fn from(err: tokio::task::JoinError) -> Self {
        DocumentError::Join(err.to_string())
    }
}
