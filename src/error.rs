//! Page request errors
//!
//! [`PageError`] is what a page request fails with. Each variant maps to one
//! [`ErrorKind`], and each kind to one HTTP status.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::document::DocumentError;

/// Failure categories exposed to callers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ErrorKind {
    InvalidPageNumber,
    PageOutOfRange,
    DocumentNotFound,
    DocumentFetchFailed,
    ParseFailed,
    RenderFailed,
    Internal,
}

impl ErrorKind {
    pub fn status_code(self) -> StatusCode {
        match self {
            ErrorKind::InvalidPageNumber | ErrorKind::PageOutOfRange => StatusCode::BAD_REQUEST,
            ErrorKind::DocumentNotFound => StatusCode::NOT_FOUND,
            ErrorKind::DocumentFetchFailed
            | ErrorKind::ParseFailed
            | ErrorKind::RenderFailed
            | ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to show any client
    fn public_message(self) -> &'static str {
        match self {
            ErrorKind::InvalidPageNumber => "Invalid page number",
            ErrorKind::PageOutOfRange => "Page out of range",
            ErrorKind::DocumentNotFound => "Document not found",
            ErrorKind::DocumentFetchFailed => "Failed to fetch document",
            ErrorKind::ParseFailed => "Failed to read document",
            ErrorKind::RenderFailed => "Failed to render page",
            ErrorKind::Internal => "Internal server error",
        }
    }
}

/// Page pipeline error type
#[derive(Debug, Error)]
pub enum PageError {
    #[error("Invalid page number: {0:?}")]
    InvalidPageNumber(String),

    #[error("{0}")]
    PageOutOfRange(String),

    #[error("Document not found: {0}")]
    DocumentNotFound(String),

    #[error("Document fetch failed: {0}")]
    DocumentFetchFailed(String),

    #[error("Document parse failed: {0}")]
    ParseFailed(String),

    #[error("Render failed: {0}")]
    RenderFailed(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type PageResult<T> = std::result::Result<T, PageError>;

impl PageError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            PageError::InvalidPageNumber(_) => ErrorKind::InvalidPageNumber,
            PageError::PageOutOfRange(_) => ErrorKind::PageOutOfRange,
            PageError::DocumentNotFound(_) => ErrorKind::DocumentNotFound,
            PageError::DocumentFetchFailed(_) => ErrorKind::DocumentFetchFailed,
            PageError::ParseFailed(_) => ErrorKind::ParseFailed,
            PageError::RenderFailed(_) => ErrorKind::RenderFailed,
            PageError::Internal(_) => ErrorKind::Internal,
        }
    }

    pub fn status_code(&self) -> StatusCode {
        self.kind().status_code()
    }

    /// Client-facing message; server-side failures never leak their cause here
    pub fn message(&self) -> String {
        match self.kind() {
            ErrorKind::InvalidPageNumber | ErrorKind::PageOutOfRange | ErrorKind::DocumentNotFound => {
                self.to_string()
            }
            kind => kind.public_message().to_string(),
        }
    }
}

/// Mapping used while loading a document
///
/// A timeout here can only be the parse step. Page range errors cannot occur
/// while loading and are treated as internal.
impl From<DocumentError> for PageError {
    fn from(err: DocumentError) -> Self {
        match err {
            DocumentError::NotFound(handle) => PageError::DocumentNotFound(handle),
            DocumentError::Fetch(msg) => PageError::DocumentFetchFailed(msg),
            DocumentError::Parse(msg) => PageError::ParseFailed(msg),
            e @ DocumentError::Timeout(_) => PageError::ParseFailed(e.to_string()),
            e @ (DocumentError::Render(_) | DocumentError::Image(_)) => PageError::RenderFailed(e.to_string()),
            e @ (DocumentError::PageOutOfRange { .. } | DocumentError::Join(_)) => {
                PageError::Internal(e.to_string())
            }
        }
    }
}

impl PageError {
    /// Mapping used once the document is loaded and its page is being drawn
    ///
    /// The declared page count was already checked (or was unknown), so a range
    /// error from the engine is a render failure, as is a render timeout.
    pub fn from_render(err: DocumentError) -> Self {
        match err {
            e @ (DocumentError::PageOutOfRange { .. }
            | DocumentError::Render(_)
            | DocumentError::Image(_)
            | DocumentError::Timeout(_)) => PageError::RenderFailed(e.to_string()),
            other => other.into(),
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorKind,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl IntoResponse for PageError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!("Page request failed: {}", self);
        }

        let body = ErrorBody {
            error: self.kind(),
            message: self.message(),
            // Causes are only exposed in development builds
            details: cfg!(debug_assertions).then(|| self.to_string()),
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(PageError::InvalidPageNumber("x".into()).status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(PageError::PageOutOfRange("p".into()).status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(PageError::DocumentNotFound("h".into()).status_code(), StatusCode::NOT_FOUND);
        for err in [
            PageError::DocumentFetchFailed("f".into()),
            PageError::ParseFailed("p".into()),
            PageError::RenderFailed("r".into()),
            PageError::Internal("i".into()),
        ] {
            assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        }
    }

    #[test]
    fn test_document_errors_map_to_kinds() {
        let cases = [
            (DocumentError::NotFound("h".into()), ErrorKind::DocumentNotFound),
            (DocumentError::Fetch("503".into()), ErrorKind::DocumentFetchFailed),
            (DocumentError::Parse("bad xref".into()), ErrorKind::ParseFailed),
            (DocumentError::Timeout(30), ErrorKind::ParseFailed),
            (DocumentError::Render("boom".into()), ErrorKind::RenderFailed),
            (DocumentError::Join("panic".into()), ErrorKind::Internal),
        ];
        for (err, kind) in cases {
            assert_eq!(PageError::from(err).kind(), kind);
        }
    }

    #[test]
    fn test_render_stage_range_error_is_render_failure() {
        let err = PageError::from_render(DocumentError::PageOutOfRange { page: 500, total: 3 });
        assert_eq!(err.kind(), ErrorKind::RenderFailed);

        let err = PageError::from_render(DocumentError::Timeout(30));
        assert_eq!(err.kind(), ErrorKind::RenderFailed);

        let err = PageError::from_render(DocumentError::Join("cancelled".into()));
        assert_eq!(err.kind(), ErrorKind::Internal);
    }

    #[test]
    fn test_server_errors_hide_cause_in_message() {
        let err = PageError::Internal("pointer at 0xdeadbeef".into());
        assert_eq!(err.message(), "Internal server error");

        let err = PageError::DocumentFetchFailed("https://blob.example/secret.pdf: 403".into());
        assert!(!err.message().contains("secret"));

        let err = PageError::InvalidPageNumber("abc".into());
        assert!(err.message().contains("abc"));
    }
}
