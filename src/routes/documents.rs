//! Document upload endpoint
//!
//! `POST /api/v1/documents` with a multipart `file` field. Stores the bytes
//! in the blob store and returns the handle plus the page count to record
//! in the catalog.

use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;

use crate::document::IngestedDocument;
use crate::state::AppState;

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ErrorResponse {
    fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: None,
        }
    }

    fn with_details(error: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: cfg!(debug_assertions).then(|| details.into()),
        }
    }
}

type UploadError = (StatusCode, Json<ErrorResponse>);

pub async fn upload_document(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<IngestedDocument>), UploadError> {
    while let Some(field) = multipart.next_field().await.map_err(|e| {
        tracing::warn!("Failed to read multipart field: {}", e);
        (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::with_details("Failed to read upload", e.to_string())),
        )
    })? {
        if field.name() != Some("file") {
            continue;
        }

        let filename = field
            .file_name()
            .map(|s| s.to_string())
            .unwrap_or_else(|| "document.pdf".to_string());

        let data = field.bytes().await.map_err(|e| {
            (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse::with_details("Failed to read file data", e.to_string())),
            )
        })?;
        if data.is_empty() {
            return Err((StatusCode::BAD_REQUEST, Json(ErrorResponse::new("Uploaded file is empty"))));
        }

        let document = state.ingest().ingest(data.to_vec(), &filename).await.map_err(|e| {
            tracing::error!("Failed to store {}: {}", filename, e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::with_details("Failed to store document", e.to_string())),
            )
        })?;

        return Ok((StatusCode::CREATED, Json(document)));
    }

    Err((
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse::new("No file provided. Use field name 'file'")),
    ))
}
