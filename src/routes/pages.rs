//! Page image endpoint
//!
//! `GET /api/v1/documents/:handle/pages/:page?pages=<declared count>`
//!
//! Handles are usually URLs, so callers percent-encode them into a single
//! path segment. The viewer's session token is read from the session cookie
//! when present; this server never issues it.

use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, HeaderValue},
    response::{IntoResponse, Response},
};
use serde::Deserialize;

use crate::error::PageError;
use crate::pipeline::{PageRequest, NO_CACHE_HEADERS};
use crate::state::AppState;
use crate::storage::DocumentHandle;

/// Query parameters for page rendering
///
/// `pages` stays a string so a malformed count gets the same JSON error body
/// as a malformed page number instead of the extractor's plain-text rejection.
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    /// Page count recorded when the document was ingested (0 or absent = unknown)
    #[serde(default)]
    pub pages: Option<String>,
}

impl PageQuery {
    /// Declared page count, 0 when unknown
    pub fn declared_page_count(&self) -> Result<u32, PageError> {
        match self.pages.as_deref().map(str::trim) {
            None | Some("") => Ok(0),
            Some(raw) => raw
                .parse()
                .map_err(|_| PageError::InvalidPageNumber(format!("pages={}", raw))),
        }
    }
}

pub async fn render_page(
    State(state): State<AppState>,
    Path((handle, page)): Path<(String, String)>,
    Query(query): Query<PageQuery>,
    headers: HeaderMap,
) -> Result<Response, PageError> {
    let declared_page_count = query.declared_page_count()?;
    let session = session_token(&headers, &state.config().session_cookie);

    let rendered = state
        .pages()
        .render_page(PageRequest {
            handle: DocumentHandle::new(handle),
            page,
            declared_page_count,
            session,
        })
        .await?;

    let mut response = rendered.data.into_response();
    let headers = response.headers_mut();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(rendered.content_type));
    for (name, value) in NO_CACHE_HEADERS {
        headers.insert(name, HeaderValue::from_static(value));
    }
    Ok(response)
}

/// Value of cookie `name`, if the request carries a non-empty one
fn session_token(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.trim_matches('"').to_string())
        .filter(|value| !value.is_empty())
}
