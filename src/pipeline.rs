//! Page request orchestration
//!
//! ```text
//! Validating → Loading (cache) → Rendering → Watermarking → Encoding → Done
//!      └────────────┴────────────────┴─────────────┴────────────┴──→ Failed(kind)
//! ```
//!
//! Loading awaits the shared [`CacheService`]. Everything after it runs as one
//! job on the blocking pool, bounded by the render timeout, and never touches
//! the cache: a failed render leaves the parsed document cached for the next
//! page request.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde::Serialize;
use tokio::time::timeout;

use crate::config::WatermarkConfig;
use crate::document::{CacheService, DocumentError, PageNumber, PageNumberError};
use crate::error::{PageError, PageResult};
use crate::render::{encode_png, PageRasterizer, WatermarkCompositor, WatermarkSpec};
use crate::storage::DocumentHandle;

/// Transport headers sent with every rendered page
///
/// Watermarks are per-render (and per-session when enabled), so no
/// intermediary may store or reuse the bytes.
pub const NO_CACHE_HEADERS: [(&str, &str); 3] = [
    ("cache-control", "private, no-cache, no-store, must-revalidate"),
    ("pragma", "no-cache"),
    ("expires", "0"),
];

/// Steps of a page request, used in logs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PageStage {
    Validating,
    Loading,
    Rendering,
    Watermarking,
    Encoding,
    Done,
}

/// One page request as it arrives from the boundary layer
#[derive(Debug, Clone)]
pub struct PageRequest {
    pub handle: DocumentHandle,
    /// Page number exactly as supplied by the caller
    pub page: String,
    /// Page count recorded at ingest; 0 means unknown
    pub declared_page_count: u32,
    /// Opaque viewer session token, used only as watermark input
    pub session: Option<String>,
}

/// Encoded, watermarked page
#[derive(Debug, Clone)]
pub struct RenderedPage {
    pub data: Vec<u8>,
    pub content_type: &'static str,
    pub width: u32,
    pub height: u32,
    pub page: PageNumber,
}

/// Check a raw page number against the declared page count
pub fn validate_page(raw: &str, declared_page_count: u32) -> PageResult<PageNumber> {
    let page = PageNumber::parse(raw).map_err(|e| match e {
        PageNumberError::NotANumber => PageError::InvalidPageNumber(raw.to_string()),
        PageNumberError::BelowOne => {
            PageError::PageOutOfRange(format!("Page {} is out of range, pages start at 1", raw.trim()))
        }
        // No engine addresses this many pages, so an unchecked render would fail anyway
        PageNumberError::TooLarge if declared_page_count > 0 => PageError::PageOutOfRange(format!(
            "Page {} is out of range (document has {} pages)",
            raw.trim(),
            declared_page_count
        )),
        PageNumberError::TooLarge => {
            PageError::RenderFailed(format!("Page {} is beyond any renderable page", raw.trim()))
        }
    })?;

    if declared_page_count > 0 && page.get() > declared_page_count {
        return Err(PageError::PageOutOfRange(format!(
            "Page {} is out of range (document has {} pages)",
            page, declared_page_count
        )));
    }
    Ok(page)
}

/// Renders watermarked pages of cached documents
pub struct PageService {
    cache: Arc<CacheService>,
    rasterizer: PageRasterizer,
    compositor: Arc<WatermarkCompositor>,
    watermark: WatermarkConfig,
    render_timeout: Duration,
}

impl PageService {
    pub fn new(
        cache: Arc<CacheService>,
        rasterizer: PageRasterizer,
        compositor: Arc<WatermarkCompositor>,
        watermark: WatermarkConfig,
        render_timeout: Duration,
    ) -> Self {
        Self {
            cache,
            rasterizer,
            compositor,
            watermark,
            render_timeout,
        }
    }

    pub fn cache(&self) -> &Arc<CacheService> {
        &self.cache
    }

    pub async fn render_page(&self, request: PageRequest) -> PageResult<RenderedPage> {
        let PageRequest {
            handle,
            page: raw_page,
            declared_page_count,
            session,
        } = request;

        trace_stage(&handle, &raw_page, PageStage::Validating);
        let page = validate_page(&raw_page, declared_page_count)?;

        trace_stage(&handle, &raw_page, PageStage::Loading);
        let doc = self.cache.get_or_load(&handle).await?;

        let spec = WatermarkSpec::for_render(&self.watermark, Utc::now().date_naive(), session.as_deref());
        let rasterizer = self.rasterizer;
        let compositor = self.compositor.clone();
        let job_handle = handle.clone();

        let job = tokio::task::spawn_blocking(move || {
            trace_stage(&job_handle, &raw_page, PageStage::Rendering);
            let mut surface = rasterizer.render(doc.as_ref(), page)?;

            trace_stage(&job_handle, &raw_page, PageStage::Watermarking);
            compositor.apply(&mut surface, &spec);

            trace_stage(&job_handle, &raw_page, PageStage::Encoding);
            encode_png(surface)
        });

        let encoded = timeout(self.render_timeout, job)
            .await
            .map_err(|_| PageError::from_render(DocumentError::Timeout(self.render_timeout.as_secs())))?
            .map_err(|e| PageError::Internal(format!("Render task failed: {}", e)))?
            .map_err(PageError::from_render)?;

        tracing::debug!(
            %handle,
            %page,
            stage = ?PageStage::Done,
            width = encoded.width,
            height = encoded.height,
            bytes = encoded.data.len(),
            "page request"
        );

        Ok(RenderedPage {
            data: encoded.data,
            content_type: encoded.content_type,
            width: encoded.width,
            height: encoded.height,
            page,
        })
    }
}

fn trace_stage(handle: &DocumentHandle, page: &str, stage: PageStage) {
    tracing::debug!(%handle, page, ?stage, "page request");
}
