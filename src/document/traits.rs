//! Document traits
//!
//! The narrow surface the page pipeline needs from a PDF engine. Anything
//! that can count pages, size them and draw them into a [`RenderSurface`]
//! can stand in for MuPDF.

use std::sync::Arc;

use async_trait::async_trait;

use crate::render::{RenderSurface, Viewport};
use crate::storage::DocumentHandle;

use super::error::DocumentResult;
use super::types::{PageNumber, PageSize};

/// A parsed PDF, shared read-only across concurrent page renders
pub trait DocumentModel: Send + Sync {
    /// Total number of pages
    fn page_count(&self) -> usize;

    /// Natural (unscaled) size of a page
    fn page_size(&self, page: PageNumber) -> DocumentResult<PageSize>;

    /// Execute the page's drawing instructions against `surface`
    ///
    /// `surface` has already been allocated at `viewport` size.
    fn render_page(
        &self,
        page: PageNumber,
        viewport: &Viewport,
        surface: &mut RenderSurface,
    ) -> DocumentResult<()>;
}

/// Turns raw bytes into a [`DocumentModel`]
///
/// Parsing is CPU-bound; callers run it on the blocking pool.
pub trait PdfEngine: Send + Sync {
    fn parse(&self, data: Vec<u8>) -> DocumentResult<Arc<dyn DocumentModel>>;
}

/// Resolves a handle to a parsed document
#[async_trait]
pub trait DocumentLoader: Send + Sync {
    async fn load(&self, handle: &DocumentHandle) -> DocumentResult<Arc<dyn DocumentModel>>;
}
