//! MuPDF-backed document model
//!
//! MuPDF's `fz_context` is not thread-safe, so a parsed document keeps only
//! its bytes and metadata. Page sizes are read once at parse time; a render
//! opens a fresh `mupdf::Document` on the calling thread and drops it when
//! done, which lets different pages of the same document render in parallel
//! on the blocking pool.

use std::sync::Arc;

use mupdf::{Colorspace, Document, Matrix};

use crate::document::{DocumentError, DocumentModel, DocumentResult, PageNumber, PageSize, PdfEngine};
use crate::render::{RenderSurface, Viewport};

const PDF_MIME: &str = "application/pdf";
const PDF_MAGIC: &[u8] = b"%PDF";

/// [`PdfEngine`] that parses with MuPDF
#[derive(Debug, Default, Clone, Copy)]
pub struct MupdfEngine;

impl MupdfEngine {
    pub fn new() -> Self {
        Self
    }
}

impl PdfEngine for MupdfEngine {
    fn parse(&self, data: Vec<u8>) -> DocumentResult<Arc<dyn DocumentModel>> {
        Ok(Arc::new(MupdfDocument::from_bytes(data)?))
    }
}

/// Parsed PDF: original bytes plus the page geometry read at parse time
pub struct MupdfDocument {
    data: Arc<Vec<u8>>,
    /// Natural size per page; `None` where MuPDF could not load the page
    sizes: Vec<Option<PageSize>>,
}

impl MupdfDocument {
    /// Validate `data` as a PDF and read its page count
    pub fn from_bytes(data: Vec<u8>) -> DocumentResult<Self> {
        if !has_pdf_magic(&data) {
            return Err(DocumentError::Parse("Missing %PDF header".into()));
        }

        let doc = Document::from_bytes(&data, PDF_MIME)
            .map_err(|e| DocumentError::Parse(e.to_string()))?;
        let page_count = doc
            .page_count()
            .map_err(|e| DocumentError::Parse(e.to_string()))?;

        // A broken page only fails its own render, not the whole document
        let sizes = (0..page_count.max(0))
            .map(|index| {
                let bounds = doc.load_page(index).and_then(|page| page.bounds()).ok()?;
                Some(PageSize::new(bounds.x1 - bounds.x0, bounds.y1 - bounds.y0))
            })
            .collect();

        Ok(Self {
            data: Arc::new(data),
            sizes,
        })
    }

    fn check_page(&self, page: PageNumber) -> DocumentResult<i32> {
        if page.index() >= self.sizes.len() {
            return Err(DocumentError::PageOutOfRange {
                page: page.get(),
                total: self.sizes.len(),
            });
        }
        i32::try_from(page.index()).map_err(|_| DocumentError::PageOutOfRange {
            page: page.get(),
            total: self.sizes.len(),
        })
    }
}

impl DocumentModel for MupdfDocument {
    fn page_count(&self) -> usize {
        self.sizes.len()
    }

    fn page_size(&self, page: PageNumber) -> DocumentResult<PageSize> {
        self.check_page(page)?;
        self.sizes[page.index()]
            .ok_or_else(|| DocumentError::Render(format!("Page {} could not be loaded", page)))
    }

    fn render_page(
        &self,
        page: PageNumber,
        viewport: &Viewport,
        surface: &mut RenderSurface,
    ) -> DocumentResult<()> {
        let index = self.check_page(page)?;
        let doc = Document::from_bytes(&self.data, PDF_MIME)?;
        let page = doc.load_page(index)?;
        let bounds = page.bounds()?;
        let (w, h) = (bounds.x1 - bounds.x0, bounds.y1 - bounds.y0);
        if w <= 0.0 || h <= 0.0 {
            return Err(DocumentError::Render(format!("Page {} has an empty box", index + 1)));
        }

        // Stretch to the exact viewport so rounding never leaves a blank edge
        let matrix = Matrix::new_scale(viewport.width as f32 / w, viewport.height as f32 / h);
        let pixmap = page.to_pixmap(&matrix, &Colorspace::device_rgb(), false, true)?;

        surface.copy_samples(
            pixmap.samples(),
            pixmap.width() as u32,
            pixmap.height() as u32,
            pixmap.n() as usize,
        );
        Ok(())
    }
}

fn has_pdf_magic(data: &[u8]) -> bool {
    // Some writers put junk before the header; MuPDF tolerates up to 1 KiB
    let head = &data[..data.len().min(1024)];
    head.windows(PDF_MAGIC.len()).any(|w| w == PDF_MAGIC)
}
