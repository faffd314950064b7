//! Page rasterization at a fixed scale

use crate::document::{DocumentError, DocumentModel, DocumentResult, PageNumber};

use super::surface::{RenderSurface, Viewport};

/// Default render scale: crisp on high-density displays, bounded image size
pub const DEFAULT_SCALE: f32 = 2.0;

/// Renders single pages of a parsed document
#[derive(Debug, Clone, Copy)]
pub struct PageRasterizer {
    scale: f32,
}

impl Default for PageRasterizer {
    fn default() -> Self {
        Self::new(DEFAULT_SCALE)
    }
}

impl PageRasterizer {
    /// Create a rasterizer; the scale is clamped to 0.1..=4.0
    pub fn new(scale: f32) -> Self {
        let scale = if scale.is_finite() { scale.clamp(0.1, 4.0) } else { DEFAULT_SCALE };
        Self { scale }
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }

    /// Viewport for `page` at this rasterizer's scale
    pub fn viewport(&self, doc: &dyn DocumentModel, page: PageNumber) -> DocumentResult<Viewport> {
        check_range(doc, page)?;
        Ok(Viewport::new(doc.page_size(page)?, self.scale))
    }

    /// Render `page` into a fresh surface of exactly viewport size
    ///
    /// CPU-bound; run it on the blocking pool.
    pub fn render(&self, doc: &dyn DocumentModel, page: PageNumber) -> DocumentResult<RenderSurface> {
        let viewport = self.viewport(doc, page)?;
        let mut surface = RenderSurface::for_viewport(&viewport);
        doc.render_page(page, &viewport, &mut surface)?;
        Ok(surface)
    }
}

fn check_range(doc: &dyn DocumentModel, page: PageNumber) -> DocumentResult<()> {
    let total = doc.page_count();
    if page.get() as usize > total {
        return Err(DocumentError::PageOutOfRange {
            page: page.get(),
            total,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::PageSize;

    /// Pages of varying size, each filled with a page-specific gray
    struct GrayPages(Vec<PageSize>);

    impl DocumentModel for GrayPages {
        fn page_count(&self) -> usize {
            self.0.len()
        }

        fn page_size(&self, page: PageNumber) -> DocumentResult<PageSize> {
            Ok(self.0[page.index()])
        }

        fn render_page(
            &self,
            page: PageNumber,
            viewport: &Viewport,
            surface: &mut RenderSurface,
        ) -> DocumentResult<()> {
            if page.get() == 3 {
                return Err(DocumentError::Render("corrupt content stream".into()));
            }
            let shade = (page.get() * 40) as u8;
            let samples = vec![shade; (viewport.width * viewport.height) as usize];
            surface.copy_samples(&samples, viewport.width, viewport.height, 1);
            Ok(())
        }
    }

    fn doc() -> GrayPages {
        GrayPages(vec![
            PageSize::new(300.0, 400.0),
            PageSize::new(842.0, 595.0),
            PageSize::new(100.0, 100.0),
        ])
    }

    #[test]
    fn test_surface_is_natural_size_times_scale() {
        let rasterizer = PageRasterizer::default();
        let surface = rasterizer.render(&doc(), PageNumber::new(1).unwrap()).unwrap();
        assert_eq!(surface.dimensions(), (600, 800));
        assert_eq!(surface.pixels().get_pixel(10, 10).0, [40, 40, 40, 255]);

        let landscape = rasterizer.render(&doc(), PageNumber::new(2).unwrap()).unwrap();
        assert_eq!(landscape.dimensions(), (1684, 1190));
    }

    #[test]
    fn test_page_past_end_is_range_error() {
        let err = PageRasterizer::default()
            .render(&doc(), PageNumber::new(4).unwrap())
            .unwrap_err();
        assert!(matches!(err, DocumentError::PageOutOfRange { page: 4, total: 3 }));
    }

    #[test]
    fn test_render_failure_propagates() {
        let err = PageRasterizer::default()
            .render(&doc(), PageNumber::new(3).unwrap())
            .unwrap_err();
        assert!(matches!(err, DocumentError::Render(_)));
    }

    #[test]
    fn test_scale_is_clamped() {
        assert_eq!(PageRasterizer::new(10.0).scale(), 4.0);
        assert_eq!(PageRasterizer::new(f32::NAN).scale(), DEFAULT_SCALE);
    }
}
