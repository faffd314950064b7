//! Pixel surfaces
//!
//! A [`RenderSurface`] is created per page render, drawn into by the PDF
//! engine, overlaid by the watermark and finally consumed by the encoder.

use image::{Rgba, RgbaImage};
use serde::Serialize;

use crate::document::PageSize;

/// Scaled page dimensions in whole pixels
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
    pub scale: f32,
}

impl Viewport {
    /// Scale a page's natural size, rounding to whole pixels (at least 1)
    pub fn new(size: PageSize, scale: f32) -> Self {
        let to_px = |points: f32| (points * scale).round().max(1.0) as u32;
        Self {
            width: to_px(size.width),
            height: to_px(size.height),
            scale,
        }
    }
}

/// RGBA pixel buffer with the handful of drawing primitives the pipeline needs
#[derive(Debug, Clone)]
pub struct RenderSurface {
    pixels: RgbaImage,
}

impl RenderSurface {
    /// Allocate an opaque white surface
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            pixels: RgbaImage::from_pixel(width, height, Rgba([255, 255, 255, 255])),
        }
    }

    pub fn for_viewport(viewport: &Viewport) -> Self {
        Self::new(viewport.width, viewport.height)
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.pixels.dimensions()
    }

    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }

    pub fn into_image(self) -> RgbaImage {
        self.pixels
    }

    /// Copy engine output into the surface
    ///
    /// `samples` is row-major with `components` bytes per pixel (1 = gray,
    /// 3 = RGB, 4 = RGBA). Anything outside the surface is clipped.
    pub fn copy_samples(&mut self, samples: &[u8], width: u32, height: u32, components: usize) {
        if components == 0 {
            return;
        }
        let stride = width as usize * components;
        let w = width.min(self.width());
        let h = height.min(self.height());

        for y in 0..h {
            let row = y as usize * stride;
            for x in 0..w {
                let offset = row + x as usize * components;
                let Some(px) = samples.get(offset..offset + components) else {
                    return;
                };
                let rgba = match components {
                    1 | 2 => [px[0], px[0], px[0], 255],
                    3 => [px[0], px[1], px[2], 255],
                    _ => [px[0], px[1], px[2], px[3]],
                };
                self.pixels.put_pixel(x, y, Rgba(rgba));
            }
        }
    }

    /// Source-over blend of an RGB colour at `alpha` (0.0..=1.0)
    #[inline]
    pub fn blend_pixel(&mut self, x: u32, y: u32, color: [u8; 3], alpha: f32) {
        if alpha <= 0.0 || x >= self.width() || y >= self.height() {
            return;
        }
        let a = alpha.min(1.0);
        let dst = self.pixels.get_pixel_mut(x, y);
        for c in 0..3 {
            let blended = color[c] as f32 * a + dst[c] as f32 * (1.0 - a);
            dst[c] = blended.round().clamp(0.0, 255.0) as u8;
        }
        let out_alpha = a * 255.0 + dst[3] as f32 * (1.0 - a);
        dst[3] = out_alpha.round().clamp(0.0, 255.0) as u8;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_viewport_scales_natural_size() {
        let viewport = Viewport::new(PageSize::new(612.0, 792.0), 2.0);
        assert_eq!((viewport.width, viewport.height), (1224, 1584));

        let tiny = Viewport::new(PageSize::new(0.1, 0.1), 2.0);
        assert_eq!((tiny.width, tiny.height), (1, 1));
    }

    #[test]
    fn test_new_surface_is_white() {
        let surface = RenderSurface::new(4, 3);
        assert_eq!(surface.dimensions(), (4, 3));
        assert!(surface.pixels().pixels().all(|p| p.0 == [255, 255, 255, 255]));
    }

    #[test]
    fn test_copy_rgb_samples_clips() {
        let mut surface = RenderSurface::new(2, 2);
        // 3x1 RGB source; third pixel falls outside the surface
        let samples = [10, 20, 30, 40, 50, 60, 70, 80, 90];
        surface.copy_samples(&samples, 3, 1, 3);

        assert_eq!(surface.pixels().get_pixel(0, 0).0, [10, 20, 30, 255]);
        assert_eq!(surface.pixels().get_pixel(1, 0).0, [40, 50, 60, 255]);
        assert_eq!(surface.pixels().get_pixel(0, 1).0, [255, 255, 255, 255]);
    }

    #[test]
    fn test_blend_pixel() {
        let mut surface = RenderSurface::new(1, 1);
        surface.blend_pixel(0, 0, [0, 0, 0], 0.5);
        assert_eq!(surface.pixels().get_pixel(0, 0).0, [128, 128, 128, 255]);

        // Out of bounds and zero alpha are no-ops
        surface.blend_pixel(5, 5, [0, 0, 0], 1.0);
        surface.blend_pixel(0, 0, [0, 0, 0], 0.0);
        assert_eq!(surface.pixels().get_pixel(0, 0).0, [128, 128, 128, 255]);
    }
}
