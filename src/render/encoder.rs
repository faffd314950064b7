//! Delivery encoding
//!
//! PNG keeps the overlaid text lossless.

use std::io::Cursor;

use image::DynamicImage;
use serde::Serialize;

use crate::document::{DocumentError, DocumentResult};

use super::surface::RenderSurface;

pub const PNG_CONTENT_TYPE: &str = "image/png";

/// An encoded page image ready for transport
#[derive(Debug, Clone, Serialize)]
pub struct EncodedPage {
    #[serde(skip)]
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub content_type: &'static str,
}

/// Serialize a composited surface to PNG, consuming it
pub fn encode_png(surface: RenderSurface) -> DocumentResult<EncodedPage> {
    let (width, height) = surface.dimensions();

    // Pages are rendered opaque, so the alpha channel carries nothing
    let rgb = DynamicImage::ImageRgba8(surface.into_image()).into_rgb8();

    let mut data = Vec::new();
    DynamicImage::ImageRgb8(rgb)
        .write_to(&mut Cursor::new(&mut data), image::ImageFormat::Png)
        .map_err(|e| DocumentError::Image(e.to_string()))?;

    Ok(EncodedPage {
        data,
        width,
        height,
        content_type: PNG_CONTENT_TYPE,
    })
}
