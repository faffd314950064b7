//! Rasterization, watermarking and encoding of single pages
//!
//! Everything here is synchronous and CPU-bound. The pipeline runs it on
//! tokio's blocking pool.

mod encoder;
mod glyphs;
mod rasterizer;
mod surface;
mod watermark;

pub use encoder::{encode_png, EncodedPage, PNG_CONTENT_TYPE};
pub use glyphs::GlyphSource;
pub use rasterizer::{PageRasterizer, DEFAULT_SCALE};
pub use surface::{RenderSurface, Viewport};
pub use watermark::{session_fingerprint, Bounds, TextInstance, WatermarkCompositor, WatermarkSpec};
