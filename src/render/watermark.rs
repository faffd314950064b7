//! Watermark compositing
//!
//! Every delivered page carries a repeating, rotated, translucent line of text
//! naming the product, the render date and (optionally) a fingerprint of the
//! viewer's session. The pattern is laid out in a frame rotated about the page
//! centre and tiled far enough in every direction to reach all four corners,
//! so cropping any region of the image still leaves watermark text in it.

use chrono::NaiveDate;
use image::GrayImage;
use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::config::WatermarkConfig;

use super::glyphs::GlyphSource;
use super::surface::RenderSurface;

/// Hex digits of the session digest embedded in the text
const FINGERPRINT_LEN: usize = 12;

/// What to draw and how
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WatermarkSpec {
    pub text: String,
    /// Global alpha applied to the whole overlay
    pub opacity: f32,
    /// Rotation of the text baseline in degrees (negative is counter-clockwise on screen)
    pub rotation_deg: f32,
    pub font_size: f32,
    pub color: [u8; 3],
    /// Alpha of the fill colour itself, multiplied with `opacity`
    pub fill_alpha: f32,
    /// Distance between rows, measured perpendicular to the text
    pub spacing: f32,
    /// Lower bound on the number of rows drawn
    pub min_rows: usize,
}

impl Default for WatermarkSpec {
    fn default() -> Self {
        Self {
            text: String::new(),
            opacity: 0.18,
            rotation_deg: -45.0,
            font_size: 48.0,
            color: [200, 60, 60],
            fill_alpha: 0.8,
            spacing: 120.0,
            min_rows: 9,
        }
    }
}

impl WatermarkSpec {
    /// Watermark for one render on `date`, optionally bound to a viewer session
    pub fn for_render(config: &WatermarkConfig, date: NaiveDate, session: Option<&str>) -> Self {
        let mut text = format!("{} — {} — {}", config.tag, date.format("%Y-%m-%d"), config.label);
        if config.include_session {
            if let Some(token) = session.filter(|t| !t.is_empty()) {
                text.push_str(" — ");
                text.push_str(&session_fingerprint(token));
            }
        }

        Self {
            text,
            opacity: config.opacity.clamp(0.0, 1.0),
            font_size: config.font_size.max(4.0),
            spacing: config.spacing.max(1.0),
            ..Self::default()
        }
    }
}

/// Short, non-reversible marker for a session token
pub fn session_fingerprint(token: &str) -> String {
    let digest = Sha256::digest(token.as_bytes());
    let mut hex = hex::encode(digest);
    hex.truncate(FINGERPRINT_LEN);
    hex
}

/// Axis-aligned box in surface pixels
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Bounds {
    pub x0: f32,
    pub y0: f32,
    pub x1: f32,
    pub y1: f32,
}

impl Bounds {
    pub fn intersects(&self, other: &Bounds) -> bool {
        self.x0 < other.x1 && other.x0 < self.x1 && self.y0 < other.y1 && other.y0 < self.y1
    }
}

/// One drawn copy of the watermark text
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextInstance {
    pub row: i32,
    pub column: i32,
    /// Corners of the rotated text box in surface coordinates
    pub corners: [(f32, f32); 4],
    pub bounds: Bounds,
}

/// Text mask plus the tiling derived from it for one surface
struct Tiling {
    mask: GrayImage,
    cos: f32,
    sin: f32,
    cx: f32,
    cy: f32,
    spacing: f32,
    pitch: f32,
    rows: i32,
    columns: i32,
}

impl Tiling {
    fn text_width(&self) -> f32 {
        self.mask.width() as f32
    }

    fn text_height(&self) -> f32 {
        self.mask.height() as f32
    }

    /// Horizontal shift of odd rows so the grid is brick-laid
    fn row_offset(&self, row: i32) -> f32 {
        if row.rem_euclid(2) == 1 {
            self.pitch / 2.0
        } else {
            0.0
        }
    }

    /// Text frame to surface
    fn to_surface(&self, u: f32, v: f32) -> (f32, f32) {
        (
            self.cx + u * self.cos - v * self.sin,
            self.cy + u * self.sin + v * self.cos,
        )
    }

    /// Coverage (0..=255) of the watermark at text frame point (u, v)
    fn coverage(&self, u: f32, v: f32) -> u8 {
        let row = (v / self.spacing).round() as i32;
        if row.abs() > self.rows {
            return 0;
        }
        let local_y = v - row as f32 * self.spacing + self.text_height() / 2.0;
        if local_y < 0.0 || local_y >= self.text_height() {
            return 0;
        }

        let t = u - self.row_offset(row) + self.text_width() / 2.0;
        let column = (t / self.pitch).floor() as i32;
        if column.abs() > self.columns {
            return 0;
        }
        let local_x = t - column as f32 * self.pitch;
        if local_x < 0.0 || local_x >= self.text_width() {
            return 0;
        }

        self.mask.get_pixel(local_x as u32, local_y as u32).0[0]
    }
}

/// Draws [`WatermarkSpec`]s onto rendered pages
#[derive(Debug)]
pub struct WatermarkCompositor {
    glyphs: GlyphSource,
}

impl WatermarkCompositor {
    pub fn new(glyphs: GlyphSource) -> Self {
        Self { glyphs }
    }

    pub fn from_config(config: &WatermarkConfig) -> Self {
        Self::new(GlyphSource::load(config.font_path.as_deref()))
    }

    fn tiling(&self, spec: &WatermarkSpec, width: u32, height: u32) -> Tiling {
        let mask = self.glyphs.rasterize(&spec.text, spec.font_size);
        let theta = spec.rotation_deg.to_radians();
        let spacing = spec.spacing.max(1.0);
        let gap = spec.font_size * 2.0;
        let pitch = (mask.width() as f32 + gap).max(1.0);

        // Rows and columns must reach the corners, half a diagonal from the centre
        let half_diagonal = ((width as f32).hypot(height as f32)) / 2.0;
        let rows = ((half_diagonal / spacing).ceil() as i32 + 1)
            .max(spec.min_rows.saturating_sub(1) as i32 / 2);
        let columns = (half_diagonal / pitch).ceil() as i32 + 1;

        Tiling {
            mask,
            cos: theta.cos(),
            sin: theta.sin(),
            cx: width as f32 / 2.0,
            cy: height as f32 / 2.0,
            spacing,
            pitch,
            rows,
            columns,
        }
    }

    /// Every text instance that touches a `width`×`height` surface
    pub fn layout(&self, spec: &WatermarkSpec, width: u32, height: u32) -> Vec<TextInstance> {
        let tiling = self.tiling(spec, width, height);
        let surface = Bounds {
            x0: 0.0,
            y0: 0.0,
            x1: width as f32,
            y1: height as f32,
        };
        let (tw, th) = (tiling.text_width(), tiling.text_height());

        let mut instances = Vec::new();
        for row in -tiling.rows..=tiling.rows {
            let v0 = row as f32 * tiling.spacing - th / 2.0;
            for column in -tiling.columns..=tiling.columns {
                let u0 = column as f32 * tiling.pitch + tiling.row_offset(row) - tw / 2.0;
                let corners = [
                    tiling.to_surface(u0, v0),
                    tiling.to_surface(u0 + tw, v0),
                    tiling.to_surface(u0 + tw, v0 + th),
                    tiling.to_surface(u0, v0 + th),
                ];
                let bounds = corners.iter().fold(
                    Bounds {
                        x0: f32::MAX,
                        y0: f32::MAX,
                        x1: f32::MIN,
                        y1: f32::MIN,
                    },
                    |b, &(x, y)| Bounds {
                        x0: b.x0.min(x),
                        y0: b.y0.min(y),
                        x1: b.x1.max(x),
                        y1: b.y1.max(y),
                    },
                );
                if bounds.intersects(&surface) {
                    instances.push(TextInstance {
                        row,
                        column,
                        corners,
                        bounds,
                    });
                }
            }
        }
        instances
    }

    /// Composite the watermark onto `surface` in place
    ///
    /// CPU-bound; run it on the blocking pool.
    pub fn apply(&self, surface: &mut RenderSurface, spec: &WatermarkSpec) {
        let (width, height) = surface.dimensions();
        if width == 0 || height == 0 || spec.text.is_empty() {
            return;
        }
        let tiling = self.tiling(spec, width, height);
        let alpha = spec.opacity.clamp(0.0, 1.0) * spec.fill_alpha.clamp(0.0, 1.0);
        if alpha <= 0.0 {
            return;
        }

        for y in 0..height {
            let dy = y as f32 + 0.5 - tiling.cy;
            for x in 0..width {
                let dx = x as f32 + 0.5 - tiling.cx;
                // Inverse rotation back into the text frame
                let u = dx * tiling.cos + dy * tiling.sin;
                let v = -dx * tiling.sin + dy * tiling.cos;
                let coverage = tiling.coverage(u, v);
                if coverage > 0 {
                    surface.blend_pixel(x, y, spec.color, alpha * coverage as f32 / 255.0);
                }
            }
        }
    }
}
