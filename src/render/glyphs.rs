//! Text rasterization for the watermark
//!
//! Prefers a TrueType font when one can be found on disk; otherwise falls back
//! to a small built-in bitmap font so that a watermark is always drawn.

use image::{GrayImage, Luma};
use rusttype::{point, Font, Scale};

/// Common system font locations, tried in order
const FONT_PATHS: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans-Bold.ttf",
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans-Bold.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Bold.ttf",
    "/usr/share/fonts/liberation/LiberationSans-Bold.ttf",
    "/System/Library/Fonts/Supplemental/Arial Bold.ttf",
    "/Library/Fonts/Arial.ttf",
];

/// Where watermark glyphs come from
pub enum GlyphSource {
    TrueType(Font<'static>),
    Bitmap,
}

impl std::fmt::Debug for GlyphSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GlyphSource::TrueType(_) => f.write_str("GlyphSource::TrueType"),
            GlyphSource::Bitmap => f.write_str("GlyphSource::Bitmap"),
        }
    }
}

impl GlyphSource {
    /// Load `font_path` if given, then the system candidates, then the bitmap font
    pub fn load(font_path: Option<&str>) -> Self {
        let candidates = font_path.into_iter().chain(FONT_PATHS.iter().copied());

        for path in candidates {
            let Ok(data) = std::fs::read(path) else {
                continue;
            };
            match Font::try_from_vec(data) {
                Some(font) => {
                    tracing::info!("Watermark font loaded from {}", path);
                    return GlyphSource::TrueType(font);
                }
                None => tracing::warn!("Ignoring unreadable font file {}", path),
            }
        }

        tracing::warn!("No TrueType font found, using built-in bitmap watermark font");
        GlyphSource::Bitmap
    }

    /// Rasterize one line of text into a coverage mask about `px` pixels tall
    pub fn rasterize(&self, text: &str, px: f32) -> GrayImage {
        let px = px.max(4.0);
        let mask = match self {
            GlyphSource::TrueType(font) => rasterize_truetype(font, text, px),
            GlyphSource::Bitmap => rasterize_bitmap(text, px),
        };
        embolden(&mask, (px / 24.0).round().max(1.0) as u32)
    }
}

fn rasterize_truetype(font: &Font<'static>, text: &str, px: f32) -> GrayImage {
    let scale = Scale::uniform(px);
    let v_metrics = font.v_metrics(scale);
    let glyphs: Vec<_> = font.layout(text, scale, point(0.0, v_metrics.ascent)).collect();

    let width = glyphs
        .last()
        .map(|g| g.position().x + g.unpositioned().h_metrics().advance_width)
        .unwrap_or(0.0)
        .ceil()
        .max(1.0) as u32;
    let height = (v_metrics.ascent - v_metrics.descent).ceil().max(1.0) as u32;

    let mut mask = GrayImage::new(width, height);
    for glyph in &glyphs {
        let Some(bb) = glyph.pixel_bounding_box() else {
            continue;
        };
        glyph.draw(|gx, gy, coverage| {
            let x = gx as i32 + bb.min.x;
            let y = gy as i32 + bb.min.y;
            if x < 0 || y < 0 || x as u32 >= width || y as u32 >= height {
                return;
            }
            let value = (coverage * 255.0).round() as u8;
            let dst = mask.get_pixel_mut(x as u32, y as u32);
            dst.0[0] = dst.0[0].max(value);
        });
    }
    mask
}

const GLYPH_COLS: u32 = 5;
const GLYPH_ROWS: usize = 7;
/// Advance per character in font units (glyph plus one column of spacing)
const GLYPH_ADVANCE: u32 = 6;
/// Line height in font units (glyph plus one row of spacing)
const GLYPH_LINE: u32 = 8;

fn rasterize_bitmap(text: &str, px: f32) -> GrayImage {
    let unit = (px / GLYPH_LINE as f32).round().max(1.0) as u32;
    let chars: Vec<char> = text.chars().collect();
    let width = (chars.len() as u32 * GLYPH_ADVANCE * unit).max(1);
    let height = GLYPH_LINE * unit;

    let mut mask = GrayImage::new(width, height);
    for (i, ch) in chars.iter().enumerate() {
        let rows = bitmap_glyph(*ch);
        let origin_x = i as u32 * GLYPH_ADVANCE * unit;
        for (row, bits) in rows.iter().enumerate() {
            for col in 0..GLYPH_COLS {
                if bits & (1 << (GLYPH_COLS - 1 - col)) == 0 {
                    continue;
                }
                let x0 = origin_x + col * unit;
                let y0 = row as u32 * unit;
                for dy in 0..unit {
                    for dx in 0..unit {
                        mask.put_pixel(x0 + dx, y0 + dy, Luma([255]));
                    }
                }
            }
        }
    }
    mask
}

/// Thicken strokes by dilating `radius` pixels to the right
fn embolden(mask: &GrayImage, radius: u32) -> GrayImage {
    let (w, h) = mask.dimensions();
    let mut out = GrayImage::new(w + radius, h);
    for y in 0..h {
        for x in 0..w + radius {
            let from = x.saturating_sub(radius);
            let to = x.min(w - 1);
            let mut value = 0u8;
            for sx in from..=to {
                value = value.max(mask.get_pixel(sx, y).0[0]);
            }
            out.put_pixel(x, y, Luma([value]));
        }
    }
    out
}

/// 5x7 rows, most significant of the low five bits is the leftmost column
fn bitmap_glyph(ch: char) -> [u8; GLYPH_ROWS] {
    match ch.to_ascii_uppercase() {
        'A' => [0b01110, 0b10001, 0b10001, 0b11111, 0b10001, 0b10001, 0b10001],
        'B' => [0b11110, 0b10001, 0b10001, 0b11110, 0b10001, 0b10001, 0b11110],
        'C' => [0b01110, 0b10001, 0b10000, 0b10000, 0b10000, 0b10001, 0b01110],
        'D' => [0b11110, 0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b11110],
        'E' => [0b11111, 0b10000, 0b10000, 0b11110, 0b10000, 0b10000, 0b11111],
        'F' => [0b11111, 0b10000, 0b10000, 0b11110, 0b10000, 0b10000, 0b10000],
        'G' => [0b01110, 0b10001, 0b10000, 0b10111, 0b10001, 0b10001, 0b01111],
        'H' => [0b10001, 0b10001, 0b10001, 0b11111, 0b10001, 0b10001, 0b10001],
        'I' => [0b01110, 0b00100, 0b00100, 0b00100, 0b00100, 0b00100, 0b01110],
        'J' => [0b00111, 0b00010, 0b00010, 0b00010, 0b00010, 0b10010, 0b01100],
        'K' => [0b10001, 0b10010, 0b10100, 0b11000, 0b10100, 0b10010, 0b10001],
        'L' => [0b10000, 0b10000, 0b10000, 0b10000, 0b10000, 0b10000, 0b11111],
        'M' => [0b10001, 0b11011, 0b10101, 0b10101, 0b10001, 0b10001, 0b10001],
        'N' => [0b10001, 0b10001, 0b11001, 0b10101, 0b10011, 0b10001, 0b10001],
        'O' => [0b01110, 0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b01110],
        'P' => [0b11110, 0b10001, 0b10001, 0b11110, 0b10000, 0b10000, 0b10000],
        'Q' => [0b01110, 0b10001, 0b10001, 0b10001, 0b10101, 0b10010, 0b01101],
        'R' => [0b11110, 0b10001, 0b10001, 0b11110, 0b10100, 0b10010, 0b10001],
        'S' => [0b01111, 0b10000, 0b10000, 0b01110, 0b00001, 0b00001, 0b11110],
        'T' => [0b11111, 0b00100, 0b00100, 0b00100, 0b00100, 0b00100, 0b00100],
        'U' => [0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b01110],
        'V' => [0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b01010, 0b00100],
        'W' => [0b10001, 0b10001, 0b10001, 0b10101, 0b10101, 0b10101, 0b01010],
        'X' => [0b10001, 0b10001, 0b01010, 0b00100, 0b01010, 0b10001, 0b10001],
        'Y' => [0b10001, 0b10001, 0b01010, 0b00100, 0b00100, 0b00100, 0b00100],
        'Z' => [0b11111, 0b00001, 0b00010, 0b00100, 0b01000, 0b10000, 0b11111],
        '0' => [0b01110, 0b10001, 0b10011, 0b10101, 0b11001, 0b10001, 0b01110],
        '1' => [0b00100, 0b01100, 0b00100, 0b00100, 0b00100, 0b00100, 0b01110],
        '2' => [0b01110, 0b10001, 0b00001, 0b00010, 0b00100, 0b01000, 0b11111],
        '3' => [0b11111, 0b00010, 0b00100, 0b00010, 0b00001, 0b10001, 0b01110],
        '4' => [0b00010, 0b00110, 0b01010, 0b10010, 0b11111, 0b00010, 0b00010],
        '5' => [0b11111, 0b10000, 0b11110, 0b00001, 0b00001, 0b10001, 0b01110],
        '6' => [0b00110, 0b01000, 0b10000, 0b11110, 0b10001, 0b10001, 0b01110],
        '7' => [0b11111, 0b00001, 0b00010, 0b00100, 0b01000, 0b01000, 0b01000],
        '8' => [0b01110, 0b10001, 0b10001, 0b01110, 0b10001, 0b10001, 0b01110],
        '9' => [0b01110, 0b10001, 0b10001, 0b01111, 0b00001, 0b00010, 0b01100],
        '-' | '—' | '–' => [0, 0, 0, 0b11111, 0, 0, 0],
        '.' => [0, 0, 0, 0, 0, 0b01100, 0b01100],
        ':' => [0, 0b01100, 0b01100, 0, 0b01100, 0b01100, 0],
        '/' => [0, 0b00001, 0b00010, 0b00100, 0b01000, 0b10000, 0],
        _ => [0; GLYPH_ROWS],
    }
}
