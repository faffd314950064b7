//! Shared helpers for integration tests

#![allow(dead_code)]

use std::sync::Arc;

use studyvault_server::config::{BlobBackend, Config};
use studyvault_server::state::AppState;
use studyvault_server::storage::MemoryBlobStore;
use studyvault_server::MupdfEngine;

/// Build a PDF with one page per entry in `sizes` (width, height in points)
///
/// Every page draws a black 100x100pt square with its lower-left corner at
/// (20, 20).
pub fn pdf_with_page_sizes(sizes: &[(u32, u32)]) -> Vec<u8> {
    let page_count = sizes.len();
    let mut objects: Vec<String> = Vec::new();

    objects.push("<< /Type /Catalog /Pages 2 0 R >>".to_string());
    let kids: Vec<String> = (0..page_count).map(|i| format!("{} 0 R", 3 + 2 * i)).collect();
    objects.push(format!("<< /Type /Pages /Kids [{}] /Count {} >>", kids.join(" "), page_count));

    let content = "0 0 0 rg 20 20 100 100 re f";
    for (i, (w, h)) in sizes.iter().enumerate() {
        objects.push(format!(
            "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {} {}] /Contents {} 0 R /Resources << >> >>",
            w,
            h,
            4 + 2 * i
        ));
        objects.push(format!(
            "<< /Length {} >>\nstream\n{}\nendstream",
            content.len(),
            content
        ));
    }

    let mut out = b"%PDF-1.4\n".to_vec();
    let mut offsets = Vec::with_capacity(objects.len());
    for (i, body) in objects.iter().enumerate() {
        offsets.push(out.len());
        out.extend_from_slice(format!("{} 0 obj\n{}\nendobj\n", i + 1, body).as_bytes());
    }

    let xref_offset = out.len();
    out.extend_from_slice(format!("xref\n0 {}\n", objects.len() + 1).as_bytes());
    out.extend_from_slice(b"0000000000 65535 f \n");
    for offset in offsets {
        out.extend_from_slice(format!("{:010} 00000 n \n", offset).as_bytes());
    }
    out.extend_from_slice(
        format!(
            "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{}\n%%EOF\n",
            objects.len() + 1,
            xref_offset
        )
        .as_bytes(),
    );
    out
}

/// `pages` pages of 300x400pt
pub fn pdf_with_pages(pages: usize) -> Vec<u8> {
    pdf_with_page_sizes(&vec![(300, 400); pages])
}

pub fn test_config() -> Config {
    let mut config = Config::default();
    config.storage.backend = BlobBackend::Memory;
    config
}

/// Application state over an in-memory blob store and the real MuPDF engine
pub fn test_state() -> (AppState, MemoryBlobStore) {
    let store = MemoryBlobStore::new();
    let state = AppState::with_engine(test_config(), Arc::new(store.clone()), Arc::new(MupdfEngine::new()));
    (state, store)
}

/// A pixel carries the watermark tint (red over white or over content)
pub fn is_tinted(px: &image::Rgba<u8>) -> bool {
    px.0[0] > px.0[1] && px.0[0] > px.0[2]
}
