//! End-to-end page pipeline tests against the real MuPDF engine

mod common;

use std::sync::Arc;

use futures::future::join_all;
use studyvault_server::error::ErrorKind;
use studyvault_server::pipeline::PageRequest;
use studyvault_server::storage::DocumentHandle;

use common::{is_tinted, pdf_with_page_sizes, pdf_with_pages, test_state};

fn request(handle: &DocumentHandle, page: &str, declared: u32) -> PageRequest {
    PageRequest {
        handle: handle.clone(),
        page: page.to_string(),
        declared_page_count: declared,
        session: None,
    }
}

#[tokio::test]
async fn test_three_page_document_scenario() {
    let (state, store) = test_state();

    let doc = state.ingest().ingest(pdf_with_pages(3), "anatomy.pdf").await.unwrap();
    assert_eq!(doc.page_count, 3);

    // Page 1 renders at twice the natural 300x400pt size
    let page = state.pages().render_page(request(&doc.handle, "1", 3)).await.unwrap();
    assert_eq!(page.content_type, "image/png");
    assert_eq!((page.width, page.height), (600, 800));
    let image = image::load_from_memory(&page.data).unwrap().to_rgba8();
    assert_eq!(image.dimensions(), (600, 800));
    assert_eq!(store.fetch_count(), 1);

    let err = state.pages().render_page(request(&doc.handle, "4", 3)).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::PageOutOfRange);

    let err = state.pages().render_page(request(&doc.handle, "abc", 3)).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidPageNumber);

    // Page 2 twice within the TTL is served from the parsed-document cache
    state.pages().render_page(request(&doc.handle, "2", 3)).await.unwrap();
    state.pages().render_page(request(&doc.handle, "2", 3)).await.unwrap();
    assert_eq!(store.fetch_count(), 1);
}

#[tokio::test]
async fn test_page_content_survives_watermark() {
    let (state, _) = test_state();
    let doc = state.ingest().ingest(pdf_with_pages(1), "a.pdf").await.unwrap();

    let page = state.pages().render_page(request(&doc.handle, "1", 1)).await.unwrap();
    let image = image::load_from_memory(&page.data).unwrap().to_rgba8();

    // Square spans 20..120pt from the bottom-left; at 2x that is x 40..240, y 560..760
    let inside = image.get_pixel(140, 660).0;
    assert!(inside[0] < 80 && inside[1] < 80 && inside[2] < 80, "square missing: {:?}", inside);
}

#[tokio::test]
async fn test_watermark_reaches_every_quadrant() {
    let (state, _) = test_state();
    let doc = state
        .ingest()
        .ingest(pdf_with_page_sizes(&[(612, 792), (842, 595)]), "mixed.pdf")
        .await
        .unwrap();

    for number in ["1", "2"] {
        let page = state
            .pages()
            .render_page(PageRequest {
                session: Some("viewer-session".into()),
                ..request(&doc.handle, number, 2)
            })
            .await
            .unwrap();
        let image = image::load_from_memory(&page.data).unwrap().to_rgba8();
        let (w, h) = image.dimensions();

        for (x0, y0) in [(0, 0), (w / 2, 0), (0, h / 2), (w / 2, h / 2)] {
            let tinted = (y0..y0 + h / 2)
                .flat_map(|y| (x0..x0 + w / 2).map(move |x| (x, y)))
                .filter(|&(x, y)| is_tinted(image.get_pixel(x, y)))
                .count();
            assert!(tinted > 0, "page {} quadrant at ({}, {}) has no watermark", number, x0, y0);
        }
    }
}

#[tokio::test]
async fn test_unknown_page_count_attempts_render() {
    let (state, _) = test_state();
    let doc = state.ingest().ingest(pdf_with_pages(3), "a.pdf").await.unwrap();

    let err = state.pages().render_page(request(&doc.handle, "500", 0)).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::RenderFailed);

    // The document stays usable for valid pages
    state.pages().render_page(request(&doc.handle, "3", 0)).await.unwrap();
}

#[tokio::test]
async fn test_bad_documents() {
    let (state, store) = test_state();

    let junk = store.insert("mem://junk.pdf", b"this is not a pdf".to_vec());
    let err = state.pages().render_page(request(&junk, "1", 0)).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ParseFailed);
    assert!(!state.cache().contains(&junk));

    let missing = DocumentHandle::from("mem://missing.pdf");
    let err = state.pages().render_page(request(&missing, "1", 0)).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::DocumentNotFound);
}

#[tokio::test]
async fn test_concurrent_first_requests_fetch_once() {
    let (state, store) = test_state();
    let handle = store.insert("mem://shared.pdf", pdf_with_pages(4));
    let state = Arc::new(state);

    let renders = (1..=8).map(|i| {
        let state = state.clone();
        let handle = handle.clone();
        async move {
            let page = ((i % 4) + 1).to_string();
            state.pages().render_page(request(&handle, &page, 4)).await
        }
    });

    for result in join_all(renders).await {
        result.unwrap();
    }
    assert_eq!(store.fetch_count(), 1);
    assert_eq!(state.cache().len(), 1);
}
