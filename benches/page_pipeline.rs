//! Page Pipeline Benchmarks
//!
//! CPU cost of the per-request work after a document is cached: rasterizing
//! a page, compositing the watermark and encoding the PNG.
//!
//! Run with: `cargo bench --bench page_pipeline`

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use std::time::Duration;

use chrono::NaiveDate;
use studyvault_server::config::WatermarkConfig;
use studyvault_server::document::{PageNumber, PdfEngine};
use studyvault_server::render::{encode_png, GlyphSource, PageRasterizer, RenderSurface, WatermarkCompositor, WatermarkSpec};
use studyvault_server::MupdfEngine;

/// One US Letter page with a filled rectangle
fn create_letter_pdf() -> Vec<u8> {
    let content = "0 0 0 rg 72 72 200 200 re f";
    let objects = [
        "<< /Type /Catalog /Pages 2 0 R >>".to_string(),
        "<< /Type /Pages /Kids [3 0 R] /Count 1 >>".to_string(),
        "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] /Contents 4 0 R /Resources << >> >>".to_string(),
        format!("<< /Length {} >>\nstream\n{}\nendstream", content.len(), content),
    ];

    let mut pdf = String::from("%PDF-1.4\n");
    let mut offsets = Vec::new();
    for (i, body) in objects.iter().enumerate() {
        offsets.push(pdf.len());
        pdf.push_str(&format!("{} 0 obj\n{}\nendobj\n", i + 1, body));
    }
    let xref = pdf.len();
    pdf.push_str(&format!("xref\n0 {}\n0000000000 65535 f \n", objects.len() + 1));
    for offset in offsets {
        pdf.push_str(&format!("{:010} 00000 n \n", offset));
    }
    pdf.push_str(&format!(
        "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{}\n%%EOF\n",
        objects.len() + 1,
        xref
    ));
    pdf.into_bytes()
}

fn spec() -> WatermarkSpec {
    let date = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap_or_default();
    WatermarkSpec::for_render(&WatermarkConfig::default(), date, Some("bench-session"))
}

/// Benchmark watermark compositing at the default 2x letter size
fn bench_watermark(c: &mut Criterion) {
    let mut group = c.benchmark_group("watermark");
    group.measurement_time(Duration::from_secs(10));
    group.sample_size(30);

    let spec = spec();
    for (name, glyphs) in [("bitmap", GlyphSource::Bitmap), ("system_font", GlyphSource::load(None))] {
        let compositor = WatermarkCompositor::new(glyphs);
        group.bench_with_input(BenchmarkId::new("apply_1224x1584", name), &compositor, |b, compositor| {
            b.iter(|| {
                let mut surface = RenderSurface::new(1224, 1584);
                compositor.apply(&mut surface, black_box(&spec));
                black_box(surface)
            })
        });
    }

    group.finish();
}

/// Benchmark PNG encoding of a watermarked page
fn bench_encode(c: &mut Criterion) {
    let mut group = c.benchmark_group("encode");
    group.measurement_time(Duration::from_secs(10));
    group.sample_size(20);

    let compositor = WatermarkCompositor::new(GlyphSource::Bitmap);
    let mut page = RenderSurface::new(1224, 1584);
    compositor.apply(&mut page, &spec());

    group.bench_function("png_1224x1584", |b| {
        b.iter(|| black_box(encode_png(page.clone())))
    });

    group.finish();
}

/// Benchmark the full render → watermark → encode job
fn bench_full_page(c: &mut Criterion) {
    let mut group = c.benchmark_group("full_page");
    group.measurement_time(Duration::from_secs(15));
    group.sample_size(20);

    let doc = MupdfEngine::new().parse(create_letter_pdf()).unwrap();
    let rasterizer = PageRasterizer::default();
    let compositor = WatermarkCompositor::new(GlyphSource::Bitmap);
    let spec = spec();
    let page = PageNumber::new(1).unwrap();

    group.bench_function("letter_2x", |b| {
        b.iter(|| {
            let mut surface = rasterizer.render(doc.as_ref(), black_box(page)).unwrap();
            compositor.apply(&mut surface, &spec);
            black_box(encode_png(surface).unwrap())
        })
    });

    group.finish();
}

criterion_group!(benches, bench_watermark, bench_encode, bench_full_page);
criterion_main!(benches);
