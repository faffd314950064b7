//! StudyVault Page Server Library
//!
//! Serves uploaded PDFs as watermarked page images, never as the original
//! file. The main server binary is in main.rs.
//!
//! # Modules
//!
//! - `storage`: Blob store adapters (HTTP, S3, in-memory)
//! - `document`: Loading, caching and ingesting parsed documents
//! - `render`: Rasterization, watermarking and PNG encoding
//! - `pipeline`: Page request orchestration
//! - `routes`: axum HTTP boundary

pub mod config;
pub mod document;
pub mod error;
pub mod pipeline;
pub mod render;
pub mod routes;
pub mod state;
pub mod storage;

mod mupdf;

pub use mupdf::{MupdfDocument, MupdfEngine};
