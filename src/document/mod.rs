//! Document loading and caching
//!
//! - [`BlobDocumentLoader`] turns a [`DocumentHandle`](crate::storage::DocumentHandle)
//!   into a parsed [`DocumentModel`]
//! - [`CacheService`] keeps parsed documents warm between page requests
//! - [`DocumentIngest`] stores new uploads and counts their pages

mod cache;
mod error;
mod ingest;
mod loader;
mod traits;
mod types;

pub use cache::{CacheConfig, CacheService, CacheStats};
pub use error::{DocumentError, DocumentResult};
pub use ingest::{DocumentIngest, IngestedDocument};
pub use loader::BlobDocumentLoader;
pub use traits::{DocumentLoader, DocumentModel, PdfEngine};
pub use types::{PageNumber, PageNumberError, PageSize};
