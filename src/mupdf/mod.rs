//! MuPDF engine
//!
//! The only place that touches the `mupdf` crate. Everything else works
//! against [`crate::document::DocumentModel`].

mod safe;

pub use safe::{MupdfDocument, MupdfEngine};
