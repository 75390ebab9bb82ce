//! # ragdoc-extract
//!
//! Document loading for the ragdoc ingest pipeline.
//!
//! This crate reads files (or downloads URLs) and produces
//! [`Document`](ragdoc_core::Document)s for downstream splitting and embedding.
//!
//! ## Supported Formats
//!
//! | Extractor | Formats | Documents produced |
//! |-----------|---------|--------------------|
//! | [`TextExtractor`] | anything that is not a PDF, decoded as UTF-8 | one per file |
//! | [`PdfExtractor`] | `.pdf` | one per page |
//!
//! ## Usage
//!
//! ```rust,ignore
//! use ragdoc_extract::DocumentLoader;
//!
//! let loader = DocumentLoader::new();
//! let docs = loader.load("manual.pdf").await?;
//! println!("Loaded {} pages", docs.len());
//! ```

pub mod loader;
pub mod pdf;
pub mod text;

pub use loader::{DocumentLoader, is_pdf, is_url};
pub use pdf::PdfExtractor;
pub use text::TextExtractor;
