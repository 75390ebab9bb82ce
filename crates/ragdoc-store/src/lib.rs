//! Vector storage layer for ragdoc.
//!
//! This crate provides the in-memory index behind a chat session,
//! implementing the [`VectorStore`](ragdoc_core::VectorStore) trait with a
//! brute-force scan.
//!
//! # Features
//!
//! - **Vector Search**: Exact top-k by cosine, L2 or dot-product relevance
//! - **Score Threshold**: Results below a minimum relevance are dropped
//! - **Metadata Filtering**: Strips values the index cannot hold
//!
//! # Example
//!
//! ```rust,ignore
//! use ragdoc_store::{MemoryStore, filter_complex_metadata};
//! use ragdoc_core::VectorStore;
//!
//! filter_complex_metadata(&mut chunks);
//!
//! let store = MemoryStore::new(384);
//! store.init().await?;
//! store.upsert_chunks(&chunks).await?;
//!
//! let results = store.search(query).await?;
//! ```

pub mod filter;
pub mod memory;
pub mod metric;

pub use filter::filter_complex_metadata;
pub use memory::MemoryStore;
pub use metric::relevance;
