//! # ragdoc-core
//!
//! Core types and traits for ragdoc, a retrieval-augmented question answering
//! tool over a single text or PDF document.
//!
//! This crate provides the foundational abstractions used throughout ragdoc:
//!
//! - **Loading**: [`ContentExtractor`] trait for reading files into [`Document`]s
//! - **Splitting**: [`Chunker`] trait for breaking text into overlapping chunks
//! - **Embedding**: [`Embedder`] trait for converting text to vector embeddings
//! - **Indexing**: [`VectorStore`] trait for storing and searching embeddings
//! - **Generation**: [`LanguageModel`] trait for completing a filled prompt
//!
//! ## Architecture
//!
//! ```text
//! File → ContentExtractor → Chunker → Embedder → VectorStore
//!                                                    ↓
//!                        question → SearchQuery → SearchResult → prompt → LanguageModel
//! ```
//!
//! ## Key Types
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Document`] | Raw text plus scalar metadata, produced by a loader |
//! | [`Chunk`] | A bounded slice of a document, with its embedding |
//! | [`MetadataValue`] | A metadata value; only scalars survive indexing |
//! | [`SearchQuery`] | Parameters for a similarity search |
//! | [`SearchResult`] | A matching chunk with its relevance score |
//!
//! ## Related Crates
//!
//! - `ragdoc-extract`: text and PDF loaders
//! - `ragdoc-chunker`: recursive character splitter
//! - `ragdoc-embed`: Candle and hashing embedders
//! - `ragdoc-store`: in-memory vector index
//! - `ragdoc-query`: retriever and prompt template
//! - `ragdoc-llm`: Ollama client
//! - `ragdoc-chat`: the ingest / ask / clear session

pub mod error;
pub mod traits;
pub mod types;

pub use error::{ChunkError, EmbedError, Error, ExtractError, LlmError, Result, StoreError};
pub use traits::*;
pub use types::*;
