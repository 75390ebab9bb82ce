//! Core traits for ragdoc components.
//!
//! - [`ContentExtractor`]: Load a file into documents
//! - [`Chunker`]: Split text into chunks
//! - [`Embedder`]: Generate vector embeddings
//! - [`VectorStore`]: Store and search vectors
//! - [`LanguageModel`]: Complete a prompt

use async_trait::async_trait;
use std::path::Path;

use crate::error::{ChunkError, EmbedError, ExtractError, LlmError, StoreError};
use crate::types::{
    Chunk, ChunkConfig, Document, EmbeddingConfig, EmbeddingOutput, GenerationConfig,
    SearchQuery, SearchResult, StoreStats,
};

// ============================================================================
// Loading
// ============================================================================

/// Trait for reading a file into documents.
#[async_trait]
pub trait ContentExtractor: Send + Sync {
    /// Check if extractor can handle based on file extension.
    fn can_extract_by_extension(&self, path: &Path) -> bool;

    /// Load a file. Each returned document carries a `source` metadata entry.
    async fn extract(&self, path: &Path) -> Result<Vec<Document>, ExtractError>;

    /// Load in-memory bytes, recording `source` as their origin.
    async fn extract_bytes(
        &self,
        _data: &[u8],
        _source: &str,
    ) -> Result<Vec<Document>, ExtractError> {
        Err(ExtractError::UnsupportedType(
            "byte extraction not supported".to_string(),
        ))
    }
}

// ============================================================================
// Splitting
// ============================================================================

/// Trait for splitting text into chunks.
#[async_trait]
pub trait Chunker: Send + Sync {
    /// Name of this splitting strategy.
    fn name(&self) -> &str;

    /// Split a text into chunks no longer than `config.chunk_size` characters.
    async fn split_text(&self, text: &str, config: &ChunkConfig)
    -> Result<Vec<String>, ChunkError>;
}

// ============================================================================
// Embedding
// ============================================================================

/// Trait for generating embeddings.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Model name/identifier.
    fn model_name(&self) -> &str;

    /// Embedding dimension.
    fn dimension(&self) -> usize;

    /// Maximum tokens per input.
    fn max_tokens(&self) -> usize;

    /// Embed text content.
    async fn embed_text(
        &self,
        texts: &[&str],
        config: &EmbeddingConfig,
    ) -> Result<Vec<EmbeddingOutput>, EmbedError>;

    /// Embed a query, prefixed with `config.instruction` when set.
    async fn embed_query(
        &self,
        query: &str,
        config: &EmbeddingConfig,
    ) -> Result<EmbeddingOutput, EmbedError> {
        let text = match &config.instruction {
            Some(instruction) => format!("{instruction}{query}"),
            None => query.to_string(),
        };
        let results = self.embed_text(&[text.as_str()], config).await?;
        results
            .into_iter()
            .next()
            .ok_or_else(|| EmbedError::Inference("empty embedding result".to_string()))
    }
}

// ============================================================================
// Vector Storage
// ============================================================================

/// Trait for vector storage and search.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Initialize the store.
    async fn init(&self) -> Result<(), StoreError>;

    /// Insert or update chunks. Every chunk must carry an embedding.
    async fn upsert_chunks(&self, chunks: &[Chunk]) -> Result<(), StoreError>;

    /// Search for similar chunks.
    async fn search(&self, query: SearchQuery) -> Result<Vec<SearchResult>, StoreError>;

    /// Remove every chunk.
    async fn clear(&self) -> Result<(), StoreError>;

    /// Get store statistics.
    async fn stats(&self) -> Result<StoreStats, StoreError>;
}

// ============================================================================
// Generation
// ============================================================================

/// Trait for a text-completion language model.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Model name/identifier.
    fn model_name(&self) -> &str;

    /// Send a filled prompt and return the model's text response.
    async fn generate(&self, prompt: &str, config: &GenerationConfig)
    -> Result<String, LlmError>;
}
