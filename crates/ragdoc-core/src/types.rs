//! Core types for ragdoc.
//!
//! ## Documents
//! - [`Document`]: Text loaded from a file, with its metadata
//! - [`MetadataValue`]: A metadata value (scalar or nested)
//!
//! ## Chunks
//! - [`Chunk`]: A segment of a document, the unit of retrieval
//! - [`ChunkConfig`]: Splitter configuration
//!
//! ## Embeddings
//! - [`EmbeddingConfig`]: Configuration for embedding generation
//! - [`EmbeddingOutput`]: Result of embedding a text
//!
//! ## Search
//! - [`SearchQuery`]: Parameters for a similarity search
//! - [`SearchResult`]: A matching chunk with relevance score
//! - [`DistanceMetric`]: How relevance is computed
//!
//! ## Generation
//! - [`GenerationConfig`]: Sampling options passed to the language model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

// ============================================================================
// Documents
// ============================================================================

/// A metadata value attached to a document or chunk.
///
/// Loaders may produce nested values; only the scalar variants can be stored
/// in the index (see [`MetadataValue::is_scalar`]).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetadataValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    List(Vec<MetadataValue>),
    Map(BTreeMap<String, MetadataValue>),
}

impl MetadataValue {
    /// Whether the value is a string, integer, float or boolean.
    #[must_use]
    pub fn is_scalar(&self) -> bool {
        matches!(
            self,
            Self::Bool(_) | Self::Int(_) | Self::Float(_) | Self::String(_)
        )
    }

    /// The string payload, if this is a string.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// The integer payload, if this is an integer.
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }
}

impl std::fmt::Display for MetadataValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Null => write!(f, "null"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::String(s) => write!(f, "{s}"),
            other => match serde_json::to_string(other) {
                Ok(json) => write!(f, "{json}"),
                Err(_) => Err(std::fmt::Error),
            },
        }
    }
}

impl From<&str> for MetadataValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for MetadataValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<i64> for MetadataValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<u32> for MetadataValue {
    fn from(value: u32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<f64> for MetadataValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<bool> for MetadataValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

/// Metadata keys mapped to values.
pub type Metadata = BTreeMap<String, MetadataValue>;

/// A loaded document: one whole text file, or one PDF page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// The text content
    pub page_content: String,
    /// Source path, page number, and anything else the loader knows
    #[serde(default)]
    pub metadata: Metadata,
}

impl Document {
    /// Create a document with the given content and metadata.
    pub fn new(page_content: impl Into<String>, metadata: Metadata) -> Self {
        Self {
            page_content: page_content.into(),
            metadata,
        }
    }

    /// The `source` metadata entry, if present.
    #[must_use]
    pub fn source(&self) -> Option<&str> {
        self.metadata.get("source").and_then(MetadataValue::as_str)
    }
}

// ============================================================================
// Chunks
// ============================================================================

/// A chunk of a document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chunk {
    /// Unique chunk identifier
    pub id: Uuid,
    /// The chunk text
    pub content: String,
    /// Position among the chunks of its document (0-indexed)
    pub chunk_index: u32,
    /// Metadata inherited from the source document
    pub metadata: Metadata,
    /// Embedding vector (if computed)
    pub embedding: Option<Vec<f32>>,
}

impl Chunk {
    /// Create an un-embedded chunk.
    pub fn new(content: impl Into<String>, chunk_index: u32, metadata: Metadata) -> Self {
        Self {
            id: Uuid::new_v4(),
            content: content.into(),
            chunk_index,
            metadata,
            embedding: None,
        }
    }
}

/// Configuration for the text splitter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkConfig {
    /// Maximum chunk length in characters
    pub chunk_size: usize,
    /// Characters carried over between consecutive chunks
    pub chunk_overlap: usize,
    /// Separators tried in order, coarsest first
    pub separators: Vec<String>,
}

impl Default for ChunkConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1024,
            chunk_overlap: 100,
            separators: vec![
                "\n\n".to_string(),
                "\n".to_string(),
                " ".to_string(),
                String::new(),
            ],
        }
    }
}

// ============================================================================
// Embedding
// ============================================================================

/// Configuration for embedding.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// Normalize embeddings to unit length
    pub normalize: bool,
    /// Instruction prefix applied to queries, for models that use one
    pub instruction: Option<String>,
    /// Batch size for processing
    pub batch_size: usize,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            normalize: true,
            instruction: None,
            batch_size: 32,
        }
    }
}

/// Output from embedding.
#[derive(Debug, Clone)]
pub struct EmbeddingOutput {
    /// The embedding vector
    pub embedding: Vec<f32>,
    /// Number of tokens in input
    pub token_count: usize,
}

// ============================================================================
// Search
// ============================================================================

/// How the relevance of a stored vector to a query vector is scored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DistanceMetric {
    /// Cosine similarity
    Cosine,
    /// `1 - d / sqrt(2)` where `d` is the squared euclidean distance
    #[default]
    L2,
    /// Raw inner product
    Dot,
}

/// A similarity search.
#[derive(Debug, Clone)]
pub struct SearchQuery {
    /// Query embedding
    pub embedding: Vec<f32>,
    /// Maximum results to return
    pub limit: usize,
    /// Minimum relevance score for a result to be kept
    pub score_threshold: Option<f32>,
    /// Relevance metric
    pub metric: DistanceMetric,
}

/// A search result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    /// Chunk ID
    pub chunk_id: Uuid,
    /// Chunk content
    pub content: String,
    /// Relevance score
    pub score: f32,
    /// Chunk metadata
    pub metadata: Metadata,
}

/// Vector store statistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreStats {
    /// Total number of chunks
    pub total_chunks: u64,
    /// Embedding dimension
    pub dimension: usize,
    /// Last update time
    pub last_updated: Option<DateTime<Utc>>,
}

// ============================================================================
// Generation
// ============================================================================

/// Sampling options for the language model. `None` leaves the server default.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// Sampling temperature
    pub temperature: Option<f32>,
    /// Maximum tokens to generate
    pub max_tokens: Option<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    // ==================== MetadataValue Tests ====================

    #[test]
    fn test_metadata_value_is_scalar() {
        assert!(MetadataValue::from("a.txt").is_scalar());
        assert!(MetadataValue::from(3_i64).is_scalar());
        assert!(MetadataValue::from(0.5).is_scalar());
        assert!(MetadataValue::from(true).is_scalar());
        assert!(!MetadataValue::Null.is_scalar());
        assert!(!MetadataValue::List(vec![]).is_scalar());
        assert!(!MetadataValue::Map(BTreeMap::new()).is_scalar());
    }

    #[test]
    fn test_metadata_value_deserialize_untagged() {
        let json = r#"{"source":"doc.pdf","page":2,"score":0.25,"ok":true,"tags":["a"],"none":null}"#;
        let meta: Metadata = serde_json::from_str(json).unwrap();

        assert_eq!(meta["source"], MetadataValue::String("doc.pdf".to_string()));
        assert_eq!(meta["page"], MetadataValue::Int(2));
        assert_eq!(meta["score"], MetadataValue::Float(0.25));
        assert_eq!(meta["ok"], MetadataValue::Bool(true));
        assert!(matches!(meta["tags"], MetadataValue::List(_)));
        assert_eq!(meta["none"], MetadataValue::Null);
    }

    #[test]
    fn test_metadata_value_serialize_untagged() {
        let mut meta = Metadata::new();
        meta.insert("page".to_string(), 4_u32.into());
        meta.insert("source".to_string(), "a.txt".into());
        let json = serde_json::to_string(&meta).unwrap();
        assert_eq!(json, r#"{"page":4,"source":"a.txt"}"#);
    }

    #[test]
    fn test_metadata_value_display() {
        assert_eq!(MetadataValue::from("x").to_string(), "x");
        assert_eq!(MetadataValue::from(7_i64).to_string(), "7");
        assert_eq!(
            MetadataValue::List(vec![1_i64.into(), 2_i64.into()]).to_string(),
            "[1,2]"
        );
    }

    // ==================== Document Tests ====================

    #[test]
    fn test_document_source() {
        let mut meta = Metadata::new();
        meta.insert("source".to_string(), "/tmp/notes.txt".into());
        let doc = Document::new("hello", meta);
        assert_eq!(doc.source(), Some("/tmp/notes.txt"));

        let doc = Document::new("hello", Metadata::new());
        assert_eq!(doc.source(), None);
    }

    #[test]
    fn test_document_serialization() {
        let mut meta = Metadata::new();
        meta.insert("page".to_string(), 0_i64.into());
        let doc = Document::new("page text", meta);

        let json = serde_json::to_string(&doc).unwrap();
        let back: Document = serde_json::from_str(&json).unwrap();
        assert_eq!(doc, back);
    }

    // ==================== Chunk Tests ====================

    #[test]
    fn test_chunk_new_has_no_embedding() {
        let chunk = Chunk::new("text", 3, Metadata::new());
        assert_eq!(chunk.chunk_index, 3);
        assert!(chunk.embedding.is_none());
        assert_ne!(chunk.id, Chunk::new("text", 3, Metadata::new()).id);
    }

    // ==================== ChunkConfig Tests ====================

    #[test]
    fn test_chunk_config_default() {
        let config = ChunkConfig::default();
        assert_eq!(config.chunk_size, 1024);
        assert_eq!(config.chunk_overlap, 100);
        assert_eq!(config.separators, vec!["\n\n", "\n", " ", ""]);
    }

    // ==================== EmbeddingConfig Tests ====================

    #[test]
    fn test_embedding_config_default() {
        let config = EmbeddingConfig::default();
        assert!(config.normalize);
        assert!(config.instruction.is_none());
        assert_eq!(config.batch_size, 32);
    }

    // ==================== DistanceMetric Tests ====================

    #[test]
    fn test_distance_metric_default() {
        assert_eq!(DistanceMetric::default(), DistanceMetric::L2);
    }

    #[test]
    fn test_distance_metric_serialization() {
        assert_eq!(
            serde_json::to_string(&DistanceMetric::Cosine).unwrap(),
            "\"cosine\""
        );
        assert_eq!(serde_json::to_string(&DistanceMetric::L2).unwrap(), "\"l2\"");
        let metric: DistanceMetric = serde_json::from_str("\"dot\"").unwrap();
        assert_eq!(metric, DistanceMetric::Dot);
    }

    // ==================== GenerationConfig Tests ====================

    #[test]
    fn test_generation_config_default_leaves_server_defaults() {
        let config = GenerationConfig::default();
        assert!(config.temperature.is_none());
        assert!(config.max_tokens.is_none());
    }
}
