//! Error types for ragdoc.

use thiserror::Error;

/// Main error type for ragdoc operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Document loading failed
    #[error("extraction error: {0}")]
    Extraction(#[from] ExtractError),

    /// Splitting failed
    #[error("chunking error: {0}")]
    Chunking(#[from] ChunkError),

    /// Embedding generation failed
    #[error("embedding error: {0}")]
    Embedding(#[from] EmbedError),

    /// Vector store operation failed
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Language model call failed
    #[error("generation error: {0}")]
    Generation(#[from] LlmError),

    /// I/O error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration error
    #[error("config error: {0}")]
    Config(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

/// Document loading errors.
#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("unsupported file type: {0}")]
    UnsupportedType(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("extraction failed: {0}")]
    Failed(String),
}

/// Splitting errors.
#[derive(Error, Debug)]
pub enum ChunkError {
    #[error("chunking failed: {0}")]
    Failed(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Embedding errors.
#[derive(Error, Debug)]
pub enum EmbedError {
    #[error("model loading failed: {0}")]
    ModelLoad(String),

    #[error("inference failed: {0}")]
    Inference(String),

    #[error("input too long: {tokens} tokens, max {max}")]
    InputTooLong { tokens: usize, max: usize },
}

/// Vector store errors.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("store initialization failed: {0}")]
    Init(String),

    #[error("insert failed: {0}")]
    Insert(String),

    #[error("query failed: {0}")]
    Query(String),
}

/// Language model errors.
#[derive(Error, Debug)]
pub enum LlmError {
    #[error("http error: {0}")]
    Http(String),

    #[error("api error {status}: {body}")]
    Api { status: u16, body: String },

    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

/// Result type alias for ragdoc operations.
pub type Result<T> = std::result::Result<T, Error>;
