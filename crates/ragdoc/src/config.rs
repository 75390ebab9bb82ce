//! Configuration handling for ragdoc.
//!
//! Settings are read from `config.toml` in the XDG config directory. Every
//! field has a default, so a missing file or a partial file is fine.

use anyhow::{Context, Result};
use directories::ProjectDirs;
use ragdoc_chat::SessionConfig;
use ragdoc_core::{ChunkConfig, DistanceMetric, EmbeddingConfig, GenerationConfig};
use ragdoc_llm::{DEFAULT_BASE_URL, DEFAULT_MODEL, OllamaConfig};
use ragdoc_query::RetrieverConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration structure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Config {
    /// Splitter configuration
    #[serde(default)]
    pub chunking: ChunkingConfig,

    /// Retrieval configuration
    #[serde(default)]
    pub retrieval: RetrievalConfig,

    /// Embedding configuration
    #[serde(default)]
    pub embedding: EmbeddingSettings,

    /// Language model configuration
    #[serde(default)]
    pub llm: LlmConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Chunking-related configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkingConfig {
    /// Maximum chunk length (characters)
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Overlap between chunks (characters)
    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,
}

fn default_chunk_size() -> usize {
    1024
}

fn default_chunk_overlap() -> usize {
    100
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            chunk_overlap: default_chunk_overlap(),
        }
    }
}

/// Retrieval-related configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Chunks passed to the model per question
    #[serde(default = "default_k")]
    pub k: usize,

    /// Minimum relevance score for a chunk to be used
    #[serde(default = "default_score_threshold")]
    pub score_threshold: f32,

    /// Relevance metric (cosine, l2, dot)
    #[serde(default)]
    pub metric: DistanceMetric,
}

fn default_k() -> usize {
    3
}

fn default_score_threshold() -> f32 {
    0.5
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            k: default_k(),
            score_threshold: default_score_threshold(),
            metric: DistanceMetric::default(),
        }
    }
}

/// Which embedder to build.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingBackend {
    /// Transformer model run locally with Candle
    #[default]
    Candle,
    /// Feature hashing, no model download
    Hashing,
}

/// Embedding-related configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbeddingSettings {
    /// Embedder to use
    #[serde(default)]
    pub backend: EmbeddingBackend,

    /// Batch size for embedding
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Use GPU if available
    #[serde(default = "default_use_gpu")]
    pub use_gpu: bool,
}

fn default_batch_size() -> usize {
    32
}

fn default_use_gpu() -> bool {
    true
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            backend: EmbeddingBackend::default(),
            batch_size: default_batch_size(),
            use_gpu: default_use_gpu(),
        }
    }
}

/// Language model configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Ollama server URL (overridden by `OLLAMA_HOST`)
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Ollama model name
    #[serde(default = "default_model")]
    pub model: String,

    /// Sampling temperature (server default when unset)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_timeout_secs() -> u64 {
    300
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            model: default_model(),
            temperature: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

const SAMPLE_CONFIG: &str = r#"# ragdoc configuration

[chunking]
chunk_size = 1024
chunk_overlap = 100

[retrieval]
k = 3
score_threshold = 0.5
# cosine, l2 or dot
metric = "l2"

[embedding]
# candle (downloads BAAI/bge-small-en-v1.5 on first run) or hashing
backend = "candle"
batch_size = 32
use_gpu = true

[llm]
# OLLAMA_HOST takes precedence when set
base_url = "http://localhost:11434"
model = "llama3.1"
# temperature = 0.2
timeout_secs = 300

[logging]
level = "info"
"#;

impl Config {
    /// Load from the default config path. A missing file yields defaults.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load from `path`, or from the default path when `None`.
    ///
    /// An explicitly given path must exist.
    pub fn load_from(path: Option<PathBuf>) -> Result<Self> {
        match path {
            Some(path) => Self::read(&path),
            None => match Self::config_path() {
                Some(path) if path.exists() => Self::read(&path),
                _ => Ok(Self::default()),
            },
        }
    }

    fn read(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("Invalid config in {}", path.display()))
    }

    /// Parse TOML text.
    pub fn parse(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Path of the config file, if a config directory can be determined.
    pub fn config_path() -> Option<PathBuf> {
        config_dir().map(|dir| dir.join("config.toml"))
    }

    /// A commented config file listing every setting at its default.
    pub fn sample_toml() -> &'static str {
        SAMPLE_CONFIG
    }

    /// Settings for a chat session.
    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            chunk: ChunkConfig {
                chunk_size: self.chunking.chunk_size,
                chunk_overlap: self.chunking.chunk_overlap,
                ..ChunkConfig::default()
            },
            retrieval: RetrieverConfig {
                k: self.retrieval.k,
                score_threshold: self.retrieval.score_threshold,
                metric: self.retrieval.metric,
            },
            embedding: EmbeddingConfig {
                batch_size: self.embedding.batch_size,
                ..EmbeddingConfig::default()
            },
            generation: GenerationConfig {
                temperature: self.llm.temperature,
                max_tokens: None,
            },
        }
    }

    /// Ollama connection settings, with `OLLAMA_HOST` applied.
    pub fn ollama_config(&self) -> OllamaConfig {
        OllamaConfig {
            base_url: self.llm.base_url.clone(),
            model: self.llm.model.clone(),
            timeout_secs: self.llm.timeout_secs,
        }
        .with_env_override()
    }

    /// Parsed `logging.level`.
    pub fn log_level(&self) -> Result<tracing::Level> {
        self.logging.level.parse().map_err(|_| {
            anyhow::anyhow!(
                "invalid logging level {:?} (expected trace, debug, info, warn or error)",
                self.logging.level
            )
        })
    }
}

/// Get the XDG data directory for ragdoc.
pub fn data_dir() -> Option<PathBuf> {
    if let Ok(dir) = std::env::var("RAGDOC_DATA_DIR") {
        return Some(PathBuf::from(dir));
    }

    ProjectDirs::from("", "", "ragdoc").map(|dirs| dirs.data_dir().to_path_buf())
}

/// Get the XDG config directory for ragdoc.
pub fn config_dir() -> Option<PathBuf> {
    if let Ok(dir) = std::env::var("RAGDOC_CONFIG_DIR") {
        return Some(PathBuf::from(dir));
    }

    ProjectDirs::from("", "", "ragdoc").map(|dirs| dirs.config_dir().to_path_buf())
}
