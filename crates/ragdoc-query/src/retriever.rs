//! Similarity retrieval over the session index.

use ragdoc_core::{
    DistanceMetric, Embedder, EmbeddingConfig, Error, SearchQuery, SearchResult, VectorStore,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

/// Retrieval parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrieverConfig {
    /// Maximum chunks returned per question
    pub k: usize,
    /// Minimum relevance a chunk needs to be returned
    pub score_threshold: f32,
    /// How relevance is computed
    pub metric: DistanceMetric,
}

impl Default for RetrieverConfig {
    fn default() -> Self {
        Self {
            k: 3,
            score_threshold: 0.5,
            metric: DistanceMetric::L2,
        }
    }
}

/// Embeds a question and fetches the most relevant chunks.
pub struct Retriever {
    /// Vector store
    store: Arc<dyn VectorStore>,
    /// Embedder for query embedding
    embedder: Arc<dyn Embedder>,
    /// Options passed to the embedder
    embedding_config: EmbeddingConfig,
    config: RetrieverConfig,
}

impl Retriever {
    /// Create a retriever over `store`.
    pub fn new(
        store: Arc<dyn VectorStore>,
        embedder: Arc<dyn Embedder>,
        config: RetrieverConfig,
    ) -> Self {
        Self {
            store,
            embedder,
            embedding_config: EmbeddingConfig::default(),
            config,
        }
    }

    /// Use the given embedding options for queries.
    #[must_use]
    pub fn with_embedding_config(mut self, embedding_config: EmbeddingConfig) -> Self {
        self.embedding_config = embedding_config;
        self
    }

    /// Retrieval parameters in use.
    #[must_use]
    pub fn config(&self) -> &RetrieverConfig {
        &self.config
    }

    /// Up to `k` chunks scoring at least `score_threshold`, best first.
    pub async fn retrieve(&self, query: &str) -> Result<Vec<SearchResult>, Error> {
        debug!("Retrieving for query: {}", query);

        let embedding = self
            .embedder
            .embed_query(query, &self.embedding_config)
            .await?;

        let results = self
            .store
            .search(SearchQuery {
                embedding: embedding.embedding,
                limit: self.config.k,
                score_threshold: Some(self.config.score_threshold),
                metric: self.config.metric,
            })
            .await?;

        if results.is_empty() {
            warn!(
                "No relevant chunks were retrieved using the relevance score threshold {}",
                self.config.score_threshold
            );
        } else {
            debug!("Retrieved {} chunks", results.len());
        }

        Ok(results)
    }
}

/// Join chunk texts with a blank line. Empty when there are no results.
#[must_use]
pub fn format_context(results: &[SearchResult]) -> String {
    results
        .iter()
        .map(|result| result.content.as_str())
        .collect::<Vec<_>>()
        .join("\n\n")
}
