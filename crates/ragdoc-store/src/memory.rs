//! In-memory vector store.
//!
//! Chunks live in insertion order, so equally scored results come back in
//! the order they were indexed. Search is a brute-force scan, which is plenty
//! for the chunks of a single document.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use ragdoc_core::{Chunk, SearchQuery, SearchResult, StoreError, StoreStats, VectorStore};
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use crate::metric::relevance;

#[derive(Default)]
struct Inner {
    chunks: Vec<Chunk>,
    positions: HashMap<Uuid, usize>,
    last_updated: Option<DateTime<Utc>>,
}

/// In-memory vector store.
///
/// # Example
///
/// ```rust
/// use ragdoc_store::MemoryStore;
/// use ragdoc_core::VectorStore;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let store = MemoryStore::new(384);
/// store.init().await?;
///
/// let stats = store.stats().await?;
/// assert_eq!(stats.total_chunks, 0);
/// # Ok(())
/// # }
/// ```
pub struct MemoryStore {
    dimension: usize,
    inner: RwLock<Inner>,
}

impl MemoryStore {
    /// Create a new in-memory store with the given embedding dimension.
    #[must_use]
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            inner: RwLock::new(Inner::default()),
        }
    }

    /// Embedding dimension every stored vector must have.
    #[must_use]
    pub fn dimension(&self) -> usize {
        self.dimension
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new(384)
    }
}

#[async_trait]
impl VectorStore for MemoryStore {
    async fn init(&self) -> Result<(), StoreError> {
        if self.dimension == 0 {
            return Err(StoreError::Init(
                "embedding dimension must be greater than zero".to_string(),
            ));
        }
        debug!("MemoryStore initialized (dimension: {})", self.dimension);
        Ok(())
    }

    async fn upsert_chunks(&self, chunks: &[Chunk]) -> Result<(), StoreError> {
        // Validate the whole batch before touching the index.
        for chunk in chunks {
            let embedding = chunk.embedding.as_ref().ok_or_else(|| {
                StoreError::Insert(format!("chunk {} has no embedding", chunk.id))
            })?;
            if embedding.len() != self.dimension {
                return Err(StoreError::Insert(format!(
                    "chunk {} has dimension {}, expected {}",
                    chunk.id,
                    embedding.len(),
                    self.dimension
                )));
            }
        }

        let mut inner = self.inner.write().await;
        for chunk in chunks {
            match inner.positions.get(&chunk.id).copied() {
                Some(position) => inner.chunks[position] = chunk.clone(),
                None => {
                    let position = inner.chunks.len();
                    inner.positions.insert(chunk.id, position);
                    inner.chunks.push(chunk.clone());
                }
            }
        }
        inner.last_updated = Some(Utc::now());

        debug!("Upserted {} chunks", chunks.len());
        Ok(())
    }

    async fn search(&self, query: SearchQuery) -> Result<Vec<SearchResult>, StoreError> {
        if query.embedding.len() != self.dimension {
            return Err(StoreError::Query(format!(
                "query has dimension {}, expected {}",
                query.embedding.len(),
                self.dimension
            )));
        }

        let inner = self.inner.read().await;
        let mut scored: Vec<(f32, &Chunk)> = inner
            .chunks
            .iter()
            .filter_map(|chunk| {
                chunk
                    .embedding
                    .as_ref()
                    .map(|embedding| (relevance(query.metric, &query.embedding, embedding), chunk))
            })
            .collect();

        // Stable sort keeps insertion order among ties
        scored.sort_by(|a, b| b.0.total_cmp(&a.0));

        let results: Vec<SearchResult> = scored
            .into_iter()
            .take(query.limit)
            .filter(|(score, _)| query.score_threshold.is_none_or(|threshold| *score >= threshold))
            .map(|(score, chunk)| SearchResult {
                chunk_id: chunk.id,
                content: chunk.content.clone(),
                score,
                metadata: chunk.metadata.clone(),
            })
            .collect();

        debug!(
            "Search returned {} results (limit {}, threshold {:?})",
            results.len(),
            query.limit,
            query.score_threshold
        );
        Ok(results)
    }

    async fn clear(&self) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        let removed = inner.chunks.len();
        inner.chunks.clear();
        inner.positions.clear();
        inner.last_updated = Some(Utc::now());
        debug!("Cleared {} chunks", removed);
        Ok(())
    }

    async fn stats(&self) -> Result<StoreStats, StoreError> {
        let inner = self.inner.read().await;
        Ok(StoreStats {
            total_chunks: inner.chunks.len() as u64,
            dimension: self.dimension,
            last_updated: inner.last_updated,
        })
    }
}
