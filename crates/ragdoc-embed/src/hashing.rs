//! Feature-hashing embedder.
//!
//! Maps each lowercase word to a signed bucket chosen by its blake3 hash and
//! sums the buckets. No model files are needed and the output is fully
//! deterministic, which makes it a fit for offline runs and tests. Texts that
//! share words land close together; there is no notion of synonyms.

use async_trait::async_trait;
use ragdoc_core::{EmbedError, Embedder, EmbeddingConfig, EmbeddingOutput};

/// Default number of buckets, matching the transformer embedder.
const DEFAULT_DIMENSION: usize = 384;

/// Deterministic bag-of-words embedder.
pub struct HashingEmbedder {
    dimension: usize,
}

impl HashingEmbedder {
    /// Create a hashing embedder with 384 buckets.
    #[must_use]
    pub fn new() -> Self {
        Self::with_dimension(DEFAULT_DIMENSION)
    }

    /// Create a hashing embedder with a custom number of buckets.
    #[must_use]
    pub fn with_dimension(dimension: usize) -> Self {
        Self {
            dimension: dimension.max(1),
        }
    }

    fn embed_one(&self, text: &str, normalize: bool) -> EmbeddingOutput {
        let mut embedding = vec![0.0f32; self.dimension];
        let mut token_count = 0;

        for token in tokenize(text) {
            let hash = blake3::hash(token.as_bytes());
            let bytes = hash.as_bytes();
            let mut index_bytes = [0u8; 8];
            index_bytes.copy_from_slice(&bytes[..8]);
            let bucket = (u64::from_le_bytes(index_bytes) % self.dimension as u64) as usize;
            let sign = if bytes[8] & 1 == 0 { 1.0 } else { -1.0 };

            embedding[bucket] += sign;
            token_count += 1;
        }

        if normalize {
            let norm = embedding.iter().map(|v| v * v).sum::<f32>().sqrt();
            if norm > 0.0 {
                for value in &mut embedding {
                    *value /= norm;
                }
            }
        }

        EmbeddingOutput {
            embedding,
            token_count,
        }
    }
}

impl Default for HashingEmbedder {
    fn default() -> Self {
        Self::new()
    }
}

/// Lowercased alphanumeric runs.
fn tokenize(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|word| !word.is_empty())
        .map(str::to_lowercase)
}

#[async_trait]
impl Embedder for HashingEmbedder {
    fn model_name(&self) -> &str {
        "hashing"
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn max_tokens(&self) -> usize {
        usize::MAX
    }

    async fn embed_text(
        &self,
        texts: &[&str],
        config: &EmbeddingConfig,
    ) -> Result<Vec<EmbeddingOutput>, EmbedError> {
        Ok(texts
            .iter()
            .map(|text| self.embed_one(text, config.normalize))
            .collect())
    }
}
