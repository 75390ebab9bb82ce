//! BGE-small embedder using Candle.
//!
//! Uses BAAI/bge-small-en-v1.5 for text embeddings:
//! - 384 dimensions
//! - 512 max tokens
//! - BERT architecture, CLS pooling

use async_trait::async_trait;
use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::bert::{BertModel, Config};
use hf_hub::api::tokio::ApiBuilder;
use hf_hub::{Repo, RepoType};
use ragdoc_core::{EmbedError, Embedder, EmbeddingConfig, EmbeddingOutput};
use std::path::PathBuf;
use tokenizers::Tokenizer;
use tokio::sync::RwLock;
use tracing::{debug, info};

/// Model identifier on HuggingFace Hub.
const MODEL_ID: &str = "BAAI/bge-small-en-v1.5";

/// Embedding dimension for bge-small.
const EMBEDDING_DIM: usize = 384;

/// Maximum sequence length.
const MAX_TOKENS: usize = 512;

/// Tokenizer and weights, present once loaded.
struct LoadedModel {
    model: BertModel,
    tokenizer: Tokenizer,
}

/// BGE-small embedder using Candle.
pub struct CandleEmbedder {
    /// Device to run inference on (CPU or CUDA)
    device: Device,
    /// Where downloaded model files are kept
    cache_dir: PathBuf,
    /// Loaded on first use
    loaded: RwLock<Option<LoadedModel>>,
}

impl CandleEmbedder {
    /// Create an embedder that uses CUDA when available.
    pub fn new(cache_dir: PathBuf) -> Self {
        let device = Device::cuda_if_available(0).unwrap_or(Device::Cpu);
        info!("CandleEmbedder using device: {:?}", device);
        Self::with_device(cache_dir, device)
    }

    /// Create an embedder pinned to the CPU.
    pub fn cpu(cache_dir: PathBuf) -> Self {
        Self::with_device(cache_dir, Device::Cpu)
    }

    /// Create with specific device.
    pub fn with_device(cache_dir: PathBuf, device: Device) -> Self {
        Self {
            device,
            cache_dir,
            loaded: RwLock::new(None),
        }
    }

    /// Download the model files if needed and load them into memory.
    pub async fn init(&self) -> Result<(), EmbedError> {
        if self.loaded.read().await.is_some() {
            return Ok(());
        }

        let mut loaded = self.loaded.write().await;
        if loaded.is_some() {
            return Ok(());
        }

        info!("Initializing CandleEmbedder with model: {}", MODEL_ID);

        let api = ApiBuilder::new()
            .with_cache_dir(self.cache_dir.clone())
            .build()
            .map_err(|e| EmbedError::ModelLoad(format!("Failed to create HF API: {e}")))?;
        let repo = api.repo(Repo::new(MODEL_ID.to_string(), RepoType::Model));

        debug!("Fetching tokenizer...");
        let tokenizer_path = repo
            .get("tokenizer.json")
            .await
            .map_err(|e| EmbedError::ModelLoad(format!("Failed to download tokenizer: {e}")))?;

        debug!("Fetching config...");
        let config_path = repo
            .get("config.json")
            .await
            .map_err(|e| EmbedError::ModelLoad(format!("Failed to download config: {e}")))?;

        debug!("Fetching model weights...");
        let weights_path = repo
            .get("model.safetensors")
            .await
            .map_err(|e| EmbedError::ModelLoad(format!("Failed to download weights: {e}")))?;

        let tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| EmbedError::ModelLoad(format!("Failed to load tokenizer: {e}")))?;

        let config_str = tokio::fs::read_to_string(&config_path)
            .await
            .map_err(|e| EmbedError::ModelLoad(format!("Failed to read config: {e}")))?;
        let config: Config = serde_json::from_str(&config_str)
            .map_err(|e| EmbedError::ModelLoad(format!("Failed to parse config: {e}")))?;

        // SAFETY: the safetensors file comes from the Hub cache and is only read.
        #[allow(unsafe_code)]
        let vb = unsafe {
            VarBuilder::from_mmaped_safetensors(&[weights_path], DType::F32, &self.device)
                .map_err(|e| EmbedError::ModelLoad(format!("Failed to load weights: {e}")))?
        };

        let model = BertModel::load(vb, &config)
            .map_err(|e| EmbedError::ModelLoad(format!("Failed to create BERT model: {e}")))?;

        *loaded = Some(LoadedModel { model, tokenizer });

        info!("CandleEmbedder initialized");
        Ok(())
    }

    /// Take the hidden state of the first (`[CLS]`) token of each sequence.
    fn cls_pooling(token_embeddings: &Tensor) -> Result<Tensor, EmbedError> {
        token_embeddings
            .narrow(1, 0, 1)
            .map_err(|e| EmbedError::Inference(format!("narrow failed: {e}")))?
            .squeeze(1)
            .map_err(|e| EmbedError::Inference(format!("squeeze failed: {e}")))
    }

    /// L2 normalize embeddings.
    fn normalize(embeddings: &Tensor) -> Result<Tensor, EmbedError> {
        let norm = embeddings
            .sqr()
            .map_err(|e| EmbedError::Inference(format!("sqr failed: {e}")))?
            .sum_keepdim(1)
            .map_err(|e| EmbedError::Inference(format!("sum_keepdim failed: {e}")))?
            .sqrt()
            .map_err(|e| EmbedError::Inference(format!("sqrt failed: {e}")))?
            .clamp(1e-12, f64::MAX)
            .map_err(|e| EmbedError::Inference(format!("clamp failed: {e}")))?;

        embeddings
            .broadcast_div(&norm)
            .map_err(|e| EmbedError::Inference(format!("div failed: {e}")))
    }

    /// Encode one batch of texts.
    async fn encode_batch(
        &self,
        texts: &[&str],
        normalize: bool,
    ) -> Result<Vec<EmbeddingOutput>, EmbedError> {
        self.init().await?;

        let loaded = self.loaded.read().await;
        let LoadedModel { model, tokenizer } = loaded
            .as_ref()
            .ok_or_else(|| EmbedError::Inference("Model not loaded".to_string()))?;

        let encodings = tokenizer
            .encode_batch(texts.to_vec(), true)
            .map_err(|e| EmbedError::Inference(format!("Tokenization failed: {e}")))?;

        let max_len = encodings
            .iter()
            .map(tokenizers::Encoding::len)
            .max()
            .unwrap_or(0)
            .min(MAX_TOKENS);

        let batch_size = texts.len();
        let mut input_ids = Vec::with_capacity(batch_size * max_len);
        let mut attention_mask = Vec::with_capacity(batch_size * max_len);
        let mut token_counts = Vec::with_capacity(batch_size);

        for encoding in &encodings {
            let ids = encoding.get_ids();
            let len = ids.len().min(max_len);
            token_counts.push(len);

            input_ids.extend_from_slice(&ids[..len]);
            attention_mask.extend(std::iter::repeat_n(1u32, len));
            // [PAD] is id 0 in the BERT vocabulary
            input_ids.extend(std::iter::repeat_n(0u32, max_len - len));
            attention_mask.extend(std::iter::repeat_n(0u32, max_len - len));
        }

        let shape = (batch_size, max_len);
        let input_ids = Tensor::from_vec(input_ids, shape, &self.device)
            .map_err(|e| EmbedError::Inference(format!("Failed to create input_ids tensor: {e}")))?;
        let attention_mask = Tensor::from_vec(attention_mask, shape, &self.device).map_err(|e| {
            EmbedError::Inference(format!("Failed to create attention_mask tensor: {e}"))
        })?;
        let token_type_ids = input_ids
            .zeros_like()
            .map_err(|e| EmbedError::Inference(format!("Failed to create token_type_ids: {e}")))?;

        let output = model
            .forward(&input_ids, &token_type_ids, Some(&attention_mask))
            .map_err(|e| EmbedError::Inference(format!("Model forward failed: {e}")))?;

        let pooled = Self::cls_pooling(&output)?;
        let embeddings = if normalize {
            Self::normalize(&pooled)?
        } else {
            pooled
        };

        let rows = embeddings
            .to_vec2::<f32>()
            .map_err(|e| EmbedError::Inference(format!("Failed to convert to vec: {e}")))?;

        Ok(rows
            .into_iter()
            .zip(token_counts)
            .map(|(embedding, token_count)| EmbeddingOutput {
                embedding,
                token_count,
            })
            .collect())
    }
}

#[async_trait]
impl Embedder for CandleEmbedder {
    fn model_name(&self) -> &str {
        MODEL_ID
    }

    fn dimension(&self) -> usize {
        EMBEDDING_DIM
    }

    fn max_tokens(&self) -> usize {
        MAX_TOKENS
    }

    async fn embed_text(
        &self,
        texts: &[&str],
        config: &EmbeddingConfig,
    ) -> Result<Vec<EmbeddingOutput>, EmbedError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        debug!(
            "Embedding {} texts with batch_size {}",
            texts.len(),
            config.batch_size
        );

        let mut results = Vec::with_capacity(texts.len());
        for batch in texts.chunks(config.batch_size.max(1)) {
            results.extend(self.encode_batch(batch, config.normalize).await?);
        }

        Ok(results)
    }
}
