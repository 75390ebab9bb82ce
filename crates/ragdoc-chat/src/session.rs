//! Chat session over a single ingested document.

use ragdoc_chunker::{RecursiveCharacterSplitter, split_documents};
use ragdoc_core::{
    ChunkConfig, EmbedError, Embedder, EmbeddingConfig, Error, GenerationConfig, LanguageModel,
    Result, VectorStore,
};
use ragdoc_extract::DocumentLoader;
use ragdoc_query::{PromptTemplate, Retriever, RetrieverConfig, format_context};
use ragdoc_store::{MemoryStore, filter_complex_metadata};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

/// Answer given to questions asked before any document was ingested.
pub const NO_DOCUMENT_MESSAGE: &str = "Por favor, primero seleccione algun documento txt o pdf";

/// Settings for every stage of a session.
#[derive(Debug, Clone, Default)]
pub struct SessionConfig {
    /// Splitter settings
    pub chunk: ChunkConfig,
    /// Retrieval settings
    pub retrieval: RetrieverConfig,
    /// Embedding options for chunks and questions
    pub embedding: EmbeddingConfig,
    /// Sampling options for the language model
    pub generation: GenerationConfig,
}

/// What an ingest produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IngestSummary {
    /// Path or URL that was loaded
    pub source: String,
    /// Documents the loader returned (pages, for a PDF)
    pub documents: usize,
    /// Chunks indexed
    pub chunks: usize,
    /// Chunks that reached the embedder's input limit and were cut short
    pub truncated: usize,
}

/// Index built from the current document.
struct Pipeline {
    source: String,
    store: Arc<MemoryStore>,
    retriever: Retriever,
}

/// Holds at most one ingested document and answers questions about it.
pub struct ChatSession {
    embedder: Arc<dyn Embedder>,
    llm: Arc<dyn LanguageModel>,
    loader: DocumentLoader,
    splitter: RecursiveCharacterSplitter,
    prompt: PromptTemplate,
    config: SessionConfig,
    state: RwLock<Option<Pipeline>>,
}

impl ChatSession {
    /// Create an empty session.
    pub fn new(
        embedder: Arc<dyn Embedder>,
        llm: Arc<dyn LanguageModel>,
        config: SessionConfig,
    ) -> Self {
        Self {
            embedder,
            llm,
            loader: DocumentLoader::new(),
            splitter: RecursiveCharacterSplitter::new(),
            prompt: PromptTemplate::rag_default(),
            config,
            state: RwLock::new(None),
        }
    }

    /// Load documents through `loader` instead of the default one.
    #[must_use]
    pub fn with_loader(mut self, loader: DocumentLoader) -> Self {
        self.loader = loader;
        self
    }

    /// Settings in use.
    #[must_use]
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Whether a document is currently ingested.
    pub async fn has_document(&self) -> bool {
        self.state.read().await.is_some()
    }

    /// Path or URL of the ingested document.
    pub async fn current_source(&self) -> Option<String> {
        self.state
            .read()
            .await
            .as_ref()
            .map(|pipeline| pipeline.source.clone())
    }

    /// Number of chunks in the current index. Zero when empty.
    pub async fn chunk_count(&self) -> Result<u64> {
        match self.state.read().await.as_ref() {
            Some(pipeline) => Ok(pipeline.store.stats().await?.total_chunks),
            None => Ok(0),
        }
    }

    /// Load, split, embed and index `source`, replacing any previous
    /// document. On failure the previous document stays in place.
    pub async fn ingest(&self, source: &str) -> Result<IngestSummary> {
        info!("Ingesting {}", source);

        let documents = self.loader.load(source).await?;

        let mut chunks = split_documents(&self.splitter, &documents, &self.config.chunk).await?;
        if chunks.is_empty() {
            return Err(Error::Other(format!("no text could be extracted from {source}")));
        }

        let dropped = filter_complex_metadata(&mut chunks);
        if dropped > 0 {
            debug!("Dropped {} complex metadata values", dropped);
        }

        let max_tokens = self.embedder.max_tokens();
        let mut truncated = 0;
        let batch_size = self.config.embedding.batch_size.max(1);
        for batch in chunks.chunks_mut(batch_size) {
            let texts: Vec<&str> = batch.iter().map(|chunk| chunk.content.as_str()).collect();
            let outputs = self
                .embedder
                .embed_text(&texts, &self.config.embedding)
                .await?;
            if outputs.len() != batch.len() {
                return Err(EmbedError::Inference(format!(
                    "expected {} embeddings, got {}",
                    batch.len(),
                    outputs.len()
                ))
                .into());
            }
            for (chunk, output) in batch.iter_mut().zip(outputs) {
                if output.token_count >= max_tokens {
                    truncated += 1;
                }
                chunk.embedding = Some(output.embedding);
            }
        }
        if truncated > 0 {
            warn!(
                "{} chunks reached the {} token limit of {} and were truncated",
                truncated,
                max_tokens,
                self.embedder.model_name()
            );
        }

        let store = Arc::new(MemoryStore::new(self.embedder.dimension()));
        store.init().await?;
        store.upsert_chunks(&chunks).await?;

        let retriever = Retriever::new(
            store.clone() as Arc<dyn VectorStore>,
            self.embedder.clone(),
            self.config.retrieval.clone(),
        )
        .with_embedding_config(self.config.embedding.clone());

        let summary = IngestSummary {
            source: source.to_string(),
            documents: documents.len(),
            chunks: chunks.len(),
            truncated,
        };

        *self.state.write().await = Some(Pipeline {
            source: source.to_string(),
            store,
            retriever,
        });

        info!(
            "Indexed {} ({} documents, {} chunks)",
            source, summary.documents, summary.chunks
        );
        Ok(summary)
    }

    /// Answer `question` from the ingested document.
    ///
    /// Returns [`NO_DOCUMENT_MESSAGE`] when nothing has been ingested.
    pub async fn ask(&self, question: &str) -> Result<String> {
        let state = self.state.read().await;
        let Some(pipeline) = state.as_ref() else {
            debug!("Question asked with no document loaded");
            return Ok(NO_DOCUMENT_MESSAGE.to_string());
        };

        let results = pipeline.retriever.retrieve(question).await?;
        let context = format_context(&results);
        let prompt = self
            .prompt
            .format(&[("question", question), ("context", &context)])?;
        debug!("Prompt: {}", prompt);

        info!(
            "Asking {} with {} context chunks",
            self.llm.model_name(),
            results.len()
        );
        let answer = self.llm.generate(&prompt, &self.config.generation).await?;
        Ok(answer)
    }

    /// Drop the ingested document and empty its index. Safe to call on an
    /// empty session.
    pub async fn clear(&self) -> Result<()> {
        let Some(pipeline) = self.state.write().await.take() else {
            return Ok(());
        };
        pipeline.store.clear().await?;
        info!("Session cleared ({})", pipeline.source);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use ragdoc_core::{EmbeddingOutput, LlmError};
    use std::path::Path;
    use tempfile::tempdir;

    // ==================== Mocks ====================

    /// Embeds onto three axes: sky, grass, anything else.
    struct KeywordEmbedder;

    #[async_trait]
    impl Embedder for KeywordEmbedder {
        fn model_name(&self) -> &str {
            "keyword"
        }

        fn dimension(&self) -> usize {
            3
        }

        fn max_tokens(&self) -> usize {
            512
        }

        async fn embed_text(
            &self,
            texts: &[&str],
            _config: &EmbeddingConfig,
        ) -> std::result::Result<Vec<EmbeddingOutput>, EmbedError> {
            Ok(texts
                .iter()
                .map(|text| {
                    let lower = text.to_lowercase();
                    let embedding = if lower.contains("sky") {
                        vec![1.0, 0.0, 0.0]
                    } else if lower.contains("grass") {
                        vec![0.0, 1.0, 0.0]
                    } else {
                        vec![0.0, 0.0, 1.0]
                    };
                    EmbeddingOutput {
                        embedding,
                        token_count: text.split_whitespace().count(),
                    }
                })
                .collect())
        }
    }

    /// Puts "sky" texts on one axis and everything else at cosine 0.6 from it.
    struct SlantedEmbedder;

    #[async_trait]
    impl Embedder for SlantedEmbedder {
        fn model_name(&self) -> &str {
            "slanted"
        }

        fn dimension(&self) -> usize {
            2
        }

        fn max_tokens(&self) -> usize {
            512
        }

        async fn embed_text(
            &self,
            texts: &[&str],
            _config: &EmbeddingConfig,
        ) -> std::result::Result<Vec<EmbeddingOutput>, EmbedError> {
            Ok(texts
                .iter()
                .map(|text| EmbeddingOutput {
                    embedding: if text.to_lowercase().contains("sky") {
                        vec![1.0, 0.0]
                    } else {
                        vec![0.6, 0.8]
                    },
                    token_count: 1,
                })
                .collect())
        }
    }

    /// Keyword embedder that only takes four tokens per input.
    struct ShortInputEmbedder;

    #[async_trait]
    impl Embedder for ShortInputEmbedder {
        fn model_name(&self) -> &str {
            "short-input"
        }

        fn dimension(&self) -> usize {
            KeywordEmbedder.dimension()
        }

        fn max_tokens(&self) -> usize {
            4
        }

        async fn embed_text(
            &self,
            texts: &[&str],
            config: &EmbeddingConfig,
        ) -> std::result::Result<Vec<EmbeddingOutput>, EmbedError> {
            let mut outputs = KeywordEmbedder.embed_text(texts, config).await?;
            for output in &mut outputs {
                output.token_count = output.token_count.min(4);
            }
            Ok(outputs)
        }
    }

    /// Answers with the prompt it was given.
    struct EchoModel;

    #[async_trait]
    impl LanguageModel for EchoModel {
        fn model_name(&self) -> &str {
            "echo"
        }

        async fn generate(
            &self,
            prompt: &str,
            _config: &GenerationConfig,
        ) -> std::result::Result<String, LlmError> {
            Ok(prompt.to_string())
        }
    }

    // ==================== Helper functions ====================

    fn session() -> ChatSession {
        ChatSession::new(
            Arc::new(KeywordEmbedder),
            Arc::new(EchoModel),
            SessionConfig::default(),
        )
    }

    fn write_file(dir: &Path, name: &str, content: &str) -> String {
        let path = dir.join(name);
        std::fs::write(&path, content).unwrap();
        path.to_str().unwrap().to_string()
    }

    // ==================== Tests ====================

    #[tokio::test]
    async fn test_ask_without_document() {
        let session = session();
        assert!(!session.has_document().await);

        for question in ["What color is the sky?", "", "¿Qué?"] {
            assert_eq!(session.ask(question).await.unwrap(), NO_DOCUMENT_MESSAGE);
        }
    }

    #[tokio::test]
    async fn test_ingest_short_text_is_one_chunk() {
        let temp_dir = tempdir().unwrap();
        let path = write_file(temp_dir.path(), "sky.txt", "The sky is blue. Grass is green.");

        let session = session();
        let summary = session.ingest(&path).await.unwrap();

        assert_eq!(summary.source, path);
        assert_eq!(summary.documents, 1);
        assert_eq!(summary.chunks, 1);
        assert!(session.has_document().await);
        assert_eq!(session.current_source().await.as_deref(), Some(path.as_str()));
        assert_eq!(session.chunk_count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_ask_uses_retrieved_context() {
        let temp_dir = tempdir().unwrap();
        let path = write_file(temp_dir.path(), "sky.txt", "The sky is blue. Grass is green.");

        let session = session();
        session.ingest(&path).await.unwrap();
        let answer = session.ask("What color is the sky?").await.unwrap();

        assert!(answer.contains("Question: What color is the sky?"));
        assert!(answer.contains("Context: The sky is blue. Grass is green."));
        assert!(answer.contains("blue"));
    }

    #[tokio::test]
    async fn test_ask_below_threshold_gets_empty_context() {
        let temp_dir = tempdir().unwrap();
        let path = write_file(temp_dir.path(), "sky.txt", "The sky is blue. Grass is green.");

        let session = session();
        session.ingest(&path).await.unwrap();
        let answer = session.ask("How tall is Everest?").await.unwrap();

        assert!(answer.contains("\nContext: \nAnswer: [/INST]"));
        assert!(!answer.contains("The sky is blue."));
    }

    #[tokio::test]
    async fn test_clear_returns_to_empty() {
        let temp_dir = tempdir().unwrap();
        let path = write_file(temp_dir.path(), "sky.txt", "The sky is blue.");

        let session = session();
        session.ingest(&path).await.unwrap();
        let store = session.state.read().await.as_ref().unwrap().store.clone();
        session.clear().await.unwrap();

        assert_eq!(store.stats().await.unwrap().total_chunks, 0);
        assert!(!session.has_document().await);
        assert_eq!(session.chunk_count().await.unwrap(), 0);
        assert_eq!(
            session.ask("What color is the sky?").await.unwrap(),
            NO_DOCUMENT_MESSAGE
        );

        // Clearing again is a no-op
        session.clear().await.unwrap();
        assert!(!session.has_document().await);
    }

    #[tokio::test]
    async fn test_ingest_replaces_previous_document() {
        let temp_dir = tempdir().unwrap();
        let sky = write_file(temp_dir.path(), "sky.txt", "The sky is blue.");
        let grass = write_file(temp_dir.path(), "grass.txt", "Grass is green.");

        let session = session();
        session.ingest(&sky).await.unwrap();
        session.ingest(&grass).await.unwrap();

        assert_eq!(session.current_source().await.as_deref(), Some(grass.as_str()));
        let answer = session.ask("Why is the grass green?").await.unwrap();
        assert!(answer.contains("Context: Grass is green."));
        let answer = session.ask("What color is the sky?").await.unwrap();
        assert!(!answer.contains("The sky is blue."));
    }

    #[tokio::test]
    async fn test_failed_ingest_keeps_previous_document() {
        let temp_dir = tempdir().unwrap();
        let sky = write_file(temp_dir.path(), "sky.txt", "The sky is blue.");
        let empty = write_file(temp_dir.path(), "empty.txt", "");

        let session = session();
        session.ingest(&sky).await.unwrap();

        let missing = session.ingest("/nonexistent/notes.txt").await;
        assert!(matches!(missing, Err(Error::Extraction(_))));

        let nothing = session.ingest(&empty).await;
        assert!(matches!(nothing, Err(Error::Other(_))));

        assert_eq!(session.current_source().await.as_deref(), Some(sky.as_str()));
        let answer = session.ask("What color is the sky?").await.unwrap();
        assert!(answer.contains("Context: The sky is blue."));
    }

    #[tokio::test]
    async fn test_ingest_invalid_utf8_fails() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("binary.txt");
        std::fs::write(&path, [0xff, 0xfe, 0x00, 0x80]).unwrap();

        let session = session();
        let result = session.ingest(path.to_str().unwrap()).await;

        assert!(matches!(result, Err(Error::Extraction(_))));
        assert!(!session.has_document().await);
    }

    #[tokio::test]
    async fn test_ingest_long_text_embeds_in_batches() {
        let temp_dir = tempdir().unwrap();
        let text = (0..600).map(|i| format!("w{i:03}")).collect::<Vec<_>>().join(" ");
        let path = write_file(temp_dir.path(), "long.txt", &text);

        let config = SessionConfig {
            embedding: EmbeddingConfig {
                batch_size: 1,
                ..Default::default()
            },
            ..Default::default()
        };
        let session = ChatSession::new(Arc::new(KeywordEmbedder), Arc::new(EchoModel), config);
        let summary = session.ingest(&path).await.unwrap();

        assert!(summary.chunks > 1);
        assert_eq!(session.chunk_count().await.unwrap(), summary.chunks as u64);
    }

    #[tokio::test]
    async fn test_default_metric_drops_chunk_at_cosine_point_six() {
        let temp_dir = tempdir().unwrap();
        let path = write_file(temp_dir.path(), "clouds.txt", "Clouds drift overhead.");

        // L2 relevance is 1 - 0.8 / sqrt(2), about 0.43, under the 0.5 threshold
        let session = ChatSession::new(
            Arc::new(SlantedEmbedder),
            Arc::new(EchoModel),
            SessionConfig::default(),
        );
        session.ingest(&path).await.unwrap();
        let answer = session.ask("What color is the sky?").await.unwrap();
        assert!(answer.ends_with("\nContext: \nAnswer: [/INST]"));

        // Cosine relevance is 0.6, over it
        let config = SessionConfig {
            retrieval: RetrieverConfig {
                metric: ragdoc_core::DistanceMetric::Cosine,
                ..Default::default()
            },
            ..Default::default()
        };
        let session = ChatSession::new(Arc::new(SlantedEmbedder), Arc::new(EchoModel), config);
        session.ingest(&path).await.unwrap();
        let answer = session.ask("What color is the sky?").await.unwrap();
        assert!(answer.contains("\nContext: Clouds drift overhead.\nAnswer: [/INST]"));
    }

    #[tokio::test]
    async fn test_ingest_counts_truncated_chunks() {
        let temp_dir = tempdir().unwrap();
        let path = write_file(
            temp_dir.path(),
            "sky.txt",
            "The sky is very blue today.\n\nGrass grows.",
        );

        let config = SessionConfig {
            chunk: ChunkConfig {
                chunk_size: 30,
                chunk_overlap: 0,
                ..Default::default()
            },
            ..Default::default()
        };
        let session = ChatSession::new(Arc::new(ShortInputEmbedder), Arc::new(EchoModel), config);
        let summary = session.ingest(&path).await.unwrap();

        assert_eq!(summary.chunks, 2);
        assert_eq!(summary.truncated, 1);
    }

    #[tokio::test]
    async fn test_ingest_within_limit_truncates_nothing() {
        let temp_dir = tempdir().unwrap();
        let path = write_file(temp_dir.path(), "sky.txt", "The sky is blue.");

        let summary = session().ingest(&path).await.unwrap();
        assert_eq!(summary.truncated, 0);
    }
}
