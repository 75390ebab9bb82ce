//! Splitting loaded documents into chunks.

use ragdoc_core::{Chunk, ChunkConfig, ChunkError, Chunker, Document};
use tracing::debug;

/// Split every document and wrap the pieces as chunks.
///
/// Each chunk carries a copy of its own document's metadata plus a
/// `chunk_index` entry counting from 0 within that document.
pub async fn split_documents(
    chunker: &dyn Chunker,
    documents: &[Document],
    config: &ChunkConfig,
) -> Result<Vec<Chunk>, ChunkError> {
    let mut chunks = Vec::new();

    for document in documents {
        let pieces = chunker.split_text(&document.page_content, config).await?;
        debug!(
            "Document {} split into {} chunks ({})",
            document.source().unwrap_or("<unknown>"),
            pieces.len(),
            chunker.name()
        );

        for (index, content) in pieces.into_iter().enumerate() {
            let chunk_index = u32::try_from(index)
                .map_err(|_| ChunkError::Failed("too many chunks in one document".to_string()))?;
            let mut metadata = document.metadata.clone();
            metadata.insert("chunk_index".to_string(), chunk_index.into());
            chunks.push(Chunk::new(content, chunk_index, metadata));
        }
    }

    Ok(chunks)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::RecursiveCharacterSplitter;
    use ragdoc_core::Metadata;

    fn page(text: &str, source: &str, page: i64) -> Document {
        let mut metadata = Metadata::new();
        metadata.insert("source".to_string(), source.into());
        metadata.insert("page".to_string(), page.into());
        Document::new(text, metadata)
    }

    #[tokio::test]
    async fn test_chunks_keep_their_own_document_metadata() {
        let documents = vec![
            page("First page text.", "book.pdf", 0),
            page("Second page text.", "book.pdf", 1),
        ];

        let chunks = split_documents(
            &RecursiveCharacterSplitter::new(),
            &documents,
            &ChunkConfig::default(),
        )
        .await
        .unwrap();

        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].content, "First page text.");
        assert_eq!(chunks[0].metadata["page"].as_i64(), Some(0));
        assert_eq!(chunks[1].content, "Second page text.");
        assert_eq!(chunks[1].metadata["page"].as_i64(), Some(1));
        assert_eq!(chunks[1].metadata["source"].as_str(), Some("book.pdf"));
    }

    #[tokio::test]
    async fn test_chunk_index_restarts_per_document() {
        let config = ChunkConfig {
            chunk_size: 10,
            chunk_overlap: 0,
            ..Default::default()
        };
        let documents = vec![
            page("aaaa bbbb cccc dddd", "a.txt", 0),
            page("eeee ffff", "b.txt", 0),
        ];

        let chunks = split_documents(&RecursiveCharacterSplitter::new(), &documents, &config)
            .await
            .unwrap();

        let indices: Vec<u32> = chunks.iter().map(|c| c.chunk_index).collect();
        assert_eq!(indices, vec![0, 1, 0]);
        assert_eq!(chunks[1].metadata["chunk_index"].as_i64(), Some(1));
        assert_eq!(chunks[2].metadata["source"].as_str(), Some("b.txt"));
        assert!(chunks.iter().all(|c| c.embedding.is_none()));
    }

    #[tokio::test]
    async fn test_empty_documents_produce_no_chunks() {
        let documents = vec![page("", "blank.pdf", 0), page("  ", "blank.pdf", 1)];
        let chunks = split_documents(
            &RecursiveCharacterSplitter::new(),
            &documents,
            &ChunkConfig::default(),
        )
        .await
        .unwrap();
        assert!(chunks.is_empty());
    }

    #[tokio::test]
    async fn test_invalid_config_propagates() {
        let config = ChunkConfig {
            chunk_size: 5,
            chunk_overlap: 6,
            ..Default::default()
        };
        let result = split_documents(
            &RecursiveCharacterSplitter::new(),
            &[page("text", "a.txt", 0)],
            &config,
        )
        .await;
        assert!(matches!(result, Err(ChunkError::InvalidConfig(_))));
    }
}
