//! Plain text loader.

use async_trait::async_trait;
use ragdoc_core::{ContentExtractor, Document, ExtractError, Metadata};
use std::path::Path;
use tokio::fs;

/// Extractor for UTF-8 text files. The whole file becomes one document.
pub struct TextExtractor;

impl TextExtractor {
    /// Create a new text extractor.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Default for TextExtractor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ContentExtractor for TextExtractor {
    fn can_extract_by_extension(&self, path: &Path) -> bool {
        let extensions = ["txt", "text", "md", "markdown", "csv", "log", "rst"];

        path.extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| extensions.contains(&ext.to_lowercase().as_str()))
    }

    async fn extract(&self, path: &Path) -> Result<Vec<Document>, ExtractError> {
        let bytes = fs::read(path).await?;
        self.extract_bytes(&bytes, &path.to_string_lossy()).await
    }

    async fn extract_bytes(
        &self,
        data: &[u8],
        source: &str,
    ) -> Result<Vec<Document>, ExtractError> {
        let text = std::str::from_utf8(data)
            .map_err(|e| ExtractError::Parse(format!("{source} is not valid UTF-8: {e}")))?;

        let mut metadata = Metadata::new();
        metadata.insert("source".to_string(), source.into());

        Ok(vec![Document::new(text, metadata)])
    }
}
