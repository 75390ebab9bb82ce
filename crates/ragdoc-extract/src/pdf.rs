//! PDF loader.
//!
//! Uses lopdf to pull the text of each page separately, so every page becomes
//! its own document carrying a 0-based `page` number.

use async_trait::async_trait;
use lopdf::{Dictionary, Object};
use ragdoc_core::{ContentExtractor, Document, ExtractError, Metadata};
use std::path::Path;
use tracing::{debug, warn};

/// Info dictionary entries copied into page metadata.
const INFO_KEYS: [(&[u8], &str); 4] = [
    (b"Title", "title"),
    (b"Author", "author"),
    (b"Producer", "producer"),
    (b"Creator", "creator"),
];

/// Extractor for PDF files.
pub struct PdfExtractor;

impl PdfExtractor {
    /// Create a new PDF extractor.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Default for PdfExtractor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ContentExtractor for PdfExtractor {
    fn can_extract_by_extension(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"))
    }

    async fn extract(&self, path: &Path) -> Result<Vec<Document>, ExtractError> {
        debug!("Extracting PDF: {:?}", path);

        let bytes = tokio::fs::read(path).await?;
        self.extract_bytes(&bytes, &path.to_string_lossy()).await
    }

    async fn extract_bytes(
        &self,
        data: &[u8],
        source: &str,
    ) -> Result<Vec<Document>, ExtractError> {
        let bytes = data.to_vec();
        let source = source.to_string();

        // lopdf parsing is blocking
        tokio::task::spawn_blocking(move || extract_pages(&bytes, &source))
            .await
            .map_err(|e| ExtractError::Failed(format!("Task join error: {e}")))?
    }
}

/// Parse PDF bytes into one document per page.
fn extract_pages(bytes: &[u8], source: &str) -> Result<Vec<Document>, ExtractError> {
    let doc = lopdf::Document::load_mem(bytes)
        .map_err(|e| ExtractError::Parse(format!("{source} is not a readable PDF: {e}")))?;

    let pages = doc.get_pages();
    let total_pages = pages.len() as i64;
    let info = info_metadata(&doc);

    let mut documents = Vec::with_capacity(pages.len());
    for (index, page_number) in pages.keys().enumerate() {
        let text = match doc.extract_text(&[*page_number]) {
            Ok(text) => text,
            Err(e) => {
                warn!("No text extracted from page {} of {}: {}", page_number, source, e);
                String::new()
            }
        };

        let mut metadata = info.clone();
        metadata.insert("source".to_string(), source.into());
        metadata.insert("page".to_string(), (index as i64).into());
        metadata.insert("total_pages".to_string(), total_pages.into());

        documents.push(Document::new(text, metadata));
    }

    debug!("Extracted {} pages from {}", documents.len(), source);
    Ok(documents)
}

/// Read the document-level fields of the trailer's Info dictionary.
fn info_metadata(doc: &lopdf::Document) -> Metadata {
    let mut metadata = Metadata::new();

    let info: Option<&Dictionary> = match doc.trailer.get(b"Info") {
        Ok(Object::Reference(id)) => doc.get_dictionary(*id).ok(),
        Ok(Object::Dictionary(dict)) => Some(dict),
        _ => None,
    };
    let Some(info) = info else {
        return metadata;
    };

    for (key, name) in INFO_KEYS {
        if let Ok(value) = info.get(key)
            && let Ok(raw) = value.as_str()
        {
            let text = decode_text_string(raw);
            if !text.trim().is_empty() {
                metadata.insert(name.to_string(), text.into());
            }
        }
    }

    metadata
}

/// Decode a PDF text string: UTF-16BE when it starts with a byte order mark,
/// otherwise single-byte.
fn decode_text_string(raw: &[u8]) -> String {
    if let Some(utf16) = raw.strip_prefix(&[0xFE, 0xFF]) {
        let units: Vec<u16> = utf16
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        return String::from_utf16_lossy(&units);
    }
    raw.iter().map(|&b| char::from(b)).collect()
}
