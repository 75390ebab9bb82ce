//! Document loader: picks the extractor for an input and fetches remote inputs.

use ragdoc_core::{ContentExtractor, Document, ExtractError};
use reqwest::Url;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::{PdfExtractor, TextExtractor};

/// Whether the input is an `http://` or `https://` URL.
#[must_use]
pub fn is_url(input: &str) -> bool {
    let lower = input.to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

/// Path whose extension decides the extractor. For URLs this is the URL
/// path, so a query string does not hide the extension.
fn dispatch_path(input: &str) -> PathBuf {
    if is_url(input) {
        Url::parse(input).map_or_else(|_| PathBuf::from(input), |url| PathBuf::from(url.path()))
    } else {
        PathBuf::from(input)
    }
}

/// Whether the input names a PDF.
#[must_use]
pub fn is_pdf(input: &str) -> bool {
    PdfExtractor::new().can_extract_by_extension(&dispatch_path(input))
}

/// Loads a path or URL into documents.
///
/// Inputs ending in `.pdf` are parsed page by page; everything else is read
/// as UTF-8 text.
pub struct DocumentLoader {
    text: TextExtractor,
    pdf: PdfExtractor,
    client: reqwest::Client,
}

impl DocumentLoader {
    /// Create a loader with a default HTTP client.
    #[must_use]
    pub fn new() -> Self {
        Self::with_client(reqwest::Client::new())
    }

    /// Create a loader that downloads through the given client.
    #[must_use]
    pub fn with_client(client: reqwest::Client) -> Self {
        Self {
            text: TextExtractor::new(),
            pdf: PdfExtractor::new(),
            client,
        }
    }

    /// Load a local file or a remote URL.
    pub async fn load(&self, path_or_url: &str) -> Result<Vec<Document>, ExtractError> {
        let extractor: &dyn ContentExtractor =
            if self.pdf.can_extract_by_extension(&dispatch_path(path_or_url)) {
                &self.pdf
            } else {
                &self.text
            };

        let documents = if is_url(path_or_url) {
            let bytes = self.download(path_or_url).await?;
            extractor.extract_bytes(&bytes, path_or_url).await?
        } else {
            extractor.extract(Path::new(path_or_url)).await?
        };

        info!("Loaded {} document(s) from {}", documents.len(), path_or_url);
        for doc in &documents {
            info!("Document source: {}", doc.source().unwrap_or(path_or_url));
            debug!("Page content: {}", doc.page_content);
        }

        Ok(documents)
    }

    async fn download(&self, url: &str) -> Result<Vec<u8>, ExtractError> {
        debug!("Downloading {}", url);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| ExtractError::Failed(format!("Download of {url} failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ExtractError::Failed(format!(
                "Download of {url} returned {status}"
            )));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| ExtractError::Failed(format!("Reading body of {url} failed: {e}")))?;
        Ok(bytes.to_vec())
    }
}

impl Default for DocumentLoader {
    fn default() -> Self {
        Self::new()
    }
}
