//! Pitch-deck text extraction.
//!
//! Decks arrive as raw bytes (an upload), a local file, or a URL to download.
//! Text is pulled out page by page with `pdf-extract` on a blocking thread.

use std::path::Path;
use std::time::Duration;

use reqwest::Client;
use tracing::{debug, info, instrument};

use pitchlens_shared::{PitchLensError, Result};

/// Maximum characters of extracted text kept.
pub const MAX_TEXT_CHARS: usize = 50_000;

/// Largest deck we will download.
const MAX_DOWNLOAD_BYTES: u64 = 50 * 1024 * 1024;

/// User-Agent string for deck downloads.
const USER_AGENT: &str = concat!("PitchLens/", env!("CARGO_PKG_VERSION"));

/// Where a document comes from.
#[derive(Debug, Clone, Copy)]
pub enum DocumentSource<'a> {
    Bytes(&'a [u8]),
    Path(&'a Path),
    Url(&'a str),
}

/// Text pulled from a document.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedDocument {
    /// Page texts joined with `--- Page N ---` markers.
    pub full_text: String,
    pub pages: usize,
}

/// PDF extractor with an HTTP client for remote decks.
pub struct PdfDocumentExtractor {
    client: Client,
    max_chars: usize,
    max_download_bytes: u64,
}

impl PdfDocumentExtractor {
    pub fn new(timeout_secs: u64) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .redirect(reqwest::redirect::Policy::limited(5))
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| PitchLensError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            max_chars: MAX_TEXT_CHARS,
            max_download_bytes: MAX_DOWNLOAD_BYTES,
        })
    }

    pub fn with_max_chars(mut self, max_chars: usize) -> Self {
        self.max_chars = max_chars;
        self
    }

    pub fn with_max_download_bytes(mut self, max_download_bytes: u64) -> Self {
        self.max_download_bytes = max_download_bytes;
        self
    }

    #[instrument(skip_all)]
    pub async fn extract(&self, source: DocumentSource<'_>) -> Result<ExtractedDocument> {
        let bytes = match source {
            DocumentSource::Bytes(bytes) => bytes.to_vec(),
            DocumentSource::Path(path) => tokio::fs::read(path)
                .await
                .map_err(|e| PitchLensError::io(path, e))?,
            DocumentSource::Url(url) => self.download(url).await?,
        };

        let max_chars = self.max_chars;
        let doc = tokio::task::spawn_blocking(move || extract_pdf_text(&bytes, max_chars))
            .await
            .map_err(|e| PitchLensError::Extraction(format!("extraction task failed: {e}")))??;

        info!(pages = doc.pages, chars = doc.full_text.len(), "document extracted");
        Ok(doc)
    }

    /// Download a remote deck into memory.
    pub async fn download(&self, url: &str) -> Result<Vec<u8>> {
        debug!(url, "downloading document");

        let mut response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| PitchLensError::Network(format!("{url}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(PitchLensError::http("document download", status.as_u16(), url));
        }

        let max = self.max_download_bytes;
        let too_large = |len: u64| {
            PitchLensError::validation(format!(
                "{url}: document too large ({len} bytes, max {max})"
            ))
        };

        if let Some(len) = response.content_length() {
            if len > max {
                return Err(too_large(len));
            }
        }

        // Chunked responses carry no length.
        let mut bytes = Vec::new();
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| PitchLensError::Network(format!("{url}: body read failed: {e}")))?
        {
            let total = (bytes.len() + chunk.len()) as u64;
            if total > max {
                return Err(too_large(total));
            }
            bytes.extend_from_slice(&chunk);
        }

        Ok(bytes)
    }
}

/// Extract text from PDF bytes, page by page.
pub fn extract_pdf_text(bytes: &[u8], max_chars: usize) -> Result<ExtractedDocument> {
    if !looks_like_pdf(bytes) {
        return Err(PitchLensError::Extraction("not a PDF document".into()));
    }

    let pages = pdf_extract::extract_text_from_mem_by_pages(bytes)
        .map_err(|e| PitchLensError::Extraction(e.to_string()))?;

    let mut full_text = String::new();
    for (i, text) in pages.iter().enumerate() {
        let text = text.trim();
        if text.is_empty() {
            continue;
        }
        full_text.push_str(&format!("\n--- Page {} ---\n{text}\n", i + 1));
    }

    let full_text = truncate_chars(full_text.trim(), max_chars);
    if full_text.is_empty() {
        return Err(PitchLensError::Extraction(
            "document contains no extractable text".into(),
        ));
    }

    Ok(ExtractedDocument {
        full_text,
        pages: pages.len(),
    })
}

/// Whether `bytes` starts with the PDF magic header.
pub fn looks_like_pdf(bytes: &[u8]) -> bool {
    bytes.starts_with(b"%PDF")
}

/// Short, title-like lines from deck text, in order of appearance.
///
/// A line qualifies when it is 3 to 99 characters long, starts with an
/// uppercase letter, does not end with `:`, and has not been seen already.
pub fn extract_key_phrases(text: &str, max: usize) -> Vec<String> {
    let mut phrases: Vec<String> = Vec::new();

    for line in text.lines().map(str::trim) {
        if phrases.len() >= max {
            break;
        }
        let len = line.chars().count();
        if !(3..100).contains(&len) || line.ends_with(':') || line.starts_with("--- Page") {
            continue;
        }
        if !line.chars().next().is_some_and(char::is_uppercase) {
            continue;
        }
        if !phrases.iter().any(|p| p == line) {
            phrases.push(line.to_string());
        }
    }

    phrases
}

fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text.to_string(),
    }
}
