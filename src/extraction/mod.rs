//! Text extraction
//!
//! Turns stored upload bytes into the JSON payload kept on a completed
//! document. The strategy is picked from the stored file's extension:
//! - `.pdf` - per-page text via lopdf
//! - `.docx` / `.doc` - paragraphs from `word/document.xml`
//! - `.txt` - UTF-8 text
//!
//! Everything else fails with `UnsupportedFormat`.

pub mod docx;
pub mod pdf;
pub mod text;

use serde::Serialize;

use crate::storage::file_extension;

#[derive(Debug, thiserror::Error)]
pub enum ExtractionError {
    #[error("Unsupported file format: {0}")]
    UnsupportedFormat(String),

    #[error("Malformed document: {0}")]
    Malformed(String),

    #[error("Text is not valid UTF-8: {0}")]
    Encoding(String),

    #[error("Could not read stored file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Extraction task failed: {0}")]
    Task(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Pdf,
    Docx,
    Text,
}

impl FileKind {
    /// Picks the extraction strategy from a file name or storage path.
    pub fn detect(path: &str) -> Result<Self, ExtractionError> {
        match file_extension(path).as_deref() {
            Some("pdf") => Ok(FileKind::Pdf),
            Some("docx") | Some("doc") => Ok(FileKind::Docx),
            Some("txt") => Ok(FileKind::Text),
            Some(other) => Err(ExtractionError::UnsupportedFormat(format!(".{other}"))),
            None => Err(ExtractionError::UnsupportedFormat(
                "file has no extension".to_string(),
            )),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageText {
    pub page_num: u32,
    pub content: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Section {
    pub index: usize,
    pub content: String,
}

/// Extracted text plus whatever structure the format offers.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedContent {
    pub text: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub pages: Vec<PageText>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub sections: Vec<Section>,
    pub metadata: serde_json::Value,
}

impl ExtractedContent {
    pub fn into_json(self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_else(|e| {
            serde_json::json!({ "text": "", "metadata": { "serializationError": e.to_string() } })
        })
    }
}

/// Extraction capability used by the lifecycle manager.
pub trait Extractor: Send + Sync {
    fn extract(&self, data: &[u8], kind: FileKind) -> Result<ExtractedContent, ExtractionError>;
}

/// Built-in extractors for PDF, DOCX and plain text.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultExtractor;

impl Extractor for DefaultExtractor {
    fn extract(&self, data: &[u8], kind: FileKind) -> Result<ExtractedContent, ExtractionError> {
        match kind {
            FileKind::Pdf => pdf::extract(data),
            FileKind::Docx => docx::extract(data),
            FileKind::Text => text::extract(data),
        }
    }
}
