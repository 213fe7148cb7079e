// PDF text extraction with lopdf

use lopdf::{Dictionary, Document, Object};
use tracing::debug;

use super::{ExtractedContent, ExtractionError, PageText};

pub fn extract(data: &[u8]) -> Result<ExtractedContent, ExtractionError> {
    let doc = Document::load_mem(data)
        .map_err(|e| ExtractionError::Malformed(format!("failed to load PDF: {e}")))?;

    if doc.is_encrypted() {
        return Err(ExtractionError::Malformed("PDF is encrypted".to_string()));
    }

    let mut pages = Vec::new();
    for (&page_num, _) in doc.get_pages().iter() {
        // A page without decodable text is kept with empty content.
        let content = match doc.extract_text(&[page_num]) {
            Ok(text) => text.trim().to_string(),
            Err(e) => {
                debug!(page_num, "No text extracted from PDF page: {}", e);
                String::new()
            }
        };
        pages.push(PageText { page_num, content });
    }

    let text = pages
        .iter()
        .map(|page| page.content.as_str())
        .filter(|content| !content.is_empty())
        .collect::<Vec<_>>()
        .join("\n\n");

    let info = info_dictionary(&doc);
    let metadata = serde_json::json!({
        "pageCount": pages.len(),
        "title": info.and_then(|dict| info_string(dict, b"Title")),
        "author": info.and_then(|dict| info_string(dict, b"Author")),
    });

    Ok(ExtractedContent {
        text,
        pages,
        sections: Vec::new(),
        metadata,
    })
}

fn info_dictionary(doc: &Document) -> Option<&Dictionary> {
    match doc.trailer.get(b"Info").ok()? {
        Object::Reference(id) => doc.get_dictionary(*id).ok(),
        Object::Dictionary(dict) => Some(dict),
        _ => None,
    }
}

fn info_string(dict: &Dictionary, key: &[u8]) -> Option<String> {
    let bytes = dict.get(key).ok()?.as_str().ok()?;
    let value = decode_text_string(bytes);
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

/// PDF text strings are either UTF-16BE with a BOM or PDFDocEncoding, which
/// matches Latin-1 for printable characters.
fn decode_text_string(bytes: &[u8]) -> String {
    if let Some(utf16) = bytes.strip_prefix(&[0xFE, 0xFF]) {
        let units: Vec<u16> = utf16
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        return String::from_utf16_lossy(&units);
    }
    bytes.iter().map(|&b| b as char).collect()
}
