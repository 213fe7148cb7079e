use super::{ExtractedContent, ExtractionError};

const UTF8_BOM: &str = "\u{feff}";

pub fn extract(data: &[u8]) -> Result<ExtractedContent, ExtractionError> {
    let decoded = std::str::from_utf8(data).map_err(|e| ExtractionError::Encoding(e.to_string()))?;
    let text = decoded.strip_prefix(UTF8_BOM).unwrap_or(decoded).to_string();

    let metadata = serde_json::json!({
        "lineCount": text.lines().count(),
        "charCount": text.chars().count(),
    });

    Ok(ExtractedContent {
        text,
        pages: Vec::new(),
        sections: Vec::new(),
        metadata,
    })
}
