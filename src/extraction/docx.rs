// DOCX text extraction: unzip the package and walk word/document.xml

use std::io::{Cursor, Read};

use quick_xml::events::Event;
use quick_xml::Reader;
use zip::result::ZipError;
use zip::ZipArchive;

use super::{ExtractedContent, ExtractionError, Section};

const DOCUMENT_PART: &str = "word/document.xml";
const CORE_PROPERTIES_PART: &str = "docProps/core.xml";

pub fn extract(data: &[u8]) -> Result<ExtractedContent, ExtractionError> {
    let mut archive = ZipArchive::new(Cursor::new(data))
        .map_err(|e| ExtractionError::Malformed(format!("not a DOCX package: {e}")))?;

    let body = read_part(&mut archive, DOCUMENT_PART)?.ok_or_else(|| {
        ExtractionError::Malformed(format!("DOCX package has no {DOCUMENT_PART}"))
    })?;
    let paragraphs = parse_paragraphs(&body)?;
    let properties = match read_part(&mut archive, CORE_PROPERTIES_PART)? {
        Some(xml) => parse_core_properties(&xml)?,
        None => CoreProperties::default(),
    };

    let sections: Vec<Section> = paragraphs
        .into_iter()
        .filter(|paragraph| !paragraph.trim().is_empty())
        .enumerate()
        .map(|(index, content)| Section { index, content })
        .collect();
    let text = sections
        .iter()
        .map(|section| section.content.as_str())
        .collect::<Vec<_>>()
        .join("\n");

    let metadata = serde_json::json!({
        "paragraphCount": sections.len(),
        "title": properties.title,
        "author": properties.creator,
        "creationDate": properties.created,
    });

    Ok(ExtractedContent {
        text,
        pages: Vec::new(),
        sections,
        metadata,
    })
}

fn read_part(
    archive: &mut ZipArchive<Cursor<&[u8]>>,
    name: &str,
) -> Result<Option<String>, ExtractionError> {
    let mut file = match archive.by_name(name) {
        Ok(file) => file,
        Err(ZipError::FileNotFound) => return Ok(None),
        Err(e) => return Err(ExtractionError::Malformed(format!("{name}: {e}"))),
    };

    let mut xml = String::new();
    file.read_to_string(&mut xml)
        .map_err(|e| ExtractionError::Malformed(format!("{name}: {e}")))?;
    Ok(Some(xml))
}

fn xml_error(
    part: &str,
    position: impl std::fmt::Display,
    error: impl std::fmt::Display,
) -> ExtractionError {
    ExtractionError::Malformed(format!("{part} at byte {position}: {error}"))
}

/// Collects the text of each `w:p` paragraph, honouring tabs and breaks.
fn parse_paragraphs(xml: &str) -> Result<Vec<String>, ExtractionError> {
    let mut reader = Reader::from_str(xml);
    let mut paragraphs = Vec::new();
    let mut current = String::new();
    let mut in_text = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => match e.local_name().as_ref() {
                b"p" => current.clear(),
                b"t" => in_text = true,
                _ => {}
            },
            Ok(Event::Empty(e)) => match e.local_name().as_ref() {
                b"tab" => current.push('\t'),
                b"br" | b"cr" => current.push('\n'),
                _ => {}
            },
            Ok(Event::Text(t)) if in_text => {
                let text = t
                    .unescape()
                    .map_err(|e| xml_error(DOCUMENT_PART, reader.buffer_position(), e))?;
                current.push_str(&text);
            }
            Ok(Event::End(e)) => match e.local_name().as_ref() {
                b"t" => in_text = false,
                b"p" => paragraphs.push(std::mem::take(&mut current)),
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(xml_error(DOCUMENT_PART, reader.buffer_position(), e)),
            _ => {}
        }
    }

    Ok(paragraphs)
}

#[derive(Debug, Default)]
struct CoreProperties {
    title: Option<String>,
    creator: Option<String>,
    created: Option<String>,
}

fn parse_core_properties(xml: &str) -> Result<CoreProperties, ExtractionError> {
    let mut reader = Reader::from_str(xml);
    let mut properties = CoreProperties::default();
    let mut current: Vec<u8> = Vec::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => current = e.local_name().as_ref().to_vec(),
            Ok(Event::End(_)) => current.clear(),
            Ok(Event::Text(t)) => {
                let value = t
                    .unescape()
                    .map_err(|e| xml_error(CORE_PROPERTIES_PART, reader.buffer_position(), e))?
                    .trim()
                    .to_string();
                if value.is_empty() {
                    continue;
                }
                match current.as_slice() {
                    b"title" => properties.title = Some(value),
                    b"creator" => properties.creator = Some(value),
                    b"created" => properties.created = Some(value),
                    _ => {}
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(xml_error(CORE_PROPERTIES_PART, reader.buffer_position(), e)),
            _ => {}
        }
    }

    Ok(properties)
}
