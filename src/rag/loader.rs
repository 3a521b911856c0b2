//! Document ingestion: turns an uploaded file into plain-text segments.
//!
//! PDFs yield one segment per page, every other format yields a single segment.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use regex::Regex;
use serde::{Deserialize, Serialize};
use zip::ZipArchive;

use crate::core::config::defaults::SUPPORTED_FILE_TYPES;
use crate::core::errors::AssistantError;

const ADAPTER: &str = "document_loader";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentKind {
    Pdf,
    Text,
    Markdown,
    Docx,
}

impl DocumentKind {
    /// Classifies a file by extension, rejecting anything unsupported.
    pub fn from_path(path: &Path) -> Result<Self, AssistantError> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase())
            .unwrap_or_default();

        match extension.as_str() {
            "pdf" => Ok(DocumentKind::Pdf),
            "txt" => Ok(DocumentKind::Text),
            "md" => Ok(DocumentKind::Markdown),
            "docx" => Ok(DocumentKind::Docx),
            other => Err(AssistantError::validation(format!(
                "Unsupported file type '{}' for {} (supported: {})",
                other,
                path.display(),
                SUPPORTED_FILE_TYPES.join(", ")
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentSegment {
    pub text: String,
    /// File name the segment came from.
    pub source: String,
    /// 1-based page number, PDFs only.
    pub page: Option<u32>,
}

pub fn load_document(path: &Path) -> Result<Vec<DocumentSegment>, AssistantError> {
    let kind = DocumentKind::from_path(path)?;
    let source = path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or_default()
        .to_string();

    let segments = match kind {
        DocumentKind::Pdf => load_pdf(path, &source)?,
        DocumentKind::Text | DocumentKind::Markdown => vec![DocumentSegment {
            text: read_text(path)?,
            source,
            page: None,
        }],
        DocumentKind::Docx => vec![DocumentSegment {
            text: load_docx(path)?,
            source,
            page: None,
        }],
    };

    tracing::debug!(
        path = %path.display(),
        segments = segments.len(),
        "Loaded document"
    );
    Ok(segments)
}

fn read_text(path: &Path) -> Result<String, AssistantError> {
    let bytes = std::fs::read(path).map_err(|e| {
        AssistantError::adapter(ADAPTER, format!("Failed to read {}: {}", path.display(), e))
    })?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

fn load_pdf(path: &Path, source: &str) -> Result<Vec<DocumentSegment>, AssistantError> {
    let doc = lopdf::Document::load(path).map_err(|e| {
        AssistantError::adapter(ADAPTER, format!("Failed to load PDF {}: {}", path.display(), e))
    })?;

    let mut segments = Vec::new();
    for page_num in doc.get_pages().keys() {
        match doc.extract_text(&[*page_num]) {
            Ok(text) => segments.push(DocumentSegment {
                text,
                source: source.to_string(),
                page: Some(*page_num),
            }),
            Err(err) => {
                tracing::warn!(page = page_num, error = %err, "Failed to extract text from page, skipping");
            }
        }
    }

    if segments.iter().all(|segment| segment.text.trim().is_empty()) {
        return Err(AssistantError::adapter(
            ADAPTER,
            format!("No text content extracted from PDF {}", path.display()),
        ));
    }

    Ok(segments)
}

fn load_docx(path: &Path) -> Result<String, AssistantError> {
    let file = File::open(path).map_err(|e| {
        AssistantError::adapter(ADAPTER, format!("Failed to open {}: {}", path.display(), e))
    })?;
    let mut archive = ZipArchive::new(file)
        .map_err(|e| AssistantError::adapter(ADAPTER, format!("Failed to open zip archive: {}", e)))?;

    let mut xml = String::new();
    archive
        .by_name("word/document.xml")
        .map_err(|e| AssistantError::adapter(ADAPTER, format!("Missing word/document.xml: {}", e)))?
        .read_to_string(&mut xml)
        .map_err(|e| AssistantError::adapter(ADAPTER, e))?;

    docx_xml_to_text(&xml)
}

fn docx_xml_to_text(xml: &str) -> Result<String, AssistantError> {
    let with_breaks = xml
        .replace("</w:p>", "\n")
        .replace("<w:tab/>", "\t")
        .replace("<w:br/>", "\n");

    let tags = Regex::new(r"<[^>]*>").map_err(|e| AssistantError::adapter(ADAPTER, e))?;
    let stripped = tags.replace_all(&with_breaks, "");

    Ok(decode_xml_entities(&stripped)
        .lines()
        .map(|line| line.trim())
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n"))
}

fn decode_xml_entities(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn unsupported_extension_fails_before_reading() {
        // The file does not exist; rejection must come from the extension alone.
        let err = load_document(Path::new("/nonexistent/slides.pptx")).unwrap_err();
        assert!(matches!(err, AssistantError::Validation(msg) if msg.contains("pptx")));
    }

    #[test]
    fn text_and_markdown_load_as_single_segment() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("notes.MD");
        std::fs::write(&path, "# Cells\nMitochondria are the powerhouse.").expect("write");

        let segments = load_document(&path).expect("load");

        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].source, "notes.MD");
        assert!(segments[0].text.contains("powerhouse"));
        assert_eq!(segments[0].page, None);
    }

    #[test]
    fn docx_paragraphs_become_lines() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("essay.docx");
        let file = File::create(&path).expect("create");
        let mut writer = zip::ZipWriter::new(file);
        writer
            .start_file("word/document.xml", zip::write::SimpleFileOptions::default())
            .expect("start file");
        writer
            .write_all(
                br#"<w:document><w:body><w:p><w:r><w:t>Newton &amp; Leibniz</w:t></w:r></w:p><w:p><w:r><w:t>invented calculus</w:t></w:r></w:p></w:body></w:document>"#,
            )
            .expect("write xml");
        writer.finish().expect("finish");

        let segments = load_document(&path).expect("load");

        assert_eq!(segments[0].text, "Newton & Leibniz\ninvented calculus");
    }

    #[test]
    fn corrupt_pdf_is_adapter_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("broken.pdf");
        std::fs::write(&path, b"not a pdf").expect("write");

        let err = load_document(&path).unwrap_err();
        assert!(matches!(err, AssistantError::Adapter { adapter: "document_loader", .. }));
    }
}
