//! File parsing for uploaded and bulk-loaded documents

use std::path::Path;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use crate::error::{Error, Result};
use crate::types::{FileType, PassageInput};

/// Language tag attached to every loaded document
pub const DOCUMENT_LANGUAGE: &str = "indonesian";

/// Upper bound for a single PDF extraction
const PDF_EXTRACT_TIMEOUT: Duration = Duration::from_secs(60);

/// Multi-format file parser
pub struct FileParser;

impl FileParser {
    /// Parse a file into one passage carrying `source`, `title`,
    /// `file_type` and `language` metadata
    pub fn parse(filename: &str, data: &[u8]) -> Result<PassageInput> {
        let file_type = FileType::from_filename(filename);

        let text = match file_type {
            FileType::Pdf => Self::parse_pdf(filename, data)?,
            FileType::Docx => Self::parse_docx(filename, data)?,
            FileType::Txt => String::from_utf8_lossy(data).into_owned(),
            FileType::Json => Self::parse_json(filename, data)?,
            FileType::Unknown => {
                let ext = filename.rsplit_once('.').map(|(_, e)| e).unwrap_or("");
                return Err(Error::UnsupportedFileType(ext.to_string()));
            }
        };

        if text.trim().is_empty() {
            return Err(Error::file_parse(filename, "No text content could be extracted"));
        }

        Ok(PassageInput::new(text)
            .with_meta("source", filename)
            .with_meta("title", filename)
            .with_meta("file_type", file_type.as_str())
            .with_meta("language", DOCUMENT_LANGUAGE))
    }

    /// Read and parse a file from disk
    pub fn parse_path(path: &Path) -> Result<PassageInput> {
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let data = std::fs::read(path)?;
        Self::parse(&filename, &data)
    }

    /// Extract PDF text on a helper thread so a pathological file cannot
    /// hang the caller
    fn parse_pdf(filename: &str, data: &[u8]) -> Result<String> {
        let data_vec = data.to_vec();
        let (tx, rx) = mpsc::channel();

        let handle = thread::spawn(move || {
            let result = pdf_extract::extract_text_from_mem(&data_vec);
            let _ = tx.send(result);
        });

        let text = match rx.recv_timeout(PDF_EXTRACT_TIMEOUT) {
            Ok(Ok(text)) => {
                let _ = handle.join();
                text
            }
            Ok(Err(e)) => {
                let _ = handle.join();
                return Err(Error::file_parse(filename, e.to_string()));
            }
            Err(mpsc::RecvTimeoutError::Timeout) => {
                tracing::error!("PDF extraction of {} timed out", filename);
                return Err(Error::file_parse(filename, "PDF extraction timed out"));
            }
            Err(mpsc::RecvTimeoutError::Disconnected) => {
                tracing::error!("PDF extraction thread crashed on {}", filename);
                return Err(Error::file_parse(filename, "PDF extraction crashed"));
            }
        };

        Ok(clean_extracted_text(&text))
    }

    fn parse_docx(filename: &str, data: &[u8]) -> Result<String> {
        let doc = docx_rs::read_docx(data).map_err(|e| Error::file_parse(filename, e.to_string()))?;

        let mut content = String::new();
        for child in doc.document.children {
            if let docx_rs::DocumentChild::Paragraph(p) = child {
                for child in p.children {
                    if let docx_rs::ParagraphChild::Run(run) = child {
                        for child in run.children {
                            if let docx_rs::RunChild::Text(t) = child {
                                content.push_str(&t.text);
                            }
                        }
                    }
                }
                content.push('\n');
            }
        }
        Ok(content)
    }

    /// JSON documents are indexed as their pretty-printed text
    fn parse_json(filename: &str, data: &[u8]) -> Result<String> {
        let value: serde_json::Value = serde_json::from_slice(data)
            .map_err(|e| Error::file_parse(filename, format!("Invalid JSON: {}", e)))?;
        Ok(serde_json::to_string_pretty(&value)?)
    }
}

/// Drop null bytes, trim lines, and remove blank lines
fn clean_extracted_text(text: &str) -> String {
    text.replace('\0', "")
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}
