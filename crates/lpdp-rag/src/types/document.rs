//! Document types for ingestion

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Supported file types
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    /// PDF document
    Pdf,
    /// Microsoft Word document (.docx)
    Docx,
    /// Plain text file
    Txt,
    /// JSON data file
    Json,
    /// Unknown file type
    Unknown,
}

impl FileType {
    /// Detect file type from extension
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_lowercase().as_str() {
            "pdf" => Self::Pdf,
            "docx" => Self::Docx,
            "txt" | "text" | "md" => Self::Txt,
            "json" => Self::Json,
            _ => Self::Unknown,
        }
    }

    /// Detect file type from a filename
    pub fn from_filename(filename: &str) -> Self {
        match filename.rsplit_once('.') {
            Some((_, ext)) => Self::from_extension(ext),
            None => Self::Unknown,
        }
    }

    /// Whether the admin upload endpoint accepts this type
    pub fn is_uploadable(&self) -> bool {
        matches!(self, Self::Pdf | Self::Txt | Self::Docx)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Docx => "docx",
            Self::Txt => "txt",
            Self::Json => "json",
            Self::Unknown => "unknown",
        }
    }
}

/// Text to index along with its metadata
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PassageInput {
    pub text: String,
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

impl PassageInput {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            metadata: Map::new(),
        }
    }

    pub fn with_meta(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.to_string(), value.into());
        self
    }

    /// Label shown to users as the passage origin
    pub fn source_label(&self) -> String {
        ["title", "source", "url"]
            .iter()
            .find_map(|key| self.metadata.get(*key).and_then(Value::as_str))
            .unwrap_or("Vector Database")
            .to_string()
    }
}
