//! Document ingestion: parsing files and chunking their text

pub mod chunker;
pub mod parser;

pub use chunker::TextChunker;
pub use parser::{FileParser, DOCUMENT_LANGUAGE};

use std::path::Path;

use crate::error::Result;
use crate::types::{FileType, PassageInput};

/// File types picked up when bulk-loading a documents directory
const BULK_TYPES: [FileType; 3] = [FileType::Pdf, FileType::Json, FileType::Txt];

/// Parse every supported file in `dir` (non-recursive, sorted by name).
///
/// Files that fail to parse are logged and skipped.
pub fn load_directory(dir: &Path) -> Result<Vec<PassageInput>> {
    let mut paths: Vec<_> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.is_file())
        .filter(|p| {
            let name = p.file_name().map(|n| n.to_string_lossy()).unwrap_or_default();
            BULK_TYPES.contains(&FileType::from_filename(&name))
        })
        .collect();
    paths.sort();

    let mut passages = Vec::with_capacity(paths.len());
    for path in paths {
        match FileParser::parse_path(&path) {
            Ok(passage) => {
                tracing::info!("Loaded {}", path.display());
                passages.push(passage);
            }
            Err(e) => tracing::warn!("Skipping {}: {}", path.display(), e),
        }
    }
    Ok(passages)
}
