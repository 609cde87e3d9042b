//! Text chunking into overlapping windows

use unicode_segmentation::UnicodeSegmentation;

use crate::config::ChunkingConfig;
use crate::types::PassageInput;

/// Text chunker with configurable size and overlap (both in characters)
#[derive(Debug, Clone)]
pub struct TextChunker {
    /// Target chunk size in characters
    chunk_size: usize,
    /// Overlap between chunks
    overlap: usize,
    /// Minimum chunk size
    min_size: usize,
}

impl TextChunker {
    /// Create a new chunker
    pub fn new(chunk_size: usize, overlap: usize) -> Self {
        let chunk_size = chunk_size.max(1);
        Self {
            chunk_size,
            overlap: overlap.min(chunk_size - 1),
            min_size: 50.min(chunk_size),
        }
    }

    pub fn from_config(config: &ChunkingConfig) -> Self {
        let mut chunker = Self::new(config.chunk_size, config.chunk_overlap);
        chunker.min_size = config.min_chunk_size.min(chunker.chunk_size);
        chunker
    }

    /// Split a passage into chunks, each inheriting the passage metadata plus
    /// `chunk_index`.
    ///
    /// Text that fits in one chunk is returned whole, even below `min_size`.
    pub fn chunk_passage(&self, passage: &PassageInput) -> Vec<PassageInput> {
        let text = passage.text.trim();
        if text.is_empty() {
            return Vec::new();
        }
        if text.chars().count() <= self.chunk_size {
            return vec![PassageInput {
                text: text.to_string(),
                metadata: passage.metadata.clone(),
            }
            .with_meta("chunk_index", 0)];
        }

        self.chunk_text(text)
            .into_iter()
            .enumerate()
            .map(|(i, chunk)| {
                PassageInput {
                    text: chunk,
                    metadata: passage.metadata.clone(),
                }
                .with_meta("chunk_index", i)
            })
            .collect()
    }

    /// Chunk raw text along sentence bounds
    pub fn chunk_text(&self, text: &str) -> Vec<String> {
        let mut chunks = Vec::new();
        let mut current = String::new();
        let mut current_len = 0usize;
        // Whether `current` holds text no chunk has emitted yet
        let mut fresh = false;

        for piece in self.split_into_pieces(text) {
            let piece_len = piece.chars().count();

            // If adding this piece exceeds chunk size, save current chunk
            if current_len > 0 && current_len + piece_len > self.chunk_size {
                if fresh {
                    chunks.push(current.trim().to_string());
                }

                // Start new chunk with overlap; a short chunk carries none
                current = if current_len >= self.min_size {
                    self.overlap_text(&current)
                } else {
                    String::new()
                };
                current_len = current.chars().count();
                if current_len + piece_len > self.chunk_size {
                    current.clear();
                    current_len = 0;
                }
                fresh = false;
            }

            current.push_str(piece);
            current_len += piece_len;
            fresh |= !piece.trim().is_empty();
        }

        if fresh {
            chunks.push(current.trim().to_string());
        }

        chunks.retain(|c| !c.is_empty());
        chunks
    }

    /// Sentences, with any sentence longer than a chunk split into
    /// chunk-sized slices
    fn split_into_pieces<'a>(&self, text: &'a str) -> Vec<&'a str> {
        let step = self.chunk_size - self.overlap;
        let mut pieces = Vec::new();

        for sentence in text.split_sentence_bounds() {
            if sentence.chars().count() <= self.chunk_size {
                pieces.push(sentence);
                continue;
            }
            let bounds: Vec<usize> = sentence
                .char_indices()
                .map(|(i, _)| i)
                .chain(std::iter::once(sentence.len()))
                .collect();
            let mut start = 0usize;
            while start < bounds.len() - 1 {
                let end = (start + step).min(bounds.len() - 1);
                pieces.push(&sentence[bounds[start]..bounds[end]]);
                start = end;
            }
        }
        pieces
    }

    /// Tail of a chunk carried into the next one
    fn overlap_text(&self, text: &str) -> String {
        if self.overlap == 0 {
            return String::new();
        }
        let total = text.chars().count();
        if total <= self.overlap {
            return text.to_string();
        }

        let start = text
            .char_indices()
            .nth(total - self.overlap)
            .map(|(i, _)| i)
            .unwrap_or(0);
        let tail = &text[start..];

        // Try to start at a sentence boundary
        if let Some(pos) = tail.find(". ") {
            return tail[pos + 2..].to_string();
        }

        // Fall back to word boundary
        if let Some(pos) = tail.find(' ') {
            return tail[pos + 1..].to_string();
        }

        tail.to_string()
    }
}

impl Default for TextChunker {
    fn default() -> Self {
        Self::from_config(&ChunkingConfig::default())
    }
}
