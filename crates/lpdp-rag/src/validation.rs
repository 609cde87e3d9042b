//! Question validation run before any pipeline work

use regex::Regex;

use crate::config::ValidationConfig;
use crate::error::{Error, Result};

/// Estimated tokens per whitespace-separated word
const TOKENS_PER_WORD: f64 = 1.3;

pub const EMPTY_QUESTION: &str = "Pertanyaan tidak boleh kosong";
pub const OFF_DOMAIN: &str = "Pertanyaan harus terkait dengan informasi beasiswa LPDP.";

/// Requests for creative writing or copied content
const OFF_DOMAIN_PATTERNS: [&str; 2] = [
    r"\b(cerpen|novel|cerita|story)\b",
    r"\b(copy|paste|artikel|blog)\b",
];

/// Rejects empty, over-long, and off-domain questions
#[derive(Debug, Clone)]
pub struct QuestionValidator {
    max_input_tokens: usize,
    blocklist: Vec<Regex>,
}

impl QuestionValidator {
    pub fn new(max_input_tokens: usize) -> Result<Self> {
        let blocklist = OFF_DOMAIN_PATTERNS
            .iter()
            .map(|p| Regex::new(p).map_err(|e| Error::Config(format!("Bad pattern {}: {}", p, e))))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            max_input_tokens,
            blocklist,
        })
    }

    pub fn from_config(config: &ValidationConfig) -> Result<Self> {
        Self::new(config.max_input_tokens)
    }

    /// Estimated token count (`words * 1.3`)
    pub fn estimate_tokens(question: &str) -> f64 {
        question.split_whitespace().count() as f64 * TOKENS_PER_WORD
    }

    /// Check a question; failures are `Error::InvalidInput` with a
    /// user-facing message
    pub fn validate(&self, question: &str) -> Result<()> {
        let question = question.trim();
        if question.is_empty() {
            return Err(Error::invalid_input(EMPTY_QUESTION));
        }

        if Self::estimate_tokens(question) > self.max_input_tokens as f64 {
            let max_words = (self.max_input_tokens as f64 / TOKENS_PER_WORD) as usize;
            return Err(Error::invalid_input(format!(
                "Pertanyaan terlalu panjang. Maksimal sekitar {} kata.",
                max_words
            )));
        }

        let lowered = question.to_lowercase();
        if self.blocklist.iter().any(|re| re.is_match(&lowered)) {
            return Err(Error::invalid_input(OFF_DOMAIN));
        }

        Ok(())
    }
}
