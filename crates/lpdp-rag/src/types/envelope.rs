//! Response types returned by the assistant facade

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Confidence reported for every successful answer.
///
/// Placeholder: nothing is scored yet.
pub const ANSWER_CONFIDENCE: f32 = 0.8;

/// Answer to one question
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerEnvelope {
    /// Answer text (markdown)
    pub answer: String,
    /// Labels of the documents the answer was grounded on
    pub sources: Vec<String>,
    /// Confidence score (0.0-1.0)
    pub confidence: f32,
    /// Whether the answer was cut short and a follow-up is expected
    pub needs_continuation: bool,
    /// Request metadata
    pub metadata: EnvelopeMetadata,
}

/// Metadata attached to an answer
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EnvelopeMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub approach: Option<String>,
    /// Seconds spent answering
    #[serde(skip_serializing_if = "Option::is_none")]
    pub processing_time: Option<f64>,
    /// Graph states visited, in order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub steps: Vec<String>,
    /// Set when the answer is a canned failure message
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub error: bool,
}

impl AnswerEnvelope {
    /// Envelope for a successfully generated answer
    pub fn answered(answer: String, sources: Vec<String>, metadata: EnvelopeMetadata) -> Self {
        Self {
            answer,
            sources,
            confidence: ANSWER_CONFIDENCE,
            needs_continuation: false,
            metadata,
        }
    }

    /// Envelope carrying an error or fallback message
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            answer: message.into(),
            sources: Vec::new(),
            confidence: 0.0,
            needs_continuation: false,
            metadata: EnvelopeMetadata {
                timestamp: Utc::now(),
                error: true,
                ..Default::default()
            },
        }
    }
}

/// Entry of the `/chat/history` view
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// `human` or `ai`
    #[serde(rename = "type")]
    pub kind: String,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

/// Collection statistics for the admin dashboard
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionStats {
    pub document_count: usize,
    pub vector_store_type: String,
    pub embedding_model: String,
    pub llm_available: bool,
    pub rag_approach: String,
    pub chat_history_managed_by: String,
}
