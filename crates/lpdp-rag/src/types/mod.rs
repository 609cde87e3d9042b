//! Core types for conversations, documents, and responses

pub mod document;
pub mod envelope;
pub mod message;

pub use document::{FileType, PassageInput};
pub use envelope::{AnswerEnvelope, CollectionStats, EnvelopeMetadata, HistoryEntry};
pub use message::{Message, RetrievedPassage, Role, ToolInvocation};
