//! lpdp-rag: conversational assistant for LPDP scholarship information
//!
//! Every question runs through a small state machine: the model decides
//! whether to call the `search` tool, retrieved passages ground the final
//! answer, and the turn is appended to a per-session transcript. Documents
//! are parsed, chunked, embedded and kept in a SQLite-backed vector index.

pub mod config;
pub mod error;
pub mod graph;
pub mod ingestion;
pub mod monitoring;
pub mod providers;
pub mod retrieval;
pub mod server;
pub mod service;
pub mod session;
pub mod types;
pub mod validation;

pub use config::RagConfig;
pub use error::{Error, Result};
pub use service::RagService;
pub use types::{AnswerEnvelope, CollectionStats, HistoryEntry, Message, PassageInput};
