//! Process-local session store

use dashmap::DashMap;

use crate::error::Result;
use crate::types::Message;

use super::SessionStore;

/// Transcripts kept in a concurrent map.
///
/// Nothing is ever evicted; a long-running process grows with every session.
#[derive(Default)]
pub struct InMemorySessionStore {
    transcripts: DashMap<String, Vec<Message>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of sessions with a transcript
    pub fn session_count(&self) -> usize {
        self.transcripts.len()
    }
}

impl SessionStore for InMemorySessionStore {
    fn append(&self, session_id: &str, messages: &[Message]) -> Result<()> {
        self.transcripts
            .entry(session_id.to_string())
            .or_default()
            .extend_from_slice(messages);
        Ok(())
    }

    fn read(&self, session_id: &str) -> Result<Vec<Message>> {
        Ok(self
            .transcripts
            .get(session_id)
            .map(|t| t.value().clone())
            .unwrap_or_default())
    }

    fn clear(&self, session_id: &str) -> Result<()> {
        self.transcripts.remove(session_id);
        Ok(())
    }

    fn name(&self) -> &str {
        "memory"
    }
}
