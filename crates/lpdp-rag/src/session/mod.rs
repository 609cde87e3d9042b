//! Per-session transcript storage
//!
//! Both backends satisfy the same contract: `read` returns exactly what was
//! appended, in order; `clear` always succeeds.

pub mod memory;
pub mod sqlite;

pub use memory::InMemorySessionStore;
pub use sqlite::SqliteSessionStore;

use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::config::{SessionBackend, SessionConfig};
use crate::error::Result;
use crate::types::Message;

/// Keyed persistence of session transcripts
pub trait SessionStore: Send + Sync {
    /// Append messages in order, creating the session if absent
    fn append(&self, session_id: &str, messages: &[Message]) -> Result<()>;

    /// Ordered transcript; empty for unknown sessions
    fn read(&self, session_id: &str) -> Result<Vec<Message>>;

    /// Drop the transcript; unknown sessions are a no-op
    fn clear(&self, session_id: &str) -> Result<()>;

    /// Backend name for logging and stats
    fn name(&self) -> &str;
}

/// Open the configured store, falling back to memory when SQLite is unusable
pub fn open_session_store(config: &SessionConfig) -> Arc<dyn SessionStore> {
    match config.backend {
        SessionBackend::Memory => Arc::new(InMemorySessionStore::new()),
        SessionBackend::Sqlite => match SqliteSessionStore::open(&config.db_path) {
            Ok(store) => {
                tracing::info!("Session checkpoints at {}", config.db_path.display());
                Arc::new(store)
            }
            Err(e) => {
                tracing::warn!(
                    "Checkpoint store unavailable ({}), keeping sessions in memory",
                    e
                );
                Arc::new(InMemorySessionStore::new())
            }
        },
    }
}

/// One async mutex per session key, serializing read-modify-append
#[derive(Default)]
pub struct SessionLocks {
    locks: DashMap<String, Arc<Mutex<()>>>,
}

impl SessionLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `session_id`
    pub async fn acquire(&self, session_id: &str) -> OwnedMutexGuard<()> {
        let lock = self
            .locks
            .entry(session_id.to_string())
            .or_default()
            .clone();
        lock.lock_owned().await
    }
}
