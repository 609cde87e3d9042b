//! Checkpointed session store backed by SQLite

use chrono::Utc;
use parking_lot::Mutex;
use rusqlite::{params, Connection};
use std::path::Path;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::types::Message;

use super::SessionStore;

/// Transcripts persisted as one JSON row per message, keyed by thread id
/// (`user_{session_id}`)
pub struct SqliteSessionStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteSessionStore {
    /// Create or open the checkpoint database at the given path
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        if let Some(parent) = path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(path)
            .map_err(|e| Error::Session(format!("Failed to open checkpoint db: {}", e)))?;
        Self::with_connection(conn)
    }

    /// In-memory database (for testing)
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| Error::Session(format!("Failed to open in-memory db: {}", e)))?;
        Self::with_connection(conn)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        let store = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        store.migrate()?;
        Ok(store)
    }

    fn migrate(&self) -> Result<()> {
        let conn = self.conn.lock();

        conn.execute_batch(
            r#"
            PRAGMA journal_mode=WAL;
            PRAGMA synchronous=NORMAL;
        "#,
        )
        .map_err(|e| Error::Session(format!("Failed to set pragmas: {}", e)))?;

        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS checkpoints (
                seq INTEGER PRIMARY KEY AUTOINCREMENT,
                thread_id TEXT NOT NULL,
                payload TEXT NOT NULL,
                written_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_checkpoints_thread ON checkpoints(thread_id, seq);
        "#,
        )
        .map_err(|e| Error::Session(format!("Failed to create schema: {}", e)))?;

        Ok(())
    }
}

fn thread_id(session_id: &str) -> String {
    format!("user_{}", session_id)
}

impl SessionStore for SqliteSessionStore {
    fn append(&self, session_id: &str, messages: &[Message]) -> Result<()> {
        if messages.is_empty() {
            return Ok(());
        }
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO checkpoints (thread_id, payload, written_at) VALUES (?1, ?2, ?3)",
            )?;
            let now = Utc::now().to_rfc3339();
            for message in messages {
                stmt.execute(params![thread_id(session_id), serde_json::to_string(message)?, now])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    fn read(&self, session_id: &str) -> Result<Vec<Message>> {
        let conn = self.conn.lock();
        let mut stmt =
            conn.prepare("SELECT payload FROM checkpoints WHERE thread_id = ?1 ORDER BY seq")?;
        let rows = stmt.query_map(params![thread_id(session_id)], |row| row.get::<_, String>(0))?;

        let mut transcript = Vec::new();
        for row in rows {
            transcript.push(serde_json::from_str(&row?)?);
        }
        Ok(transcript)
    }

    fn clear(&self, session_id: &str) -> Result<()> {
        let conn = self.conn.lock();
        conn.execute(
            "DELETE FROM checkpoints WHERE thread_id = ?1",
            params![thread_id(session_id)],
        )?;
        Ok(())
    }

    fn name(&self) -> &str {
        "sqlite"
    }
}
