//! Persistent vector index over document passages
//!
//! Embeddings are stored as little-endian f32 blobs in SQLite and searched
//! by brute-force cosine similarity, which is plenty for a single-program
//! document collection.

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use rusqlite::{params, Connection};
use std::path::Path;
use std::sync::Arc;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::providers::EmbeddingProvider;
use crate::types::{PassageInput, RetrievedPassage};

/// Trait for the searchable passage collection
#[async_trait]
pub trait DocumentIndex: Send + Sync {
    /// Embed and store passages, returning how many were stored
    async fn add(&self, passages: Vec<PassageInput>) -> Result<usize>;

    /// Top-`k` passages most similar to `query`
    async fn search(&self, query: &str, k: usize) -> Result<Vec<RetrievedPassage>>;

    /// Number of stored passages
    async fn count(&self) -> Result<usize>;

    /// Remove every stored passage, returning how many were removed
    async fn clear(&self) -> Result<usize>;

    /// Get index name for logging and stats
    fn name(&self) -> &str;

    /// Embedding model backing the index
    fn embedding_model(&self) -> &str;
}

/// A stored passage returned by a scan
#[derive(Debug, Clone)]
struct StoredPassage {
    content: String,
    source: String,
}

/// Synchronous SQLite table of passages for one collection
pub struct VectorTable {
    conn: Arc<Mutex<Connection>>,
    collection: String,
}

impl VectorTable {
    /// Create or open the table at the given path
    pub fn open<P: AsRef<Path>>(path: P, collection: &str) -> Result<Self> {
        if let Some(parent) = path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(path)
            .map_err(|e| Error::VectorDb(format!("Failed to open index: {}", e)))?;
        Self::with_connection(conn, collection)
    }

    /// In-memory table (tests, ephemeral runs)
    pub fn in_memory(collection: &str) -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| Error::VectorDb(format!("Failed to open in-memory index: {}", e)))?;
        Self::with_connection(conn, collection)
    }

    fn with_connection(conn: Connection, collection: &str) -> Result<Self> {
        let table = Self {
            conn: Arc::new(Mutex::new(conn)),
            collection: collection.to_string(),
        };
        table.migrate()?;
        Ok(table)
    }

    fn migrate(&self) -> Result<()> {
        let conn = self.conn.lock();

        conn.execute_batch(
            r#"
            PRAGMA journal_mode=WAL;
            PRAGMA synchronous=NORMAL;
            PRAGMA temp_store=MEMORY;
        "#,
        )
        .map_err(|e| Error::VectorDb(format!("Failed to set pragmas: {}", e)))?;

        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS passages (
                id TEXT PRIMARY KEY,
                collection TEXT NOT NULL,
                content TEXT NOT NULL,
                source TEXT NOT NULL,
                metadata TEXT NOT NULL,
                embedding BLOB NOT NULL,
                created_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_passages_collection ON passages(collection);
        "#,
        )
        .map_err(|e| Error::VectorDb(format!("Failed to create schema: {}", e)))?;

        Ok(())
    }

    fn insert(&self, passages: &[(PassageInput, Vec<f32>)]) -> Result<usize> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO passages (id, collection, content, source, metadata, embedding, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            )?;
            let now = Utc::now().to_rfc3339();
            for (passage, embedding) in passages {
                stmt.execute(params![
                    Uuid::new_v4().to_string(),
                    self.collection,
                    passage.text,
                    passage.source_label(),
                    serde_json::to_string(&passage.metadata)?,
                    encode_embedding(embedding),
                    now,
                ])?;
            }
        }
        tx.commit()?;
        Ok(passages.len())
    }

    fn search(&self, query: &[f32], k: usize) -> Result<Vec<(StoredPassage, f32)>> {
        let conn = self.conn.lock();
        let mut stmt = conn
            .prepare("SELECT content, source, embedding FROM passages WHERE collection = ?1")?;

        let rows = stmt.query_map(params![self.collection], |row| {
            let content: String = row.get(0)?;
            let source: String = row.get(1)?;
            let embedding: Vec<u8> = row.get(2)?;
            Ok((content, source, embedding))
        })?;

        let mut scored = Vec::new();
        for row in rows {
            let (content, source, blob) = row?;
            let score = cosine_similarity(query, &decode_embedding(&blob));
            scored.push((StoredPassage { content, source }, score));
        }

        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(k);
        Ok(scored)
    }

    fn count(&self) -> Result<usize> {
        let conn = self.conn.lock();
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM passages WHERE collection = ?1",
            params![self.collection],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    fn clear(&self) -> Result<usize> {
        let conn = self.conn.lock();
        let removed = conn.execute(
            "DELETE FROM passages WHERE collection = ?1",
            params![self.collection],
        )?;
        Ok(removed)
    }
}

/// Encode an embedding as little-endian f32 bytes
fn encode_embedding(embedding: &[f32]) -> Vec<u8> {
    embedding.iter().flat_map(|v| v.to_le_bytes()).collect()
}

fn decode_embedding(blob: &[u8]) -> Vec<f32> {
    blob.chunks_exact(4)
        .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect()
}

/// Cosine similarity; 0.0 for mismatched or zero vectors
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

/// Vector index combining an embedding provider with a SQLite table
pub struct SqliteVectorIndex {
    table: Arc<VectorTable>,
    embedder: Arc<dyn EmbeddingProvider>,
    embedding_model: String,
}

impl SqliteVectorIndex {
    pub fn new(
        table: VectorTable,
        embedder: Arc<dyn EmbeddingProvider>,
        embedding_model: impl Into<String>,
    ) -> Self {
        Self {
            table: Arc::new(table),
            embedder,
            embedding_model: embedding_model.into(),
        }
    }
}

#[async_trait]
impl DocumentIndex for SqliteVectorIndex {
    async fn add(&self, passages: Vec<PassageInput>) -> Result<usize> {
        let passages: Vec<PassageInput> = passages
            .into_iter()
            .filter(|p| !p.text.trim().is_empty())
            .collect();
        if passages.is_empty() {
            return Ok(0);
        }

        let texts: Vec<String> = passages.iter().map(|p| p.text.clone()).collect();
        let embeddings = self.embedder.embed_batch(&texts).await?;
        if embeddings.len() != passages.len() {
            return Err(Error::Embedding(format!(
                "Expected {} embeddings, got {}",
                passages.len(),
                embeddings.len()
            )));
        }
        let width = self.embedder.dimensions();
        if let Some(bad) = embeddings.iter().find(|e| e.len() != width) {
            return Err(Error::Embedding(format!(
                "{} returned a {}-dimensional vector, expected {}",
                self.embedder.name(),
                bad.len(),
                width
            )));
        }

        let rows: Vec<(PassageInput, Vec<f32>)> = passages.into_iter().zip(embeddings).collect();
        let table = self.table.clone();
        let stored = tokio::task::spawn_blocking(move || table.insert(&rows))
            .await
            .map_err(|e| Error::Internal(format!("Task join error: {}", e)))??;

        tracing::info!("Indexed {} passages", stored);
        Ok(stored)
    }

    async fn search(&self, query: &str, k: usize) -> Result<Vec<RetrievedPassage>> {
        let embedding = self.embedder.embed(query).await?;
        let table = self.table.clone();

        let hits = tokio::task::spawn_blocking(move || table.search(&embedding, k))
            .await
            .map_err(|e| Error::Internal(format!("Task join error: {}", e)))??;

        Ok(hits
            .into_iter()
            .map(|(stored, score)| RetrievedPassage {
                content: stored.content,
                source: stored.source,
                score,
            })
            .collect())
    }

    async fn count(&self) -> Result<usize> {
        let table = self.table.clone();
        tokio::task::spawn_blocking(move || table.count())
            .await
            .map_err(|e| Error::Internal(format!("Task join error: {}", e)))?
    }

    async fn clear(&self) -> Result<usize> {
        let table = self.table.clone();
        tokio::task::spawn_blocking(move || table.clear())
            .await
            .map_err(|e| Error::Internal(format!("Task join error: {}", e)))?
    }

    fn name(&self) -> &str {
        "sqlite"
    }

    fn embedding_model(&self) -> &str {
        &self.embedding_model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Embeds text as letter-frequency counts over a few keywords
    struct KeywordEmbedder;

    #[async_trait]
    impl EmbeddingProvider for KeywordEmbedder {
        async fn embed(&self, text: &str) -> Result<Vec<f32>> {
            let lower = text.to_lowercase();
            Ok(["usia", "ipk", "toefl", "dana"]
                .iter()
                .map(|kw| lower.matches(kw).count() as f32 + 0.01)
                .collect())
        }

        fn dimensions(&self) -> usize {
            4
        }

        fn name(&self) -> &str {
            "keyword"
        }
    }

    fn index() -> SqliteVectorIndex {
        SqliteVectorIndex::new(
            VectorTable::in_memory("lpdp_docs").unwrap(),
            Arc::new(KeywordEmbedder),
            "keyword",
        )
    }

    #[test]
    fn test_embedding_blob_encoding() {
        let v = vec![0.5f32, -1.25, 3.0];
        let blob = encode_embedding(&v);
        assert_eq!(blob.len(), 12);
        assert_eq!(decode_embedding(&blob), v);
    }

    #[test]
    fn test_cosine_similarity_edges() {
        assert!((cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]) - 1.0).abs() < 1e-6);
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]), 0.0);
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 2.0]), 0.0);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 1.0]), 0.0);
    }

    #[tokio::test]
    async fn test_search_ranks_by_similarity() {
        let index = index();
        let added = index
            .add(vec![
                PassageInput::new("Batas usia pendaftar maksimal 35 tahun, usia dihitung saat daftar.")
                    .with_meta("title", "Persyaratan Umum"),
                PassageInput::new("Skor TOEFL minimal 80 untuk dalam negeri.")
                    .with_meta("source", "bahasa.pdf"),
                PassageInput::new("   "),
            ])
            .await
            .unwrap();
        assert_eq!(added, 2);
        assert_eq!(index.count().await.unwrap(), 2);

        let hits = index.search("berapa batas usia?", 1).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].source, "Persyaratan Umum");
        assert!(hits[0].content.contains("35 tahun"));
    }

    #[tokio::test]
    async fn test_clear_only_touches_own_collection() {
        let table = VectorTable::in_memory("lpdp_docs").unwrap();
        let other = VectorTable {
            conn: table.conn.clone(),
            collection: "other".to_string(),
        };
        other
            .insert(&[(PassageInput::new("lain"), vec![1.0, 0.0, 0.0, 0.0])])
            .unwrap();

        let index = SqliteVectorIndex::new(table, Arc::new(KeywordEmbedder), "keyword");
        index.add(vec![PassageInput::new("dana hidup")]).await.unwrap();

        assert_eq!(index.clear().await.unwrap(), 1);
        assert_eq!(index.count().await.unwrap(), 0);
        assert_eq!(other.count().unwrap(), 1);
    }

    struct NarrowEmbedder;

    #[async_trait]
    impl EmbeddingProvider for NarrowEmbedder {
        async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
            Ok(vec![1.0, 0.0])
        }

        fn dimensions(&self) -> usize {
            4
        }

        fn name(&self) -> &str {
            "narrow"
        }
    }

    #[tokio::test]
    async fn test_rejects_vectors_of_wrong_width() {
        let index = SqliteVectorIndex::new(
            VectorTable::in_memory("lpdp_docs").unwrap(),
            Arc::new(NarrowEmbedder),
            "narrow",
        );
        let err = index.add(vec![PassageInput::new("dana hidup")]).await.unwrap_err();
        assert!(matches!(err, Error::Embedding(_)));
        assert_eq!(index.count().await.unwrap(), 0);
    }
}
