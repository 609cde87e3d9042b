//! Configuration for the RAG assistant
//!
//! Values come from three layers, later layers winning: built-in defaults,
//! an optional TOML file named by `RAG_CONFIG`, and environment variables.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::error::{Error, Result};

/// Main RAG assistant configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RagConfig {
    /// Server configuration
    pub server: ServerConfig,
    /// Chat-completion backend configuration
    pub llm: LlmConfig,
    /// Embedding backend configuration
    pub embeddings: EmbeddingConfig,
    /// Chunking configuration
    pub chunking: ChunkingConfig,
    /// Vector index configuration
    pub vector_db: VectorDbConfig,
    /// Session transcript storage
    pub sessions: SessionConfig,
    /// Input validation and rate limiting
    pub validation: ValidationConfig,
    /// Retrieval tool configuration
    pub retrieval: RetrievalConfig,
    /// External trace reporting
    pub monitoring: MonitoringConfig,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host address
    pub host: String,
    /// Port number
    pub port: u16,
    /// Enable CORS
    pub enable_cors: bool,
    /// Maximum upload size in bytes (default: 50MB)
    pub max_upload_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            enable_cors: true,
            max_upload_size: 50 * 1024 * 1024,
        }
    }
}

/// Chat-completion (Groq, OpenAI-compatible) configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// API base URL (the `/chat/completions` path is appended)
    pub base_url: String,
    /// API key; no key means no language model is available
    pub api_key: Option<String>,
    /// Model name
    pub model: String,
    /// Sampling temperature
    pub temperature: f32,
    /// Maximum tokens in a completion
    pub max_tokens: u32,
    /// Per-call request timeout in seconds
    pub timeout_secs: u64,
    /// Number of retries for failed requests
    pub max_retries: u32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.groq.com/openai/v1".to_string(),
            api_key: None,
            model: "llama3-8b-8192".to_string(),
            temperature: 0.1,
            max_tokens: 512,
            timeout_secs: 15,
            max_retries: 1,
        }
    }
}

/// Embedding (Ollama) configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    /// Ollama base URL
    pub base_url: String,
    /// Embedding model name
    pub model: String,
    /// Embedding dimensions
    pub dimensions: usize,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Number of retries for failed requests
    pub max_retries: u32,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434".to_string(),
            model: "paraphrase-multilingual".to_string(),
            dimensions: 768,
            timeout_secs: 60,
            max_retries: 2,
        }
    }
}

/// Text chunking configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingConfig {
    /// Target chunk size in characters
    pub chunk_size: usize,
    /// Overlap between chunks in characters
    pub chunk_overlap: usize,
    /// Minimum chunk size (skip smaller trailing chunks)
    pub min_chunk_size: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: 800,
            chunk_overlap: 200,
            min_chunk_size: 50,
        }
    }
}

/// Vector index configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VectorDbConfig {
    /// Directory holding the index files
    pub storage_path: PathBuf,
    /// Collection the assistant reads and writes
    pub collection: String,
}

impl Default for VectorDbConfig {
    fn default() -> Self {
        Self {
            storage_path: PathBuf::from("./data/vector_db"),
            collection: "lpdp_docs".to_string(),
        }
    }
}

impl VectorDbConfig {
    /// Path of the SQLite file backing the index
    pub fn index_file(&self) -> PathBuf {
        self.storage_path.join("index.sqlite3")
    }
}

/// Which store keeps session transcripts
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SessionBackend {
    /// Checkpointed SQLite store, survives restarts
    #[default]
    Sqlite,
    /// Process-local map
    Memory,
}

impl FromStr for SessionBackend {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "sqlite" => Ok(Self::Sqlite),
            "memory" => Ok(Self::Memory),
            other => Err(Error::Config(format!("Unknown session backend: {}", other))),
        }
    }
}

/// Session transcript storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Preferred backend; falls back to memory when SQLite cannot be opened
    pub backend: SessionBackend,
    /// Checkpoint database path
    pub db_path: PathBuf,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            backend: SessionBackend::Sqlite,
            db_path: PathBuf::from("./data/sessions.sqlite3"),
        }
    }
}

/// Input validation and rate limiting
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    /// Ceiling on the estimated token count (`words * 1.3`)
    pub max_input_tokens: usize,
    /// Minimum seconds between accepted questions of one session
    pub rate_limit_secs: f64,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            max_input_tokens: 1000,
            rate_limit_secs: 2.0,
        }
    }
}

/// Retrieval tool configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Passages returned per search
    pub top_k: usize,
    /// Directory scanned by the admin populate command
    pub documents_path: PathBuf,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: 5,
            documents_path: PathBuf::from("./data/documents"),
        }
    }
}

/// LangSmith-compatible trace reporting
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitoringConfig {
    /// Report runs when an API key is present too
    pub enabled: bool,
    /// API key
    pub api_key: Option<String>,
    /// API endpoint
    pub endpoint: String,
    /// Project runs are filed under
    pub project: String,
}

impl Default for MonitoringConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            api_key: None,
            endpoint: "https://api.smith.langchain.com".to_string(),
            project: "lpdp-rag-assistant".to_string(),
        }
    }
}

impl RagConfig {
    /// Load defaults, then `RAG_CONFIG` (if set), then environment overrides
    pub fn load() -> Result<Self> {
        let mut config = match std::env::var("RAG_CONFIG") {
            Ok(path) if !path.trim().is_empty() => Self::from_toml_file(path.trim())?,
            _ => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Read a TOML file; missing sections take their defaults
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| {
            Error::Config(format!("Invalid config file {}: {}", path.display(), e))
        })
    }

    /// Overlay values from an environment lookup
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = var("HOST") {
            self.server.host = v;
        }
        if let Some(v) = var("PORT") {
            self.server.port = parse_var("PORT", &v)?;
        }

        if let Some(v) = var("GROQ_API_KEY") {
            self.llm.api_key = Some(v);
        }
        if let Some(v) = var("GROQ_MODEL") {
            self.llm.model = v;
        }
        if let Some(v) = var("GROQ_BASE_URL") {
            self.llm.base_url = v;
        }

        if let Some(v) = var("OLLAMA_BASE_URL") {
            self.embeddings.base_url = v;
        }
        if let Some(v) = var("EMBEDDING_MODEL") {
            self.embeddings.model = v;
        }
        if let Some(v) = var("EMBEDDING_DIMENSIONS") {
            self.embeddings.dimensions = parse_var("EMBEDDING_DIMENSIONS", &v)?;
        }

        if let Some(v) = var("VECTOR_DB_PATH") {
            self.vector_db.storage_path = PathBuf::from(v);
        }
        if let Some(v) = var("VECTOR_COLLECTION_NAME") {
            self.vector_db.collection = v;
        }
        if let Some(v) = var("DOCUMENTS_PATH") {
            self.retrieval.documents_path = PathBuf::from(v);
        }

        if let Some(v) = var("CHUNK_SIZE") {
            self.chunking.chunk_size = parse_var("CHUNK_SIZE", &v)?;
        }
        if let Some(v) = var("CHUNK_OVERLAP") {
            self.chunking.chunk_overlap = parse_var("CHUNK_OVERLAP", &v)?;
        }
        if let Some(v) = var("MAX_INPUT_TOKENS") {
            self.validation.max_input_tokens = parse_var("MAX_INPUT_TOKENS", &v)?;
        }
        if let Some(v) = var("RATE_LIMIT_SECS") {
            self.validation.rate_limit_secs = parse_var("RATE_LIMIT_SECS", &v)?;
        }

        if let Some(v) = var("SESSION_BACKEND") {
            self.sessions.backend = v.parse()?;
        }
        if let Some(v) = var("SESSION_DB_PATH") {
            self.sessions.db_path = PathBuf::from(v);
        }

        if let Some(v) = var("LANGSMITH_TRACING") {
            self.monitoring.enabled = matches!(v.to_lowercase().as_str(), "1" | "true" | "yes");
        }
        if let Some(v) = var("LANGSMITH_API_KEY") {
            self.monitoring.api_key = Some(v);
        }
        if let Some(v) = var("LANGSMITH_ENDPOINT") {
            self.monitoring.endpoint = v;
        }
        if let Some(v) = var("LANGSMITH_PROJECT") {
            self.monitoring.project = v;
        }

        self.validate()
    }

    /// Reject combinations the pipeline cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.chunking.chunk_size == 0 {
            return Err(Error::Config("chunk_size must be positive".to_string()));
        }
        if self.chunking.chunk_overlap >= self.chunking.chunk_size {
            return Err(Error::Config(format!(
                "chunk_overlap ({}) must be smaller than chunk_size ({})",
                self.chunking.chunk_overlap, self.chunking.chunk_size
            )));
        }
        if self.retrieval.top_k == 0 {
            return Err(Error::Config("retrieval.top_k must be positive".to_string()));
        }
        let secs = self.validation.rate_limit_secs;
        if !secs.is_finite() || secs < 0.0 {
            return Err(Error::Config(format!(
                "rate_limit_secs must be a finite, non-negative number, got {}",
                secs
            )));
        }
        Ok(())
    }
}

fn parse_var<T: FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| Error::Config(format!("Invalid value for {}: {}", key, value)))
}
