//! RAG orchestration facade
//!
//! Validates questions, runs the conversation graph, and shapes its outcome
//! into an `AnswerEnvelope`. Document ingestion and statistics go through
//! here too, so the HTTP layer and the admin binary share one entry point.

use chrono::Utc;
use serde_json::json;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use crate::config::RagConfig;
use crate::error::{Error, Result, GENERIC_FAILURE};
use crate::graph::ConversationGraph;
use crate::ingestion::{self, FileParser, TextChunker};
use crate::monitoring::{reporter_from_config, NoopReporter, RunType, TraceReporter, TraceRun};
use crate::providers::{ChatModel, EmbeddingProvider, GroqChatModel, OllamaEmbedder};
use crate::retrieval::{DocumentIndex, RetrievalTool, SqliteVectorIndex, VectorTable};
use crate::session::{open_session_store, SessionStore};
use crate::types::{
    AnswerEnvelope, CollectionStats, EnvelopeMetadata, HistoryEntry, PassageInput, Role,
};
use crate::validation::QuestionValidator;

/// Value of `metadata.approach` on every answer
pub const APPROACH: &str = "stateful_chain";

/// Message for requests that arrive while no language model is configured
pub const SERVICE_UNAVAILABLE: &str = "Service tidak tersedia saat ini";

/// Answer text of the envelope returned for unexpected failures
pub const APOLOGY: &str = "Maaf, terjadi kesalahan dalam memproses pertanyaan Anda.";

/// Scholarship assistant facade
pub struct RagService {
    graph: Option<ConversationGraph>,
    index: Arc<dyn DocumentIndex>,
    sessions: Arc<dyn SessionStore>,
    chunker: TextChunker,
    validator: QuestionValidator,
    reporter: Arc<dyn TraceReporter>,
}

impl RagService {
    /// Assemble the service from already-built adapters.
    ///
    /// Without `llm` the service still ingests documents and serves history,
    /// but `get_answer` fails with `ServiceUnavailable`.
    pub fn new(
        config: &RagConfig,
        llm: Option<Arc<dyn ChatModel>>,
        index: Arc<dyn DocumentIndex>,
        sessions: Arc<dyn SessionStore>,
    ) -> Result<Self> {
        let tool = RetrievalTool::new(index.clone(), config.retrieval.top_k);
        let graph = llm.map(|llm| ConversationGraph::new(llm, tool, sessions.clone()));

        Ok(Self {
            graph,
            index,
            sessions,
            chunker: TextChunker::from_config(&config.chunking),
            validator: QuestionValidator::from_config(&config.validation)?,
            reporter: Arc::new(NoopReporter),
        })
    }

    pub fn with_reporter(mut self, reporter: Arc<dyn TraceReporter>) -> Self {
        self.reporter = reporter;
        self
    }

    /// Build every adapter from configuration
    pub fn from_config(config: &RagConfig) -> Result<Self> {
        let reporter = reporter_from_config(&config.monitoring);

        let embedder: Arc<dyn EmbeddingProvider> = Arc::new(OllamaEmbedder::new(&config.embeddings)?);
        let table = VectorTable::open(config.vector_db.index_file(), &config.vector_db.collection)?;
        let index: Arc<dyn DocumentIndex> = Arc::new(SqliteVectorIndex::new(
            table,
            embedder,
            config.embeddings.model.clone(),
        ));
        tracing::info!(
            "Vector index at {} (collection {}, {} embeddings)",
            config.vector_db.index_file().display(),
            config.vector_db.collection,
            config.embeddings.model
        );

        let sessions = open_session_store(&config.sessions);

        let llm: Option<Arc<dyn ChatModel>> = match GroqChatModel::new(&config.llm) {
            Ok(model) => {
                tracing::info!("Language model: {} ({})", model.model(), model.name());
                Some(Arc::new(model.with_reporter(reporter.clone())))
            }
            Err(e) => {
                tracing::warn!("Language model unavailable: {}", e);
                None
            }
        };

        Ok(Self::new(config, llm, index, sessions)?.with_reporter(reporter))
    }

    /// Whether a language model is configured
    pub fn llm_available(&self) -> bool {
        self.graph.is_some()
    }

    /// Answer a question within a session.
    ///
    /// Validation failures are `InvalidInput` and leave the session untouched.
    pub async fn get_answer(&self, question: &str, session_id: &str) -> Result<AnswerEnvelope> {
        let started = Instant::now();
        let question = question.trim();

        self.validator.validate(question)?;

        let graph = self
            .graph
            .as_ref()
            .ok_or_else(|| Error::unavailable(SERVICE_UNAVAILABLE))?;

        let run = TraceRun::start(
            "rag_chain_execution",
            RunType::Chain,
            json!({ "question": question, "session_id": session_id }),
        );

        let outcome = match graph.run_turn(session_id, question).await {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::error!("Conversation turn failed for session {}: {}", session_id, e);
                self.reporter.report(run.failed(e.to_string()));
                return Err(Error::internal(GENERIC_FAILURE));
            }
        };

        let mut sources: Vec<String> = Vec::new();
        for passage in &outcome.passages {
            if !sources.contains(&passage.source) {
                sources.push(passage.source.clone());
            }
        }

        let metadata = EnvelopeMetadata {
            session_id: Some(session_id.to_string()),
            timestamp: Utc::now(),
            approach: Some(APPROACH.to_string()),
            processing_time: Some(started.elapsed().as_secs_f64()),
            steps: outcome.path.iter().map(|s| s.as_str().to_string()).collect(),
            error: outcome.degraded,
        };

        let mut envelope = AnswerEnvelope::answered(outcome.answer, sources, metadata);
        if outcome.degraded {
            envelope.confidence = 0.0;
        }

        self.reporter.report(run.succeeded(json!({
            "answer": envelope.answer,
            "sources": envelope.sources,
            "confidence": envelope.confidence,
        })));

        Ok(envelope)
    }

    /// `get_answer` for callers that want an envelope in every case
    pub async fn answer_envelope(&self, question: &str, session_id: &str) -> AnswerEnvelope {
        match self.get_answer(question, session_id).await {
            Ok(envelope) => envelope,
            Err(Error::InvalidInput(msg)) | Err(Error::ServiceUnavailable(msg)) => {
                AnswerEnvelope::error(msg)
            }
            Err(_) => AnswerEnvelope::error(APOLOGY),
        }
    }

    /// Human and non-tool AI messages of a session
    pub async fn get_session_history(&self, session_id: &str) -> Result<Vec<HistoryEntry>> {
        let transcript = match &self.graph {
            Some(graph) => graph.transcript(session_id).await?,
            None => self.sessions.read(session_id)?,
        };

        Ok(transcript
            .into_iter()
            .filter_map(|m| {
                let kind = match m.role {
                    Role::User => "human",
                    Role::Assistant if !m.is_tool_call() => "ai",
                    _ => return None,
                };
                Some(HistoryEntry {
                    kind: kind.to_string(),
                    content: m.content,
                    timestamp: m.timestamp,
                })
            })
            .collect())
    }

    /// Empty a session's transcript; unknown sessions succeed
    pub async fn clear_session(&self, session_id: &str) -> Result<()> {
        match &self.graph {
            Some(graph) => graph.clear(session_id).await,
            None => self.sessions.clear(session_id),
        }
    }

    /// Chunk and index passages, returning the number of chunks stored
    pub async fn add_documents(&self, passages: Vec<PassageInput>) -> Result<usize> {
        let chunks: Vec<PassageInput> = passages
            .iter()
            .flat_map(|p| self.chunker.chunk_passage(p))
            .collect();
        if chunks.is_empty() {
            return Ok(0);
        }
        self.index.add(chunks).await
    }

    /// Parse one uploaded file and index it
    pub async fn add_document_bytes(&self, filename: &str, data: &[u8]) -> Result<usize> {
        let name = filename.to_string();
        let bytes = data.to_vec();
        let passage = tokio::task::spawn_blocking(move || FileParser::parse(&name, &bytes))
            .await
            .map_err(|e| Error::Internal(format!("Task join error: {}", e)))??;
        let stored = self.add_documents(vec![passage]).await?;
        tracing::info!("Ingested {} as {} chunks", filename, stored);
        Ok(stored)
    }

    /// Index every supported file in a directory; returns (files, chunks)
    pub async fn populate_from_dir(&self, dir: &Path) -> Result<(usize, usize)> {
        let dir = dir.to_path_buf();
        let passages = tokio::task::spawn_blocking(move || ingestion::load_directory(&dir))
            .await
            .map_err(|e| Error::Internal(format!("Task join error: {}", e)))??;

        let files = passages.len();
        let chunks = self.add_documents(passages).await?;
        Ok((files, chunks))
    }

    /// Remove every indexed passage
    pub async fn depopulate(&self) -> Result<usize> {
        self.index.clear().await
    }

    pub async fn collection_stats(&self) -> Result<CollectionStats> {
        let chat_history_managed_by = match self.sessions.name() {
            "sqlite" => "sqlite_checkpointer",
            _ => "in_memory",
        };

        Ok(CollectionStats {
            document_count: self.index.count().await?,
            vector_store_type: self.index.name().to_string(),
            embedding_model: self.index.embedding_model().to_string(),
            llm_available: self.llm_available(),
            rag_approach: APPROACH.to_string(),
            chat_history_managed_by: chat_history_managed_by.to_string(),
        })
    }
}
