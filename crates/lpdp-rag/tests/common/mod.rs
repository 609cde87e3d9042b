//! Shared fakes for integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request, Response};
use lpdp_rag::error::{Error, Result};
use lpdp_rag::providers::{ChatModel, EmbeddingProvider, ToolSpec};
use lpdp_rag::retrieval::{DocumentIndex, SqliteVectorIndex, VectorTable};
use lpdp_rag::server::state::AppState;
use lpdp_rag::session::InMemorySessionStore;
use lpdp_rag::{Message, PassageInput, RagConfig, RagService};
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::Arc;

/// Replays canned replies in order and counts calls
#[derive(Default)]
pub struct ScriptedModel {
    replies: Mutex<VecDeque<Message>>,
    calls: Mutex<usize>,
}

impl ScriptedModel {
    pub fn new(replies: Vec<Message>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.into()),
            calls: Mutex::new(0),
        })
    }

    /// Decide to search, then answer
    pub fn searching(query: &str, answer: &str) -> Arc<Self> {
        Self::new(vec![Message::tool_call("search", query), Message::assistant(answer)])
    }

    pub fn push(&self, reply: Message) {
        self.replies.lock().push_back(reply);
    }

    pub fn calls(&self) -> usize {
        *self.calls.lock()
    }
}

#[async_trait]
impl ChatModel for ScriptedModel {
    async fn chat_complete(&self, _messages: &[Message], _tools: &[ToolSpec]) -> Result<Message> {
        *self.calls.lock() += 1;
        self.replies
            .lock()
            .pop_front()
            .ok_or_else(|| Error::Llm("no scripted reply left".into()))
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }

    fn name(&self) -> &str {
        "scripted"
    }

    fn model(&self) -> &str {
        "scripted-model"
    }
}

/// Embeds text as keyword counts so similar questions find the right passage
pub struct KeywordEmbedder;

#[async_trait]
impl EmbeddingProvider for KeywordEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let lower = text.to_lowercase();
        Ok(["usia", "ipk", "toefl", "dana", "beasiswa"]
            .iter()
            .map(|kw| lower.matches(kw).count() as f32 + 0.01)
            .collect())
    }

    fn dimensions(&self) -> usize {
        5
    }

    fn name(&self) -> &str {
        "keyword"
    }
}

pub struct Harness {
    pub service: Arc<RagService>,
    pub sessions: Arc<InMemorySessionStore>,
    pub state: AppState,
}

/// Service over an in-memory index and session store
pub fn harness(model: Option<Arc<ScriptedModel>>) -> Harness {
    let config = RagConfig::default();
    let index: Arc<dyn DocumentIndex> = Arc::new(SqliteVectorIndex::new(
        VectorTable::in_memory(&config.vector_db.collection).unwrap(),
        Arc::new(KeywordEmbedder),
        "keyword",
    ));
    let sessions = Arc::new(InMemorySessionStore::new());
    let llm = model.map(|m| m as Arc<dyn ChatModel>);

    let service = Arc::new(RagService::new(&config, llm, index, sessions.clone()).unwrap());
    let state = AppState::with_service(config, Some(service.clone()));

    Harness {
        service,
        sessions,
        state,
    }
}

pub fn scholarship_passages() -> Vec<PassageInput> {
    vec![
        PassageInput::new("Usia maksimal pendaftar program magister adalah 35 tahun.")
            .with_meta("title", "Persyaratan Umum"),
        PassageInput::new("Skor TOEFL ITP minimal 500 untuk tujuan dalam negeri.")
            .with_meta("title", "Persyaratan Bahasa"),
        PassageInput::new("Dana hidup dibayarkan setiap bulan selama masa studi.")
            .with_meta("source", "Panduan Pendanaan"),
    ]
}

pub fn post_json(uri: &str, body: Value, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::post(uri).header(header::CONTENT_TYPE, "application/json");
    if let Some(id) = cookie {
        builder = builder.header(header::COOKIE, format!("lpdp_session={}", id));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

pub fn get(uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::get(uri);
    if let Some(id) = cookie {
        builder = builder.header(header::COOKIE, format!("lpdp_session={}", id));
    }
    builder.body(Body::empty()).unwrap()
}

pub async fn json_body(response: Response<Body>) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

/// Build a multipart body with one part per (field, filename, content)
pub fn multipart(parts: &[(&str, &str, &str)]) -> (String, Vec<u8>) {
    let boundary = "lpdp-test-boundary";
    let mut body = Vec::new();
    for (field, filename, content) in parts {
        body.extend_from_slice(format!("--{}\r\n", boundary).as_bytes());
        body.extend_from_slice(
            format!(
                "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
                field, filename
            )
            .as_bytes(),
        );
        body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
        body.extend_from_slice(content.as_bytes());
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", boundary).as_bytes());
    (format!("multipart/form-data; boundary={}", boundary), body)
}
