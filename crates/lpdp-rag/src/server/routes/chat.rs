//! Chat page and question endpoints

use axum::{
    extract::{rejection::JsonRejection, State},
    response::{Html, IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::error::{Error, Result};
use crate::server::session::SessionCookie;
use crate::server::state::AppState;
use crate::types::{AnswerEnvelope, HistoryEntry};
use crate::validation::EMPTY_QUESTION;

const CHAT_PAGE: &str = include_str!("../../../static/chat.html");

const HISTORY_FAILED: &str = "Gagal mengambil riwayat percakapan";
const CLEAR_FAILED: &str = "Gagal membersihkan percakapan";

/// Question request
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub question: Option<String>,
}

/// Answer envelope plus the session it was recorded under
#[derive(Debug, Serialize)]
pub struct ChatResponse {
    #[serde(flatten)]
    pub envelope: AnswerEnvelope,
    pub session_id: String,
}

#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    pub history: Vec<HistoryEntry>,
}

/// Serve the chat page, minting a session when the browser has none
pub async fn chat_page(mut session: SessionCookie) -> Response {
    session.get_or_create();
    session.apply(Html(CHAT_PAGE).into_response())
}

/// Answer a question.
///
/// Checks run in order: service present, question non-empty, session
/// cooldown. Everything else is decided by the service.
pub async fn ask(
    State(state): State<AppState>,
    mut session: SessionCookie,
    body: std::result::Result<Json<ChatRequest>, JsonRejection>,
) -> Response {
    let session_id = session.get_or_create();
    let result = answer(&state, &session_id, body).await.map(|envelope| {
        Json(ChatResponse {
            envelope,
            session_id: session_id.clone(),
        })
    });
    session.apply(result.into_response())
}

async fn answer(
    state: &AppState,
    session_id: &str,
    body: std::result::Result<Json<ChatRequest>, JsonRejection>,
) -> Result<AnswerEnvelope> {
    let service = state.require_service()?;

    let question = match body {
        Ok(Json(req)) => req.question.unwrap_or_default(),
        Err(rejection) => {
            tracing::debug!("Unreadable chat body: {}", rejection);
            String::new()
        }
    };
    let question = question.trim();
    if question.is_empty() {
        return Err(Error::invalid_input(EMPTY_QUESTION));
    }

    state.rate_limiter().check(session_id)?;

    tracing::info!("Question from session {}", session_id);
    service.get_answer(question, session_id).await
}

/// Transcript of the caller's session
pub async fn history(
    State(state): State<AppState>,
    session: SessionCookie,
) -> Result<Json<HistoryResponse>> {
    let (Some(service), Some(session_id)) = (state.service(), session.existing()) else {
        return Ok(Json(HistoryResponse { history: Vec::new() }));
    };

    let history = service.get_session_history(session_id).await.map_err(|e| {
        tracing::error!("History lookup failed for {}: {}", session_id, e);
        Error::internal(HISTORY_FAILED)
    })?;

    Ok(Json(HistoryResponse { history }))
}

/// Empty the caller's session transcript
pub async fn clear(
    State(state): State<AppState>,
    session: SessionCookie,
) -> Result<Json<serde_json::Value>> {
    if let (Some(service), Some(session_id)) = (state.service(), session.existing()) {
        service.clear_session(session_id).await.map_err(|e| {
            tracing::error!("Clearing session {} failed: {}", session_id, e);
            Error::internal(CLEAR_FAILED)
        })?;
        tracing::info!("Cleared session {}", session_id);
    }

    Ok(Json(json!({ "success": true })))
}
