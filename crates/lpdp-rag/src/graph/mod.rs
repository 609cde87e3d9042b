//! Stateful conversation graph
//!
//! Each turn walks `deciding -> (retrieving -> generating)? -> done`:
//!
//! - **deciding**: the model sees the retrieval mandate plus the transcript
//!   and may request the `search` tool.
//! - **retrieving**: the tool runs and its passages are appended as a tool
//!   result right after the requesting assistant message.
//! - **generating**: the trailing tool results become the grounding context
//!   of a fresh system prompt, and the model answers without tools.
//!
//! A failed model call ends the turn with a fixed fallback message. The turn
//! holds its session lock from the first read until the new messages are
//! appended.

pub mod prompts;

use serde::Serialize;
use std::sync::Arc;

use crate::error::Result;
use crate::providers::ChatModel;
use crate::retrieval::{RetrievalTool, SEARCH_TOOL_NAME};
use crate::session::{SessionLocks, SessionStore};
use crate::types::{Message, RetrievedPassage, Role};

use prompts::{
    generation_prompt, DECIDING_FALLBACK, EMPTY_ANSWER, GENERATING_FALLBACK, RETRIEVAL_MANDATE,
};

/// Graph states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GraphState {
    Deciding,
    Retrieving,
    Generating,
    Done,
}

impl GraphState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Deciding => "deciding",
            Self::Retrieving => "retrieving",
            Self::Generating => "generating",
            Self::Done => "done",
        }
    }
}

/// Result of one turn
#[derive(Debug, Clone)]
pub struct TurnOutcome {
    /// Final assistant text
    pub answer: String,
    /// States visited, starting with `Deciding` and ending with `Done`
    pub path: Vec<GraphState>,
    /// Passages retrieved during this turn
    pub passages: Vec<RetrievedPassage>,
    /// Set when a model call failed and the answer is a fallback
    pub degraded: bool,
}

/// Working state of a turn in progress
struct Turn {
    transcript: Vec<Message>,
    passages: Vec<RetrievedPassage>,
    degraded: bool,
}

/// Conversation state machine over a chat model, the retrieval tool, and a
/// session store
pub struct ConversationGraph {
    llm: Arc<dyn ChatModel>,
    tool: RetrievalTool,
    sessions: Arc<dyn SessionStore>,
    locks: SessionLocks,
}

impl ConversationGraph {
    pub fn new(llm: Arc<dyn ChatModel>, tool: RetrievalTool, sessions: Arc<dyn SessionStore>) -> Self {
        Self {
            llm,
            tool,
            sessions,
            locks: SessionLocks::new(),
        }
    }

    /// Run one question through the graph and persist the new messages
    pub async fn run_turn(&self, session_id: &str, question: &str) -> Result<TurnOutcome> {
        let _guard = self.locks.acquire(session_id).await;

        let mut transcript = self.sessions.read(session_id)?;
        let prior_len = transcript.len();
        transcript.push(Message::user(question));

        let mut turn = Turn {
            transcript,
            passages: Vec::new(),
            degraded: false,
        };

        let mut state = GraphState::Deciding;
        let mut path = vec![state];
        while state != GraphState::Done {
            state = match state {
                GraphState::Deciding => self.decide(&mut turn).await,
                GraphState::Retrieving => self.retrieve(&mut turn).await,
                GraphState::Generating => self.generate(&mut turn).await,
                GraphState::Done => GraphState::Done,
            };
            path.push(state);
        }

        self.sessions.append(session_id, &turn.transcript[prior_len..])?;

        let answer = turn
            .transcript
            .last()
            .map(|m| m.content.clone())
            .unwrap_or_else(|| EMPTY_ANSWER.to_string());

        tracing::debug!(
            "Turn for session {} finished via {:?}",
            session_id,
            path.iter().map(GraphState::as_str).collect::<Vec<_>>()
        );

        Ok(TurnOutcome {
            answer,
            path,
            passages: turn.passages,
            degraded: turn.degraded,
        })
    }

    async fn decide(&self, turn: &mut Turn) -> GraphState {
        let mut prompt = Vec::with_capacity(turn.transcript.len() + 1);
        prompt.push(Message::system(RETRIEVAL_MANDATE));
        prompt.extend(turn.transcript.iter().cloned());

        match self.llm.chat_complete(&prompt, &[self.tool.spec()]).await {
            Ok(mut response) => {
                let wants_search = response
                    .tool_invocation
                    .as_ref()
                    .map(|inv| inv.name == SEARCH_TOOL_NAME)
                    .unwrap_or(false);

                if wants_search {
                    turn.transcript.push(response);
                    return GraphState::Retrieving;
                }

                if let Some(inv) = response.tool_invocation.take() {
                    tracing::warn!("Model requested unknown tool {:?}, treating as answer", inv.name);
                }
                if response.content.trim().is_empty() {
                    response.content = EMPTY_ANSWER.to_string();
                }
                turn.transcript.push(response);
                GraphState::Done
            }
            Err(e) => {
                tracing::error!("Deciding step failed: {}", e);
                turn.transcript.push(Message::assistant(DECIDING_FALLBACK));
                turn.degraded = true;
                GraphState::Done
            }
        }
    }

    async fn retrieve(&self, turn: &mut Turn) -> GraphState {
        let Some(invocation) = turn
            .transcript
            .last()
            .and_then(|m| m.tool_invocation.clone())
        else {
            return GraphState::Generating;
        };

        let passages = self.tool.search(&invocation.query).await;
        tracing::info!(
            "Retrieved {} passages for query: {}",
            passages.len(),
            invocation.query
        );

        turn.passages.extend(passages.iter().cloned());
        turn.transcript.push(Message::tool_result(&invocation, passages));
        GraphState::Generating
    }

    async fn generate(&self, turn: &mut Turn) -> GraphState {
        let context = grounding_context(&turn.transcript);

        let mut prompt = vec![Message::system(generation_prompt(&context))];
        prompt.extend(conversation_messages(&turn.transcript).cloned());

        match self.llm.chat_complete(&prompt, &[]).await {
            Ok(mut response) => {
                response.tool_invocation = None;
                if response.content.trim().is_empty() {
                    response.content = EMPTY_ANSWER.to_string();
                }
                turn.transcript.push(response);
            }
            Err(e) => {
                tracing::error!("Generating step failed: {}", e);
                turn.transcript.push(Message::assistant(GENERATING_FALLBACK));
                turn.degraded = true;
            }
        }
        GraphState::Done
    }

    /// Full stored transcript of a session
    pub async fn transcript(&self, session_id: &str) -> Result<Vec<Message>> {
        let _guard = self.locks.acquire(session_id).await;
        self.sessions.read(session_id)
    }

    /// Drop a session's transcript
    pub async fn clear(&self, session_id: &str) -> Result<()> {
        let _guard = self.locks.acquire(session_id).await;
        self.sessions.clear(session_id)
    }
}

/// Contents of the trailing run of tool results, oldest first, joined by
/// blank lines
pub fn grounding_context(transcript: &[Message]) -> String {
    let start = transcript
        .iter()
        .rposition(|m| !m.is_tool_result())
        .map(|i| i + 1)
        .unwrap_or(0);

    transcript[start..]
        .iter()
        .map(|m| m.content.as_str())
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// User, system, and non-tool-invoking assistant messages
pub fn conversation_messages(transcript: &[Message]) -> impl Iterator<Item = &Message> {
    transcript.iter().filter(|m| match m.role {
        Role::User | Role::System => true,
        Role::Assistant => !m.is_tool_call(),
        Role::ToolResult => false,
    })
}
