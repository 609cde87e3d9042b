//! Conversation messages and retrieved passages

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Who produced a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    System,
    User,
    Assistant,
    /// Output of the retrieval tool
    #[serde(rename = "tool")]
    ToolResult,
}

/// A request, emitted by the model, to run the retrieval tool
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolInvocation {
    /// Call id echoed back on the matching tool result
    pub id: String,
    /// Tool name (always the retrieval tool today)
    pub name: String,
    /// Search query argument
    pub query: String,
}

/// A passage returned by the retrieval tool
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievedPassage {
    /// Passage text
    pub content: String,
    /// Document title or origin
    pub source: String,
    /// Cosine similarity to the query (0.0-1.0)
    #[serde(default)]
    pub score: f32,
}

/// One turn in a conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    /// Text content; for tool results, the passage text joined for the prompt
    pub content: String,
    /// Present only on assistant messages that request retrieval
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_invocation: Option<ToolInvocation>,
    /// Present only on tool results: the invocation this answers
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
    /// Structured payload of a tool result
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub passages: Vec<RetrievedPassage>,
    pub timestamp: DateTime<Utc>,
}

impl Message {
    fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            tool_invocation: None,
            tool_call_id: None,
            passages: Vec::new(),
            timestamp: Utc::now(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    /// Assistant message asking for a retrieval with `query`
    pub fn tool_call(name: impl Into<String>, query: impl Into<String>) -> Self {
        let mut msg = Self::new(Role::Assistant, "");
        msg.tool_invocation = Some(ToolInvocation {
            id: format!("call_{}", Uuid::new_v4().simple()),
            name: name.into(),
            query: query.into(),
        });
        msg
    }

    /// Tool result answering `invocation`
    pub fn tool_result(invocation: &ToolInvocation, passages: Vec<RetrievedPassage>) -> Self {
        let content = passages
            .iter()
            .map(|p| p.content.as_str())
            .collect::<Vec<_>>()
            .join("\n\n");
        let mut msg = Self::new(Role::ToolResult, content);
        msg.tool_call_id = Some(invocation.id.clone());
        msg.passages = passages;
        msg
    }

    pub fn is_tool_call(&self) -> bool {
        self.role == Role::Assistant && self.tool_invocation.is_some()
    }

    pub fn is_tool_result(&self) -> bool {
        self.role == Role::ToolResult
    }
}

/// Check that every tool result directly follows the assistant message that
/// issued its invocation.
pub fn tool_results_are_paired(transcript: &[Message]) -> bool {
    transcript.iter().enumerate().all(|(i, msg)| {
        if !msg.is_tool_result() {
            return true;
        }
        let Some(prev) = i.checked_sub(1).map(|j| &transcript[j]) else {
            return false;
        };
        match (&prev.tool_invocation, &msg.tool_call_id) {
            (Some(inv), Some(id)) => prev.role == Role::Assistant && &inv.id == id,
            _ => false,
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn passage(text: &str) -> RetrievedPassage {
        RetrievedPassage {
            content: text.to_string(),
            source: "pedoman.pdf".to_string(),
            score: 0.9,
        }
    }

    #[test]
    fn test_tool_result_joins_passages() {
        let call = Message::tool_call("search", "syarat usia");
        let inv = call.tool_invocation.clone().unwrap();
        let result = Message::tool_result(&inv, vec![passage("a"), passage("b")]);

        assert_eq!(result.content, "a\n\nb");
        assert_eq!(result.tool_call_id.as_deref(), Some(inv.id.as_str()));
        assert!(call.is_tool_call());
        assert!(result.is_tool_result());
    }

    #[test]
    fn test_pairing_check() {
        let call = Message::tool_call("search", "q");
        let inv = call.tool_invocation.clone().unwrap();
        let good = vec![
            Message::user("q"),
            call.clone(),
            Message::tool_result(&inv, vec![]),
            Message::assistant("a"),
        ];
        assert!(tool_results_are_paired(&good));

        let orphan = vec![Message::user("q"), Message::tool_result(&inv, vec![])];
        assert!(!tool_results_are_paired(&orphan));

        let leading = vec![Message::tool_result(&inv, vec![])];
        assert!(!tool_results_are_paired(&leading));
    }

    #[test]
    fn test_role_wire_names() {
        assert_eq!(serde_json::to_string(&Role::ToolResult).unwrap(), "\"tool\"");
        assert_eq!(serde_json::to_string(&Role::Assistant).unwrap(), "\"assistant\"");
    }
}
