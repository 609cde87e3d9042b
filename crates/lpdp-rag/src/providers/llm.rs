//! Chat-completion provider trait

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::Result;
use crate::types::Message;

/// Tool offered to the model during a completion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolSpec {
    pub name: String,
    pub description: String,
    /// JSON schema of the arguments object
    pub parameters: Value,
}

impl ToolSpec {
    /// Tool taking a single required string argument named `query`
    pub fn query_tool(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "query": { "type": "string", "description": "Search query" }
                },
                "required": ["query"]
            }),
        }
    }
}

/// Trait for chat-completion models
///
/// Implementations:
/// - `GroqChatModel`: Groq (or any OpenAI-compatible) `/chat/completions`
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Complete a conversation.
    ///
    /// With a non-empty `tools`, the returned assistant message may carry a
    /// `tool_invocation` instead of (or alongside) text.
    async fn chat_complete(&self, messages: &[Message], tools: &[ToolSpec]) -> Result<Message>;

    /// Check if the provider is healthy and available
    async fn health_check(&self) -> Result<bool>;

    /// Get provider name for logging
    fn name(&self) -> &str;

    /// Get the model being used
    fn model(&self) -> &str;
}
