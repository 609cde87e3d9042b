//! Groq chat-completion client (OpenAI-compatible wire format)

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

use crate::config::LlmConfig;
use crate::error::{Error, Result};
use crate::monitoring::{NoopReporter, RunType, TraceReporter, TraceRun};
use crate::types::{Message, Role, ToolInvocation};

use super::llm::{ChatModel, ToolSpec};
use super::retry_request;

/// Groq API client with automatic retry
pub struct GroqChatModel {
    client: Client,
    config: LlmConfig,
    api_key: String,
    reporter: Arc<dyn TraceReporter>,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage>,
    temperature: f32,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<WireTool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct WireMessage {
    role: String,
    #[serde(default)]
    content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tool_calls: Option<Vec<WireToolCall>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct WireToolCall {
    id: String,
    #[serde(rename = "type", default = "function_kind")]
    kind: String,
    function: WireFunctionCall,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct WireFunctionCall {
    name: String,
    /// JSON-encoded arguments object
    arguments: String,
}

#[derive(Serialize)]
struct WireTool {
    #[serde(rename = "type")]
    kind: &'static str,
    function: serde_json::Value,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: WireMessage,
}

#[derive(Deserialize)]
struct QueryArguments {
    #[serde(default)]
    query: String,
}

fn function_kind() -> String {
    "function".to_string()
}

impl GroqChatModel {
    /// Create a client; fails when no API key is configured
    pub fn new(config: &LlmConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| Error::Config("GROQ_API_KEY is not set".to_string()))?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .pool_max_idle_per_host(5)
            .build()?;

        Ok(Self {
            client,
            config: config.clone(),
            api_key,
            reporter: Arc::new(NoopReporter),
        })
    }

    /// Report every completion as an `llm` run
    pub fn with_reporter(mut self, reporter: Arc<dyn TraceReporter>) -> Self {
        self.reporter = reporter;
        self
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.config.base_url.trim_end_matches('/'), path)
    }
}

fn to_wire(msg: &Message) -> WireMessage {
    match msg.role {
        Role::System => WireMessage {
            role: "system".into(),
            content: Some(msg.content.clone()),
            tool_calls: None,
            tool_call_id: None,
        },
        Role::User => WireMessage {
            role: "user".into(),
            content: Some(msg.content.clone()),
            tool_calls: None,
            tool_call_id: None,
        },
        Role::Assistant => WireMessage {
            role: "assistant".into(),
            content: Some(msg.content.clone()),
            tool_calls: msg.tool_invocation.as_ref().map(|inv| {
                vec![WireToolCall {
                    id: inv.id.clone(),
                    kind: function_kind(),
                    function: WireFunctionCall {
                        name: inv.name.clone(),
                        arguments: json!({ "query": inv.query }).to_string(),
                    },
                }]
            }),
            tool_call_id: None,
        },
        Role::ToolResult => WireMessage {
            role: "tool".into(),
            content: Some(msg.content.clone()),
            tool_calls: None,
            tool_call_id: msg.tool_call_id.clone(),
        },
    }
}

fn from_wire(wire: WireMessage) -> Message {
    let mut msg = Message::assistant(wire.content.unwrap_or_default());

    // Only the first call is honoured; the graph runs one retrieval per turn.
    if let Some(call) = wire.tool_calls.and_then(|calls| calls.into_iter().next()) {
        let query = serde_json::from_str::<QueryArguments>(&call.function.arguments)
            .map(|args| args.query)
            .unwrap_or_default();
        msg.tool_invocation = Some(ToolInvocation {
            id: call.id,
            name: call.function.name,
            query,
        });
    }
    msg
}

#[async_trait]
impl ChatModel for GroqChatModel {
    async fn chat_complete(&self, messages: &[Message], tools: &[ToolSpec]) -> Result<Message> {
        let url = self.endpoint("chat/completions");
        let wire_messages: Vec<WireMessage> = messages.iter().map(to_wire).collect();
        let wire_tools: Vec<serde_json::Value> = tools
            .iter()
            .map(|t| {
                json!({
                    "name": t.name,
                    "description": t.description,
                    "parameters": t.parameters,
                })
            })
            .collect();

        tracing::debug!(
            "Chat completion with model {} ({} messages, {} tools)",
            self.config.model,
            messages.len(),
            tools.len()
        );

        let run = TraceRun::start(
            "llm",
            RunType::Llm,
            json!({ "model": self.config.model, "message_count": messages.len(), "tools": wire_tools.len() }),
        );

        let result = retry_request(self.config.max_retries, || {
            let request = ChatRequest {
                model: &self.config.model,
                messages: wire_messages.clone(),
                temperature: self.config.temperature,
                max_tokens: self.config.max_tokens,
                tools: wire_tools
                    .iter()
                    .map(|f| WireTool {
                        kind: "function",
                        function: f.clone(),
                    })
                    .collect(),
            };
            let builder = self
                .client
                .post(&url)
                .bearer_auth(&self.api_key)
                .json(&request);

            async move {
                let response = builder
                    .send()
                    .await
                    .map_err(|e| Error::Llm(format!("Chat request failed: {}", e)))?;

                if !response.status().is_success() {
                    let status = response.status();
                    let body = response.text().await.unwrap_or_default();
                    return Err(Error::Llm(format!(
                        "Chat completion failed: HTTP {} - {}",
                        status, body
                    )));
                }

                let parsed: ChatResponse = response
                    .json()
                    .await
                    .map_err(|e| Error::Llm(format!("Failed to parse chat response: {}", e)))?;

                parsed
                    .choices
                    .into_iter()
                    .next()
                    .map(|choice| from_wire(choice.message))
                    .ok_or_else(|| Error::Llm("Chat response had no choices".to_string()))
            }
        })
        .await;

        if self.reporter.is_enabled() {
            let run = match &result {
                Ok(msg) => run.succeeded(json!({
                    "content": msg.content,
                    "tool_call": msg.tool_invocation.as_ref().map(|inv| &inv.query),
                })),
                Err(e) => run.failed(e.to_string()),
            };
            self.reporter.report(run);
        }
        result
    }

    async fn health_check(&self) -> Result<bool> {
        let url = self.endpoint("models");
        match self.client.get(&url).bearer_auth(&self.api_key).send().await {
            Ok(response) => Ok(response.status().is_success()),
            Err(_) => Ok(false),
        }
    }

    fn name(&self) -> &str {
        "groq"
    }

    fn model(&self) -> &str {
        &self.config.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_requires_api_key() {
        let config = LlmConfig::default();
        assert!(matches!(GroqChatModel::new(&config), Err(Error::Config(_))));

        let config = LlmConfig {
            api_key: Some("gsk_test".into()),
            ..Default::default()
        };
        let model = GroqChatModel::new(&config).unwrap();
        assert_eq!(model.model(), "llama3-8b-8192");
        assert_eq!(
            model.endpoint("chat/completions"),
            "https://api.groq.com/openai/v1/chat/completions"
        );
    }

    #[test]
    fn test_tool_call_round_trip_through_wire() {
        let call = Message::tool_call("search", "batas usia S2");
        let wire = to_wire(&call);
        let calls = wire.tool_calls.clone().unwrap();
        assert_eq!(calls[0].function.name, "search");
        assert!(calls[0].function.arguments.contains("batas usia S2"));

        let back = from_wire(wire);
        let inv = back.tool_invocation.unwrap();
        assert_eq!(inv.query, "batas usia S2");
        assert_eq!(inv.id, call.tool_invocation.unwrap().id);
    }

    #[test]
    fn test_parses_plain_response() {
        let body = r#"{"choices":[{"message":{"role":"assistant","content":"Halo!"}}]}"#;
        let parsed: ChatResponse = serde_json::from_str(body).unwrap();
        let msg = from_wire(parsed.choices.into_iter().next().unwrap().message);
        assert_eq!(msg.content, "Halo!");
        assert!(!msg.is_tool_call());
    }

    #[test]
    fn test_tool_result_maps_to_tool_role() {
        let call = Message::tool_call("search", "q");
        let result = Message::tool_result(call.tool_invocation.as_ref().unwrap(), vec![]);
        let wire = to_wire(&result);
        assert_eq!(wire.role, "tool");
        assert_eq!(wire.tool_call_id, result.tool_call_id);
    }
}
