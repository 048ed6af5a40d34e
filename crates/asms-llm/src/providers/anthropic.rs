//! Anthropic Messages API client. Distinct wire shape from the OpenAI
//! family: the system prompt is a top-level field, tool
//! calls/results are content blocks rather than a sibling `tool_calls`
//! array, and `max_tokens` is mandatory on every request.

use crate::client::{ChatOptions, ChatOutcome, LlmClient, Usage};
use crate::error::LlmError;
use asms_core::conversation::{Message, Role, ToolCall, ToolDef};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

const DEFAULT_BASE_URL: &str = "https://api.anthropic.com/v1";
const ANTHROPIC_VERSION: &str = "2023-06-01";
const DEFAULT_MAX_TOKENS: u32 = 4096;

pub struct AnthropicClient {
    http: Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl AnthropicClient {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self::with_base_url(api_key, model, DEFAULT_BASE_URL)
    }

    pub fn with_base_url(api_key: impl Into<String>, model: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            api_key: api_key.into(),
            model: model.into(),
            base_url: base_url.into(),
        }
    }
}

#[derive(Debug, Serialize)]
struct WireRequest {
    model: String,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    messages: Vec<WireMessage>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<WireTool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Serialize)]
struct WireMessage {
    role: &'static str,
    content: Vec<WireBlock>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub(crate) enum WireBlock {
    Text { text: String },
    ToolUse { id: String, name: String, input: Value },
    ToolResult { tool_use_id: String, content: String },
}

#[derive(Debug, Serialize)]
struct WireTool {
    name: String,
    description: String,
    input_schema: Value,
}

#[derive(Debug, Deserialize)]
struct WireResponse {
    content: Vec<WireResponseBlock>,
    #[serde(default)]
    usage: Option<WireUsage>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum WireResponseBlock {
    Text { text: String },
    ToolUse { id: String, name: String, input: Value },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
struct WireUsage {
    #[serde(default)]
    input_tokens: u64,
    #[serde(default)]
    output_tokens: u64,
}

/// Anthropic's system prompt is a top-level field, not a message; this
/// also filters out any `Role::System` entries that show up mid-history.
fn extract_system(messages: &[Message]) -> Option<String> {
    let system: Vec<&str> = messages
        .iter()
        .filter(|m| m.role == Role::System)
        .map(|m| m.content.as_str())
        .collect();
    if system.is_empty() {
        None
    } else {
        Some(system.join("\n\n"))
    }
}

fn to_wire_messages(messages: &[Message]) -> Vec<WireMessage> {
    messages
        .iter()
        .filter(|m| m.role != Role::System)
        .map(|m| match m.role {
            Role::Tool => WireMessage {
                role: "user",
                content: vec![WireBlock::ToolResult {
                    tool_use_id: m.tool_call_id.clone().unwrap_or_default(),
                    content: m.content.clone(),
                }],
            },
            Role::Assistant if !m.tool_calls.is_empty() => {
                let mut blocks = Vec::new();
                if !m.content.is_empty() {
                    blocks.push(WireBlock::Text { text: m.content.clone() });
                }
                for tc in &m.tool_calls {
                    blocks.push(WireBlock::ToolUse {
                        id: tc.id.clone(),
                        name: tc.name.clone(),
                        input: serde_json::to_value(&tc.arguments).unwrap_or(Value::Null),
                    });
                }
                WireMessage {
                    role: "assistant",
                    content: blocks,
                }
            }
            Role::Assistant => WireMessage {
                role: "assistant",
                content: vec![WireBlock::Text { text: m.content.clone() }],
            },
            Role::User => WireMessage {
                role: "user",
                content: vec![WireBlock::Text { text: m.content.clone() }],
            },
            Role::System => unreachable!("filtered above"),
        })
        .collect()
}

fn to_wire_tool(def: &ToolDef) -> WireTool {
    WireTool {
        name: def.name.clone(),
        description: def.description.clone(),
        input_schema: def.input_schema.clone(),
    }
}

fn from_wire_response(response: WireResponse) -> (Message, Vec<ToolCall>, Usage) {
    let mut text = String::new();
    let mut tool_calls = Vec::new();

    for block in response.content {
        match block {
            WireResponseBlock::Text { text: t } => text.push_str(&t),
            WireResponseBlock::ToolUse { id, name, input } => {
                let arguments: HashMap<String, Value> = match input {
                    Value::Object(map) => map.into_iter().collect(),
                    _ => HashMap::new(),
                };
                tool_calls.push(ToolCall { id, name, arguments });
            }
            WireResponseBlock::Other => {}
        }
    }

    let message = if tool_calls.is_empty() {
        Message::assistant(text)
    } else {
        Message::assistant_with_tool_calls(text, tool_calls.clone())
    };

    let usage = response
        .usage
        .map(|u| Usage {
            input_tokens: u.input_tokens,
            output_tokens: u.output_tokens,
        })
        .unwrap_or_default();

    (message, tool_calls, usage)
}

#[async_trait]
impl LlmClient for AnthropicClient {
    fn name(&self) -> &str {
        "anthropic"
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    async fn chat(
        &self,
        messages: &[Message],
        tools: &[ToolDef],
        opts: &ChatOptions,
    ) -> Result<ChatOutcome, LlmError> {
        let request = WireRequest {
            model: self.model.clone(),
            max_tokens: opts.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
            system: extract_system(messages),
            messages: to_wire_messages(messages),
            tools: tools.iter().map(to_wire_tool).collect(),
            temperature: opts.temperature,
        };

        let response = self
            .http
            .post(format!("{}/messages", self.base_url))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::Provider {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: WireResponse = response.json().await?;
        let (message, tool_calls, usage) = from_wire_response(parsed);
        Ok(ChatOutcome {
            message,
            tool_calls,
            usage,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn happy_path_against_mock_server() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("POST", "/messages")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"content":[{"type":"text","text":"hello"}],
                    "usage":{"input_tokens":7,"output_tokens":4}}"#,
            )
            .create_async()
            .await;

        let client = AnthropicClient::with_base_url("test-key", "claude-3-5-sonnet", server.url());
        let outcome = client
            .chat(&[Message::system("be terse"), Message::user("hi")], &[], &ChatOptions::default())
            .await
            .unwrap();

        assert_eq!(outcome.message.content, "hello");
        assert_eq!(outcome.usage.input_tokens, 7);
        assert_eq!(outcome.usage.output_tokens, 4);
    }

    #[tokio::test]
    async fn tool_use_block_becomes_tool_call() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("POST", "/messages")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"content":[{"type":"tool_use","id":"toolu_1","name":"model_list","input":{"domain":"models"}}]}"#,
            )
            .create_async()
            .await;

        let client = AnthropicClient::with_base_url("test-key", "claude-3-5-sonnet", server.url());
        let outcome = client
            .chat(&[Message::user("list models")], &[], &ChatOptions::default())
            .await
            .unwrap();

        assert_eq!(outcome.tool_calls.len(), 1);
        assert_eq!(outcome.tool_calls[0].name, "model_list");
        assert_eq!(
            outcome.tool_calls[0].arguments.get("domain").and_then(|v| v.as_str()),
            Some("models")
        );
    }

    #[test]
    fn tool_result_message_round_trips_call_id() {
        let messages = vec![Message::tool_result("call_42", "42 models")];
        let wire = to_wire_messages(&messages);
        match &wire[0].content[0] {
            WireBlock::ToolResult { tool_use_id, content } => {
                assert_eq!(tool_use_id, "call_42");
                assert_eq!(content, "42 models");
            }
            other => panic!("expected ToolResult block, got {other:?}"),
        }
    }

    #[test]
    fn system_messages_are_extracted_not_inlined() {
        let messages = vec![Message::system("be terse"), Message::user("hi")];
        assert_eq!(extract_system(&messages), Some("be terse".to_string()));
        let wire = to_wire_messages(&messages);
        assert_eq!(wire.len(), 1);
        assert_eq!(wire[0].role, "user");
    }
}
