//! Wire types shared by [`super::openai::OpenAiCompatibleClient`] and
//! [`super::local::LocalOpenAiClient`] — both speak the same Chat
//! Completions JSON shape, just against different base URLs and auth.

use crate::client::Usage;
use crate::error::LlmError;
use asms_core::conversation::{Message, Role, ToolCall, ToolDef};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

#[derive(Debug, Serialize)]
pub(crate) struct WireRequest {
    pub model: String,
    pub messages: Vec<WireMessage>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<WireTool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

#[derive(Debug, Serialize)]
pub(crate) struct WireMessage {
    pub role: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<WireToolCall>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct WireToolCall {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub function: WireFunctionCall,
}

#[derive(Debug, Serialize)]
pub(crate) struct WireFunctionCall {
    pub name: String,
    pub arguments: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct WireTool {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub function: WireToolFunction,
}

#[derive(Debug, Serialize)]
pub(crate) struct WireToolFunction {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

#[derive(Debug, Deserialize)]
pub(crate) struct WireResponse {
    pub choices: Vec<WireChoice>,
    #[serde(default)]
    pub usage: Option<WireUsage>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct WireChoice {
    pub message: WireResponseMessage,
}

#[derive(Debug, Deserialize)]
pub(crate) struct WireResponseMessage {
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub tool_calls: Vec<WireResponseToolCall>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct WireResponseToolCall {
    pub id: String,
    pub function: WireResponseFunctionCall,
}

#[derive(Debug, Deserialize)]
pub(crate) struct WireResponseFunctionCall {
    pub name: String,
    pub arguments: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct WireUsage {
    #[serde(default)]
    pub prompt_tokens: u64,
    #[serde(default)]
    pub completion_tokens: u64,
}

pub(crate) fn role_str(role: Role) -> &'static str {
    match role {
        Role::System => "system",
        Role::User => "user",
        Role::Assistant => "assistant",
        Role::Tool => "tool",
    }
}

pub(crate) fn to_wire_message(message: &Message) -> WireMessage {
    WireMessage {
        role: role_str(message.role),
        content: if message.content.is_empty() {
            None
        } else {
            Some(message.content.clone())
        },
        tool_calls: message
            .tool_calls
            .iter()
            .map(|tc| WireToolCall {
                id: tc.id.clone(),
                kind: "function",
                function: WireFunctionCall {
                    name: tc.name.clone(),
                    arguments: serde_json::to_string(&tc.arguments)
                        .unwrap_or_else(|_| "{}".to_string()),
                },
            })
            .collect(),
        tool_call_id: message.tool_call_id.clone(),
    }
}

pub(crate) fn to_wire_tool(def: &ToolDef) -> WireTool {
    WireTool {
        kind: "function",
        function: WireToolFunction {
            name: def.name.clone(),
            description: def.description.clone(),
            parameters: def.input_schema.clone(),
        },
    }
}

/// Parses the first choice of a Chat Completions response into the
/// in-core `Message` + `ToolCall` shape. Arguments arrive as a JSON
/// string on the wire; they are decoded into a map here so callers
/// always see tool-call arguments as a map, never a raw string.
pub(crate) fn from_wire_response(response: WireResponse) -> Result<(Message, Vec<ToolCall>, Usage), LlmError> {
    let choice = response
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| LlmError::Malformed("response had no choices".to_string()))?;

    let tool_calls: Vec<ToolCall> = choice
        .message
        .tool_calls
        .into_iter()
        .map(|tc| {
            let arguments: HashMap<String, Value> = serde_json::from_str(&tc.function.arguments)
                .unwrap_or_default();
            ToolCall {
                id: tc.id,
                name: tc.function.name,
                arguments,
            }
        })
        .collect();

    let content = choice.message.content.unwrap_or_default();
    let message = if tool_calls.is_empty() {
        Message::assistant(content)
    } else {
        Message::assistant_with_tool_calls(content, tool_calls.clone())
    };

    let usage = response
        .usage
        .map(|u| Usage {
            input_tokens: u.prompt_tokens,
            output_tokens: u.completion_tokens,
        })
        .unwrap_or_default();

    Ok((message, tool_calls, usage))
}
