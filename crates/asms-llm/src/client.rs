//! The `LlmClient` contract: `name()`, `model_name()`, `chat()`. Built
//! around the in-core `Message`/`ToolCall`/`ToolDef` shape so the agent
//! loop never has to know which provider it is talking to.

use crate::error::LlmError;
use asms_core::conversation::{Message, ToolCall, ToolDef};
use async_trait::async_trait;

/// Per-call tuning knobs. All optional; a client falls back to its own
/// defaults when a field is `None`.
#[derive(Debug, Clone, Default)]
pub struct ChatOptions {
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
}

/// Token accounting for one `chat()` call. Zeroed out when the provider
/// doesn't report usage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Usage {
    pub input_tokens: u64,
    pub output_tokens: u64,
}

/// Result of one `chat()` round: the assistant's reply plus any tool
/// calls it made. `message.tool_calls` already carries the same calls
/// (the in-core `Message` shape), `tool_calls` is a convenience copy for
/// callers that only want to inspect them.
#[derive(Debug, Clone)]
pub struct ChatOutcome {
    pub message: Message,
    pub tool_calls: Vec<ToolCall>,
    pub usage: Usage,
}

/// Uniform chat-with-tools interface over any number of backends.
///
/// Implementers must preserve `tool_call_id` on round-tripped
/// tool-result messages, encode mixed
/// text+tool-call assistant turns as whatever shape the provider wire
/// format expects, keep `arguments` in-core as a map (encode/decode at
/// the boundary if the provider wants a JSON string), and report zero
/// usage rather than guessing when the provider is silent about it.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Stable identifier for the provider, e.g. `"openai"`, `"anthropic"`.
    fn name(&self) -> &str;

    /// The upstream model identifier this client targets, e.g. `"gpt-4o-mini"`.
    fn model_name(&self) -> &str;

    async fn chat(
        &self,
        messages: &[Message],
        tools: &[ToolDef],
        opts: &ChatOptions,
    ) -> Result<ChatOutcome, LlmError>;
}
