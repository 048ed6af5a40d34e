//! OpenAI Chat Completions client: a bearer token, a fixed base URL,
//! and the standard `/chat/completions` endpoint.

use crate::client::{ChatOptions, ChatOutcome, LlmClient};
use crate::error::LlmError;
use crate::providers::openai_wire::{from_wire_response, to_wire_message, to_wire_tool, WireRequest, WireResponse};
use asms_core::conversation::{Message, ToolDef};
use async_trait::async_trait;
use reqwest::Client;

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

pub struct OpenAiCompatibleClient {
    http: Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl OpenAiCompatibleClient {
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

#[async_trait]
impl LlmClient for OpenAiCompatibleClient {
    fn name(&self) -> &str {
        "openai"
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
            messages: messages.iter().map(to_wire_message).collect(),
            tools: tools.iter().map(to_wire_tool).collect(),
            temperature: opts.temperature,
            max_tokens: opts.max_tokens,
        };

        let response = self
            .http
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
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
        let (message, tool_calls, usage) = from_wire_response(parsed)?;
        Ok(ChatOutcome {
            message,
            tool_calls,
            usage,
        })
    }
}
