//! Client for a locally-hosted OpenAI-compatible endpoint (llama.cpp
//! server, vLLM, Ollama's `/v1` shim): a configurable `base_url` and an
//! optional bearer token, same Chat Completions wire shape as
//! [`super::openai::OpenAiCompatibleClient`].

use crate::client::{ChatOptions, ChatOutcome, LlmClient};
use crate::error::LlmError;
use crate::providers::openai_wire::{from_wire_response, to_wire_message, to_wire_tool, WireRequest, WireResponse};
use asms_core::conversation::{Message, ToolDef};
use async_trait::async_trait;
use reqwest::Client;

pub struct LocalOpenAiClient {
    http: Client,
    api_key: Option<String>,
    model: String,
    base_url: String,
}

impl LocalOpenAiClient {
    pub fn new(base_url: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            api_key: None,
            model: model.into(),
            base_url: base_url.into(),
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }
}

#[async_trait]
impl LlmClient for LocalOpenAiClient {
    fn name(&self) -> &str {
        "local-openai"
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

        let mut builder = self.http.post(format!("{}/chat/completions", self.base_url)).json(&request);
        if let Some(api_key) = &self.api_key {
            builder = builder.bearer_auth(api_key);
        }

        let response = builder.send().await?;
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

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn works_without_an_api_key() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("POST", "/chat/completions")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"choices":[{"message":{"content":"ok","tool_calls":[]}}]}"#)
            .create_async()
            .await;

        let client = LocalOpenAiClient::new(server.url(), "local-model");
        let outcome = client
            .chat(&[Message::user("ping")], &[], &ChatOptions::default())
            .await
            .unwrap();

        assert_eq!(outcome.message.content, "ok");
        assert_eq!(outcome.usage.input_tokens, 0);
    }

    #[test]
    fn name_and_model_are_reported() {
        let client = LocalOpenAiClient::new("http://localhost:8080/v1", "qwen2.5-32b-instruct");
        assert_eq!(client.name(), "local-openai");
        assert_eq!(client.model_name(), "qwen2.5-32b-instruct");
    }
}
