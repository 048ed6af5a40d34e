//! # asms-llm
//!
//! Provider-agnostic LLM client abstraction. The [`LlmClient`] trait is
//! the seam the agent loop drives; everything provider-specific lives
//! behind it.

pub mod client;
pub mod error;
pub mod providers;

pub use client::{ChatOptions, ChatOutcome, LlmClient, Usage};
pub use error::LlmError;
pub use providers::anthropic::AnthropicClient;
pub use providers::local::LocalOpenAiClient;
pub use providers::openai::OpenAiCompatibleClient;
