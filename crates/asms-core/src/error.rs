use serde::{Deserialize, Serialize};
use std::fmt;

/// The one error envelope every dispatch outcome is expressed in.
///
/// `code` is the stable contract; `message` and `details`
/// are human-readable and never asserted on by tests.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UnitError {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl UnitError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    pub fn unit_not_found(unit: &str) -> Self {
        Self::new("unit_not_found", format!("unit '{}' is not registered", unit))
    }

    pub fn invalid_input(missing_or_bad: Vec<String>) -> Self {
        let details = serde_json::json!(missing_or_bad);
        Self::new("invalid_input", "input failed schema validation").with_details(details)
    }

    pub fn already_registered(name: &str) -> Self {
        Self::new("already_registered", format!("unit '{}' is already registered", name))
    }

    pub fn invalid_unit(name: &str) -> Self {
        Self::new(
            "invalid_unit",
            format!("unit name '{}' is empty or lacks a domain.verb separator", name),
        )
    }

    pub fn timeout() -> Self {
        Self::new("timeout", "operation exceeded its deadline")
    }

    pub fn cancelled() -> Self {
        Self::new("cancelled", "operation was cancelled by the caller")
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new("internal_error", message.into())
    }

    pub fn conversation_not_found(id: &str) -> Self {
        Self::new("conversation_not_found", format!("conversation '{}' not found", id))
    }

    pub fn agent_not_enabled() -> Self {
        Self::new("agent_not_enabled", "the agent subsystem is not enabled on this gateway")
    }

    pub fn agent_llm_error(cause: impl fmt::Display) -> Self {
        Self::new("agent_llm_error", format!("llm call failed: {}", cause))
    }

    pub fn agent_tool_loop_exceeded(rounds: u32) -> Self {
        Self::new(
            "agent_tool_loop_exceeded",
            format!("exceeded {} tool-call rounds without a final text response", rounds),
        )
    }

    pub fn skill_not_found(id: &str) -> Self {
        Self::new("skill_not_found", format!("skill '{}' not found", id))
    }

    pub fn builtin_skill_immutable(id: &str) -> Self {
        Self::new("builtin_skill_immutable", format!("skill '{}' is built in and cannot be modified", id))
    }
}

impl fmt::Display for UnitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for UnitError {}

/// Internal error type for asms-core's own fallible operations (schema
/// compilation, id generation). Converts into `UnitError` at every crate
/// boundary so no crate-internal error type crosses the wire.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid schema: {0}")]
    InvalidSchema(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl From<Error> for UnitError {
    fn from(e: Error) -> Self {
        UnitError::internal(e.to_string())
    }
}
