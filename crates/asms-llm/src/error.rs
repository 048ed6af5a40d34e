use asms_core::UnitError;

/// Internal error type for the three providers. Converts into
/// [`UnitError::agent_llm_error`] at the crate boundary so no
/// provider-specific error type crosses into the Agent Loop.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("http request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("provider returned {status}: {body}")]
    Provider { status: u16, body: String },

    #[error("malformed response: {0}")]
    Malformed(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<LlmError> for UnitError {
    fn from(e: LlmError) -> Self {
        UnitError::agent_llm_error(e)
    }
}
