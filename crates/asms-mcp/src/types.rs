//! MCP-facing shapes: tool/resource definitions and call results.

use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Clone, Serialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub input_schema: Value,
}

#[derive(Debug, Clone, Serialize)]
pub struct ResourceDescriptor {
    pub uri: String,
    pub domain: String,
    /// True when `uri` is a `{param}` template, not a concrete resource.
    pub template: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ContentBlock {
    Text { text: String },
}

impl ContentBlock {
    pub fn text(text: impl Into<String>) -> Self {
        ContentBlock::Text { text: text.into() }
    }
}

/// The result of a `tools/call`. Never a protocol-level error — a
/// failing unit comes back here with `is_error: true` so the model sees
/// the failure as text and can retry.
#[derive(Debug, Clone, Serialize)]
pub struct ToolResult {
    pub content: Vec<ContentBlock>,
    pub is_error: bool,
}

impl ToolResult {
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            content: vec![ContentBlock::text(message)],
            is_error: true,
        }
    }

    pub fn text(message: impl Into<String>) -> Self {
        Self {
            content: vec![ContentBlock::text(message)],
            is_error: false,
        }
    }

    pub fn from_unit_response(response: asms_core::Response) -> Self {
        if response.success {
            let data = response.data.unwrap_or(Value::Null);
            let text = serde_json::to_string(&data).unwrap_or_else(|_| "null".to_string());
            Self::text(text)
        } else {
            let error = response.error.unwrap_or_else(|| asms_core::UnitError::internal("unknown error"));
            let mut content = vec![ContentBlock::text(format!("{}: {}", error.code, error.message))];
            if let Some(details) = error.details {
                content.push(ContentBlock::text(
                    serde_json::to_string(&details).unwrap_or_default(),
                ));
            }
            Self { content, is_error: true }
        }
    }

    pub fn to_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}
