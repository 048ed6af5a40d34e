use crate::error::UnitError;
use crate::unit::UnitKind;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// `{type, unit, input, options}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Request {
    #[serde(rename = "type")]
    pub request_type: RequestType,
    pub unit: String,
    #[serde(default)]
    pub input: HashMap<String, Value>,
    #[serde(default)]
    pub options: RequestOptions,
}

impl Request {
    pub fn new(request_type: RequestType, unit: impl Into<String>, input: HashMap<String, Value>) -> Self {
        Self {
            request_type,
            unit: unit.into(),
            input,
            options: RequestOptions::default(),
        }
    }

    pub fn input_as_value(&self) -> Value {
        Value::Object(self.input.clone().into_iter().collect())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestType {
    Command,
    Query,
}

impl From<RequestType> for UnitKind {
    fn from(value: RequestType) -> Self {
        match value {
            RequestType::Command => UnitKind::Command,
            RequestType::Query => UnitKind::Query,
        }
    }
}

impl From<UnitKind> for RequestType {
    fn from(value: UnitKind) -> Self {
        match value {
            UnitKind::Command => RequestType::Command,
            UnitKind::Query => RequestType::Query,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RequestOptions {
    /// Milliseconds. 0 (or absent) means "use the gateway default."
    #[serde(default)]
    pub timeout_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<String>,
}

/// `{success, data|error}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Response {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<UnitError>,
}

impl Response {
    pub fn ok(data: Value) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn err(error: UnitError) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error),
        }
    }
}
