use crate::error::UnitError;
use crate::schema::SchemaNode;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

/// Which of the two disjoint namespaces a unit lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitKind {
    Command,
    Query,
}

impl UnitKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            UnitKind::Command => "command",
            UnitKind::Query => "query",
        }
    }
}

/// Static metadata every unit advertises, independent of its kind.
#[derive(Debug, Clone)]
pub struct UnitMeta {
    pub name: String,
    pub domain: String,
    pub description: String,
    pub input_schema: SchemaNode,
    pub output_schema: SchemaNode,
    pub examples: Vec<Value>,
}

impl UnitMeta {
    pub fn new(name: impl Into<String>, domain: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            domain: domain.into(),
            description: description.into(),
            input_schema: SchemaNode::object(),
            output_schema: SchemaNode::object(),
            examples: Vec::new(),
        }
    }

    pub fn with_input_schema(mut self, schema: SchemaNode) -> Self {
        self.input_schema = schema;
        self
    }

    pub fn with_output_schema(mut self, schema: SchemaNode) -> Self {
        self.output_schema = schema;
        self
    }

    /// Required by register_command/register_query: name must be
    /// non-empty and contain a `.` separating domain from verb.
    pub fn is_well_formed(&self) -> bool {
        !self.name.is_empty() && self.name.contains('.')
    }
}

/// The cancellation/deadline context threaded through every dispatch.
/// Units that perform I/O must observe `is_cancelled()` promptly.
#[derive(Clone)]
pub struct UnitContext {
    token: tokio_util::sync::CancellationToken,
    pub correlation_id: Option<String>,
}

impl UnitContext {
    pub fn new(token: tokio_util::sync::CancellationToken, correlation_id: Option<String>) -> Self {
        Self { token, correlation_id }
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    pub async fn cancelled(&self) {
        self.token.cancelled().await
    }

    pub fn child_token(&self) -> tokio_util::sync::CancellationToken {
        self.token.child_token()
    }
}

/// A command: intent to change state.
#[async_trait]
pub trait CommandUnit: Send + Sync {
    fn meta(&self) -> &UnitMeta;
    async fn execute(&self, ctx: UnitContext, input: Value) -> Result<Value, UnitError>;
}

/// A query: read-only.
#[async_trait]
pub trait QueryUnit: Send + Sync {
    fn meta(&self) -> &UnitMeta;
    async fn execute(&self, ctx: UnitContext, input: Value) -> Result<Value, UnitError>;
}

pub type ArcCommand = Arc<dyn CommandUnit>;
pub type ArcQuery = Arc<dyn QueryUnit>;
