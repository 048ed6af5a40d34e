use crate::error::UnitError;
use crate::schema::SchemaNode;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::mpsc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceOperation {
    Refresh,
    Create,
    Update,
    Delete,
}

/// A single event on a resource subscription.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceUpdate {
    pub uri: String,
    pub timestamp: DateTime<Utc>,
    pub operation: ResourceOperation,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<UnitError>,
}

impl ResourceUpdate {
    pub fn refresh(uri: impl Into<String>, data: Value) -> Self {
        Self {
            uri: uri.into(),
            timestamp: Utc::now(),
            operation: ResourceOperation::Refresh,
            data: Some(data),
            error: None,
        }
    }
}

/// A named observable value. `uri` may be parameterized
/// (`asms://skill/{id}`); static resources and parameterized factories
/// both implement this trait — the distinction is resolved by the
/// registry, not the trait.
#[async_trait]
pub trait Resource: Send + Sync {
    fn uri(&self) -> &str;
    fn domain(&self) -> &str;
    fn schema(&self) -> &SchemaNode;

    async fn get(&self) -> Result<Value, UnitError>;

    /// Default: resources that don't support watching simply never emit.
    /// `watch` returning `None` means "not watchable."
    async fn watch(&self) -> Option<mpsc::Receiver<ResourceUpdate>> {
        None
    }
}

/// A resource factory expands a parameterized URI template
/// (`asms://skill/{id}`) into a concrete `Resource` at resolve time.
/// Factories are never pre-enumerated.
pub trait ResourceFactory: Send + Sync {
    fn uri_template(&self) -> &str;
    fn domain(&self) -> &str;

    /// Attempt to resolve `uri` against this factory's template,
    /// returning a concrete resource on match.
    fn resolve(&self, uri: &str) -> Option<std::sync::Arc<dyn Resource>>;
}
