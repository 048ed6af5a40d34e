//! Translates the unit/resource model into MCP tools/resources and
//! dispatches JSON-RPC method calls onto the Gateway.

use crate::jsonrpc::{JsonRpcError, JsonRpcRequest, JsonRpcResponse};
use crate::types::{ResourceDescriptor, ToolDefinition, ToolResult};
use asms_core::{Request, RequestType, ResourceUpdate};
use asms_gateway::Gateway;
use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Push channel for out-of-band JSON-RPC notifications (resource
/// updates). Implemented once per transport: the stdio writer task, and
/// the SSE session's outbound queue.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, method: &str, params: Value);
}

/// Map a unit name (`model.create`) to its MCP tool name (`model_create`).
/// Bidirectional and exact — reject source names that would make that
/// mapping ambiguous.
pub fn mcp_tool_name(unit_name: &str) -> Result<String, asms_core::UnitError> {
    if unit_name.matches('.').count() != 1 {
        return Err(asms_core::UnitError::invalid_unit(unit_name));
    }
    if unit_name.contains("__") {
        return Err(asms_core::UnitError::new(
            "invalid_unit",
            format!("unit '{}' contains '__', which collides with the tool-name encoding", unit_name),
        ));
    }
    Ok(unit_name.replace('.', "_"))
}

/// Reverse of [`mcp_tool_name`]: the first `_` becomes `.` again, which
/// is exact given the registration-time rejection above.
pub fn unit_name_from_tool(tool_name: &str) -> Option<String> {
    if !tool_name.contains('_') {
        return None;
    }
    Some(tool_name.replacen('_', ".", 1))
}

pub struct Adapter {
    gateway: Arc<Gateway>,
}

impl Adapter {
    pub fn new(gateway: Arc<Gateway>) -> Self {
        Self { gateway }
    }

    pub fn list_tools(&self) -> Vec<ToolDefinition> {
        self.gateway
            .registry()
            .list_units(None)
            .into_iter()
            .filter_map(|meta| match mcp_tool_name(&meta.name) {
                Ok(name) => Some(ToolDefinition {
                    name,
                    description: meta.description.clone(),
                    input_schema: serde_json::to_value(&meta.input_schema).unwrap_or(json!({})),
                }),
                Err(e) => {
                    tracing::warn!(unit = %meta.name, error = %e, "unit cannot be exposed as an MCP tool");
                    None
                }
            })
            .collect()
    }

    pub fn list_resources(&self) -> Vec<ResourceDescriptor> {
        self.gateway
            .resource_descriptors()
            .into_iter()
            .map(|(uri, domain, template)| ResourceDescriptor { uri, domain, template })
            .collect()
    }

    /// Runs a tool call through the Gateway. Never raises a protocol
    /// error — a unit failure comes back as an error-flagged result.
    pub async fn execute_tool(&self, scope: CancellationToken, tool_name: &str, args_json: &str) -> ToolResult {
        let input: HashMap<String, Value> = match serde_json::from_str(args_json) {
            Ok(Value::Object(map)) => map.into_iter().collect(),
            Ok(_) => return ToolResult::error("invalid_input: tool arguments must be a JSON object"),
            Err(e) => return ToolResult::error(format!("invalid_input: arguments are not valid JSON: {}", e)),
        };

        let Some(unit_name) = unit_name_from_tool(tool_name) else {
            return ToolResult::error(format!("unit_not_found: no unit maps to tool '{}'", tool_name));
        };
        let Some(kind) = self.gateway.registry().kind_of(&unit_name) else {
            return ToolResult::error(format!("unit_not_found: unit '{}' is not registered", unit_name));
        };

        let request = Request::new(RequestType::from(kind), unit_name, input);
        let response = self.gateway.handle(scope, request).await;
        ToolResult::from_unit_response(response)
    }

    pub async fn read_resource(&self, uri: &str) -> Result<Value, asms_core::UnitError> {
        self.gateway.read_resource(uri).await
    }

    /// Subscribe and forward every update to `notifier` as
    /// `notifications/resources/updated` until the scope closes or the
    /// resource stream ends.
    pub async fn subscribe_resource(
        &self,
        scope: CancellationToken,
        uri: &str,
        notifier: Arc<dyn Notifier>,
    ) -> Result<(), asms_core::UnitError> {
        let mut updates = self.gateway.stream(scope, uri).await?;
        let uri = uri.to_string();
        tokio::spawn(async move {
            while let Some(update) = updates.recv().await {
                notifier.notify("notifications/resources/updated", notification_payload(&uri, &update)).await;
            }
        });
        Ok(())
    }

    /// Route one JSON-RPC method call. Returns `None` for notifications
    /// (no `id`) — the caller sends nothing back.
    pub async fn dispatch(
        &self,
        scope: CancellationToken,
        notifier: Arc<dyn Notifier>,
        request: JsonRpcRequest,
    ) -> Option<JsonRpcResponse> {
        let id = request.id.clone();
        let result = self.dispatch_method(scope, notifier, &request).await;
        if request.is_notification() {
            return None;
        }
        Some(match result {
            Ok(value) => JsonRpcResponse::ok(id, value),
            Err(error) => JsonRpcResponse::err(id, error),
        })
    }

    async fn dispatch_method(
        &self,
        scope: CancellationToken,
        notifier: Arc<dyn Notifier>,
        request: &JsonRpcRequest,
    ) -> Result<Value, JsonRpcError> {
        match request.method.as_str() {
            "initialize" => Ok(json!({
                "protocolVersion": "2024-11-05",
                "capabilities": {"tools": {}, "resources": {"subscribe": true}},
                "serverInfo": {"name": "asms", "version": env!("CARGO_PKG_VERSION")},
            })),
            "tools/list" => Ok(json!({"tools": self.list_tools()})),
            "tools/call" => {
                let name = request
                    .params
                    .get("name")
                    .and_then(Value::as_str)
                    .ok_or_else(|| JsonRpcError::invalid_params("missing 'name'"))?;
                let arguments = request.params.get("arguments").cloned().unwrap_or(json!({}));
                let args_json = serde_json::to_string(&arguments).unwrap_or_else(|_| "{}".to_string());
                let result = self.execute_tool(scope, name, &args_json).await;
                Ok(result.to_json())
            }
            "resources/list" => Ok(json!({"resources": self.list_resources()})),
            "resources/read" => {
                let uri = request
                    .params
                    .get("uri")
                    .and_then(Value::as_str)
                    .ok_or_else(|| JsonRpcError::invalid_params("missing 'uri'"))?;
                self.read_resource(uri)
                    .await
                    .map(|data| json!({"contents": [{"uri": uri, "data": data}]}))
                    .map_err(|e| JsonRpcError::internal_error(format!("{}", e)))
            }
            "resources/subscribe" => {
                let uri = request
                    .params
                    .get("uri")
                    .and_then(Value::as_str)
                    .ok_or_else(|| JsonRpcError::invalid_params("missing 'uri'"))?;
                self.subscribe_resource(scope, uri, notifier)
                    .await
                    .map(|_| json!({"subscribed": uri}))
                    .map_err(|e| JsonRpcError::internal_error(format!("{}", e)))
            }
            "shutdown" => Ok(json!({"ok": true})),
            other => Err(JsonRpcError::method_not_found(other)),
        }
    }
}

fn notification_payload(uri: &str, update: &ResourceUpdate) -> Value {
    serde_json::to_value(update).unwrap_or_else(|_| json!({"uri": uri}))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tool_name_mapping_round_trips() {
        let tool = mcp_tool_name("model.create").unwrap();
        assert_eq!(tool, "model_create");
        assert_eq!(unit_name_from_tool(&tool).unwrap(), "model.create");
    }

    #[test]
    fn multi_dot_names_are_rejected() {
        assert!(mcp_tool_name("a.b.c").is_err());
    }

    #[test]
    fn double_underscore_names_are_rejected() {
        assert!(mcp_tool_name("model__weird.create").is_err());
    }
}
