//! Integration tests spanning `asms-registry`, `asms-gateway`, and
//! `asms-mcp`: the pieces that make up the control plane, wired the way
//! `asms-cli::stack` wires them but without a unit domain of its own
//! (a handful of stub units built in-test instead).

use asms_core::{CommandUnit, GatewayConfig, QueryUnit, Request, RequestType, SchemaNode, UnitContext, UnitError, UnitMeta};
use asms_gateway::Gateway;
use asms_mcp::adapter::Adapter;
use asms_registry::{RegistryBuilder, ResourceRegistry};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

struct Echo {
    meta: UnitMeta,
}

impl Echo {
    fn command(name: &str) -> Arc<dyn CommandUnit> {
        Arc::new(Self {
            meta: UnitMeta::new(name, "model", "echoes its input back")
                .with_input_schema(SchemaNode::object().with_property("value", SchemaNode::string()).required(["value"])),
        })
    }

    fn query(name: &str) -> Arc<dyn QueryUnit> {
        Arc::new(Self {
            meta: UnitMeta::new(name, "model", "returns a constant"),
        })
    }
}

#[async_trait]
impl CommandUnit for Echo {
    fn meta(&self) -> &UnitMeta {
        &self.meta
    }
    async fn execute(&self, _ctx: UnitContext, input: Value) -> Result<Value, UnitError> {
        Ok(input)
    }
}

#[async_trait]
impl QueryUnit for Echo {
    fn meta(&self) -> &UnitMeta {
        &self.meta
    }
    async fn execute(&self, _ctx: UnitContext, _input: Value) -> Result<Value, UnitError> {
        Ok(json!({"models": [], "total": 0}))
    }
}

fn gateway_with(commands: Vec<(&str, Arc<dyn CommandUnit>)>, queries: Vec<(&str, Arc<dyn QueryUnit>)>) -> Gateway {
    let mut builder = RegistryBuilder::new();
    for (_, unit) in commands {
        builder.register_command(unit).unwrap();
    }
    for (_, unit) in queries {
        builder.register_query(unit).unwrap();
    }
    let registry = Arc::new(builder.build());
    let resources = Arc::new(ResourceRegistry::new());
    Gateway::new(registry, resources, GatewayConfig::default())
}

#[tokio::test]
async fn command_round_trips_through_the_gateway() {
    let gateway = gateway_with(vec![("model.create", Echo::command("model.create"))], vec![]);
    let request = Request::new(RequestType::Command, "model.create", [("value".to_string(), json!("alpha"))].into());
    let response = gateway.handle(CancellationToken::new(), request).await;
    assert!(response.success);
    assert_eq!(response.data.unwrap()["value"], "alpha");
}

#[tokio::test]
async fn missing_required_field_is_invalid_input() {
    let gateway = gateway_with(vec![("model.create", Echo::command("model.create"))], vec![]);
    let request = Request::new(RequestType::Command, "model.create", Default::default());
    let response = gateway.handle(CancellationToken::new(), request).await;
    assert!(!response.success);
    assert_eq!(response.error.unwrap().code, "invalid_input");
}

#[tokio::test]
async fn unknown_unit_is_unit_not_found() {
    let gateway = gateway_with(vec![], vec![]);
    let request = Request::new(RequestType::Query, "model.list", Default::default());
    let response = gateway.handle(CancellationToken::new(), request).await;
    assert_eq!(response.error.unwrap().code, "unit_not_found");
}

#[tokio::test]
async fn query_registered_as_command_is_not_found_under_the_other_kind() {
    let gateway = gateway_with(vec![], vec![("model.list", Echo::query("model.list"))]);
    let request = Request::new(RequestType::Command, "model.list", Default::default());
    let response = gateway.handle(CancellationToken::new(), request).await;
    assert_eq!(response.error.unwrap().code, "unit_not_found");
}

#[tokio::test]
async fn caller_cancellation_surfaces_as_cancelled_not_a_partial_success() {
    struct Never {
        meta: UnitMeta,
    }
    #[async_trait]
    impl CommandUnit for Never {
        fn meta(&self) -> &UnitMeta {
            &self.meta
        }
        async fn execute(&self, ctx: UnitContext, _input: Value) -> Result<Value, UnitError> {
            ctx.cancelled().await;
            Ok(json!({"should": "never observe this"}))
        }
    }
    let unit: Arc<dyn CommandUnit> = Arc::new(Never {
        meta: UnitMeta::new("model.stall", "model", "never completes on its own"),
    });
    let gateway = gateway_with(vec![("model.stall", unit)], vec![]);

    let caller_scope = CancellationToken::new();
    let request = Request::new(RequestType::Command, "model.stall", Default::default());
    let handle = tokio::spawn({
        let caller_scope = caller_scope.clone();
        async move { gateway.handle(caller_scope, request).await }
    });
    tokio::time::sleep(std::time::Duration::from_millis(20)).await;
    caller_scope.cancel();

    let response = handle.await.unwrap();
    assert!(!response.success);
    assert_eq!(response.error.unwrap().code, "cancelled");
}

#[tokio::test]
async fn mcp_adapter_lists_tools_named_after_registered_units() {
    let gateway = Arc::new(gateway_with(vec![("model.create", Echo::command("model.create"))], vec![]));
    let adapter = Adapter::new(gateway);
    let tools = adapter.list_tools();
    assert!(tools.iter().any(|t| t.name == "model_create"));
}

#[tokio::test]
async fn mcp_adapter_execute_tool_never_raises_a_protocol_error_on_unit_failure() {
    let gateway = Arc::new(gateway_with(vec![("model.create", Echo::command("model.create"))], vec![]));
    let adapter = Adapter::new(gateway);
    // missing "value" -> the unit rejects with invalid_input, which the
    // adapter must express as is_error content, not a raised error.
    let result = adapter.execute_tool(CancellationToken::new(), "model_create", "{}").await;
    assert!(result.is_error);
}

#[tokio::test]
async fn conversation_store_get_or_create_generates_and_reuses_an_id() {
    let store = asms_conversation::ConversationStore::new(100);
    let conversation = store.get_or_create("").await;
    let id = conversation.id.clone();
    assert!(id.starts_with("conv-"));

    let same = store.get_or_create(&id).await;
    assert_eq!(same.id, id);
}

#[tokio::test]
async fn conversation_store_trims_from_the_front_past_max_messages() {
    let store = asms_conversation::ConversationStore::new(2);
    let conversation = store.get_or_create("").await;
    let id = conversation.id;

    store.add_message(&id, asms_core::conversation::Message::user("one")).await;
    store.add_message(&id, asms_core::conversation::Message::user("two")).await;
    store.add_message(&id, asms_core::conversation::Message::user("three")).await;

    let conversation = store.get(&id).await.unwrap();
    assert_eq!(conversation.messages.len(), 2);
    assert_eq!(conversation.messages[0].content, "two");
    assert_eq!(conversation.messages[1].content, "three");
}
