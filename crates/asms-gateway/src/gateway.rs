use crate::metrics::MetricsCollector;
use asms_core::{
    validate_or_error, ArcCommand, ArcQuery, GatewayConfig, Request, Response, ResourceUpdate,
    UnitContext, UnitError, UnitKind, UnitMeta,
};
use asms_registry::{Registry, ResourceRegistry};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

const RESOURCE_SUBSCRIPTION_QUEUE_DEPTH: usize = 64;

enum Dispatchable {
    Command(ArcCommand),
    Query(ArcQuery),
}

impl Dispatchable {
    fn meta(&self) -> &UnitMeta {
        match self {
            Dispatchable::Command(u) => u.meta(),
            Dispatchable::Query(u) => u.meta(),
        }
    }

    async fn execute(&self, ctx: UnitContext, input: serde_json::Value) -> Result<serde_json::Value, UnitError> {
        match self {
            Dispatchable::Command(u) => u.execute(ctx, input).await,
            Dispatchable::Query(u) => u.execute(ctx, input).await,
        }
    }
}

/// The one-call entry point for every front-end: `handle(ctx, Request) ->
/// Response`. Stateless aside from config and a shared Registry
/// reference.
pub struct Gateway {
    registry: Arc<Registry>,
    resources: Arc<ResourceRegistry>,
    config: GatewayConfig,
    metrics: MetricsCollector,
}

impl Gateway {
    pub fn new(registry: Arc<Registry>, resources: Arc<ResourceRegistry>, config: GatewayConfig) -> Self {
        Self {
            registry,
            resources,
            config,
            metrics: MetricsCollector::new(),
        }
    }

    pub fn metrics(&self) -> &MetricsCollector {
        &self.metrics
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    pub fn resource_descriptors(&self) -> Vec<(String, String, bool)> {
        self.resources.list_descriptors()
    }

    /// Normalizes options, resolves the unit, validates input, executes
    /// under a cancellation scope, and wraps the outcome. Never raises
    /// an unstructured error to the caller.
    pub async fn handle(&self, caller_scope: CancellationToken, request: Request) -> Response {
        let start = Instant::now();
        let unit_name = request.unit.clone();
        let response = self.dispatch(caller_scope, request).await;
        tracing::debug!(unit = %unit_name, success = response.success, "gateway dispatch");
        self.metrics.record_request(&unit_name, start.elapsed(), response.success);
        response
    }

    async fn dispatch(&self, caller_scope: CancellationToken, request: Request) -> Response {
        let timeout_ms = if request.options.timeout_ms == 0 {
            self.config.default_timeout_ms
        } else {
            request.options.timeout_ms
        };

        let kind: UnitKind = request.request_type.into();
        let dispatchable = match kind {
            UnitKind::Command => self.registry.get_command(&request.unit).map(Dispatchable::Command),
            UnitKind::Query => self.registry.get_query(&request.unit).map(Dispatchable::Query),
        };
        let Some(dispatchable) = dispatchable else {
            return Response::err(UnitError::unit_not_found(&request.unit));
        };

        let input_value = request.input_as_value();
        let materialized = match validate_or_error(&dispatchable.meta().input_schema, &input_value) {
            Ok(v) => v,
            Err(e) => return Response::err(e),
        };

        let child_scope = caller_scope.child_token();
        let ctx = UnitContext::new(child_scope.clone(), request.options.correlation_id.clone());

        let join = tokio::spawn(async move { dispatchable.execute(ctx, materialized).await });

        tokio::select! {
            result = join => Self::response_from_join(result),
            _ = tokio::time::sleep(Duration::from_millis(timeout_ms)) => {
                child_scope.cancel();
                Response::err(UnitError::timeout())
            }
            _ = caller_scope.cancelled() => {
                child_scope.cancel();
                Response::err(UnitError::cancelled())
            }
        }
    }

    fn response_from_join(result: Result<Result<serde_json::Value, UnitError>, tokio::task::JoinError>) -> Response {
        match result {
            Ok(Ok(value)) => Response::ok(value),
            Ok(Err(unit_error)) => Response::err(unit_error),
            Err(join_error) if join_error.is_cancelled() => Response::err(UnitError::cancelled()),
            Err(join_error) => Response::err(UnitError::internal(panic_message(join_error))),
        }
    }

    /// Snapshot read of a resource.
    pub async fn read_resource(&self, uri: &str) -> Result<serde_json::Value, UnitError> {
        let resource = self.resources.resolve(uri)?;
        resource.get().await
    }

    /// `stream(ctx, uri) -> channel<ResourceUpdate>`. Each subscription
    /// is its own forwarding task; no fan-out is shared between clients.
    pub async fn stream(
        &self,
        subscriber_scope: CancellationToken,
        uri: &str,
    ) -> Result<mpsc::Receiver<ResourceUpdate>, UnitError> {
        let resource = self.resources.resolve(uri)?;
        let mut source = resource.watch().await.ok_or_else(|| {
            UnitError::new("resource_not_watchable", format!("resource '{}' does not support watch", uri))
        })?;

        let (tx, rx) = mpsc::channel(RESOURCE_SUBSCRIPTION_QUEUE_DEPTH);
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = subscriber_scope.cancelled() => break,
                    update = source.recv() => {
                        match update {
                            Some(update) => {
                                if tx.send(update).await.is_err() {
                                    break;
                                }
                            }
                            None => break,
                        }
                    }
                }
            }
        });
        Ok(rx)
    }
}

fn panic_message(join_error: tokio::task::JoinError) -> String {
    match join_error.try_into_panic() {
        Ok(payload) => payload
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unit panicked".to_string()),
        Err(_) => "unit task failed".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use asms_core::{CommandUnit, QueryUnit, SchemaNode};
    use asms_registry::RegistryBuilder;
    use serde_json::json;

    struct ListModels;

    #[async_trait]
    impl QueryUnit for ListModels {
        fn meta(&self) -> &UnitMeta {
            thread_local_meta()
        }
        async fn execute(&self, _ctx: UnitContext, _input: serde_json::Value) -> Result<serde_json::Value, UnitError> {
            Ok(json!({"models": [], "total": 0}))
        }
    }

    fn thread_local_meta() -> &'static UnitMeta {
        use std::sync::OnceLock;
        static META: OnceLock<UnitMeta> = OnceLock::new();
        META.get_or_init(|| UnitMeta::new("model.list", "model", "list models"))
    }

    struct CreateModel {
        meta: UnitMeta,
    }

    #[async_trait]
    impl CommandUnit for CreateModel {
        fn meta(&self) -> &UnitMeta {
            &self.meta
        }
        async fn execute(&self, _ctx: UnitContext, input: serde_json::Value) -> Result<serde_json::Value, UnitError> {
            Ok(json!({"id": input["name"]}))
        }
    }

    struct SleepyUnit {
        meta: UnitMeta,
    }

    #[async_trait]
    impl QueryUnit for SleepyUnit {
        fn meta(&self) -> &UnitMeta {
            &self.meta
        }
        async fn execute(&self, _ctx: UnitContext, _input: serde_json::Value) -> Result<serde_json::Value, UnitError> {
            tokio::time::sleep(Duration::from_secs(10)).await;
            Ok(json!({}))
        }
    }

    fn build_gateway(setup: impl FnOnce(&mut RegistryBuilder)) -> Gateway {
        let mut builder = RegistryBuilder::new();
        setup(&mut builder);
        let registry = Arc::new(builder.build());
        let resources = Arc::new(ResourceRegistry::new());
        Gateway::new(registry, resources, GatewayConfig::default())
    }

    fn query_request(unit: &str) -> Request {
        Request::new(asms_core::RequestType::Query, unit, Default::default())
    }

    #[tokio::test]
    async fn unit_not_found_scenario() {
        let gateway = build_gateway(|_| {});
        let resp = gateway.handle(CancellationToken::new(), query_request("model.unknown")).await;
        assert!(!resp.success);
        assert_eq!(resp.error.unwrap().code, "unit_not_found");
    }

    #[tokio::test]
    async fn validation_failure_scenario() {
        let meta = UnitMeta::new("model.create", "model", "create a model")
            .with_input_schema(SchemaNode::object().with_property("name", SchemaNode::string()).required(["name"]));
        let gateway = build_gateway(|b| {
            b.register_command(Arc::new(CreateModel { meta })).unwrap();
        });

        let resp = gateway
            .handle(CancellationToken::new(), Request::new(asms_core::RequestType::Command, "model.create", Default::default()))
            .await;
        assert!(!resp.success);
        let error = resp.error.unwrap();
        assert_eq!(error.code, "invalid_input");
        assert_eq!(error.details.unwrap(), json!(["name"]));
    }

    #[tokio::test]
    async fn happy_path_scenario() {
        let gateway = build_gateway(|b| {
            b.register_query(Arc::new(ListModels)).unwrap();
        });
        let resp = gateway.handle(CancellationToken::new(), query_request("model.list")).await;
        assert!(resp.success);
        assert_eq!(resp.data.unwrap(), json!({"models": [], "total": 0}));
    }

    #[tokio::test]
    async fn timeout_scenario() {
        let gateway = build_gateway(|b| {
            b.register_query(Arc::new(SleepyUnit {
                meta: UnitMeta::new("model.slow", "model", "sleeps"),
            }))
            .unwrap();
        });

        let mut request = query_request("model.slow");
        request.options.timeout_ms = 50;

        let start = Instant::now();
        let resp = gateway.handle(CancellationToken::new(), request).await;
        assert!(start.elapsed() < Duration::from_millis(200));
        assert!(!resp.success);
        assert_eq!(resp.error.unwrap().code, "timeout");
    }

    #[tokio::test]
    async fn caller_cancellation_maps_to_cancelled_not_timeout() {
        let gateway = build_gateway(|b| {
            b.register_query(Arc::new(SleepyUnit {
                meta: UnitMeta::new("model.slow", "model", "sleeps"),
            }))
            .unwrap();
        });

        let caller_scope = CancellationToken::new();
        let mut request = query_request("model.slow");
        request.options.timeout_ms = 5_000;

        let scope_clone = caller_scope.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            scope_clone.cancel();
        });

        let resp = gateway.handle(caller_scope, request).await;
        assert!(!resp.success);
        assert_eq!(resp.error.unwrap().code, "cancelled");
    }

    #[tokio::test]
    async fn response_success_iff_no_error() {
        let gateway = build_gateway(|b| {
            b.register_query(Arc::new(ListModels)).unwrap();
        });
        let ok = gateway.handle(CancellationToken::new(), query_request("model.list")).await;
        assert_eq!(ok.success, ok.error.is_none());

        let missing = gateway.handle(CancellationToken::new(), query_request("model.missing")).await;
        assert_eq!(missing.success, missing.error.is_none());
    }
}
