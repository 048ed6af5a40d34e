use asms_core::{CommandUnit, GatewayConfig, Request, RequestType, UnitContext, UnitError, UnitMeta};
use asms_gateway::Gateway;
use asms_registry::{Registry, RegistryBuilder, ResourceRegistry};
use async_trait::async_trait;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use serde_json::{json, Value};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

struct AddOne;

#[async_trait]
impl CommandUnit for AddOne {
    fn meta(&self) -> &UnitMeta {
        static META: std::sync::OnceLock<UnitMeta> = std::sync::OnceLock::new();
        META.get_or_init(|| UnitMeta::new("bench.add", "bench", "adds one"))
    }

    async fn execute(&self, _ctx: UnitContext, input: Value) -> Result<Value, UnitError> {
        let value = input["value"].as_i64().unwrap_or(0);
        Ok(json!({"result": value + 1}))
    }
}

struct Filler {
    meta: UnitMeta,
}

#[async_trait]
impl CommandUnit for Filler {
    fn meta(&self) -> &UnitMeta {
        &self.meta
    }

    async fn execute(&self, _ctx: UnitContext, _input: Value) -> Result<Value, UnitError> {
        Ok(json!({}))
    }
}

fn gateway_with(num_fillers: usize) -> Gateway {
    let mut builder = RegistryBuilder::new();
    builder.register_command(Arc::new(AddOne)).unwrap();
    for i in 0..num_fillers {
        builder
            .register_command(Arc::new(Filler {
                meta: UnitMeta::new(format!("bench.filler{i}"), "bench", "filler"),
            }))
            .unwrap();
    }
    let registry: Registry = builder.build();
    Gateway::new(Arc::new(registry), Arc::new(ResourceRegistry::new()), GatewayConfig::default())
}

fn dispatch_benchmark(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let mut group = c.benchmark_group("gateway_dispatch");

    group.bench_function("single_unit", |b| {
        let gateway = gateway_with(0);
        b.to_async(&rt).iter(|| async {
            let request = Request::new(RequestType::Command, "bench.add", [("value".to_string(), json!(42))].into());
            let response = gateway.handle(black_box(CancellationToken::new()), black_box(request)).await;
            black_box(response);
        });
    });

    for num_filler_units in [10, 100, 1000].iter() {
        group.bench_with_input(BenchmarkId::new("registry_scale", num_filler_units), num_filler_units, |b, &num| {
            let gateway = gateway_with(num);
            b.to_async(&rt).iter(|| async {
                let request =
                    Request::new(RequestType::Command, "bench.add", [("value".to_string(), json!(42))].into());
                let response = gateway.handle(black_box(CancellationToken::new()), black_box(request)).await;
                black_box(response);
            });
        });
    }

    group.finish();
}

criterion_group!(benches, dispatch_benchmark);
criterion_main!(benches);
