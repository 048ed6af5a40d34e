//! Prometheus-compatible request metrics: per-unit counters and latency
//! sums in a `DashMap`, exported both as Prometheus text and as JSON for
//! `/api/v2/metrics` and `/api/v2/health`.

use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

#[derive(Clone)]
pub struct MetricsCollector {
    request_counts: Arc<DashMap<String, AtomicU64>>,
    error_counts: Arc<DashMap<String, AtomicU64>>,
    latency_sums_micros: Arc<DashMap<String, AtomicU64>>,
    start_time: Arc<Instant>,
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self {
            request_counts: Arc::new(DashMap::new()),
            error_counts: Arc::new(DashMap::new()),
            latency_sums_micros: Arc::new(DashMap::new()),
            start_time: Arc::new(Instant::now()),
        }
    }

    pub fn record_request(&self, unit: &str, latency: Duration, success: bool) {
        self.request_counts
            .entry(unit.to_string())
            .or_insert_with(|| AtomicU64::new(0))
            .fetch_add(1, Ordering::Relaxed);

        self.latency_sums_micros
            .entry(unit.to_string())
            .or_insert_with(|| AtomicU64::new(0))
            .fetch_add(latency.as_micros() as u64, Ordering::Relaxed);

        if !success {
            self.error_counts
                .entry(unit.to_string())
                .or_insert_with(|| AtomicU64::new(0))
                .fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn request_count(&self, unit: &str) -> u64 {
        self.request_counts.get(unit).map(|v| v.load(Ordering::Relaxed)).unwrap_or(0)
    }

    pub fn error_count(&self, unit: &str) -> u64 {
        self.error_counts.get(unit).map(|v| v.load(Ordering::Relaxed)).unwrap_or(0)
    }

    pub fn avg_latency_micros(&self, unit: &str) -> Option<f64> {
        let count = self.request_count(unit);
        if count == 0 {
            return None;
        }
        let sum = self.latency_sums_micros.get(unit).map(|v| v.load(Ordering::Relaxed)).unwrap_or(0);
        Some(sum as f64 / count as f64)
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    pub fn export_prometheus(&self) -> String {
        let mut out = String::new();

        out.push_str("# HELP asms_gateway_requests_total Total requests handled per unit\n");
        out.push_str("# TYPE asms_gateway_requests_total counter\n");
        for entry in self.request_counts.iter() {
            out.push_str(&format!(
                "asms_gateway_requests_total{{unit=\"{}\"}} {}\n",
                entry.key(),
                entry.value().load(Ordering::Relaxed)
            ));
        }

        out.push_str("# HELP asms_gateway_errors_total Total error responses per unit\n");
        out.push_str("# TYPE asms_gateway_errors_total counter\n");
        for entry in self.error_counts.iter() {
            out.push_str(&format!(
                "asms_gateway_errors_total{{unit=\"{}\"}} {}\n",
                entry.key(),
                entry.value().load(Ordering::Relaxed)
            ));
        }

        out.push_str("# HELP asms_gateway_latency_microseconds_sum Sum of request latencies per unit\n");
        out.push_str("# TYPE asms_gateway_latency_microseconds_sum counter\n");
        for entry in self.latency_sums_micros.iter() {
            out.push_str(&format!(
                "asms_gateway_latency_microseconds_sum{{unit=\"{}\"}} {}\n",
                entry.key(),
                entry.value().load(Ordering::Relaxed)
            ));
        }

        out.push_str("# HELP asms_gateway_uptime_seconds Gateway process uptime\n");
        out.push_str("# TYPE asms_gateway_uptime_seconds gauge\n");
        out.push_str(&format!("asms_gateway_uptime_seconds {}\n", self.uptime_seconds()));

        out
    }

    pub fn export_json(&self) -> serde_json::Value {
        let mut units = serde_json::Map::new();
        for entry in self.request_counts.iter() {
            let unit = entry.key();
            let requests = entry.value().load(Ordering::Relaxed);
            let errors = self.error_count(unit);
            let mut detail = serde_json::Map::new();
            detail.insert("requests".to_string(), serde_json::json!(requests));
            detail.insert("errors".to_string(), serde_json::json!(errors));
            if let Some(avg) = self.avg_latency_micros(unit) {
                detail.insert("avg_latency_micros".to_string(), serde_json::json!(avg));
            }
            units.insert(unit.clone(), serde_json::Value::Object(detail));
        }
        serde_json::json!({
            "uptime_seconds": self.uptime_seconds(),
            "units": units,
        })
    }
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new()
    }
}
