//! # asms-gateway
//!
//! The synchronous request/response fabric every front-end goes through.
//! Owns the built [`asms_registry::Registry`] and
//! [`asms_registry::ResourceRegistry`], enforces the schema-validate →
//! execute-under-cancellation → wrap-outcome pipeline, and exposes the
//! HTTP surface.

pub mod gateway;
pub mod http;
pub mod metrics;

pub use gateway::Gateway;
pub use http::{router, HttpState};
pub use metrics::MetricsCollector;
