//! The HTTP front door: `POST /api/v2/execute`, `GET /api/v2/health`,
//! `GET /api/v2/metrics`. Built on `axum` for the inbound surface.

use crate::gateway::Gateway;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response as AxumResponse};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

#[derive(Clone)]
pub struct HttpState {
    pub gateway: Arc<Gateway>,
    pub max_body_bytes: u64,
    pub version: String,
}

pub fn router(state: HttpState) -> Router {
    Router::new()
        .route("/api/v2/execute", post(execute))
        .route("/api/v2/health", get(health))
        .route("/api/v2/metrics", get(metrics))
        .with_state(state)
}

async fn execute(State(state): State<HttpState>, body: Bytes) -> AxumResponse {
    if body.len() as u64 > state.max_body_bytes {
        let error = asms_core::UnitError::new(
            "invalid_request",
            format!("request body of {} bytes exceeds the {}-byte limit", body.len(), state.max_body_bytes),
        );
        return (StatusCode::BAD_REQUEST, Json(asms_core::Response::err(error))).into_response();
    }

    let request: asms_core::Request = match serde_json::from_slice(&body) {
        Ok(r) => r,
        Err(e) => {
            let error = asms_core::UnitError::new("invalid_request", format!("malformed request body: {}", e));
            return (StatusCode::BAD_REQUEST, Json(asms_core::Response::err(error))).into_response();
        }
    };

    // Each HTTP call gets its own root cancellation scope; nothing
    // outlives the request.
    let response = state.gateway.handle(CancellationToken::new(), request).await;
    (StatusCode::OK, Json(response)).into_response()
}

async fn health(State(state): State<HttpState>) -> AxumResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "timestamp": Utc::now(),
        "version": state.version,
    }))
    .into_response()
}

async fn metrics(State(state): State<HttpState>) -> AxumResponse {
    let body = state.gateway.metrics().export_prometheus();
    ([(axum::http::header::CONTENT_TYPE, "text/plain; version=0.0.4")], body).into_response()
}
