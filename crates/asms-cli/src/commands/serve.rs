//! Runs the HTTP, stdio MCP, and SSE MCP transports concurrently
//! against one [`crate::stack::Stack`], shutting all three down
//! together on Ctrl-C via a shared cancellation token.

use crate::stack::build_stack;
use anyhow::{Context, Result};
use asms_core::AsmsConfig;
use asms_mcp::{run_stdio_server, Adapter};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

pub async fn run(config: AsmsConfig, no_stdio: bool) -> Result<()> {
    let stack = build_stack(&config)?;
    let shutdown = CancellationToken::new();

    let reaper = asms_conversation::spawn_reaper(
        stack.conversations.clone(),
        config.conversation.ttl_secs,
        config.conversation.reap_interval_secs,
        shutdown.clone(),
    );

    let http_state = asms_gateway::HttpState {
        gateway: stack.gateway.clone(),
        max_body_bytes: config.gateway.max_body_bytes,
        version: env!("CARGO_PKG_VERSION").to_string(),
    };
    let http_router = asms_gateway::router(http_state);
    let http_listener = tokio::net::TcpListener::bind(&config.http.bind_addr)
        .await
        .with_context(|| format!("binding HTTP listener on {}", config.http.bind_addr))?;
    tracing::info!(addr = %config.http.bind_addr, "HTTP surface listening");

    let adapter = Arc::new(Adapter::new(stack.gateway.clone()));

    let sse_router = asms_mcp::sse::router(adapter.clone(), config.mcp.sse_queue_capacity);
    let sse_listener = tokio::net::TcpListener::bind(&config.mcp.sse_bind_addr)
        .await
        .with_context(|| format!("binding SSE listener on {}", config.mcp.sse_bind_addr))?;
    tracing::info!(addr = %config.mcp.sse_bind_addr, "SSE MCP surface listening");

    let http_shutdown = shutdown.clone();
    let http_task = tokio::spawn(async move {
        axum::serve(http_listener, http_router)
            .with_graceful_shutdown(async move { http_shutdown.cancelled().await })
            .await
    });

    let sse_shutdown = shutdown.clone();
    let sse_task = tokio::spawn(async move {
        axum::serve(sse_listener, sse_router)
            .with_graceful_shutdown(async move { sse_shutdown.cancelled().await })
            .await
    });

    let stdio_task = if config.mcp.stdio_enabled && !no_stdio {
        let stdio_adapter = adapter.clone();
        Some(tokio::spawn(async move { run_stdio_server(stdio_adapter).await }))
    } else {
        None
    };

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("ctrl-c received, shutting down");
        }
        _ = shutdown.cancelled() => {}
    }
    shutdown.cancel();

    let _ = http_task.await?;
    let _ = sse_task.await?;
    if let Some(task) = stdio_task {
        let _ = task.await?;
    }
    reaper.abort();

    Ok(())
}
