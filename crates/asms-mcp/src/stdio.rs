//! Single-client, half-duplex stdio MCP server:
//!
//! ```text
//! Uninit --initialize--> Ready --tools.call|resources.*--> Ready
//! Ready  --shutdown|EOF--> Closed
//! ```
//!
//! Writes are serialized through a dedicated writer task so that a
//! resource-update notification can never interleave mid-line with a
//! request/response.

use crate::adapter::{Adapter, Notifier};
use crate::jsonrpc::{JsonRpcError, JsonRpcNotification, JsonRpcRequest, JsonRpcResponse};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SessionState {
    Uninit,
    Ready,
    Closed,
}

struct StdoutNotifier {
    tx: mpsc::UnboundedSender<String>,
}

#[async_trait]
impl Notifier for StdoutNotifier {
    async fn notify(&self, method: &str, params: Value) {
        let notification = JsonRpcNotification::new(method, params);
        if let Ok(line) = serde_json::to_string(&notification) {
            let _ = self.tx.send(line);
        }
    }
}

/// Drives the stdio session until EOF or `shutdown`. The session's own
/// cancellation scope is cancelled on exit so any in-flight
/// `resources/subscribe` forwarders stop.
pub async fn run_stdio_server(adapter: Arc<Adapter>) -> std::io::Result<()> {
    let stdin = tokio::io::stdin();
    let mut lines = BufReader::new(stdin).lines();
    let mut stdout = tokio::io::stdout();

    let (tx, mut rx) = mpsc::unbounded_channel::<String>();
    let writer = tokio::spawn(async move {
        while let Some(line) = rx.recv().await {
            if stdout.write_all(line.as_bytes()).await.is_err() {
                break;
            }
            if stdout.write_all(b"\n").await.is_err() {
                break;
            }
            if stdout.flush().await.is_err() {
                break;
            }
        }
    });

    let notifier: Arc<dyn Notifier> = Arc::new(StdoutNotifier { tx: tx.clone() });
    let session_scope = CancellationToken::new();
    let mut state = SessionState::Uninit;

    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break, // EOF
            Err(e) => {
                tracing::warn!(error = %e, "stdio read error, closing session");
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }

        let request: JsonRpcRequest = match serde_json::from_str(&line) {
            Ok(r) => r,
            Err(e) => {
                let response = JsonRpcResponse::err(None, JsonRpcError::parse_error(e.to_string()));
                send(&tx, &response);
                continue;
            }
        };

        if state == SessionState::Uninit && request.method != "initialize" {
            if !request.is_notification() {
                let response = JsonRpcResponse::err(
                    request.id.clone(),
                    JsonRpcError::invalid_request("session is not initialized; call 'initialize' first"),
                );
                send(&tx, &response);
            }
            continue;
        }

        let method = request.method.clone();
        if let Some(response) = adapter.dispatch(session_scope.child_token(), notifier.clone(), request).await {
            send(&tx, &response);
        }

        match method.as_str() {
            "initialize" => state = SessionState::Ready,
            "shutdown" => {
                state = SessionState::Closed;
                break;
            }
            _ => {}
        }
    }

    session_scope.cancel();
    drop(tx);
    let _ = writer.await;
    tracing::info!(?state, "stdio session closed");
    Ok(())
}

fn send(tx: &mpsc::UnboundedSender<String>, response: &JsonRpcResponse) {
    if let Ok(line) = serde_json::to_string(response) {
        let _ = tx.send(line);
    }
}
