//! HTTP + Server-Sent-Events MCP server. `POST /message`
//! accepts a JSON-RPC request and returns a `session_id`; `GET
//! /sse?session=<id>` is the long-lived stream that actually delivers
//! responses and notifications. Each session owns a bounded outbound
//! queue; persistent back-pressure drops the session rather than the
//! whole server.

use crate::adapter::{Adapter, Notifier};
use crate::jsonrpc::{JsonRpcNotification, JsonRpcRequest};
use async_trait::async_trait;
use axum::extract::{Query, State};
use axum::response::sse::{Event, Sse};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use dashmap::DashMap;
use futures::stream::Stream;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tokio_stream::wrappers::ReceiverStream;
use tokio_stream::StreamExt;
use tokio_util::sync::CancellationToken;

const MAX_CONSECUTIVE_DROPS: u32 = 5;

struct Session {
    tx: mpsc::Sender<String>,
    rx: Mutex<Option<mpsc::Receiver<String>>>,
    scope: CancellationToken,
    consecutive_drops: AtomicU32,
}

impl Session {
    fn new(queue_capacity: usize) -> Arc<Self> {
        let (tx, rx) = mpsc::channel(queue_capacity);
        Arc::new(Self {
            tx,
            rx: Mutex::new(Some(rx)),
            scope: CancellationToken::new(),
            consecutive_drops: AtomicU32::new(0),
        })
    }
}

struct QueueNotifier {
    sessions: Arc<DashMap<String, Arc<Session>>>,
    session_id: String,
}

#[async_trait]
impl Notifier for QueueNotifier {
    async fn notify(&self, method: &str, params: Value) {
        let Some(session) = self.sessions.get(&self.session_id).map(|e| e.value().clone()) else {
            return;
        };
        let notification = JsonRpcNotification::new(method, params);
        push(&self.sessions, &self.session_id, &session, &notification);
    }
}

#[derive(Clone)]
pub struct SseState {
    adapter: Arc<Adapter>,
    sessions: Arc<DashMap<String, Arc<Session>>>,
    queue_capacity: usize,
}

pub fn router(adapter: Arc<Adapter>, queue_capacity: usize) -> Router {
    let state = SseState {
        adapter,
        sessions: Arc::new(DashMap::new()),
        queue_capacity,
    };
    Router::new()
        .route("/message", post(post_message))
        .route("/sse", get(get_sse))
        .with_state(state)
}

#[derive(Debug, Deserialize)]
struct MessageQuery {
    session: Option<String>,
}

async fn post_message(
    State(state): State<SseState>,
    Query(query): Query<MessageQuery>,
    Json(request): Json<JsonRpcRequest>,
) -> impl IntoResponse {
    let session_id = query.session.unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
    let session = state
        .sessions
        .entry(session_id.clone())
        .or_insert_with(|| Session::new(state.queue_capacity))
        .clone();

    let adapter = state.adapter.clone();
    let sessions = state.sessions.clone();
    let sid = session_id.clone();
    let scope = session.scope.child_token();
    tokio::spawn(async move {
        let notifier: Arc<dyn Notifier> = Arc::new(QueueNotifier {
            sessions: sessions.clone(),
            session_id: sid.clone(),
        });
        if let Some(response) = adapter.dispatch(scope, notifier, request).await {
            if let Some(session) = sessions.get(&sid).map(|e| e.value().clone()) {
                push(&sessions, &sid, &session, &response);
            }
        }
    });

    Json(json!({"session_id": session_id}))
}

async fn get_sse(
    State(state): State<SseState>,
    Query(query): Query<MessageQuery>,
) -> Sse<impl Stream<Item = Result<Event, std::convert::Infallible>>> {
    let session_id = query.session.unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
    let session = state
        .sessions
        .entry(session_id.clone())
        .or_insert_with(|| Session::new(state.queue_capacity))
        .clone();

    let receiver = session.rx.lock().await.take();
    let stream = match receiver {
        Some(rx) => ReceiverStream::new(rx),
        // A second GET for the same session (client reconnect without a
        // fresh session id): there is no receiver left to hand out, so
        // the stream ends immediately rather than fighting over one.
        None => {
            let (_tx, rx) = mpsc::channel(1);
            ReceiverStream::new(rx)
        }
    };

    Sse::new(stream.map(|line| Ok(Event::default().data(line))))
}

fn push<T: serde::Serialize>(
    sessions: &Arc<DashMap<String, Arc<Session>>>,
    session_id: &str,
    session: &Arc<Session>,
    message: &T,
) {
    let Ok(line) = serde_json::to_string(message) else {
        return;
    };
    match session.tx.try_send(line) {
        Ok(()) => session.consecutive_drops.store(0, Ordering::Relaxed),
        Err(_) => {
            let drops = session.consecutive_drops.fetch_add(1, Ordering::Relaxed) + 1;
            if drops >= MAX_CONSECUTIVE_DROPS {
                tracing::warn!(session = %session_id, "sse session back-pressured past limit, terminating");
                session.scope.cancel();
                sessions.remove(session_id);
            }
        }
    }
}
