//! Background reclamation loop, one fixed-interval `tokio::spawn`ed
//! task per store. Uses a sleep-then-check loop rather than
//! `tokio::time::interval`, since a reap pass that runs slightly late
//! is harmless and the loop needs no catch-up behavior.

use crate::store::ConversationStore;
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Spawns the reaper loop and returns a handle whose `cancel()` stops
/// it. The loop itself never panics: a reap pass failing would mean the
/// store's lock is poisoned, which `tokio::sync::RwLock` cannot be.
pub fn spawn_reaper(
    store: Arc<ConversationStore>,
    ttl_secs: u64,
    interval_secs: u64,
    shutdown: CancellationToken,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let interval = Duration::from_secs(interval_secs);
        let ttl = chrono::Duration::seconds(ttl_secs as i64);
        loop {
            tokio::select! {
                _ = tokio::time::sleep(interval) => {
                    let removed = store.reap_idle(ttl, Utc::now()).await;
                    if removed > 0 {
                        tracing::info!(removed, "conversation reaper evicted idle conversations");
                    }
                }
                _ = shutdown.cancelled() => {
                    tracing::debug!("conversation reaper shutting down");
                    break;
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use asms_core::conversation::Conversation;

    #[tokio::test]
    async fn reaper_evicts_idle_conversation_after_one_tick() {
        let store = Arc::new(ConversationStore::new(100));
        let mut stale = Conversation::new("stale");
        stale.updated_at = Utc::now() - chrono::Duration::hours(1);
        store.inject(stale).await;

        let shutdown = CancellationToken::new();
        let handle = spawn_reaper(store.clone(), 60, 0, shutdown.clone());

        tokio::time::sleep(Duration::from_millis(50)).await;
        shutdown.cancel();
        let _ = handle.await;

        assert!(store.get("stale").await.is_none());
    }

    #[tokio::test]
    async fn reaper_stops_promptly_on_cancellation() {
        let store = Arc::new(ConversationStore::new(100));
        let shutdown = CancellationToken::new();
        let handle = spawn_reaper(store, 3600, 3600, shutdown.clone());

        shutdown.cancel();
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("reaper should shut down promptly")
            .unwrap();
    }
}
