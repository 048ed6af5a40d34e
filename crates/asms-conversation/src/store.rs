//! `ConversationStore`: a single reader/writer lock around a map, the
//! simplest correct design for this access pattern. `get`,
//! `get_or_create`, `list`, `count`, `delete`, and the reaper all take
//! the lock; `add_message` is the Agent's responsibility to serialize
//! per conversation and only needs a write-lock for its own mutation.

use asms_core::conversation::{Conversation, Message};
use chrono::{DateTime, Utc};
use rand::Rng;
use std::collections::HashMap;
use tokio::sync::RwLock;

pub struct ConversationStore {
    conversations: RwLock<HashMap<String, Conversation>>,
    max_messages: usize,
}

impl ConversationStore {
    pub fn new(max_messages: usize) -> Self {
        Self {
            conversations: RwLock::new(HashMap::new()),
            max_messages,
        }
    }

    /// Returns the existing conversation for `id`, or creates a fresh
    /// one. An empty `id` generates a new `conv-<8 hex chars>` id rather
    /// than being treated as a real key.
    pub async fn get_or_create(&self, id: &str) -> Conversation {
        let id = if id.is_empty() {
            generate_id()
        } else {
            id.to_string()
        };

        let mut conversations = self.conversations.write().await;
        conversations
            .entry(id.clone())
            .or_insert_with(|| Conversation::new(id))
            .clone()
    }

    pub async fn get(&self, id: &str) -> Option<Conversation> {
        self.conversations.read().await.get(id).cloned()
    }

    pub async fn delete(&self, id: &str) -> bool {
        self.conversations.write().await.remove(id).is_some()
    }

    pub async fn list(&self) -> Vec<Conversation> {
        self.conversations.read().await.values().cloned().collect()
    }

    pub async fn count(&self) -> usize {
        self.conversations.read().await.len()
    }

    /// Replace-or-insert a conversation wholesale, used when restoring
    /// persisted state from a snapshot.
    pub async fn inject(&self, conversation: Conversation) {
        self.conversations.write().await.insert(conversation.id.clone(), conversation);
    }

    /// Append `message` to `id`'s history, trimming to `max_messages`
    /// from the front. Returns the conversation after mutation, or
    /// `None` if `id` is not present (callers should `get_or_create`
    /// first within the same turn).
    pub async fn add_message(&self, id: &str, message: Message) -> Option<Conversation> {
        let mut conversations = self.conversations.write().await;
        let conversation = conversations.get_mut(id)?;
        conversation.add_message(message, self.max_messages);
        Some(conversation.clone())
    }

    /// Deletes every conversation whose `updated_at` is older than
    /// `now - ttl`. Returns the number removed.
    pub async fn reap_idle(&self, ttl: chrono::Duration, now: DateTime<Utc>) -> usize {
        let mut conversations = self.conversations.write().await;
        let before = conversations.len();
        conversations.retain(|_, conv| !conv.is_idle_past(ttl, now));
        before - conversations.len()
    }
}

fn generate_id() -> String {
    let suffix: u32 = rand::thread_rng().gen();
    format!("conv-{:08x}", suffix)
}
