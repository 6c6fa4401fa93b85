use crate::relay::types::ChatMessage;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Per-sender conversation window, bounded in both dimensions: each sender
/// keeps at most `turn_limit` recent turns (oldest dropped first), and at
/// most `sender_limit` senders are tracked before the least-recently-active
/// conversation is evicted entirely.
#[derive(Clone)]
pub struct ConversationStore {
    inner: Arc<Mutex<ConversationStoreInner>>,
    turn_limit: usize,
    sender_limit: usize,
}

struct ConversationStoreInner {
    conversations: HashMap<String, VecDeque<ChatMessage>>,

    /// Sender keys ordered from least to most recently active.
    activity: VecDeque<String>,
}

impl ConversationStore {
    pub fn new(turn_limit: usize, sender_limit: usize) -> Self {
        Self {
            inner: Arc::new(Mutex::new(ConversationStoreInner {
                conversations: HashMap::new(),
                activity: VecDeque::new(),
            })),
            turn_limit,
            sender_limit: sender_limit.max(1),
        }
    }

    /// Appends a turn and returns a snapshot of the sender's current window.
    pub async fn push_and_snapshot(&self, sender: &str, message: ChatMessage) -> Vec<ChatMessage> {
        let mut inner = self.inner.lock().await;
        self.push_locked(&mut inner, sender, message);
        inner
            .conversations
            .get(sender)
            .map(|turns| turns.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Appends a turn without snapshotting, used for assistant replies.
    pub async fn push(&self, sender: &str, message: ChatMessage) {
        let mut inner = self.inner.lock().await;
        self.push_locked(&mut inner, sender, message);
    }

    pub async fn sender_count(&self) -> usize {
        self.inner.lock().await.conversations.len()
    }

    fn push_locked(&self, inner: &mut ConversationStoreInner, sender: &str, message: ChatMessage) {
        let turns = inner
            .conversations
            .entry(sender.to_string())
            .or_insert_with(|| VecDeque::with_capacity(self.turn_limit));

        turns.push_back(message);
        while turns.len() > self.turn_limit {
            turns.pop_front();
        }

        Self::touch(&mut inner.activity, sender);
        while inner.conversations.len() > self.sender_limit {
            match inner.activity.pop_front() {
                Some(evicted) => {
                    inner.conversations.remove(&evicted);
                }
                None => break,
            }
        }
    }

    /// Moves the sender to the most-recently-active position.
    fn touch(activity: &mut VecDeque<String>, sender: &str) {
        if let Some(position) = activity.iter().position(|key| key == sender) {
            activity.remove(position);
        }
        activity.push_back(sender.to_string());
    }
}

#[cfg(test)]
mod conversation_store_tests {
    use super::*;
    use crate::relay::types::ChatRole;

    fn user_turn(content: &str) -> ChatMessage {
        ChatMessage {
            role: ChatRole::User,
            content: content.to_string(),
        }
    }

    #[tokio::test]
    async fn test_turn_cap_evicts_oldest_first() {
        let store = ConversationStore::new(3, 8);
        for i in 0..5 {
            store.push("918928417703", user_turn(&format!("msg {i}"))).await;
        }

        let snapshot = store
            .push_and_snapshot("918928417703", user_turn("msg 5"))
            .await;
        let contents: Vec<&str> = snapshot.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["msg 3", "msg 4", "msg 5"]);
    }

    #[tokio::test]
    async fn test_snapshot_includes_pushed_message() {
        let store = ConversationStore::new(10, 8);
        let snapshot = store.push_and_snapshot("123", user_turn("first")).await;
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].content, "first");
    }

    #[tokio::test]
    async fn test_sender_cap_evicts_least_recently_active() {
        let store = ConversationStore::new(4, 2);
        store.push("alice", user_turn("a")).await;
        store.push("bob", user_turn("b")).await;

        // Alice is refreshed, so adding a third sender should drop Bob.
        store.push("alice", user_turn("a2")).await;
        store.push("carol", user_turn("c")).await;

        assert_eq!(store.sender_count().await, 2);
        let alice = store.push_and_snapshot("alice", user_turn("a3")).await;
        assert_eq!(alice.len(), 3);

        // Bob starts fresh after eviction.
        let bob = store.push_and_snapshot("bob", user_turn("b2")).await;
        assert_eq!(bob.len(), 1);
    }

    #[tokio::test]
    async fn test_distinct_senders_are_isolated() {
        let store = ConversationStore::new(4, 8);
        store.push("111", user_turn("one")).await;
        let snapshot = store.push_and_snapshot("222", user_turn("two")).await;
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].content, "two");
    }
}
