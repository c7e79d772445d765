//! A thread-safe notification hub for topic-based event fan-out, with
//! presence tracking.
//!
//! Uses Tokio broadcast channels per topic. Delivery is best-effort: a slow
//! or disconnected subscriber never blocks the sender or other subscribers.
//! Also tracks user presence per topic so a user with several devices keeps
//! their entry until the last channel closes.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{RwLock, broadcast};

use super::topics;

/// Type alias for topic name.
type Topic = String;

/// Sender for a topic's broadcast channel.
type Sender = broadcast::Sender<String>;

/// Receiver for a topic's broadcast channel.
type Receiver = broadcast::Receiver<String>;

/// Manages broadcast channels per topic to support real-time WebSocket
/// communication.
///
/// - Lazily creates broadcast channels per topic on first subscription
/// - Removes topics when their subscriber count drops to zero after sending
/// - Tracks user presence per topic using a refcount (supports multiple devices)
#[derive(Clone, Default)]
pub struct WebSocketManager {
    /// Map of topics to broadcast senders.
    pub inner: Arc<RwLock<HashMap<Topic, Sender>>>,
    /// Presence map: topic -> (user_id -> refcount)
    presence: Arc<RwLock<HashMap<Topic, HashMap<String, usize>>>>,
}

impl WebSocketManager {
    /// Creates a new, empty `WebSocketManager`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribes to the given topic, creating it if necessary.
    pub async fn subscribe(&self, topic: &str) -> Receiver {
        let mut map = self.inner.write().await;
        map.entry(topic.to_string())
            .or_insert_with(|| broadcast::channel(100).0)
            .subscribe()
    }

    /// Broadcasts a message to all subscribers of `topic`.
    ///
    /// If the topic does not exist, it's a no-op.
    /// If the topic has zero subscribers after sending, it is removed.
    pub async fn broadcast<T: Into<String>>(&self, topic: &str, msg: T) {
        let mut map = self.inner.write().await;
        if let Some(sender) = map.get(topic) {
            let _ = sender.send(msg.into());
            if sender.receiver_count() == 0 {
                tracing::info!("Removing topic '{topic}' due to no subscribers.");
                map.remove(topic);
            }
        }
    }

    /// Delivers a message to every channel the given user has open on their
    /// personal topic. Best-effort: absent or dead channels are skipped.
    pub async fn send_to_user<T: Into<String>>(&self, user_id: &str, msg: T) {
        self.broadcast(&topics::user_topic(user_id), msg).await;
    }

    /// Delivers a message to every client connected to the global events
    /// topic, across all users.
    pub async fn broadcast_all<T: Into<String>>(&self, msg: T) {
        self.broadcast(topics::EVENTS_TOPIC, msg).await;
    }

    // -------------------- Presence API --------------------

    /// Increment presence refcount for `user_id` on `topic`.
    /// Call this when a socket subscribes/opens for that topic.
    pub async fn register(&self, topic: &str, user_id: &str) {
        let mut p = self.presence.write().await;
        let entry = p.entry(topic.to_string()).or_default();
        *entry.entry(user_id.to_string()).or_insert(0) += 1;
    }

    /// Decrement presence refcount for `user_id` on `topic`.
    /// Call this when a socket closes for that topic. Dropping the last
    /// channel removes the user entry entirely.
    pub async fn unregister(&self, topic: &str, user_id: &str) {
        let mut p = self.presence.write().await;
        if let Some(users) = p.get_mut(topic) {
            if let Some(cnt) = users.get_mut(user_id) {
                if *cnt > 1 {
                    *cnt -= 1;
                } else {
                    users.remove(user_id);
                }
            }
            if users.is_empty() {
                p.remove(topic);
            }
        }
    }

    /// Returns `true` if `user_id` currently has at least one active
    /// subscription to `topic`.
    pub async fn is_user_present_on(&self, topic: &str, user_id: &str) -> bool {
        let p = self.presence.read().await;
        p.get(topic).and_then(|m| m.get(user_id)).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::{Duration, timeout};

    #[tokio::test]
    async fn it_broadcasts_to_all_subscribers() {
        let manager = WebSocketManager::new();
        let topic = "test-topic";

        let mut r1 = manager.subscribe(topic).await;
        let mut r2 = manager.subscribe(topic).await;

        manager.broadcast(topic, "hello world").await;

        let msg1 = timeout(Duration::from_millis(50), r1.recv())
            .await
            .unwrap()
            .unwrap();
        let msg2 = timeout(Duration::from_millis(50), r2.recv())
            .await
            .unwrap()
            .unwrap();

        assert_eq!(msg1, "hello world");
        assert_eq!(msg2, "hello world");
    }

    #[tokio::test]
    async fn it_creates_topic_lazily() {
        let manager = WebSocketManager::new();
        let topic = "lazy-create";
        assert!(manager.inner.read().await.get(topic).is_none());
        let _ = manager.subscribe(topic).await;
        assert!(manager.inner.read().await.get(topic).is_some());
    }

    #[tokio::test]
    async fn broadcast_to_empty_topic_does_not_panic() {
        let manager = WebSocketManager::new();
        manager.broadcast("no-subscribers", "silent").await;
    }

    #[tokio::test]
    async fn topic_is_removed_after_broadcast_if_no_subscribers() {
        let manager = WebSocketManager::new();
        let topic = "ephemeral-topic";
        {
            let _ = manager.subscribe(topic).await;
        } // drop receiver
        manager.broadcast(topic, "cleanup").await;
        let map = manager.inner.read().await;
        assert!(!map.contains_key(topic));
    }

    #[tokio::test]
    async fn send_to_user_reaches_only_that_users_channels() {
        let manager = WebSocketManager::new();
        let mut alice_a = manager.subscribe(&topics::user_topic("alice")).await;
        let mut alice_b = manager.subscribe(&topics::user_topic("alice")).await;
        let mut bob = manager.subscribe(&topics::user_topic("bob")).await;

        manager.send_to_user("alice", "direct").await;

        assert_eq!(
            timeout(Duration::from_millis(50), alice_a.recv())
                .await
                .unwrap()
                .unwrap(),
            "direct"
        );
        assert_eq!(
            timeout(Duration::from_millis(50), alice_b.recv())
                .await
                .unwrap()
                .unwrap(),
            "direct"
        );
        assert!(timeout(Duration::from_millis(50), bob.recv()).await.is_err());
    }

    #[tokio::test]
    async fn broadcast_all_reaches_events_subscribers() {
        let manager = WebSocketManager::new();
        let mut rx = manager.subscribe(topics::EVENTS_TOPIC).await;
        manager.broadcast_all("everyone").await;
        assert_eq!(
            timeout(Duration::from_millis(50), rx.recv())
                .await
                .unwrap()
                .unwrap(),
            "everyone"
        );
    }

    #[tokio::test]
    async fn presence_register_unregister_and_query() {
        let m = WebSocketManager::new();
        let topic = "p";
        assert!(!m.is_user_present_on(topic, "u7").await);
        m.register(topic, "u7").await;
        assert!(m.is_user_present_on(topic, "u7").await);
        m.register(topic, "u7").await; // refcount 2 (second device)
        m.unregister(topic, "u7").await; // refcount 1
        assert!(m.is_user_present_on(topic, "u7").await);
        m.unregister(topic, "u7").await; // refcount 0
        assert!(!m.is_user_present_on(topic, "u7").await);
    }
}
