//! EventBus - the shared pub/sub substrate
//!
//! One explicitly constructed bus instance is handed to every component
//! that needs it; there is no ambient global. The bus owns the backing
//! store for every topic (payload slot + notify flag live inside the
//! [`Topic`]) and a single closing signal that every delivery loop
//! observes at shutdown.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio_util::sync::CancellationToken;

use hearth_plugin_api::EventPayload;

use super::topic::Topic;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// The pub/sub substrate: a registry of named topics plus the bus-wide
/// closing signal.
///
/// Construct once at bootstrap, share via `Arc`, and call
/// [`shutdown`](EventBus::shutdown) exactly once on the way out.
pub struct EventBus {
    topics: Mutex<HashMap<String, Arc<Topic>>>,
    closing: CancellationToken,
}

impl EventBus {
    /// Open a new, empty bus
    pub fn new() -> Self {
        Self {
            topics: Mutex::new(HashMap::new()),
            closing: CancellationToken::new(),
        }
    }

    /// Idempotently get or create the backing store for `name`.
    ///
    /// Calling this for an existing name attaches to the existing topic;
    /// its delivery loop is restarted if it had exited.
    ///
    /// Must be called from within a tokio runtime.
    pub fn topic(&self, name: &str) -> Arc<Topic> {
        let mut topics = lock(&self.topics);
        if let Some(topic) = topics.get(name) {
            topic.ensure_listening();
            return Arc::clone(topic);
        }

        let topic = Topic::create(name, self.closing.child_token());
        topics.insert(name.to_string(), Arc::clone(&topic));
        tracing::debug!(topic = %name, "topic created");
        topic
    }

    /// Fire a topic by name, if its backing store exists. Best-effort:
    /// unknown names are a no-op, not an error.
    pub fn fire(&self, name: &str, payload: EventPayload) {
        let topic = lock(&self.topics).get(name).cloned();
        if let Some(topic) = topic {
            topic.fire(payload);
        }
    }

    /// Whether the named backing store exists
    pub fn has_topic(&self, name: &str) -> bool {
        lock(&self.topics).contains_key(name)
    }

    /// Whether the bus has been shut down
    pub fn is_closing(&self) -> bool {
        self.closing.is_cancelled()
    }

    /// Flip the closing signal and pulse every topic once, so delivery
    /// loops blocked on their notify flag wake up, observe closing, and
    /// exit instead of re-blocking.
    pub fn shutdown(&self) {
        if self.closing.is_cancelled() {
            return;
        }
        self.closing.cancel();
        for topic in lock(&self.topics).values() {
            topic.pulse();
        }
        tracing::info!("event bus shut down");
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hearth_plugin_api::{EventCallback, PluginError, Subscription};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn counter() -> (Arc<AtomicUsize>, EventCallback) {
        let hits = Arc::new(AtomicUsize::new(0));
        let hits2 = Arc::clone(&hits);
        let callback: EventCallback = Arc::new(move |_payload| {
            hits2.fetch_add(1, Ordering::SeqCst);
        });
        (hits, callback)
    }

    async fn settle() {
        tokio::time::sleep(Duration::from_millis(50)).await;
    }

    #[tokio::test]
    async fn topic_is_idempotent() {
        let bus = EventBus::new();
        let a = bus.topic("alpha");
        let b = bus.topic("alpha");
        assert!(Arc::ptr_eq(&a, &b));
        assert!(bus.has_topic("alpha"));
    }

    #[tokio::test]
    async fn fire_by_name_reaches_subscribers() {
        let bus = EventBus::new();
        let topic = bus.topic("alpha");
        let (hits, callback) = counter();
        let _conn = topic.connect(callback, false).unwrap();

        bus.fire("alpha", serde_json::json!("payload"));
        settle().await;

        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn fire_unknown_topic_is_a_no_op() {
        let bus = EventBus::new();
        bus.fire("nobody-home", serde_json::json!(1));
        assert!(!bus.has_topic("nobody-home"));
    }

    #[tokio::test]
    async fn topic_reattaches_after_unlisten() {
        let bus = EventBus::new();
        let topic = bus.topic("alpha");
        let (_h, cb) = counter();
        let conn = topic.connect(cb, false).unwrap();
        conn.disconnect();
        settle().await;
        assert!(!topic.is_listening());

        // Re-requesting the topic restarts its delivery loop
        let again = bus.topic("alpha");
        assert!(Arc::ptr_eq(&topic, &again));
        settle().await;
        assert!(again.is_listening());
    }

    #[tokio::test]
    async fn shutdown_rejects_new_connections_and_stops_delivery() {
        let bus = EventBus::new();
        let topic = bus.topic("alpha");
        let (hits, callback) = counter();
        let _conn = topic.connect(callback, false).unwrap();

        bus.shutdown();
        settle().await;
        assert!(bus.is_closing());

        let (_h, late) = counter();
        assert!(matches!(
            topic.connect(late, false),
            Err(PluginError::EventBusClosed)
        ));

        bus.fire("alpha", serde_json::json!(1));
        settle().await;
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn shutdown_is_idempotent() {
        let bus = EventBus::new();
        let _topic = bus.topic("alpha");
        bus.shutdown();
        bus.shutdown();
        assert!(bus.is_closing());
    }
}
