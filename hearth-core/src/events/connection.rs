//! Connection - one subscriber's binding to a topic

use std::sync::Weak;
use std::sync::atomic::{AtomicBool, Ordering};

use hearth_plugin_api::{EventCallback, Subscription};

use super::topic::Topic;

/// Internal per-subscriber record, owned by the topic's subscriber list
pub(crate) struct ConnectionInner {
    pub(crate) callback: EventCallback,
    pub(crate) paused: AtomicBool,
    /// Auto-disconnect after the first delivery is dispatched
    pub(crate) once: bool,
    /// Internal connections (the auto-destroy hook) do not count as real
    /// subscribers
    pub(crate) internal: bool,
}

impl ConnectionInner {
    pub(crate) fn new(callback: EventCallback, once: bool, internal: bool) -> Self {
        Self {
            callback,
            paused: AtomicBool::new(false),
            once,
            internal,
        }
    }
}

/// Handle a subscriber holds to its binding.
///
/// The topic owns the binding; this handle only pauses delivery or requests
/// disconnection. Dropping the handle leaves the binding connected.
pub struct Connection {
    pub(crate) inner: std::sync::Arc<ConnectionInner>,
    pub(crate) topic: Weak<Topic>,
}

impl Connection {
    /// Name of the topic this connection is bound to, if it still exists
    pub fn topic_name(&self) -> Option<String> {
        self.topic.upgrade().map(|t| t.name().to_string())
    }
}

impl Subscription for Connection {
    fn disconnect(&self) {
        if let Some(topic) = self.topic.upgrade() {
            topic.disconnect(&self.inner);
        }
    }

    fn pause(&self) {
        self.inner.paused.store(true, Ordering::SeqCst);
    }

    fn resume(&self) {
        self.inner.paused.store(false, Ordering::SeqCst);
    }

    fn is_paused(&self) -> bool {
        self.inner.paused.load(Ordering::SeqCst)
    }
}
