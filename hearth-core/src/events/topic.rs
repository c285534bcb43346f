//! Topic (bindable event) - a named channel with a single shared payload slot

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;

use hearth_plugin_api::{EventCallback, EventPayload, PluginError};

use super::connection::{Connection, ConnectionInner};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// A named pub/sub channel.
///
/// Holds the last-fired payload in a single shared slot and a live
/// subscriber list. A dedicated delivery-loop task blocks on the topic's
/// notify flag; every `fire` writes the slot and pulses the flag
/// (edge-triggered - a subscriber connecting between fires is not handed
/// the stale payload).
pub struct Topic {
    name: String,
    notify: Notify,
    slot: Mutex<Option<EventPayload>>,
    subscribers: Mutex<Vec<Arc<ConnectionInner>>>,
    listening: AtomicBool,
    closing: CancellationToken,
    /// Self-reference handed to connections and the delivery loop
    weak: Weak<Topic>,
}

impl Topic {
    /// Create a topic and start its delivery loop.
    ///
    /// Must be called from within a tokio runtime.
    pub(crate) fn create(name: impl Into<String>, closing: CancellationToken) -> Arc<Self> {
        let topic = Arc::new_cyclic(|weak| Self {
            name: name.into(),
            notify: Notify::new(),
            slot: Mutex::new(None),
            subscribers: Mutex::new(Vec::new()),
            listening: AtomicBool::new(false),
            closing,
            weak: weak.clone(),
        });
        topic.ensure_listening();
        topic
    }

    /// Topic name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the delivery loop is currently running
    pub fn is_listening(&self) -> bool {
        self.listening.load(Ordering::SeqCst)
    }

    /// Number of real subscribers (internal hooks excluded)
    pub fn subscriber_count(&self) -> usize {
        lock(&self.subscribers)
            .iter()
            .filter(|c| !c.internal)
            .count()
    }

    /// Bind a callback to this topic.
    ///
    /// Restarts the delivery loop if it exited (a topic whose loop stopped
    /// after its last subscriber disconnected is reusable). With
    /// `once = true` the connection disconnects itself after its first
    /// delivery is dispatched. Fails once the bus is shut down.
    pub fn connect(&self, callback: EventCallback, once: bool) -> Result<Connection, PluginError> {
        self.connect_inner(callback, once, false)
    }

    /// Bind an internal hook that does not count as a real subscriber
    pub(crate) fn connect_internal(
        &self,
        callback: EventCallback,
        once: bool,
    ) -> Result<Connection, PluginError> {
        self.connect_inner(callback, once, true)
    }

    fn connect_inner(
        &self,
        callback: EventCallback,
        once: bool,
        internal: bool,
    ) -> Result<Connection, PluginError> {
        if self.closing.is_cancelled() {
            return Err(PluginError::EventBusClosed);
        }

        self.ensure_listening();

        let inner = Arc::new(ConnectionInner::new(callback, once, internal));
        lock(&self.subscribers).push(Arc::clone(&inner));

        Ok(Connection {
            inner,
            topic: self.weak.clone(),
        })
    }

    /// Write the payload slot and pulse the delivery loop.
    ///
    /// Fire-and-forget: returns before any subscriber runs. Two rapid fires
    /// may coalesce into one delivery cycle observing the later payload;
    /// this mirrors the slot-overwrite semantics of a set-then-clear flag.
    /// A fire while the delivery loop is stopped is lost, not latched: the
    /// pulse is skipped so a loop restarted by a later connect does not
    /// replay the pre-connect payload.
    pub fn fire(&self, payload: EventPayload) {
        *lock(&self.slot) = Some(payload);
        if self.listening.load(Ordering::SeqCst) {
            self.notify.notify_one();
        }
    }

    /// Deliver the last-stored payload to a snapshot of the subscriber list.
    ///
    /// Each delivery runs on its own task: no ordering between subscribers,
    /// and a slow callback does not block the next fire.
    fn execute_listeners(&self) {
        let payload = match lock(&self.slot).clone() {
            Some(payload) => payload,
            None => return,
        };

        let snapshot: Vec<_> = lock(&self.subscribers).clone();
        for conn in snapshot {
            if conn.paused.load(Ordering::SeqCst) {
                continue;
            }

            let callback = Arc::clone(&conn.callback);
            let args = payload.clone();
            tokio::spawn(async move {
                callback(args);
            });

            // Once-connections leave at dispatch time, not completion time
            if conn.once {
                self.disconnect(&conn);
            }
        }
    }

    /// Remove a connection; the last real departure unlists the topic
    pub(crate) fn disconnect(&self, inner: &Arc<ConnectionInner>) {
        let mut subscribers = lock(&self.subscribers);
        let before = subscribers.len();
        subscribers.retain(|c| !Arc::ptr_eq(c, inner));
        let now_empty = subscribers.is_empty();
        drop(subscribers);

        if now_empty && before > 0 {
            self.unlisten();
        }
    }

    /// Tell the delivery loop to stop and wake it so it can exit
    pub(crate) fn unlisten(&self) {
        self.listening.store(false, Ordering::SeqCst);
        self.notify.notify_one();
    }

    /// Force-stop: unlisten, drop all subscribers, clear the payload slot
    pub fn destroy(&self) {
        self.unlisten();
        lock(&self.subscribers).clear();
        *lock(&self.slot) = None;
    }

    /// Pulse the notify flag once; used at shutdown so a blocked loop wakes
    /// up, observes closing, and exits instead of re-blocking
    pub(crate) fn pulse(&self) {
        self.notify.notify_one();
    }

    /// Start the delivery loop if it is not already running
    pub(crate) fn ensure_listening(&self) {
        if self.closing.is_cancelled() {
            return;
        }
        if self.listening.swap(true, Ordering::SeqCst) {
            return;
        }

        let Some(topic) = self.weak.upgrade() else {
            return;
        };
        tokio::spawn(async move {
            topic.listen_loop().await;
            tracing::trace!(topic = %topic.name, "delivery loop stopped");
        });
    }

    async fn listen_loop(&self) {
        loop {
            tokio::select! {
                _ = self.closing.cancelled() => break,
                _ = self.notify.notified() => {
                    if self.closing.is_cancelled() || !self.listening.load(Ordering::SeqCst) {
                        break;
                    }
                    self.execute_listeners();
                }
            }
            if !self.listening.load(Ordering::SeqCst) {
                break;
            }
        }
        self.listening.store(false, Ordering::SeqCst);
    }
}
