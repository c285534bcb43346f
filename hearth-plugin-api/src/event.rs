//! Event bus types shared between the host and plugins

use std::sync::Arc;

/// Payload delivered to subscribers: the last-fired arguments, as JSON
pub type EventPayload = serde_json::Value;

/// A subscriber callback.
///
/// Each delivery runs on its own task, so callbacks must be `Send + Sync`
/// and should not assume any ordering relative to other subscribers.
pub type EventCallback = Arc<dyn Fn(EventPayload) + Send + Sync>;

/// Handle to one subscriber's binding on a topic.
///
/// The topic owns the binding; the subscriber holds this handle only to
/// pause delivery or request disconnection. Dropping the handle does NOT
/// disconnect; call [`disconnect`](Subscription::disconnect).
pub trait Subscription: Send + Sync {
    /// Remove this binding from its topic. Idempotent.
    fn disconnect(&self);

    /// Skip deliveries until [`resume`](Subscription::resume) is called
    fn pause(&self);

    /// Resume deliveries after [`pause`](Subscription::pause)
    fn resume(&self);

    /// Whether deliveries are currently being skipped
    fn is_paused(&self) -> bool;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subscription_trait_is_object_safe() {
        // This compiles only if Subscription is object-safe
        fn _takes_boxed(_: Box<dyn Subscription>) {}
    }

    #[test]
    fn test_callback_is_invocable_through_clone() {
        let hits = Arc::new(std::sync::atomic::AtomicUsize::new(0));
        let hits2 = Arc::clone(&hits);
        let cb: EventCallback = Arc::new(move |_payload| {
            hits2.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        });

        let cb2 = Arc::clone(&cb);
        cb(serde_json::json!({"a": 1}));
        cb2(serde_json::json!(null));

        assert_eq!(hits.load(std::sync::atomic::Ordering::SeqCst), 2);
    }
}
