//! HostApi - the Host API facade handed to plugins
//!
//! Mediates plugin access to the registry (lookup, typed option mutation
//! with change notification) and wraps the event bus in the auto-destroying
//! topic pattern: every topic created through this facade self-registers an
//! internal once-hook that tears the topic down and drops it from the
//! facade's registry when the last real subscriber is gone.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use hearth_plugin_api::{
    EventCallback, EventPayload, Host, OptionValue, PluginError, PluginInfo, Subscription,
};

use crate::events::{Connection, EventBus, Topic};

use super::SharedRegistry;

/// Lifecycle topic fired with the removed plugin's manifest name
pub const ON_PLUGIN_REMOVE: &str = "OnPluginRemove";

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Concrete [`Host`] implementation, shared between the plugin host and
/// every plugin context.
pub struct HostApi {
    registry: SharedRegistry,
    bus: Arc<EventBus>,
    /// Facade-managed (auto-destroying) topics
    topics: Mutex<HashMap<String, Arc<Topic>>>,
    self_ref: Weak<HostApi>,
}

impl HostApi {
    /// Build the facade and subscribe its lifecycle hook to
    /// [`ON_PLUGIN_REMOVE`].
    ///
    /// Must be called from within a tokio runtime.
    pub(crate) fn new(registry: SharedRegistry, bus: Arc<EventBus>) -> Arc<Self> {
        let api = Arc::new_cyclic(|weak| Self {
            registry,
            bus,
            topics: Mutex::new(HashMap::new()),
            self_ref: weak.clone(),
        });

        // Cross-cutting cleanup hook point; permanent connection, so the
        // lifecycle topic never hits zero subscribers.
        let hook: EventCallback = Arc::new(move |payload| {
            if let Some(name) = payload.as_str() {
                tracing::debug!(plugin = %name, "observed plugin removal");
            }
        });
        if let Err(e) = api.bus.topic(ON_PLUGIN_REMOVE).connect(hook, false) {
            tracing::warn!(error = %e, "could not subscribe lifecycle hook");
        }

        api
    }

    /// Get or create a facade-managed topic, attaching the auto-destroy
    /// hook on creation. A topic whose delivery loop already exited is
    /// dropped and recreated.
    fn ensure_topic(&self, name: &str) -> Arc<Topic> {
        let mut topics = lock(&self.topics);

        if let Some(existing) = topics.get(name) {
            if existing.is_listening() {
                return Arc::clone(existing);
            }
            topics.remove(name);
        }

        let topic = self.bus.topic(name);

        let weak = self.self_ref.clone();
        let topic_name = name.to_string();
        let hook: EventCallback = Arc::new(move |_payload| {
            if let Some(api) = weak.upgrade() {
                api.destroy_if_abandoned(&topic_name);
            }
        });
        if let Err(e) = topic.connect_internal(hook, true) {
            tracing::warn!(topic = %name, error = %e, "could not attach auto-destroy hook");
        }

        topics.insert(name.to_string(), Arc::clone(&topic));
        topic
    }

    /// Destroy and unregister the named topic if it has no real
    /// subscribers left
    fn destroy_if_abandoned(&self, name: &str) {
        let mut topics = lock(&self.topics);
        if let Some(topic) = topics.get(name) {
            if topic.subscriber_count() == 0 {
                topic.destroy();
                topics.remove(name);
                tracing::debug!(topic = %name, "auto-destroyed abandoned topic");
            }
        }
    }

    /// Whether the facade currently manages the named topic
    pub fn has_topic(&self, name: &str) -> bool {
        lock(&self.topics).contains_key(name)
    }
}

impl Host for HostApi {
    fn plugin_info(&self, name: &str) -> Option<PluginInfo> {
        self.registry
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .map(|entry| entry.info())
    }

    fn connect_event(
        &self,
        name: &str,
        callback: EventCallback,
        once: bool,
    ) -> Result<Box<dyn Subscription>, PluginError> {
        let topic = self.ensure_topic(name);
        let conn = topic.connect(callback, once)?;

        Ok(Box::new(ManagedSubscription {
            conn,
            api: self.self_ref.clone(),
            topic: name.to_string(),
        }))
    }

    fn fire_event(&self, name: &str, payload: EventPayload) {
        // Firing an unknown name degenerates to create -> deliver to the
        // auto-destroy hook -> self-destroy: observably a no-op.
        let topic = self.ensure_topic(name);
        topic.fire(payload);
    }

    fn change_plugin_option(
        &self,
        plugin: &str,
        option: &str,
        value: OptionValue,
    ) -> Result<(), PluginError> {
        let entry = self
            .registry
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(plugin)
            .cloned()
            .ok_or_else(|| PluginError::custom(format!("Plugin '{plugin}' not found")))?;

        let changed = entry.with_manifest_mut(|manifest| {
            let spec = manifest
                .options
                .get_mut(option)
                .ok_or_else(|| PluginError::UnknownOption(option.to_string()))?;

            match (&spec.value, &value) {
                (OptionValue::Bool(_), OptionValue::Bool(_)) => {}
                (OptionValue::Select(_), OptionValue::Select(choice)) => {
                    if !spec.select_options.contains(choice) {
                        return Err(PluginError::InvalidOptionValue {
                            option: option.to_string(),
                            reason: format!("'{choice}' is not an allowed choice"),
                        });
                    }
                }
                _ => {
                    return Err(PluginError::InvalidOptionValue {
                        option: option.to_string(),
                        reason: "value type does not match the option type".to_string(),
                    });
                }
            }

            if spec.value == value {
                return Ok(false);
            }
            spec.value = value.clone();
            Ok(true)
        })?;

        // A no-op write must not trigger notification
        if changed {
            let Some(host) = self.self_ref.upgrade() else {
                return Ok(());
            };
            let ctx = entry.context(host);
            entry.instance().options_changed(option, &value, &ctx);
            tracing::debug!(
                plugin = %entry.manifest().visual_name,
                option = %option,
                "plugin option changed"
            );
        }

        Ok(())
    }
}

/// Facade subscription: disconnect additionally prunes the topic from the
/// facade registry once the last real subscriber is gone.
struct ManagedSubscription {
    conn: Connection,
    api: Weak<HostApi>,
    topic: String,
}

impl Subscription for ManagedSubscription {
    fn disconnect(&self) {
        self.conn.disconnect();
        if let Some(api) = self.api.upgrade() {
            api.destroy_if_abandoned(&self.topic);
        }
    }

    fn pause(&self) {
        self.conn.pause();
    }

    fn resume(&self) {
        self.conn.resume();
    }

    fn is_paused(&self) -> bool {
        self.conn.is_paused()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::RwLock;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn empty_registry() -> SharedRegistry {
        Arc::new(RwLock::new(HashMap::new()))
    }

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
    async fn connect_then_fire_delivers() {
        let bus = Arc::new(EventBus::new());
        let api = HostApi::new(empty_registry(), bus);

        let (hits, callback) = counter();
        let _sub = api.connect_event("greetings", callback, false).unwrap();

        api.fire_event("greetings", serde_json::json!("hello"));
        settle().await;

        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert!(api.has_topic("greetings"));
    }

    #[tokio::test]
    async fn fire_with_no_subscribers_auto_destroys_topic() {
        let bus = Arc::new(EventBus::new());
        let api = HostApi::new(empty_registry(), bus);

        api.fire_event("ephemeral", serde_json::json!(1));
        settle().await;

        // Auto-destroy hook fired once and removed the topic
        assert!(!api.has_topic("ephemeral"));
    }

    #[tokio::test]
    async fn last_disconnect_removes_topic_from_registry() {
        let bus = Arc::new(EventBus::new());
        let api = HostApi::new(empty_registry(), bus);

        let (_hits, callback) = counter();
        let sub = api.connect_event("short-lived", callback, false).unwrap();
        assert!(api.has_topic("short-lived"));

        sub.disconnect();
        settle().await;

        assert!(!api.has_topic("short-lived"));
    }

    #[tokio::test]
    async fn topic_survives_while_real_subscriber_remains() {
        let bus = Arc::new(EventBus::new());
        let api = HostApi::new(empty_registry(), bus);

        let (hits, callback) = counter();
        let _keep = api.connect_event("durable", callback, false).unwrap();

        // An unrelated once-subscriber coming and going must not tear the
        // topic down under the remaining subscriber
        let (_h2, other) = counter();
        let _once = api.connect_event("durable", other, true).unwrap();

        api.fire_event("durable", serde_json::json!(1));
        settle().await;
        api.fire_event("durable", serde_json::json!(2));
        settle().await;

        assert!(api.has_topic("durable"));
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn plugin_info_unknown_name_is_none() {
        let bus = Arc::new(EventBus::new());
        let api = HostApi::new(empty_registry(), bus);
        assert!(api.plugin_info("nobody").is_none());
    }

    #[tokio::test]
    async fn change_option_on_unknown_plugin_errors() {
        let bus = Arc::new(EventBus::new());
        let api = HostApi::new(empty_registry(), bus);

        let result = api.change_plugin_option("ghost", "flag", OptionValue::Bool(true));
        assert!(result.is_err());
    }
}
