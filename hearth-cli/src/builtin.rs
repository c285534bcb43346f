//! Built-in plugins compiled into the hearth binary.
//!
//! Factories for these are registered on every host the CLI builds; a
//! plugin only activates when a matching manifest directory exists under
//! the plugin root.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use hearth_core::PluginHost;
use hearth_plugin_api::{
    OptionValue, Plugin, PluginContext, PluginError, Subscription,
};

/// Topic fired by the heartbeat plugin on every tick
pub const HEARTBEAT_TOPIC: &str = "Heartbeat";

/// Demo plugin firing a `Heartbeat` event once a second.
///
/// The `chime` bool option gates whether ticks also log at info level.
#[derive(Default)]
pub struct HeartbeatPlugin {
    stop: Arc<AtomicBool>,
    chime: Arc<AtomicBool>,
}

impl Plugin for HeartbeatPlugin {
    fn on_load(&mut self, ctx: &PluginContext) -> Result<(), PluginError> {
        if let Some(spec) = ctx.manifest().options.get("chime") {
            if let OptionValue::Bool(value) = spec.value {
                self.chime.store(value, Ordering::SeqCst);
            }
        }
        ctx.log_info("heartbeat ready");
        Ok(())
    }

    fn start(&mut self, ctx: &PluginContext) -> Result<(), PluginError> {
        let host = Arc::clone(ctx.host());
        let name = ctx.plugin_name().to_string();
        let stop = Arc::clone(&self.stop);
        let chime = Arc::clone(&self.chime);

        // Tick on a dedicated thread so start can return immediately
        std::thread::spawn(move || {
            let mut beat: u64 = 0;
            while !stop.load(Ordering::SeqCst) {
                std::thread::sleep(Duration::from_secs(1));
                beat += 1;
                host.fire_event(HEARTBEAT_TOPIC, serde_json::json!({ "beat": beat }));
                if chime.load(Ordering::SeqCst) {
                    tracing::info!(plugin = %name, beat, "heartbeat");
                }
            }
        });

        Ok(())
    }

    fn options_changed(&mut self, option: &str, value: &OptionValue, _ctx: &PluginContext) {
        if option == "chime" {
            if let OptionValue::Bool(on) = value {
                self.chime.store(*on, Ordering::SeqCst);
            }
        }
    }

    fn clean_up(&mut self) {
        self.stop.store(true, Ordering::SeqCst);
    }
}

/// Demo plugin that logs every heartbeat it observes
#[derive(Default)]
pub struct HeartbeatListenerPlugin {
    subscription: Option<Box<dyn Subscription>>,
}

impl Plugin for HeartbeatListenerPlugin {
    fn on_load(&mut self, ctx: &PluginContext) -> Result<(), PluginError> {
        let name = ctx.plugin_name().to_string();
        let sub = ctx.connect_event(
            HEARTBEAT_TOPIC,
            Arc::new(move |payload| {
                tracing::info!(plugin = %name, %payload, "observed heartbeat");
            }),
            false,
        )?;
        self.subscription = Some(sub);
        Ok(())
    }

    fn start(&mut self, _ctx: &PluginContext) -> Result<(), PluginError> {
        Ok(())
    }

    fn clean_up(&mut self) {
        if let Some(sub) = self.subscription.take() {
            sub.disconnect();
        }
    }
}

/// Register factories for every built-in plugin
pub fn register_builtins(host: &mut PluginHost) {
    host.register_factory("heartbeat", Box::new(|| Box::new(HeartbeatPlugin::default())));
    host.register_factory(
        "heartbeat-listener",
        Box::new(|| Box::new(HeartbeatListenerPlugin::default())),
    );
}
