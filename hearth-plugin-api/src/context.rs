//! PluginContext - a plugin's interface to the hearth host

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::PluginError;
use crate::event::{EventCallback, EventPayload, Subscription};
use crate::types::{OptionValue, PluginInfo, PluginManifest};

/// The Host API surface exposed to plugins.
///
/// The concrete implementation lives in hearth-core; plugins only ever see
/// this trait, through their [`PluginContext`].
pub trait Host: Send + Sync {
    /// Look up a registered plugin by its manifest `name` (not visual name).
    ///
    /// Returns a snapshot of the plugin's manifest and lifecycle state.
    fn plugin_info(&self, name: &str) -> Option<PluginInfo>;

    /// Connect a callback to a named topic, creating the topic if needed.
    ///
    /// Topics created this way are self-cleaning: once the last real
    /// subscriber disconnects, the topic is torn down and removed.
    /// With `once = true` the subscription disconnects itself after its
    /// first delivery is dispatched.
    fn connect_event(
        &self,
        name: &str,
        callback: EventCallback,
        once: bool,
    ) -> Result<Box<dyn Subscription>, PluginError>;

    /// Fire a topic by name. Best-effort: firing a topic this facade does
    /// not know about is a no-op, not an error.
    fn fire_event(&self, name: &str, payload: EventPayload);

    /// Change a plugin option, validating the value against the option spec.
    ///
    /// The plugin's `options_changed` hook runs only if the stored value
    /// actually changed; a no-op write never notifies.
    fn change_plugin_option(
        &self,
        plugin: &str,
        option: &str,
        value: OptionValue,
    ) -> Result<(), PluginError>;
}

/// Passed to every plugin lifecycle hook.
///
/// Carries the plugin's identity, its filesystem root, a snapshot of its
/// manifest, and the [`Host`] facade for reaching the manager and the
/// event bus.
pub struct PluginContext {
    plugin_name: String,
    plugin_dir: PathBuf,
    manifest: PluginManifest,
    host: Arc<dyn Host>,
}

impl PluginContext {
    /// Create a new plugin context
    pub fn new(manifest: PluginManifest, plugin_dir: PathBuf, host: Arc<dyn Host>) -> Self {
        Self {
            plugin_name: manifest.name.clone(),
            plugin_dir,
            manifest,
            host,
        }
    }

    /// The plugin's manifest `name`
    pub fn plugin_name(&self) -> &str {
        &self.plugin_name
    }

    /// The plugin's filesystem root (the directory holding `plugin.toml`)
    pub fn plugin_dir(&self) -> &Path {
        &self.plugin_dir
    }

    /// Snapshot of the plugin's manifest taken at load time
    pub fn manifest(&self) -> &PluginManifest {
        &self.manifest
    }

    /// The host facade
    pub fn host(&self) -> &Arc<dyn Host> {
        &self.host
    }

    /// Convenience: connect a callback to a topic via the host
    pub fn connect_event(
        &self,
        name: &str,
        callback: EventCallback,
        once: bool,
    ) -> Result<Box<dyn Subscription>, PluginError> {
        self.host.connect_event(name, callback, once)
    }

    /// Convenience: fire a topic via the host
    pub fn fire_event(&self, name: &str, payload: EventPayload) {
        self.host.fire_event(name, payload);
    }

    /// Log an info message tagged with this plugin's name
    pub fn log_info(&self, message: &str) {
        tracing::info!(plugin = %self.plugin_name, "{message}");
    }

    /// Log a warning tagged with this plugin's name
    pub fn log_warn(&self, message: &str) {
        tracing::warn!(plugin = %self.plugin_name, "{message}");
    }

    /// Log an error tagged with this plugin's name
    pub fn log_error(&self, message: &str) {
        tracing::error!(plugin = %self.plugin_name, "{message}");
    }
}
