//! PluginEntry - a registered plugin's runtime record

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};

use hearth_plugin_api::{
    Host, Plugin, PluginContext, PluginInfo, PluginManifest, PluginState,
};

/// A registered plugin: its manifest, lifecycle flags, filesystem root,
/// and the instance itself.
///
/// Exclusively owned by the host's registry, keyed by manifest `name`.
/// The manifest sits behind a lock because option values mutate at
/// runtime; the flags are atomics because the host and the Host API
/// facade read them from different tasks.
pub struct PluginEntry {
    name: String,
    manifest: RwLock<PluginManifest>,
    loaded: AtomicBool,
    started: AtomicBool,
    root: PathBuf,
    instance: Mutex<Box<dyn Plugin>>,
}

impl PluginEntry {
    pub(crate) fn new(manifest: PluginManifest, root: PathBuf, instance: Box<dyn Plugin>) -> Self {
        Self {
            name: manifest.name.clone(),
            manifest: RwLock::new(manifest),
            loaded: AtomicBool::new(false),
            started: AtomicBool::new(false),
            root,
            instance: Mutex::new(instance),
        }
    }

    /// Manifest `name` (stable id)
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The plugin's directory (holds `plugin.toml`)
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Snapshot of the current manifest
    pub fn manifest(&self) -> PluginManifest {
        self.manifest
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Mutate the manifest under its write lock
    pub(crate) fn with_manifest_mut<R>(&self, f: impl FnOnce(&mut PluginManifest) -> R) -> R {
        let mut manifest = self
            .manifest
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        f(&mut manifest)
    }

    /// Lock the plugin instance for a lifecycle call
    pub(crate) fn instance(&self) -> MutexGuard<'_, Box<dyn Plugin>> {
        self.instance.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded.load(Ordering::SeqCst)
    }

    pub fn is_started(&self) -> bool {
        self.started.load(Ordering::SeqCst)
    }

    pub(crate) fn set_loaded(&self, value: bool) {
        self.loaded.store(value, Ordering::SeqCst);
    }

    pub(crate) fn set_started(&self, value: bool) {
        self.started.store(value, Ordering::SeqCst);
    }

    /// Current lifecycle state, derived from the flags
    pub fn state(&self) -> PluginState {
        if self.is_started() {
            PluginState::Started
        } else if self.is_loaded() {
            PluginState::Loaded
        } else {
            PluginState::Discovered
        }
    }

    /// Snapshot for host-side reporting
    pub fn info(&self) -> PluginInfo {
        PluginInfo {
            name: self.name.clone(),
            manifest: self.manifest(),
            state: self.state(),
        }
    }

    /// Build a context for a lifecycle call on this plugin
    pub(crate) fn context(&self, host: Arc<dyn Host>) -> PluginContext {
        PluginContext::new(self.manifest(), self.root.clone(), host)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hearth_plugin_api::PluginError;

    struct Noop;

    impl Plugin for Noop {
        fn on_load(&mut self, _ctx: &PluginContext) -> Result<(), PluginError> {
            Ok(())
        }

        fn start(&mut self, _ctx: &PluginContext) -> Result<(), PluginError> {
            Ok(())
        }
    }

    fn manifest(name: &str) -> PluginManifest {
        PluginManifest::from_toml(&format!(
            r#"
            name = "{name}"
            visual-name = "{name}"
            version = 1
            loader-version = "1.0"
            "#
        ))
        .unwrap()
    }

    #[test]
    fn test_entry_starts_unloaded() {
        let entry = PluginEntry::new(manifest("a"), PathBuf::from("/tmp/a"), Box::new(Noop));
        assert!(!entry.is_loaded());
        assert!(!entry.is_started());
        assert_eq!(entry.state(), PluginState::Discovered);
    }

    #[test]
    fn test_entry_state_follows_flags() {
        let entry = PluginEntry::new(manifest("a"), PathBuf::from("/tmp/a"), Box::new(Noop));

        entry.set_loaded(true);
        assert_eq!(entry.state(), PluginState::Loaded);

        entry.set_started(true);
        assert_eq!(entry.state(), PluginState::Started);
    }

    #[test]
    fn test_entry_info_snapshot() {
        let entry = PluginEntry::new(manifest("clock"), PathBuf::from("/tmp/clock"), Box::new(Noop));
        let info = entry.info();
        assert_eq!(info.name, "clock");
        assert_eq!(info.manifest.visual_name, "clock");
        assert_eq!(info.state, PluginState::Discovered);
    }

    #[test]
    fn test_manifest_mutation_is_visible_in_snapshot() {
        let entry = PluginEntry::new(manifest("a"), PathBuf::from("/tmp/a"), Box::new(Noop));
        entry.with_manifest_mut(|m| m.visual_name = "Renamed".to_string());
        assert_eq!(entry.manifest().visual_name, "Renamed");
    }
}
