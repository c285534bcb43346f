//! PluginHost - manages plugin lifecycle: discovery, dependency
//! resolution, load, start, and health-check-driven removal

use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::path::PathBuf;
use std::sync::{Arc, PoisonError, RwLock};

use hearth_plugin_api::{Host, ManagerManifest, PluginFactory, PluginInfo};

use crate::events::EventBus;

use super::api::{HostApi, ON_PLUGIN_REMOVE};
use super::discover::{DiscoveredPlugin, ManifestIndex, discover};
use super::entry::PluginEntry;
use super::error::PluginHostError;
use super::SharedRegistry;

/// Configuration for [`PluginHost`]
pub struct PluginHostConfig {
    /// Root directory walked during discovery
    pub plugin_root: PathBuf,
    /// Manager manifest: declared API version and the loader versions
    /// accepted from plugins
    pub manager: ManagerManifest,
}

impl Default for PluginHostConfig {
    fn default() -> Self {
        Self {
            plugin_root: hearth_paths::plugins_dir(),
            manager: ManagerManifest::default(),
        }
    }
}

/// The plugin lifecycle manager.
///
/// Drives every plugin through
/// `Discovered -> DependencyChecked -> Loaded -> Started`, with a
/// back-edge to removal whenever a later dependency re-check fails. All
/// rejections are local: one broken plugin never prevents others from
/// loading, and nothing here terminates the host.
pub struct PluginHost {
    registry: SharedRegistry,
    factories: HashMap<String, PluginFactory>,
    manager: ManagerManifest,
    plugin_root: PathBuf,
    bus: Arc<EventBus>,
    api: Arc<HostApi>,
}

impl PluginHost {
    /// Create a plugin host sharing the given event bus.
    ///
    /// Must be called from within a tokio runtime (the Host API facade
    /// subscribes its lifecycle hook at construction).
    pub fn new(config: PluginHostConfig, bus: Arc<EventBus>) -> Self {
        let registry: SharedRegistry = Arc::new(RwLock::new(HashMap::new()));
        let api = HostApi::new(Arc::clone(&registry), Arc::clone(&bus));

        Self {
            registry,
            factories: HashMap::new(),
            manager: config.manager,
            plugin_root: config.plugin_root,
            bus,
            api,
        }
    }

    /// The Host API facade handed to every plugin
    pub fn api(&self) -> Arc<HostApi> {
        Arc::clone(&self.api)
    }

    /// Register a plugin constructor under its manifest `name`.
    ///
    /// Plugins whose manifests are discovered but have no registered
    /// factory are rejected at load time.
    pub fn register_factory(&mut self, name: impl Into<String>, factory: PluginFactory) {
        self.factories.insert(name.into(), factory);
    }

    /// Run a fresh discovery pass over the plugin root
    pub fn discover(&self) -> Vec<DiscoveredPlugin> {
        discover(&self.plugin_root)
    }

    /// Discover and load every plugin, independently - one plugin's
    /// rejection does not abort the pass.
    pub fn load_all(&self) {
        tracing::info!(root = %self.plugin_root.display(), "loading all plugins");

        let discovered = self.discover();
        let index = ManifestIndex::new(&discovered);

        for plugin in &discovered {
            match self.load_one(plugin, &index) {
                Ok(()) => {
                    tracing::info!(
                        plugin = %plugin.manifest.visual_name,
                        version = plugin.manifest.version,
                        "plugin loaded"
                    );
                }
                Err(e) => {
                    tracing::warn!(
                        plugin = %plugin.manifest.visual_name,
                        reason = %e,
                        "plugin was not loaded"
                    );
                }
            }
        }
    }

    /// Load a single discovered plugin.
    ///
    /// Rejections (disabled, incompatible loader version, duplicate name,
    /// unsatisfied dependency closure, failed construction or `on_load`)
    /// are returned for the caller to log; none are fatal.
    fn load_one(
        &self,
        plugin: &DiscoveredPlugin,
        index: &ManifestIndex,
    ) -> Result<(), PluginHostError> {
        let manifest = &plugin.manifest;

        if !manifest.enabled {
            return Err(PluginHostError::Disabled);
        }

        if !self.manager.supports(&manifest.loader_version) {
            return Err(PluginHostError::IncompatibleVersion {
                host: self.manager.version.clone(),
                plugin: manifest.loader_version.clone(),
            });
        }

        if self.read_registry().contains_key(&manifest.name) {
            return Err(PluginHostError::DuplicatePlugin {
                name: manifest.name.clone(),
            });
        }

        index.validate_closure(manifest)?;

        let factory =
            self.factories
                .get(&manifest.name)
                .ok_or_else(|| PluginHostError::UnknownFactory {
                    name: manifest.name.clone(),
                })?;

        let instance = factory();
        let entry = Arc::new(PluginEntry::new(
            manifest.clone(),
            plugin.root.clone(),
            instance,
        ));

        // init then on_load, with panic isolation: a plugin that panics
        // while loading is rejected, not registered
        let ctx = entry.context(self.api());
        let result = std::panic::catch_unwind(AssertUnwindSafe(|| {
            let mut instance = entry.instance();
            instance.init(&ctx)?;
            instance.on_load(&ctx)
        }));

        match result {
            Ok(Ok(())) => {}
            Ok(Err(e)) => return Err(PluginHostError::LoadFailure(e.to_string())),
            Err(_) => {
                return Err(PluginHostError::LoadFailure(
                    "plugin panicked during load".to_string(),
                ));
            }
        }

        entry.set_loaded(true);
        self.write_registry().insert(manifest.name.clone(), entry);
        Ok(())
    }

    /// Re-validate dependencies across the registered set, start every
    /// remaining plugin, then clean up anything left un-started.
    pub fn start_all(&self) {
        tracing::info!("starting plugins");
        self.revalidate_dependencies();

        for entry in self.snapshot() {
            self.start_one(&entry);
        }

        self.clean_plugins();
    }

    /// Dispatch a plugin's `start` on its own supervised task.
    ///
    /// `started` is set optimistically at dispatch; completion and failure
    /// are observed by the supervising task and logged.
    pub fn start_one(&self, entry: &Arc<PluginEntry>) {
        let visual = entry.manifest().visual_name;

        if entry.is_started() {
            tracing::warn!(plugin = %visual, "plugin not started: already started");
            return;
        }
        if !entry.is_loaded() {
            tracing::warn!(plugin = %visual, "plugin not started: not loaded");
            return;
        }

        entry.set_started(true);
        tracing::info!(plugin = %visual, "plugin started");

        let task_entry = Arc::clone(entry);
        let api: Arc<dyn Host> = self.api();
        let handle = tokio::task::spawn_blocking(move || {
            let ctx = task_entry.context(api);
            task_entry.instance().start(&ctx)
        });

        tokio::spawn(async move {
            match handle.await {
                Ok(Ok(())) => tracing::debug!(plugin = %visual, "plugin start completed"),
                Ok(Err(e)) => {
                    tracing::error!(plugin = %visual, error = %e, "plugin start failed");
                }
                Err(e) => {
                    tracing::error!(plugin = %visual, error = %e, "plugin start panicked");
                }
            }
        });
    }

    /// Remove a plugin: `on_remove` then `clean_up` synchronously on the
    /// caller's task, unregister, and fire [`ON_PLUGIN_REMOVE`] with the
    /// manifest name as payload.
    pub fn remove_plugin(&self, entry: &Arc<PluginEntry>) {
        let visual = entry.manifest().visual_name;

        let ctx = entry.context(self.api());
        let result = std::panic::catch_unwind(AssertUnwindSafe(|| {
            let mut instance = entry.instance();
            instance.on_remove(&ctx);
            instance.clean_up();
        }));
        if result.is_err() {
            tracing::error!(plugin = %visual, "plugin panicked during removal");
        }

        entry.set_loaded(false);
        entry.set_started(false);
        self.write_registry().remove(entry.name());

        self.bus
            .topic(ON_PLUGIN_REMOVE)
            .fire(serde_json::Value::String(entry.name().to_string()));

        tracing::info!(plugin = %visual, "plugin removed");
    }

    /// Re-run the fixed-point dependency check, then remove every plugin
    /// left un-loaded or un-started.
    pub fn clean_plugins(&self) {
        tracing::debug!("cleaning plugins");
        self.revalidate_dependencies();

        let stale: Vec<_> = self
            .snapshot()
            .into_iter()
            .filter(|entry| !entry.is_loaded() || !entry.is_started())
            .collect();

        for entry in stale {
            self.remove_plugin(&entry);
        }
    }

    /// Fixed-point dependency re-validation over the registered set.
    ///
    /// Scans all registered plugins for a dependency that is missing or
    /// below its required minimum; on the first violation removes the
    /// offending plugin and restarts the scan. Terminates when a full pass
    /// finds no violation - each removal shrinks the registry, so a finite
    /// registry always converges.
    fn revalidate_dependencies(&self) {
        'scan: loop {
            let mut entries = self.snapshot();
            entries.sort_by(|a, b| a.name().cmp(b.name()));

            for entry in &entries {
                let manifest = entry.manifest();
                for (dependency, required) in &manifest.dependencies {
                    let registered = self
                        .read_registry()
                        .get(dependency)
                        .map(|dep| dep.manifest().version);

                    let violation = match registered {
                        None => Some(PluginHostError::MissingDependency {
                            dependency: dependency.clone(),
                        }),
                        Some(found) if found < *required => {
                            Some(PluginHostError::OutdatedDependency {
                                dependency: dependency.clone(),
                                found,
                                required: *required,
                            })
                        }
                        Some(_) => None,
                    };

                    if let Some(reason) = violation {
                        tracing::warn!(
                            plugin = %manifest.visual_name,
                            reason = %reason,
                            "removing plugin failing dependency re-check"
                        );
                        self.remove_plugin(entry);
                        continue 'scan;
                    }
                }
            }

            break;
        }
    }

    /// Remove a registered plugin by manifest name
    pub fn remove_by_name(&self, name: &str) -> Result<(), PluginHostError> {
        let entry = self
            .get_plugin(name)
            .ok_or_else(|| PluginHostError::NotFound {
                name: name.to_string(),
            })?;
        self.remove_plugin(&entry);
        Ok(())
    }

    /// Registry lookup by manifest `name` (not visual name)
    pub fn get_plugin(&self, name: &str) -> Option<Arc<PluginEntry>> {
        self.read_registry().get(name).cloned()
    }

    /// Snapshot info for every registered plugin
    pub fn list_plugins(&self) -> Vec<PluginInfo> {
        let mut plugins: Vec<_> = self
            .read_registry()
            .values()
            .map(|entry| entry.info())
            .collect();
        plugins.sort_by(|a, b| a.name.cmp(&b.name));
        plugins
    }

    /// Number of registered plugins
    pub fn plugin_count(&self) -> usize {
        self.read_registry().len()
    }

    fn snapshot(&self) -> Vec<Arc<PluginEntry>> {
        self.read_registry().values().cloned().collect()
    }

    fn read_registry(
        &self,
    ) -> std::sync::RwLockReadGuard<'_, HashMap<String, Arc<PluginEntry>>> {
        self.registry.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_registry(
        &self,
    ) -> std::sync::RwLockWriteGuard<'_, HashMap<String, Arc<PluginEntry>>> {
        self.registry
            .write()
            .unwrap_or_else(PoisonError::into_inner)
    }
}
