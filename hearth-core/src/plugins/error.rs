//! Plugin host error types

use thiserror::Error;

/// Errors that can occur while loading, starting, or removing plugins.
///
/// None of these are fatal to the host: every one is handled at the
/// operation that produced it, logged, and the offending plugin is simply
/// not loaded (or is removed). The system degrades to "fewer plugins
/// active" rather than terminating.
#[derive(Error, Debug)]
pub enum PluginHostError {
    /// Manifest missing or malformed
    #[error("Invalid manifest: {0}")]
    ConfigInvalid(String),

    /// Plugin is disabled in its manifest
    #[error("Plugin is disabled")]
    Disabled,

    /// Plugin's loader version is not in the host's supported set
    #[error("Incompatible loader version (host: {host}, plugin: {plugin})")]
    IncompatibleVersion { host: String, plugin: String },

    /// A plugin with the same manifest name is already registered
    #[error("Plugin '{name}' is already loaded")]
    DuplicatePlugin { name: String },

    /// A dependency is absent from the discovered set
    #[error("Missing dependency '{dependency}'")]
    MissingDependency { dependency: String },

    /// A dependency exists but its version is below the required minimum
    #[error("Dependency '{dependency}' is outdated (found {found}, requires >= {required})")]
    OutdatedDependency {
        dependency: String,
        found: u32,
        required: u32,
    },

    /// No factory registered under the plugin's manifest name
    #[error("No factory registered for plugin '{name}'")]
    UnknownFactory { name: String },

    /// Exception during instantiation or `on_load`
    #[error("Plugin failed to load: {0}")]
    LoadFailure(String),

    /// Plugin not found in the registry
    #[error("Plugin '{name}' not found")]
    NotFound { name: String },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
