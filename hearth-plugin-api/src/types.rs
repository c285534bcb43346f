//! Plugin manifest and metadata structures

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

use crate::error::PluginError;

/// Plugin manifest, loaded from `plugin.toml` in the plugin directory
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct PluginManifest {
    /// Stable plugin id, unique across all discovered manifests
    pub name: String,
    /// Human-readable display name
    pub visual_name: String,
    /// Ordinal plugin version, compared against dependency minimums
    pub version: u32,
    /// Disabled plugins are rejected at load time
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Loader version string, matched against the manager's supported set
    pub loader_version: String,
    /// Dependency name -> minimum required version
    #[serde(default)]
    pub dependencies: BTreeMap<String, u32>,
    /// Option name -> option spec
    #[serde(default)]
    pub options: BTreeMap<String, OptionSpec>,
}

fn default_enabled() -> bool {
    true
}

impl PluginManifest {
    /// Parse a manifest from TOML text
    pub fn from_toml(text: &str) -> Result<Self, PluginError> {
        toml::from_str(text).map_err(|e| PluginError::Config(e.to_string()))
    }

    /// Load a manifest from a `plugin.toml` file
    pub fn load(path: &std::path::Path) -> Result<Self, PluginError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml(&text)
    }
}

/// Manager manifest: the API version this host speaks and the loader
/// versions it accepts from plugins
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ManagerManifest {
    /// Declared host API version
    pub version: String,
    /// Loader version strings accepted from plugin manifests
    pub supported_versions: HashSet<String>,
}

impl Default for ManagerManifest {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            supported_versions: HashSet::from(["1.0".to_string()]),
        }
    }
}

impl ManagerManifest {
    /// Load a manager manifest from a `manager.toml` file
    pub fn load(path: &std::path::Path) -> Result<Self, PluginError> {
        let text = std::fs::read_to_string(path)?;
        toml::from_str(&text).map_err(|e| PluginError::Config(e.to_string()))
    }

    /// Check whether a plugin's loader version is accepted by this host
    pub fn supports(&self, loader_version: &str) -> bool {
        self.supported_versions.contains(loader_version)
    }
}

/// One declared plugin option
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub struct OptionSpec {
    /// Current value; its variant fixes the option type
    pub value: OptionValue,
    /// Allowed values for selector options; ignored for bool options
    #[serde(default)]
    pub select_options: Vec<String>,
}

impl OptionSpec {
    /// A bool option with the given initial value
    pub fn bool(value: bool) -> Self {
        Self {
            value: OptionValue::Bool(value),
            select_options: Vec::new(),
        }
    }

    /// A selector option with the given choices and initial selection
    pub fn selector(value: impl Into<String>, choices: Vec<String>) -> Self {
        Self {
            value: OptionValue::Select(value.into()),
            select_options: choices,
        }
    }
}

/// An option value: bool toggle or selector choice
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum OptionValue {
    /// Toggle option
    Bool(bool),
    /// One choice out of the declared `select_options`
    Select(String),
}

/// Lifecycle state of a registered plugin, for host-side reporting
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PluginState {
    /// Manifest read and validated, instance not yet constructed
    Discovered,
    /// `on_load` completed
    Loaded,
    /// `start` dispatched
    Started,
    /// Removed from the registry
    Removed,
}

/// Snapshot of a registered plugin, returned by [`Host::plugin_info`]
///
/// [`Host::plugin_info`]: crate::Host::plugin_info
#[derive(Debug, Clone)]
pub struct PluginInfo {
    /// Plugin name (manifest `name`, not visual name)
    pub name: String,
    /// Manifest snapshot at the time of the lookup
    pub manifest: PluginManifest,
    /// Current lifecycle state
    pub state: PluginState,
}
