//! Plugin system for hearth
//!
//! This module provides the infrastructure for loading and managing
//! plugins:
//!
//! - [`PluginHost`]: the lifecycle manager - discovery, dependency
//!   resolution, load, start, health-check-driven removal
//! - [`HostApi`]: the facade plugins see - registry lookup, typed option
//!   mutation, auto-destroying event topics
//! - [`PluginEntry`]: one registered plugin's runtime record
//! - [`PluginHostError`]: error taxonomy for plugin operations
//!
//! # Plugin discovery
//!
//! Plugins are discovered by a recursive walk of the plugin root: a
//! directory is a plugin iff it directly contains `plugin.toml`. The walk
//! does not descend past a plugin root, but sibling trees are explored.
//!
//! # Example
//!
//! ```ignore
//! use hearth_core::events::EventBus;
//! use hearth_core::plugins::{PluginHost, PluginHostConfig};
//!
//! let bus = Arc::new(EventBus::new());
//! let mut host = PluginHost::new(PluginHostConfig::default(), bus);
//! host.register_factory("clock", Box::new(|| Box::new(ClockPlugin::default())));
//!
//! host.load_all();
//! host.start_all();
//! ```

mod api;
mod discover;
mod entry;
mod error;
mod host;

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

pub use api::{HostApi, ON_PLUGIN_REMOVE};
pub use discover::{DiscoveredPlugin, ManifestIndex, PLUGIN_MANIFEST, discover};
pub use entry::PluginEntry;
pub use error::PluginHostError;
pub use host::{PluginHost, PluginHostConfig};

/// Registry shared between the plugin host and the Host API facade
pub(crate) type SharedRegistry = Arc<RwLock<HashMap<String, Arc<PluginEntry>>>>;
