//! hearth-core: Core library for the hearth plugin host
//!
//! This crate provides the foundational components for hearth:
//!
//! - **Plugin lifecycle** - [`PluginHost`] for discovery, dependency
//!   resolution, load/start supervision, and removal
//! - **Event system** - [`EventBus`] and [`Topic`] for edge-triggered
//!   pub/sub between plugins and the host
//! - **Host API facade** - [`HostApi`], the [`hearth_plugin_api::Host`]
//!   implementation handed to every plugin
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use hearth_core::{EventBus, PluginHost, PluginHostConfig};
//!
//! #[tokio::main]
//! async fn main() {
//!     let bus = Arc::new(EventBus::new());
//!     let host = PluginHost::new(PluginHostConfig::default(), Arc::clone(&bus));
//!
//!     host.load_all();
//!     host.start_all();
//!
//!     for plugin in host.list_plugins() {
//!         println!("{} v{}", plugin.manifest.visual_name, plugin.manifest.version);
//!     }
//! }
//! ```

pub mod events;
pub mod plugins;

// Re-export key types for convenience
pub use events::{Connection, EventBus, Topic};
pub use plugins::{
    DiscoveredPlugin, HostApi, ManifestIndex, ON_PLUGIN_REMOVE, PluginEntry, PluginHost,
    PluginHostConfig, PluginHostError, discover,
};
