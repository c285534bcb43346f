//! hearth-plugin-api - Plugin API for the hearth application host
//!
//! This crate provides the traits and types needed to write plugins for
//! hearth. A plugin is a directory containing a `plugin.toml` manifest plus
//! an implementation of the [`Plugin`] trait, registered with the host
//! through a name-keyed factory table at startup.
//!
//! # Example
//!
//! ```
//! use hearth_plugin_api::{Plugin, PluginContext, PluginError};
//!
//! #[derive(Default)]
//! pub struct MyPlugin;
//!
//! impl Plugin for MyPlugin {
//!     fn on_load(&mut self, ctx: &PluginContext) -> Result<(), PluginError> {
//!         ctx.log_info("Plugin loaded!");
//!         Ok(())
//!     }
//!
//!     fn start(&mut self, ctx: &PluginContext) -> Result<(), PluginError> {
//!         ctx.log_info("Plugin started!");
//!         Ok(())
//!     }
//! }
//! ```

pub mod context;
pub mod error;
pub mod event;
pub mod types;

pub use context::{Host, PluginContext};
pub use error::PluginError;
pub use event::{EventCallback, EventPayload, Subscription};
pub use types::{
    ManagerManifest, OptionSpec, OptionValue, PluginInfo, PluginManifest, PluginState,
};

/// Constructor for a plugin instance, registered with the host under the
/// plugin's manifest `name`
pub type PluginFactory = Box<dyn Fn() -> Box<dyn Plugin> + Send + Sync>;

/// The core plugin trait - implement this to create a hearth plugin.
///
/// The host drives these hooks in a fixed order: [`init`](Plugin::init)
/// before [`on_load`](Plugin::on_load) before [`start`](Plugin::start);
/// [`on_remove`](Plugin::on_remove) and [`clean_up`](Plugin::clean_up) run
/// (in that order) when the plugin is removed. Hooks with a sensible no-op
/// have default implementations, so plugins only override what they need.
pub trait Plugin: Send + Sync {
    /// Called once after construction, before `on_load`. The context already
    /// carries the parsed manifest and the plugin's directory.
    fn init(&mut self, _ctx: &PluginContext) -> Result<(), PluginError> {
        Ok(())
    }

    /// Plugin-defined setup. A returned error rejects the load; the plugin
    /// is never registered.
    fn on_load(&mut self, ctx: &PluginContext) -> Result<(), PluginError>;

    /// Plugin-defined main work, dispatched on its own task. Long-running
    /// plugins should spawn their background work and return; the host logs
    /// but does not recover from an error here.
    fn start(&mut self, ctx: &PluginContext) -> Result<(), PluginError>;

    /// Called synchronously when the plugin is being removed, before
    /// `clean_up`.
    fn on_remove(&mut self, _ctx: &PluginContext) {}

    /// Called after a successful option change through the host. Not called
    /// for writes that leave the value unchanged.
    fn options_changed(&mut self, _option: &str, _value: &OptionValue, _ctx: &PluginContext) {}

    /// Final teardown, after `on_remove`.
    fn clean_up(&mut self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plugin_trait_is_object_safe() {
        // This compiles only if Plugin is object-safe
        fn _takes_boxed_plugin(_: Box<dyn Plugin>) {}
    }

    #[test]
    fn test_default_hooks_are_no_ops() {
        struct Minimal;

        impl Plugin for Minimal {
            fn on_load(&mut self, _ctx: &PluginContext) -> Result<(), PluginError> {
                Ok(())
            }

            fn start(&mut self, _ctx: &PluginContext) -> Result<(), PluginError> {
                Ok(())
            }
        }

        // init / on_remove / options_changed / clean_up all default
        let mut plugin = Minimal;
        plugin.clean_up();
    }

    #[test]
    fn test_factory_produces_boxed_plugin() {
        #[derive(Default)]
        struct Demo;

        impl Plugin for Demo {
            fn on_load(&mut self, _ctx: &PluginContext) -> Result<(), PluginError> {
                Ok(())
            }

            fn start(&mut self, _ctx: &PluginContext) -> Result<(), PluginError> {
                Ok(())
            }
        }

        let factory: PluginFactory = Box::new(|| Box::new(Demo));
        let _plugin = factory();
    }
}
