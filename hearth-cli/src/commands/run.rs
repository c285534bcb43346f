//! Run the hearth plugin host until interrupted

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use hearth_core::{EventBus, PluginHost, PluginHostConfig};
use hearth_plugin_api::ManagerManifest;

use crate::builtin;
use crate::config::HearthSettings;

/// Host runner arguments
#[derive(Args)]
pub struct RunArgs {
    /// Plugin root directory (overrides settings.toml)
    #[arg(long)]
    pub plugin_root: Option<PathBuf>,
}

/// Run the host: load and start every plugin, then idle until ctrl-c
pub async fn run(args: RunArgs) -> Result<()> {
    let settings = HearthSettings::load()?;
    let plugin_root = args.plugin_root.unwrap_or_else(|| settings.plugin_root());

    let config = PluginHostConfig {
        plugin_root,
        manager: load_manager_manifest()?,
    };

    let bus = Arc::new(EventBus::new());
    let mut host = PluginHost::new(config, Arc::clone(&bus));
    builtin::register_builtins(&mut host);

    host.load_all();
    host.start_all();

    let running = host.list_plugins();
    println!("hearth running with {} plugin(s):", running.len());
    for plugin in &running {
        println!(
            "  {} v{} [{:?}]",
            plugin.manifest.visual_name, plugin.manifest.version, plugin.state
        );
    }

    tokio::signal::ctrl_c()
        .await
        .context("listening for ctrl-c")?;
    tracing::info!("shutting down");

    for plugin in host.list_plugins() {
        if let Err(e) = host.remove_by_name(&plugin.name) {
            tracing::warn!(plugin = %plugin.name, error = %e, "could not remove plugin");
        }
    }
    bus.shutdown();

    Ok(())
}

/// Load `<config_dir>/manager.toml` if present, defaults otherwise
fn load_manager_manifest() -> Result<ManagerManifest> {
    let path = hearth_paths::config_dir().join("manager.toml");
    if path.exists() {
        ManagerManifest::load(&path)
            .with_context(|| format!("loading manager manifest {}", path.display()))
    } else {
        Ok(ManagerManifest::default())
    }
}
