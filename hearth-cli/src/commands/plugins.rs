//! Plugin inspection commands

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Subcommand};
use hearth_core::discover;

use crate::config::HearthSettings;

/// Plugin inspection arguments
#[derive(Args)]
pub struct PluginsArgs {
    #[command(subcommand)]
    pub command: PluginsCommands,

    /// Plugin root directory (overrides settings.toml)
    #[arg(long, global = true)]
    pub plugin_root: Option<PathBuf>,
}

/// Plugin subcommands
#[derive(Subcommand)]
pub enum PluginsCommands {
    /// List discovered plugin manifests
    List,
    /// Show one plugin's manifest details
    Info {
        /// Plugin manifest name
        name: String,
    },
}

/// Run a plugin inspection command
pub fn run(args: PluginsArgs) -> Result<()> {
    let settings = HearthSettings::load()?;
    let root = args.plugin_root.unwrap_or_else(|| settings.plugin_root());

    match args.command {
        PluginsCommands::List => list_plugins(&root),
        PluginsCommands::Info { name } => show_plugin(&root, &name),
    }
}

fn list_plugins(root: &std::path::Path) -> Result<()> {
    let discovered = discover(root);

    if discovered.is_empty() {
        println!("No plugins found under {}", root.display());
        println!();
        println!("A plugin is a directory containing a plugin.toml manifest.");
        return Ok(());
    }

    println!("Plugins under {}:", root.display());
    for plugin in &discovered {
        let manifest = &plugin.manifest;
        let marker = if manifest.enabled { "" } else { " (disabled)" };
        println!(
            "  {} v{} - {}{}",
            manifest.name, manifest.version, manifest.visual_name, marker
        );
    }
    Ok(())
}

fn show_plugin(root: &std::path::Path, name: &str) -> Result<()> {
    let discovered = discover(root);
    let Some(plugin) = discovered.iter().find(|p| p.manifest.name == name) else {
        anyhow::bail!("plugin '{name}' not found under {}", root.display());
    };

    let manifest = &plugin.manifest;
    println!("{} ({})", manifest.visual_name, manifest.name);
    println!("  version:        {}", manifest.version);
    println!("  loader version: {}", manifest.loader_version);
    println!("  enabled:        {}", manifest.enabled);
    println!("  directory:      {}", plugin.root.display());

    if !manifest.dependencies.is_empty() {
        println!("  dependencies:");
        for (dep, min) in &manifest.dependencies {
            println!("    {dep} >= {min}");
        }
    }
    if !manifest.options.is_empty() {
        println!("  options:");
        for (option, spec) in &manifest.options {
            println!("    {option} = {:?}", spec.value);
        }
    }
    Ok(())
}
