use anyhow::Result;
use clap::{Parser, Subcommand};

mod builtin;
mod commands;
mod config;

#[derive(Parser)]
#[command(name = "hearth", about = "Plugin host with an edge-triggered event bus")]
#[command(version, propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Inspect installed plugins
    Plugins(commands::plugins::PluginsArgs),
    /// Run the plugin host
    Run(commands::run::RunArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let debug = cli.verbose
        || config::HearthSettings::load()
            .map(|settings| settings.log.debug)
            .unwrap_or(false);
    let filter = if debug { "debug" } else { "info" };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match cli.command {
        Commands::Plugins(args) => commands::plugins::run(args),
        Commands::Run(args) => commands::run::run(args).await,
    }
}
