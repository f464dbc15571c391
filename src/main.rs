mod commands;
mod config;
mod notify;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::config::BridgeConfig;

#[derive(Parser)]
#[command(name = "calbridge")]
#[command(about = "Keep a Google calendar and an iCloud calendar in sync")]
struct Cli {
    /// Config file (defaults to ~/.config/calbridge/config.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sync on a fixed interval until interrupted
    Run {
        /// Seconds between passes (overrides sync_interval)
        #[arg(long)]
        interval: Option<u64>,
    },
    /// Run a single sync pass
    Once,
    /// Show what has been synced and what failed
    Status {
        /// Print the raw sync state as JSON
        #[arg(long)]
        json: bool,
    },
    /// Forget failed events so the next pass retries them
    ClearFailed,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let cli = Cli::parse();
    let config = BridgeConfig::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Run { interval } => commands::run::run(&config, interval).await,
        Commands::Once => commands::once::run(&config).await,
        Commands::Status { json } => commands::status::run(&config, json),
        Commands::ClearFailed => commands::clear_failed::run(&config),
    }
}
