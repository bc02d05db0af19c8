//! Colis console - command-line client for the colis package tracking API.
//!
//! Signs in against the backend, keeps the token pair in the configured
//! store, and exposes package, zone and user operations as subcommands.

mod commands;
mod logging;

use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use tracing::{debug, info};

use colis_core::Config;
use commands::Commands;

#[derive(Parser)]
#[command(name = "colis")]
#[command(about = "Command-line console for the colis package tracking API")]
#[command(version)]
struct Cli {
    /// API base URL, e.g. http://localhost:8081/api
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Request timeout in milliseconds
    #[arg(long, global = true)]
    timeout_ms: Option<u64>,

    /// Also write logs to a file in the cache directory
    #[arg(long, global = true)]
    log_file: bool,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    let mut config = Config::load()?;

    let log_dir = if cli.log_file {
        Some(config.cache_dir()?)
    } else {
        None
    };
    let _guard = logging::init_tracing(log_dir.as_deref())?;
    info!("Colis console starting");

    // Flags win over the environment and the config file
    let mut api_config = config.api_config()?;
    if let Some(base_url) = cli.base_url {
        api_config.base_url = base_url;
    }
    if let Some(ms) = cli.timeout_ms {
        api_config.timeout = Duration::from_millis(ms);
    }
    debug!(base_url = %api_config.base_url, timeout_ms = api_config.timeout.as_millis() as u64, "Configuration loaded");

    cli.command.execute(&mut config, api_config).await
}
