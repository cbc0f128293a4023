//! # HUD Sync CLI
//!
//! Command-line entry point: configuration loading and validation, and the
//! engine tick loop with graceful shutdown.

mod cli;
mod commands;
mod error;
mod pipeline;

use anyhow::Result;
use clap::Parser;
use observability::ObservabilityConfig;
use tracing::info;

use cli::{Cli, Commands};
use commands::{run_hud, run_info, run_validate};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    init_logging(&cli)?;

    info!(version = env!("CARGO_PKG_VERSION"), "HUD Sync CLI starting");

    let result = match &cli.command {
        Commands::Run(args) => run_hud(args).await,
        Commands::Validate(args) => run_validate(args),
        Commands::Info(args) => run_info(args),
    };

    if let Err(ref e) = result {
        tracing::error!(error = %e, "Command failed");
    }

    result
}

/// Initialize logging based on CLI options
fn init_logging(cli: &Cli) -> Result<()> {
    observability::init_with_config(ObservabilityConfig::from_verbosity(
        cli.log_format.into(),
        cli.verbose,
        cli.quiet,
    ))
}
