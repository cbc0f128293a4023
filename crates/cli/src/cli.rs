//! CLI argument definitions using clap.

use clap::{Parser, Subcommand, ValueEnum};
use std::ops::Range;
use std::path::PathBuf;

use crate::error::CliError;

/// HUD Sync - per-frame state synchronization core of a driver-assistance HUD
#[derive(Parser, Debug)]
#[command(
    name = "hud-sync",
    author,
    version,
    about = "Driver-assistance HUD state synchronization core",
    long_about = "Drives the HUD engine tick loop against scripted drive telemetry.\n\n\
                  Aggregates bus topics into the scene, projects perception output, \n\
                  derives status and alerts, and dispatches scene snapshots to sinks."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "HUD_SYNC_VERBOSE")]
    pub verbose: u8,

    /// Suppress all output except warnings and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format
    #[arg(
        long,
        value_enum,
        default_value = "pretty",
        global = true,
        env = "HUD_SYNC_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the engine tick loop against the scripted drive
    Run(RunArgs),

    /// Validate configuration file without running
    Validate(ValidateArgs),

    /// Display configuration information
    Info(InfoArgs),
}

/// Arguments for the `run` command
#[derive(Parser, Debug, Clone)]
pub struct RunArgs {
    /// Path to configuration file (TOML or JSON)
    #[arg(short, long, default_value = "hud.toml", env = "HUD_SYNC_CONFIG")]
    pub config: PathBuf,

    /// Override the nominal tick rate from configuration
    #[arg(long, env = "HUD_SYNC_TICK_HZ")]
    pub tick_hz: Option<u32>,

    /// Number of ticks to run (0 = until interrupted)
    #[arg(long, default_value = "600", env = "HUD_SYNC_MAX_TICKS")]
    pub max_ticks: u64,

    /// Tick the device reports started
    #[arg(long, default_value = "5")]
    pub start_tick: u64,

    /// Tick the device reports stopped again
    #[arg(long)]
    pub stop_tick: Option<u64>,

    /// Tick the controller engages
    #[arg(long, default_value = "40")]
    pub engage_tick: Option<u64>,

    /// Ticks during which the controller publishes nothing (e.g. `300..500`)
    #[arg(long, value_parser = parse_tick_range)]
    pub controls_dropout: Option<Range<u64>>,

    /// Ticks during which the controller raises a prompt alert (e.g. `200..240`)
    #[arg(long, value_parser = parse_tick_range)]
    pub prompt_alert: Option<Range<u64>>,

    /// Radar lead distance in meters
    #[arg(long)]
    pub lead_distance: Option<f32>,

    /// Do not publish uplink pings (connectivity shows disconnected)
    #[arg(long)]
    pub offline: bool,

    /// Validate configuration and exit without running
    #[arg(long)]
    pub dry_run: bool,

    /// Capacity of the scene snapshot channel to the dispatcher
    #[arg(long, default_value = "64", env = "HUD_SYNC_BUFFER_SIZE")]
    pub buffer_size: usize,

    /// Metrics server port (0 = disabled)
    #[arg(long, default_value = "0", env = "HUD_SYNC_METRICS_PORT")]
    pub metrics_port: u16,
}

/// Arguments for the `validate` command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to configuration file to validate
    #[arg(short, long, default_value = "hud.toml")]
    pub config: PathBuf,

    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `info` command
#[derive(Parser, Debug)]
pub struct InfoArgs {
    /// Path to configuration file
    #[arg(short, long, default_value = "hud.toml")]
    pub config: PathBuf,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,

    /// Show derived tick periods
    #[arg(long)]
    pub timing: bool,

    /// Show sink configuration
    #[arg(long)]
    pub sinks: bool,
}

/// Log output format
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable pretty format
    #[default]
    Pretty,
    /// Compact single-line format
    Compact,
}

impl From<LogFormat> for observability::LogFormat {
    fn from(format: LogFormat) -> Self {
        match format {
            LogFormat::Json => Self::Json,
            LogFormat::Pretty => Self::Pretty,
            LogFormat::Compact => Self::Compact,
        }
    }
}

/// Parse `start..end` into a half-open tick range
pub fn parse_tick_range(s: &str) -> Result<Range<u64>, CliError> {
    let invalid = || CliError::invalid_argument(format!("expected <start>..<end>, got '{s}'"));
    let (start, end) = s.split_once("..").ok_or_else(invalid)?;
    let start: u64 = start.trim().parse().map_err(|_| invalid())?;
    let end: u64 = end.trim().parse().map_err(|_| invalid())?;
    if end <= start {
        return Err(CliError::invalid_argument(format!(
            "empty tick range '{s}'"
        )));
    }
    Ok(start..end)
}
