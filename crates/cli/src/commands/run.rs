//! `run` command implementation.

use anyhow::{Context, Result};
use contracts::HudBlueprint;
use ingestion::ScenarioConfig;
use tracing::{info, warn};

use super::load_blueprint;
use crate::cli::RunArgs;
use crate::pipeline::{Pipeline, PipelineConfig};

/// Execute the `run` command
pub async fn run_hud(args: &RunArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration");

    let mut blueprint = load_blueprint(&args.config)?;

    if let Some(tick_hz) = args.tick_hz {
        info!(tick_hz, "Overriding tick rate from CLI");
        blueprint.device.tick_hz = tick_hz;
    }

    info!(
        tick_hz = blueprint.device.tick_hz,
        wide_camera = blueprint.device.wide_camera,
        light_source = ?blueprint.device.light_source,
        sinks = blueprint.sinks.len(),
        "Configuration loaded"
    );

    if args.dry_run {
        info!("Dry run mode - configuration is valid, exiting");
        print_config_summary(&blueprint, args);
        return Ok(());
    }

    if args.metrics_port != 0 {
        observability::init_metrics_only(args.metrics_port)?;
        info!(port = args.metrics_port, "Metrics endpoint available");
    }

    let pipeline_config = PipelineConfig {
        scenario: scenario_config(args, blueprint.device.tick_hz),
        blueprint,
        max_ticks: if args.max_ticks == 0 {
            None
        } else {
            Some(args.max_ticks)
        },
        ping: !args.offline,
        buffer_size: args.buffer_size,
    };

    info!("Starting tick loop...");
    let stats = Pipeline::new(pipeline_config)
        .run(shutdown_signal())
        .await
        .context("Pipeline execution failed")?;

    info!(
        ticks = stats.ticks,
        dropped = stats.frames_dropped,
        duration_secs = stats.duration.as_secs_f64(),
        tick_rate = format!("{:.2}", stats.tick_rate()),
        "Run completed"
    );
    stats.print_summary();

    info!("HUD Sync finished");
    Ok(())
}

/// Drive script from the command-line knobs
fn scenario_config(args: &RunArgs, tick_hz: u32) -> ScenarioConfig {
    let defaults = ScenarioConfig::default();
    ScenarioConfig {
        start_tick: args.start_tick,
        stop_tick: args.stop_tick,
        engage_tick: args.engage_tick,
        controls_dropout: args.controls_dropout.clone(),
        prompt_alert: args.prompt_alert.clone(),
        lead_distance: args.lead_distance.or(defaults.lead_distance),
        tick_hz,
        ..defaults
    }
}

/// Resolves on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

/// Print configuration summary for dry-run mode
fn print_config_summary(blueprint: &HudBlueprint, args: &RunArgs) {
    let engine = blueprint.engine_config();

    println!("\n=== Configuration Summary ===\n");
    println!("Device:");
    println!("  Tick rate: {} Hz", engine.tick_hz);
    println!("  Wide camera: {}", engine.wide_camera);
    println!("  Light source: {:?}", engine.light_source);

    println!("\nScenario:");
    println!("  Start tick: {}", args.start_tick);
    if let Some(stop) = args.stop_tick {
        println!("  Stop tick: {}", stop);
    }
    if let Some(ref dropout) = args.controls_dropout {
        println!("  Controls dropout: {:?}", dropout);
    }
    println!(
        "  Max ticks: {}",
        if args.max_ticks == 0 {
            "unlimited".to_string()
        } else {
            args.max_ticks.to_string()
        }
    );

    if !blueprint.sinks.is_empty() {
        println!("\nSinks ({}):", blueprint.sinks.len());
        for sink in &blueprint.sinks {
            println!("  - {} ({:?})", sink.name, sink.sink_type);
        }
    }

    println!();
}
