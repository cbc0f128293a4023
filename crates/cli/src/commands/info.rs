//! `info` command implementation.

use anyhow::{Context, Result};
use contracts::HudBlueprint;
use serde::Serialize;
use tracing::info;

use super::load_blueprint;
use crate::cli::InfoArgs;

/// Configuration info for JSON output
#[derive(Serialize)]
struct ConfigInfo {
    version: String,
    device: DeviceInfo,
    display: DisplayInfo,
    #[serde(skip_serializing_if = "Option::is_none")]
    timing: Option<contracts::TickPeriods>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    sinks: Vec<SinkInfo>,
}

#[derive(Serialize)]
struct DeviceInfo {
    tick_hz: u32,
    wide_camera: bool,
    light_source: String,
    focal_length: f32,
}

#[derive(Serialize)]
struct DisplayInfo {
    width: u32,
    height: u32,
    zoom: f32,
    max_draw_distance: f32,
}

#[derive(Serialize)]
struct SinkInfo {
    name: String,
    sink_type: String,
    queue_capacity: usize,
}

/// Execute the `info` command
pub fn run_info(args: &InfoArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration info");

    let blueprint = load_blueprint(&args.config)?;

    if args.json {
        let info = build_config_info(&blueprint, args);
        let json =
            serde_json::to_string_pretty(&info).context("Failed to serialize config info")?;
        println!("{}", json);
    } else {
        print_config_info(&blueprint, args);
    }

    Ok(())
}

fn build_config_info(blueprint: &HudBlueprint, args: &InfoArgs) -> ConfigInfo {
    let engine = blueprint.engine_config();

    let sinks = if args.sinks {
        blueprint
            .sinks
            .iter()
            .map(|s| SinkInfo {
                name: s.name.clone(),
                sink_type: format!("{:?}", s.sink_type),
                queue_capacity: s.queue_capacity,
            })
            .collect()
    } else {
        Vec::new()
    };

    ConfigInfo {
        version: format!("{:?}", blueprint.version),
        device: DeviceInfo {
            tick_hz: engine.tick_hz,
            wide_camera: engine.wide_camera,
            light_source: format!("{:?}", engine.light_source),
            focal_length: engine.intrinsics().fx,
        },
        display: DisplayInfo {
            width: engine.display.width,
            height: engine.display.height,
            zoom: engine.display.zoom,
            max_draw_distance: engine.geometry.max_draw_distance,
        },
        timing: args.timing.then_some(engine.periods),
        sinks,
    }
}

fn print_config_info(blueprint: &HudBlueprint, args: &InfoArgs) {
    let engine = blueprint.engine_config();

    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║                  HUD Sync Configuration                      ║");
    println!("╚══════════════════════════════════════════════════════════════╝\n");

    println!("📟 Device");
    println!("   ├─ Version: {:?}", blueprint.version);
    println!("   ├─ Tick rate: {} Hz", engine.tick_hz);
    println!(
        "   ├─ Camera: {} (fx = {})",
        if engine.wide_camera { "wide" } else { "road" },
        engine.intrinsics().fx
    );
    println!("   └─ Light source: {:?}", engine.light_source);

    println!("\n🖥  Display");
    println!(
        "   ├─ Framebuffer: {}x{}",
        engine.display.width, engine.display.height
    );
    println!("   ├─ Zoom: {}", engine.display.zoom);
    println!(
        "   └─ Draw distance: {}..{} m",
        engine.geometry.min_draw_distance, engine.geometry.max_draw_distance
    );

    if args.timing {
        let periods = engine.periods;
        println!("\n⏱  Timing (ticks)");
        println!("   ├─ Controls wait: {}", periods.controls_wait);
        println!("   ├─ Controls timeout: {}", periods.controls_timeout);
        println!("   ├─ Link timeout: {}", periods.link_timeout);
        println!("   ├─ Settings refresh: {}", periods.settings_refresh);
        println!("   ├─ Connectivity refresh: {}", periods.connectivity_refresh);
        println!("   └─ Blinker blink: {}", periods.blinker_blink);
    }

    match &blueprint.params.store_dir {
        Some(dir) => println!("\n🗄  Params store: {}", dir.display()),
        None => println!("\n🗄  Params store: (in memory)"),
    }

    if args.sinks && !blueprint.sinks.is_empty() {
        println!("\n📤 Sinks ({})", blueprint.sinks.len());
        for (i, sink) in blueprint.sinks.iter().enumerate() {
            let is_last = i == blueprint.sinks.len() - 1;
            let prefix = if is_last { "└─" } else { "├─" };
            println!(
                "   {} {} ({:?}, queue {})",
                prefix, sink.name, sink.sink_type, sink.queue_capacity
            );
        }
    }

    println!();
}
