//! Pipeline orchestrator - wires the scripted drive, the engine and the
//! dispatcher together and paces the tick loop.

use std::future::Future;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use contracts::{Clock, HudBlueprint, ParamStore, SceneFrame};
use ingestion::{DriveScenario, MockVisionTransport, ScenarioConfig, TopicBus};
use observability::{record_frame_dispatched, record_tick_duration_ms, record_tick_metrics};
use sync_engine::{param_keys, EngineParts, HudEngine, SystemClock, Transition};
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tracing::{info, warn};

use super::{LogSoundPlayer, LogTextureUploader, RunStats, SharedParamStore};

/// Pipeline configuration
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub blueprint: HudBlueprint,

    /// Drive script
    pub scenario: ScenarioConfig,

    /// Maximum number of ticks (None = unlimited)
    pub max_ticks: Option<u64>,

    /// Publish an uplink ping once per second
    pub ping: bool,

    /// Scene snapshot channel capacity
    pub buffer_size: usize,
}

/// Main pipeline orchestrator
pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    /// Run until `max_ticks` or until `shutdown` resolves
    pub async fn run(self, shutdown: impl Future<Output = ()>) -> Result<RunStats> {
        let start_time = Instant::now();
        let PipelineConfig {
            blueprint,
            scenario,
            max_ticks,
            ping,
            buffer_size,
        } = self.config;

        let engine_config = blueprint.engine_config();
        let tick_hz = u64::from(engine_config.tick_hz.max(1));

        let scenario = DriveScenario::new(scenario).context("Invalid drive scenario")?;
        let bus = TopicBus::new();
        let publisher = bus.publisher();
        let bus_metrics = bus.metrics();

        let store = SharedParamStore::new(
            config_loader::open_param_store(&blueprint.params)
                .context("Failed to open param store")?,
        );
        let mut pinger = store.clone();
        let clock = SystemClock;

        let mut engine = HudEngine::new(
            engine_config,
            EngineParts {
                bus: Box::new(bus),
                params: Box::new(store),
                sound: Box::new(LogSoundPlayer::default()),
                vision: Box::new(MockVisionTransport::default()),
                uploader: Box::new(LogTextureUploader::default()),
                clock: Box::new(clock),
            },
        );

        if blueprint.sinks.is_empty() {
            warn!("No sinks configured - scene snapshots will be dropped");
        }
        let (scene_tx, scene_rx) = mpsc::channel::<SceneFrame>(buffer_size.max(1));
        let dispatcher = dispatcher::create_dispatcher(blueprint.sinks.clone(), scene_rx)
            .await
            .context("Failed to create dispatcher")?;
        let dispatcher_handle = dispatcher.spawn();

        let mut stats = RunStats {
            active_sinks: blueprint.sinks.len(),
            ..Default::default()
        };

        let mut interval = tokio::time::interval(Duration::from_secs_f64(1.0 / tick_hz as f64));
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        tokio::pin!(shutdown);

        info!(tick_hz, max_ticks = ?max_ticks, "Tick loop running");

        loop {
            tokio::select! {
                biased;
                _ = &mut shutdown => {
                    warn!(ticks = stats.ticks, "Shutdown requested, stopping tick loop");
                    break;
                }
                _ = interval.tick() => {}
            }

            let tick = stats.ticks + 1;
            if ping && tick % tick_hz == 0 {
                if let Err(e) = pinger.put(param_keys::LAST_PING_TIME, &clock.now_ns().to_string()) {
                    warn!(error = %e, "Failed to record uplink ping");
                }
            }
            scenario
                .publish_tick(tick, &publisher)
                .context("Telemetry bus closed")?;

            let tick_start = Instant::now();
            let report = engine.tick();
            let elapsed_ms = tick_start.elapsed().as_secs_f64() * 1000.0;
            stats.ticks = tick;

            record_tick_metrics(&report.meta);
            record_tick_duration_ms(elapsed_ms);
            stats.tick_metrics.update(&report.meta);
            stats.tick_metrics.record_duration_ms(elapsed_ms);

            match report.transition {
                Some(Transition::Onroad { source }) => {
                    info!(tick, camera = ?source, "Onroad")
                }
                Some(Transition::Offroad) => info!(tick, "Offroad"),
                None => {}
            }

            match scene_tx.try_send(engine.snapshot()) {
                Ok(()) => record_frame_dispatched("dispatcher", true),
                Err(mpsc::error::TrySendError::Full(_)) => {
                    stats.frames_dropped += 1;
                    record_frame_dispatched("dispatcher", false);
                }
                Err(mpsc::error::TrySendError::Closed(_)) => {
                    warn!("Dispatcher channel closed");
                    break;
                }
            }

            if max_ticks.is_some_and(|max| stats.ticks >= max) {
                info!(ticks = stats.ticks, "Reached max ticks limit");
                break;
            }
        }

        info!("Shutting down pipeline...");
        drop(scene_tx);
        match tokio::time::timeout(Duration::from_secs(5), dispatcher_handle).await {
            Ok(Ok(summary)) => info!(
                frames = summary.frames,
                refused = summary.refused,
                "Dispatcher drained"
            ),
            Ok(Err(e)) => warn!(error = %e, "Dispatcher task failed"),
            Err(_) => warn!("Dispatcher did not drain within 5s"),
        }

        stats.bus = bus_metrics.snapshot();
        stats.duration = start_time.elapsed();
        info!(
            ticks = stats.ticks,
            duration_secs = stats.duration.as_secs_f64(),
            status = engine.status().as_str(),
            "Pipeline shutdown complete"
        );

        Ok(stats)
    }
}
