//! Main HUD engine: one update tick per rendered frame.

use contracts::{
    Clock, HudEngineConfig, ParamStore, Scene, SceneFrame, SoundPlayer, TelemetryBus,
    TextureUploader, TickMeta, UiStatus, VisionFrame, VisionTransport,
};
use tracing::{debug, instrument, warn};

use crate::aggregator::SceneAggregator;
use crate::refresh::{param_keys, ParamsRefresher, RefreshKind};
use crate::status::{road_camera, StatusMachine, Transition, WatchdogState};
use crate::vision::{ConnectionState, FrameOutcome, VisionController, VisionUpdate};

/// External collaborators the engine drives
pub struct EngineParts {
    pub bus: Box<dyn TelemetryBus>,
    pub params: Box<dyn ParamStore>,
    pub sound: Box<dyn SoundPlayer>,
    pub vision: Box<dyn VisionTransport>,
    pub uploader: Box<dyn TextureUploader>,
    pub clock: Box<dyn Clock>,
}

/// What one tick did
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickReport {
    pub refresh: RefreshKind,
    pub transition: Option<Transition>,
    pub watchdog: WatchdogState,
    pub vision: VisionUpdate,
    pub meta: TickMeta,
}

/// HUD state synchronization engine
pub struct HudEngine {
    /// Startup configuration, after store overrides
    config: HudEngineConfig,
    /// Canonical snapshot
    scene: Scene,
    bus: Box<dyn TelemetryBus>,
    params: Box<dyn ParamStore>,
    sound: Box<dyn SoundPlayer>,
    clock: Box<dyn Clock>,
    aggregator: SceneAggregator,
    status: StatusMachine,
    refresher: ParamsRefresher,
    vision: VisionController,
    /// Ticks run so far
    ticks: u64,
}

impl HudEngine {
    /// Create an engine and perform the startup settings read.
    ///
    /// A failing settings store is logged and leaves defaults in place.
    pub fn new(mut config: HudEngineConfig, parts: EngineParts) -> Self {
        let EngineParts {
            bus,
            mut params,
            sound,
            vision,
            uploader,
            clock,
        } = parts;

        let mut scene = Scene::default();
        match ParamsRefresher::read_initial(params.as_ref(), &scene.settings) {
            Ok((settings, wide_camera)) => {
                scene.settings = settings;
                if let Some(wide) = wide_camera {
                    config.wide_camera = wide;
                }
            }
            Err(e) => warn!(error = %e, "initial settings read failed, using defaults"),
        }
        if let Err(e) = params.put(param_keys::LIMIT_SET_SPEED_CAMERA, "0") {
            warn!(error = %e, "failed to reset speed camera limit");
        }

        let periods = config.periods;
        let refresher = ParamsRefresher::new(
            periods.settings_refresh,
            periods.connectivity_refresh,
            config.ping_staleness_ns,
        );
        let aggregator = SceneAggregator::new(&config);
        let status = StatusMachine::new(&config);
        let vision = VisionController::new(road_camera(config.wide_camera), vision, uploader);

        debug!(
            tick_hz = config.tick_hz,
            wide_camera = config.wide_camera,
            "hud engine created"
        );

        Self {
            config,
            scene,
            bus,
            params,
            sound,
            clock,
            aggregator,
            status,
            refresher,
            vision,
            ticks: 0,
        }
    }

    /// Run one update tick: settings refresh, bus aggregation, status and
    /// alert, then the camera.
    #[instrument(level = "trace", name = "hud_engine_tick", skip(self), fields(tick = self.ticks + 1))]
    pub fn tick(&mut self) -> TickReport {
        self.ticks += 1;

        let refresh = self.refresher.refresh(
            self.bus.frame(),
            &mut self.scene,
            self.params.as_ref(),
            self.clock.as_ref(),
        );

        let vehicle = &mut self.scene.vehicle;
        vehicle.blinker_blinking_rate = vehicle.blinker_blinking_rate.saturating_sub(1);
        let topics_updated = self.aggregator.update(&mut self.scene, self.bus.as_mut());

        let transition = self.status.update_status(
            &mut self.scene,
            self.aggregator.controls(),
            self.bus.as_ref(),
            self.params.as_ref(),
            self.sound.as_mut(),
        );
        match transition {
            Some(Transition::Onroad { source }) => self.vision.select_source(source),
            Some(Transition::Offroad) => self.vision.mark_disconnected(),
            None => {}
        }

        let watchdog = self.status.update_alert(
            &mut self.scene,
            self.aggregator.controls(),
            self.bus.as_ref(),
            self.sound.as_mut(),
        );
        let vision = self.vision.update(&mut self.scene);

        let meta = self.meta(topics_updated, watchdog, vision);
        TickReport {
            refresh,
            transition,
            watchdog,
            vision,
            meta,
        }
    }

    fn meta(&self, topics_updated: usize, watchdog: WatchdogState, vision: VisionUpdate) -> TickMeta {
        let scene = &self.scene;
        TickMeta {
            frame: self.bus.frame(),
            topics_updated,
            status: scene.status,
            track_vertices: scene.track_vertices.len(),
            lane_line_vertices: scene.lane_line_vertices.each_ref().map(|v| v.len()),
            road_edge_vertices: scene.road_edge_vertices.each_ref().map(|v| v.len()),
            watchdog_escalated: matches!(watchdog, WatchdogState::Unresponsive { escalated: true }),
            vision_frame: matches!(vision.outcome, FrameOutcome::Received { .. }),
            vision_timeout: vision.outcome == FrameOutcome::Timeout,
            vision_connected: vision.connected_now,
        }
    }

    /// Re-derive the viewport for a resized framebuffer
    pub fn resize(&mut self, width: u32, height: u32) {
        self.aggregator
            .projection_mut()
            .set_framebuffer_size(&self.config, width, height);
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn status(&self) -> UiStatus {
        self.scene.status
    }

    pub fn config(&self) -> &HudEngineConfig {
        &self.config
    }

    /// Bus frame counter
    pub fn frame(&self) -> u64 {
        self.bus.frame()
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn vision_state(&self) -> ConnectionState {
        self.vision.state()
    }

    pub fn last_frame(&self) -> Option<&VisionFrame> {
        self.vision.last_frame()
    }

    /// Renderer-side copy of the current state
    pub fn snapshot(&self) -> SceneFrame {
        SceneFrame {
            tick: self.bus.frame(),
            camera_source: self.vision.source(),
            last_frame_id: self.vision.last_frame().map(|f| f.frame_id),
            scene: self.scene.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use config_loader::MemoryParamStore;
    use contracts::{
        AudibleAlert, CameraSource, ControlsState, DeviceState, Message, NetStatus,
        VisionBufferInfo,
    };
    use ingestion::{BusPublisher, MockVisionTransport, TopicBus};
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct SharedSound(Arc<Mutex<Vec<Option<AudibleAlert>>>>);

    impl SoundPlayer for SharedSound {
        fn play(&mut self, alert: AudibleAlert) {
            self.0.lock().unwrap().push(Some(alert));
        }

        fn stop(&mut self) {
            self.0.lock().unwrap().push(None);
        }
    }

    struct NoopUploader;

    impl TextureUploader for NoopUploader {
        fn init_buffers(&mut self, _buffers: &[VisionBufferInfo]) {}
    }

    struct FixedClock(u64);

    impl Clock for FixedClock {
        fn now_ns(&self) -> u64 {
            self.0
        }
    }

    fn engine_with(
        config: HudEngineConfig,
        params: MemoryParamStore,
    ) -> (HudEngine, BusPublisher, SharedSound) {
        let bus = TopicBus::new();
        let publisher = bus.publisher();
        let sound = SharedSound::default();
        let engine = HudEngine::new(
            config,
            EngineParts {
                bus: Box::new(bus),
                params: Box::new(params),
                sound: Box::new(sound.clone()),
                vision: Box::new(MockVisionTransport::default()),
                uploader: Box::new(NoopUploader),
                clock: Box::new(FixedClock(100_000_000_000)),
            },
        );
        (engine, publisher, sound)
    }

    fn engine() -> (HudEngine, BusPublisher, SharedSound) {
        engine_with(HudEngineConfig::default(), MemoryParamStore::new())
    }

    fn device(started: bool) -> Message {
        Message::DeviceState(DeviceState {
            started,
            ..Default::default()
        })
    }

    #[test]
    fn test_startup_reads_settings_and_overrides_wide_camera() {
        let params = MemoryParamStore::with_values([
            ("EnableWideCamera", "1"),
            ("DebugUi1", "1"),
            ("LimitSetSpeedCamera", "3"),
        ]);
        let (engine, _, _) = engine_with(HudEngineConfig::default(), params);
        assert!(engine.config().wide_camera);
        assert!(engine.scene().settings.debug_ui1);
        assert_eq!(engine.scene().gnss.satellite_count, -1);
        assert_eq!(engine.snapshot().camera_source, CameraSource::WideRoad);
    }

    #[test]
    fn test_offroad_snapshot_reports_configured_camera() {
        let config = HudEngineConfig {
            wide_camera: true,
            ..HudEngineConfig::default()
        };
        let (mut engine, _, _) = engine_with(config, MemoryParamStore::new());
        engine.tick();
        assert_eq!(engine.status(), UiStatus::Offroad);
        assert_eq!(engine.snapshot().camera_source, CameraSource::WideRoad);

        let (engine, _, _) = self::engine();
        assert_eq!(engine.snapshot().camera_source, CameraSource::Road);
    }

    #[test]
    fn test_idle_ticks_stay_offroad() {
        let (mut engine, _, _) = engine();
        for _ in 0..50 {
            let report = engine.tick();
            assert_eq!(report.meta.topics_updated, 0);
            assert_eq!(report.meta.status, UiStatus::Offroad);
        }
        assert_eq!(engine.frame(), 50);
        assert_eq!(engine.vision_state(), ConnectionState::Disconnected);
    }

    #[test]
    fn test_onroad_connects_camera() {
        let (mut engine, publisher, _) = engine();
        publisher.publish(device(true)).unwrap();
        let report = engine.tick();

        assert_eq!(
            report.transition,
            Some(Transition::Onroad {
                source: CameraSource::Road
            })
        );
        assert!(report.vision.connected_now);
        assert!(report.meta.vision_frame);
        assert_eq!(engine.status(), UiStatus::Disengaged);
        assert_eq!(engine.scene().started_frame, 1);

        let snapshot = engine.snapshot();
        assert_eq!(snapshot.tick, 1);
        assert_eq!(snapshot.last_frame_id, Some(0));
    }

    #[test]
    fn test_offroad_disconnects_and_silences() {
        let (mut engine, publisher, sound) = engine();
        publisher.publish(device(true)).unwrap();
        engine.tick();
        publisher
            .publish(Message::ControlsState(ControlsState {
                enabled: true,
                ..Default::default()
            }))
            .unwrap();
        engine.tick();
        assert_eq!(engine.status(), UiStatus::Engaged);

        publisher.publish(device(false)).unwrap();
        let report = engine.tick();
        assert_eq!(report.transition, Some(Transition::Offroad));
        assert_eq!(engine.status(), UiStatus::Offroad);
        assert!(!engine.scene().sidebar_collapsed);
        assert_eq!(engine.vision_state(), ConnectionState::Disconnected);
        assert_eq!(*sound.0.lock().unwrap(), vec![None]);
    }

    #[test]
    fn test_blinker_counter_decays() {
        let (mut engine, publisher, _) = engine();
        publisher
            .publish(Message::VehicleState(contracts::VehicleState {
                right_blinker: true,
                ..Default::default()
            }))
            .unwrap();
        engine.tick();
        assert_eq!(engine.scene().vehicle.blinker_blinking_rate, 120);
        for _ in 0..20 {
            engine.tick();
        }
        assert_eq!(engine.scene().vehicle.blinker_blinking_rate, 100);
        for _ in 0..200 {
            engine.tick();
        }
        assert_eq!(engine.scene().vehicle.blinker_blinking_rate, 0);
    }

    #[test]
    fn test_connectivity_refresh_uses_clock() {
        let params = MemoryParamStore::with_values([("LastPingTime", "95000000000")]);
        let (mut engine, _, _) = engine_with(HudEngineConfig::default(), params);
        // connectivity period is 120 ticks at 20 Hz
        let mut kinds = Vec::new();
        for _ in 0..=120 {
            kinds.push(engine.tick().refresh);
        }
        assert_eq!(kinds[0], RefreshKind::Settings);
        assert_eq!(kinds[120], RefreshKind::Connectivity);
        assert_eq!(engine.scene().net_status, NetStatus::Connected);
    }

    #[test]
    fn test_resize_recenters_projection() {
        let (mut engine, publisher, _) = engine();
        engine.resize(800, 600);
        publisher
            .publish(Message::Calibration(contracts::Calibration {
                rpy_calib: vec![0.0, 0.0, 0.0],
            }))
            .unwrap();
        publisher
            .publish(Message::RadarState(contracts::RadarState {
                lead_one: contracts::LeadData {
                    status: true,
                    d_rel: 50.0,
                    ..Default::default()
                },
                ..Default::default()
            }))
            .unwrap();
        engine.tick();
        let lead = engine.scene().lead_vertices[0];
        assert!((lead.x - 400.0).abs() < 1e-2);
    }
}
