//! # Integration Tests
//!
//! Cross-crate scenarios: a scripted drive feeds the telemetry bus, the HUD
//! engine ticks against it, and snapshots flow to the dispatcher.

#[cfg(test)]
mod contract_tests {
    use config_loader::{ConfigFormat, ConfigLoader};

    #[test]
    fn test_blueprint_to_engine_config() {
        let blueprint = ConfigLoader::load_from_str(
            r#"
[device]
tick_hz = 10
wide_camera = true

[timing]
controls_timeout_sec = 2.0
"#,
            ConfigFormat::Toml,
        )
        .unwrap();

        assert_eq!(blueprint.version, contracts::ConfigVersion::V1);
        let config = blueprint.engine_config();
        assert_eq!(config.periods.controls_timeout, 20);
        assert_eq!(config.periods.controls_wait, 100);
        assert_eq!(config.intrinsics().fx, 567.0);
    }

    #[test]
    fn test_shipped_config_is_valid() {
        let path = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("../../configs/hud.toml");
        let blueprint = ConfigLoader::load_from_path(&path).unwrap();

        assert_eq!(blueprint.engine_config().periods, contracts::TickPeriods::for_tick_hz(20));
        assert_eq!(blueprint.sinks.len(), 2);
        assert_eq!(blueprint.params.overrides["IsMetric"], "1");
    }
}

#[cfg(test)]
mod e2e_tests {
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    use config_loader::MemoryParamStore;
    use contracts::{
        AudibleAlert, CameraSource, Clock, HudBlueprint, SceneFrame, SinkConfig, SinkType,
        SoundPlayer, TextureUploader, UiStatus, VisionBufferInfo,
    };
    use dispatcher::create_dispatcher;
    use ingestion::{
        BusPublisher, DriveScenario, MockVisionConfig, MockVisionTransport, ScenarioConfig,
        TopicBus,
    };
    use observability::TickMetricsAggregator;
    use sync_engine::{
        ConnectionState, EngineParts, HudEngine, TickReport, Transition, WatchdogState,
        UNRESPONSIVE_TEXT1, WAITING_TEXT1, WAITING_TEXT2,
    };
    use tokio::sync::mpsc;

    #[derive(Debug, Clone, Copy, PartialEq)]
    enum SoundEvent {
        Play(AudibleAlert),
        Stop,
    }

    #[derive(Clone, Default)]
    struct SoundLog(Arc<Mutex<Vec<SoundEvent>>>);

    impl SoundPlayer for SoundLog {
        fn play(&mut self, alert: AudibleAlert) {
            self.0.lock().unwrap().push(SoundEvent::Play(alert));
        }

        fn stop(&mut self) {
            self.0.lock().unwrap().push(SoundEvent::Stop);
        }
    }

    struct NoTextures;

    impl TextureUploader for NoTextures {
        fn init_buffers(&mut self, _buffers: &[VisionBufferInfo]) {}
    }

    struct FixedClock(u64);

    impl Clock for FixedClock {
        fn now_ns(&self) -> u64 {
            self.0
        }
    }

    /// Engine wired to a scripted drive at 20 Hz; controls wait 20 ticks,
    /// controls timeout 10 ticks.
    struct Drive {
        engine: HudEngine,
        scenario: DriveScenario,
        publisher: BusPublisher,
        sound: SoundLog,
        tick: u64,
    }

    impl Drive {
        fn new(scenario: ScenarioConfig) -> Self {
            Self::with_vision(scenario, MockVisionConfig::default())
        }

        fn with_vision(scenario: ScenarioConfig, vision: MockVisionConfig) -> Self {
            let mut blueprint = HudBlueprint::default();
            blueprint.timing.controls_wait_sec = 1.0;
            blueprint.timing.controls_timeout_sec = 0.5;

            let bus = TopicBus::new();
            let publisher = bus.publisher();
            let sound = SoundLog::default();
            let engine = HudEngine::new(
                blueprint.engine_config(),
                EngineParts {
                    bus: Box::new(bus),
                    params: Box::new(MemoryParamStore::new()),
                    sound: Box::new(sound.clone()),
                    vision: Box::new(MockVisionTransport::new(vision)),
                    uploader: Box::new(NoTextures),
                    clock: Box::new(FixedClock(0)),
                },
            );

            Self {
                engine,
                scenario: DriveScenario::new(scenario).unwrap(),
                publisher,
                sound,
                tick: 0,
            }
        }

        fn step(&mut self) -> TickReport {
            self.tick += 1;
            self.scenario.publish_tick(self.tick, &self.publisher).unwrap();
            self.engine.tick()
        }

        /// Run through `last` inclusive
        fn run_until(&mut self, last: u64) -> Vec<TickReport> {
            let mut reports = Vec::new();
            while self.tick < last {
                reports.push(self.step());
            }
            reports
        }

        fn sounds(&self) -> Vec<SoundEvent> {
            self.sound.0.lock().unwrap().clone()
        }
    }

    #[test]
    fn test_drive_goes_onroad_and_engages() {
        let mut drive = Drive::new(ScenarioConfig::default());

        drive.run_until(9);
        assert!(!drive.engine.scene().started);
        assert_eq!(drive.engine.status(), UiStatus::Offroad);

        // device state is published every 10 ticks at 20 Hz
        let report = drive.step();
        assert_eq!(
            report.transition,
            Some(Transition::Onroad {
                source: CameraSource::Road
            })
        );
        assert_eq!(drive.engine.status(), UiStatus::Disengaged);
        assert!(drive.engine.scene().sidebar_collapsed);
        assert_eq!(drive.engine.scene().started_frame, 10);
        assert_eq!(drive.engine.vision_state(), ConnectionState::Connected);

        let reports = drive.run_until(45);
        assert_eq!(drive.engine.status(), UiStatus::Engaged);
        assert!(reports.iter().all(|r| r.watchdog == WatchdogState::Idle));

        let scene = drive.engine.scene();
        assert!(scene.world_objects_visible);
        assert!(!scene.track_vertices.is_empty());
        assert!(reports.last().unwrap().meta.total_vertices() > 0);
        assert!(scene.lead_data[0].status);
        assert!(drive.engine.last_frame().is_some());
        assert!(drive.sounds().is_empty());
    }

    #[test]
    fn test_zero_calibration_is_axis_permutation() {
        let mut drive = Drive::new(ScenarioConfig::default());
        drive.run_until(10);

        assert_eq!(
            drive.engine.scene().view_from_calib,
            [[0.0, 1.0, 0.0], [0.0, 0.0, 1.0], [1.0, 0.0, 0.0]]
        );
    }

    #[test]
    fn test_controls_dropout_escalates_once() {
        let mut drive = Drive::new(ScenarioConfig {
            controls_dropout: Some(100..160),
            ..Default::default()
        });

        drive.run_until(99);
        assert_eq!(drive.engine.status(), UiStatus::Engaged);

        let reports = drive.run_until(159);
        let escalations: Vec<u64> = reports
            .iter()
            .filter(|r| r.meta.watchdog_escalated)
            .map(|r| r.meta.frame)
            .collect();
        // last controls at frame 99; stale once the gap exceeds 10 ticks
        assert_eq!(escalations, vec![110]);
        assert!(reports[..10]
            .iter()
            .all(|r| r.watchdog == WatchdogState::Idle));
        assert!(reports[11..]
            .iter()
            .all(|r| r.watchdog == WatchdogState::Unresponsive { escalated: false }));
        assert_eq!(drive.engine.status(), UiStatus::Alert);
        assert_eq!(drive.engine.scene().alert.text1, UNRESPONSIVE_TEXT1);
        assert_eq!(
            drive.sounds(),
            vec![SoundEvent::Play(AudibleAlert::ChimeWarningRepeat)]
        );

        let report = drive.step();
        assert_eq!(report.watchdog, WatchdogState::Idle);
        assert_eq!(drive.engine.status(), UiStatus::Engaged);
        assert!(drive.engine.scene().alert.text1.is_empty());
    }

    #[test]
    fn test_waiting_for_controls_after_start() {
        let mut drive = Drive::new(ScenarioConfig {
            controls_dropout: Some(0..1000),
            ..Default::default()
        });

        let reports = drive.run_until(40);
        assert_eq!(
            reports.last().unwrap().watchdog,
            WatchdogState::WaitingForControls
        );
        // started at frame 10, the wait covers frames 11..=30
        assert_eq!(reports[29].watchdog, WatchdogState::Idle);
        assert_eq!(reports[30].watchdog, WatchdogState::WaitingForControls);

        let alert = &drive.engine.scene().alert;
        assert_eq!(alert.text1, WAITING_TEXT1);
        assert_eq!(alert.text2, WAITING_TEXT2);
        assert_eq!(drive.engine.status(), UiStatus::Disengaged);
        assert!(drive.sounds().is_empty());
    }

    #[test]
    fn test_prompt_sound_follows_alert_type_changes() {
        let mut drive = Drive::new(ScenarioConfig {
            prompt_alert: Some(50..70),
            ..Default::default()
        });

        drive.run_until(60);
        assert_eq!(drive.engine.status(), UiStatus::Warning);
        assert_eq!(drive.engine.scene().alert.text1, "KEEP EYES ON ROAD");

        drive.run_until(80);
        assert_eq!(drive.engine.status(), UiStatus::Engaged);
        assert_eq!(
            drive.sounds(),
            vec![SoundEvent::Play(AudibleAlert::ChimePrompt), SoundEvent::Stop]
        );
    }

    #[test]
    fn test_offroad_mid_alert() {
        let mut drive = Drive::new(ScenarioConfig {
            stop_tick: Some(200),
            prompt_alert: Some(150..250),
            ..Default::default()
        });

        drive.run_until(199);
        assert_eq!(drive.engine.status(), UiStatus::Warning);

        let report = drive.step();
        assert_eq!(report.transition, Some(Transition::Offroad));
        assert_eq!(drive.engine.status(), UiStatus::Offroad);
        assert!(!drive.engine.scene().sidebar_collapsed);
        assert_eq!(drive.engine.vision_state(), ConnectionState::Disconnected);
        assert_eq!(drive.sounds().last(), Some(&SoundEvent::Stop));

        let reports = drive.run_until(260);
        assert!(reports.iter().all(|r| r.transition.is_none()));
        assert!(reports.iter().all(|r| r.watchdog == WatchdogState::Idle));
        assert_eq!(drive.engine.status(), UiStatus::Offroad);
        assert_eq!(drive.engine.vision_state(), ConnectionState::Disconnected);
    }

    #[test]
    fn test_status_never_offroad_while_started() {
        let mut drive = Drive::new(ScenarioConfig {
            stop_tick: Some(300),
            controls_dropout: Some(100..160),
            prompt_alert: Some(200..240),
            ..Default::default()
        });

        for _ in 0..400 {
            drive.step();
            let scene = drive.engine.scene();
            assert!(
                !(scene.started && scene.status == UiStatus::Offroad),
                "offroad while started at frame {}",
                drive.engine.frame()
            );
        }
    }

    #[test]
    fn test_vision_reconnect_hides_world_until_calibration() {
        let mut drive = Drive::with_vision(
            ScenarioConfig::default(),
            MockVisionConfig {
                failed_connects: 3,
                timeout_every: Some(4),
                ..Default::default()
            },
        );

        // connect attempts on frames 10, 11, 12 are refused
        let reports = drive.run_until(12);
        assert!(reports.iter().all(|r| !r.vision.connected_now));
        assert_eq!(drive.engine.vision_state(), ConnectionState::Disconnected);

        let report = drive.step();
        assert!(report.vision.connected_now);
        assert!(!drive.engine.scene().world_objects_visible);
        drive.step();
        assert!(!drive.engine.scene().world_objects_visible);

        // calibration arrives every 5 ticks
        drive.step();
        assert!(drive.engine.scene().world_objects_visible);

        let reports = drive.run_until(40);
        let timeouts = reports.iter().filter(|r| r.meta.vision_timeout).count();
        assert!(timeouts > 0);
        assert!(drive.engine.last_frame().is_some());
    }

    #[test]
    fn test_run_summary_from_tick_meta() {
        let mut drive = Drive::new(ScenarioConfig {
            controls_dropout: Some(100..160),
            ..Default::default()
        });

        let mut aggregator = TickMetricsAggregator::new();
        for report in drive.run_until(200) {
            aggregator.update(&report.meta);
        }

        let summary = aggregator.summary();
        assert_eq!(summary.total_ticks, 200);
        assert_eq!(summary.watchdog_escalations, 1);
        assert_eq!(summary.offroad_ticks, 9);
        assert_eq!(summary.alert_ticks, 50);
        assert!(summary.vision_frames > 0);
        assert_eq!(summary.vision_connects, 1);
    }

    /// Engine snapshots -> Dispatcher -> file sink
    #[tokio::test]
    async fn test_e2e_snapshots_reach_file_sink() {
        let dir = tempfile::tempdir().unwrap();
        let sink_configs = vec![
            SinkConfig {
                name: "scene_log".to_string(),
                sink_type: SinkType::Log,
                queue_capacity: 64,
                params: HashMap::from([("every".to_string(), "10".to_string())]),
            },
            SinkConfig {
                name: "scene_file".to_string(),
                sink_type: SinkType::File,
                queue_capacity: 64,
                params: HashMap::from([
                    (
                        "base_path".to_string(),
                        dir.path().to_string_lossy().to_string(),
                    ),
                    ("session".to_string(), "drive".to_string()),
                ]),
            },
        ];

        let (scene_tx, scene_rx) = mpsc::channel::<SceneFrame>(64);
        let dispatcher = create_dispatcher(sink_configs, scene_rx).await.unwrap();
        let dispatcher_handle = dispatcher.spawn();

        let mut drive = Drive::new(ScenarioConfig::default());
        for _ in 0..50 {
            drive.step();
            scene_tx.send(drive.engine.snapshot()).await.unwrap();
        }
        drop(scene_tx);
        let summary = dispatcher_handle.await.unwrap();
        assert_eq!(summary.frames, 50);

        let content =
            std::fs::read_to_string(dir.path().join("drive").join("scene.jsonl")).unwrap();
        let frames: Vec<SceneFrame> = content
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();
        assert_eq!(frames.len(), 50);
        assert_eq!(frames[0].tick, 1);
        assert_eq!(frames[0].scene.status, UiStatus::Offroad);

        let last = frames.last().unwrap();
        assert_eq!(last.tick, 50);
        assert_eq!(last.scene.status, UiStatus::Engaged);
        assert_eq!(last.camera_source, CameraSource::Road);
        assert!(last.last_frame_id.is_some());
    }
}
