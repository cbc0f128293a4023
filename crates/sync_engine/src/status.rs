//! Operating status, alert content and the controls liveness watchdog.

use contracts::{
    AlertSize, AlertStatus, AudibleAlert, CameraSource, ControlsState, HudEngineConfig,
    ParamStore, Scene, SoundPlayer, TelemetryBus, Topic, UiStatus,
};
use tracing::{info, warn};

use crate::refresh::param_keys;

pub const WAITING_TEXT1: &str = "Driver Assist Unavailable";
pub const WAITING_TEXT2: &str = "Waiting for controls to start";
pub const UNRESPONSIVE_TEXT1: &str = "TAKE CONTROL IMMEDIATELY";
pub const UNRESPONSIVE_TEXT2: &str = "Controls Unresponsive";

/// Forward-facing source for the device's camera capability
pub fn road_camera(wide_camera: bool) -> CameraSource {
    if wide_camera {
        CameraSource::WideRoad
    } else {
        CameraSource::Road
    }
}

/// Edge of the `started` flag observed this tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Vehicle started; the camera to connect
    Onroad { source: CameraSource },
    Offroad,
}

/// Outcome of the controls liveness check
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum WatchdogState {
    #[default]
    Idle,
    /// Started long enough but controls never arrived this drive
    WaitingForControls,
    /// Controls went stale; `escalated` only on the first tick of the episode
    Unresponsive { escalated: bool },
}

#[derive(Debug, Clone)]
pub struct StatusMachine {
    started_prev: bool,
    unresponsive_latched: bool,
    controls_wait: u64,
    controls_timeout: u64,
    wide_camera: bool,
}

impl StatusMachine {
    pub fn new(config: &HudEngineConfig) -> Self {
        Self {
            started_prev: false,
            unresponsive_latched: false,
            controls_wait: config.periods.controls_wait,
            controls_timeout: config.periods.controls_timeout,
            wide_camera: config.wide_camera,
        }
    }

    /// Camera used for a drive
    fn camera_for(&self, scene: &Scene) -> CameraSource {
        if scene.settings.driver_view {
            CameraSource::Driver
        } else {
            road_camera(self.wide_camera)
        }
    }

    /// Derive status from the controller and handle onroad/offroad edges.
    pub fn update_status(
        &mut self,
        scene: &mut Scene,
        controls: &ControlsState,
        bus: &dyn TelemetryBus,
        params: &dyn ParamStore,
        sound: &mut dyn SoundPlayer,
    ) -> Option<Transition> {
        if scene.started && bus.updated(Topic::ControlsState) {
            scene.status = match controls.alert_status {
                AlertStatus::UserPrompt => UiStatus::Warning,
                AlertStatus::Critical => UiStatus::Alert,
                AlertStatus::Normal if controls.enabled => UiStatus::Engaged,
                AlertStatus::Normal => UiStatus::Disengaged,
            };
        }

        if scene.started == self.started_prev {
            return None;
        }
        self.started_prev = scene.started;

        if scene.started {
            scene.status = UiStatus::Disengaged;
            scene.started_frame = bus.frame();
            match params.get_bool(param_keys::IS_RHD) {
                Ok(is_rhd) => scene.is_rhd = is_rhd,
                Err(e) => warn!(error = %e, "failed to read right-hand-drive flag"),
            }
            scene.sidebar_collapsed = true;
            scene.alert.size = AlertSize::None;
            self.unresponsive_latched = false;

            let source = self.camera_for(scene);
            info!(frame = scene.started_frame, ?source, "onroad");
            Some(Transition::Onroad { source })
        } else {
            scene.status = UiStatus::Offroad;
            scene.sidebar_collapsed = false;
            sound.stop();
            info!(frame = bus.frame(), "offroad");
            Some(Transition::Offroad)
        }
    }

    /// Copy controller alert content and run the liveness watchdog.
    pub fn update_alert(
        &mut self,
        scene: &mut Scene,
        controls: &ControlsState,
        bus: &dyn TelemetryBus,
        sound: &mut dyn SoundPlayer,
    ) -> WatchdogState {
        if bus.updated(Topic::ControlsState) {
            self.unresponsive_latched = false;

            if scene.alert.alert_type != controls.alert_type {
                match controls.alert_sound {
                    AudibleAlert::None => sound.stop(),
                    alert => sound.play(alert),
                }
            }
            let alert = &mut scene.alert;
            alert.text1.clone_from(&controls.alert_text1);
            alert.text2.clone_from(&controls.alert_text2);
            alert.size = controls.alert_size;
            alert.alert_type.clone_from(&controls.alert_type);
            alert.sound = controls.alert_sound;
            alert.blinking_rate = controls.alert_blinking_rate;
        }

        let frame = bus.frame();
        if !scene.device.started || frame.saturating_sub(scene.started_frame) <= self.controls_wait
        {
            return WatchdogState::Idle;
        }

        let cs_frame = bus.rcv_frame(Topic::ControlsState);
        if cs_frame < scene.started_frame {
            if !scene.settings.self_view_only {
                scene.alert.text1 = WAITING_TEXT1.into();
                scene.alert.text2 = WAITING_TEXT2.into();
                scene.alert.size = AlertSize::Mid;
            }
            WatchdogState::WaitingForControls
        } else if frame - cs_frame > self.controls_timeout {
            let escalated = !self.unresponsive_latched;
            if escalated {
                self.unresponsive_latched = true;
                sound.play(AudibleAlert::ChimeWarningRepeat);
                warn!(frame, last_controls = cs_frame, "controls unresponsive");
                metrics::counter!("hud_watchdog_escalations_total").increment(1);
            }
            scene.alert.text1 = UNRESPONSIVE_TEXT1.into();
            scene.alert.text2 = UNRESPONSIVE_TEXT2.into();
            scene.alert.size = AlertSize::Full;
            scene.status = UiStatus::Alert;
            WatchdogState::Unresponsive { escalated }
        } else {
            WatchdogState::Idle
        }
    }
}
