//! Scripted drive scenario
//!
//! Produces the telemetry a real drive would publish, tick by tick, without
//! any vehicle: device start/stop, calibration, perception model, radar lead,
//! controller state (with optional prompt alerts and dropouts), vehicle CAN
//! state, link health, positioning and raw sensors.

use std::ops::Range;

use contracts::{
    AlertSize, AlertStatus, AudibleAlert, Calibration, CameraExposure, ControlsState,
    DeviceState, GatewayType, GearShifter, GnssReport, GpsFix, LanePlan, LateralControlState,
    LeadData, LinkHealth, Localization, Message, ModelOutput, RadarState, SensorEvent,
    TirePressures, VehicleParams, VehicleState, XyztLine, TRAJECTORY_SIZE,
};
use tracing::trace;

use crate::bus::BusPublisher;
use crate::error::{IngestionError, Result};

/// Longitudinal sample positions of every model line (m)
pub fn trajectory_x() -> Vec<f32> {
    let last = (TRAJECTORY_SIZE - 1) as f32;
    (0..TRAJECTORY_SIZE)
        .map(|i| {
            let r = i as f32 / last;
            192.0 * r * r
        })
        .collect()
}

/// Scenario script
#[derive(Debug, Clone)]
pub struct ScenarioConfig {
    /// First tick the device reports started
    pub start_tick: u64,
    /// First tick the device reports stopped again
    pub stop_tick: Option<u64>,
    /// First tick the controller reports enabled
    pub engage_tick: Option<u64>,
    /// Ticks during which the controller publishes nothing
    pub controls_dropout: Option<Range<u64>>,
    /// Ticks during which the controller raises a user-prompt alert
    pub prompt_alert: Option<Range<u64>>,
    /// Tick at which the left blinker turns on
    pub blinker_tick: Option<u64>,
    /// Radar lead distance (m); no lead when `None`
    pub lead_distance: Option<f32>,
    /// Ego speed (m/s)
    pub speed: f32,
    /// Calibration roll/pitch/yaw (rad)
    pub rpy_calib: [f32; 3],
    /// Nominal tick rate; slower topics publish at fractions of it
    pub tick_hz: u32,
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self {
            start_tick: 5,
            stop_tick: None,
            engage_tick: Some(40),
            controls_dropout: None,
            prompt_alert: None,
            blinker_tick: None,
            lead_distance: Some(40.0),
            speed: 20.0,
            rpy_calib: [0.0, 0.0, 0.0],
            tick_hz: 20,
        }
    }
}

/// Scripted telemetry producer
#[derive(Debug, Clone)]
pub struct DriveScenario {
    config: ScenarioConfig,
    xs: Vec<f32>,
}

impl DriveScenario {
    pub fn new(config: ScenarioConfig) -> Result<Self> {
        if config.tick_hz == 0 {
            return Err(IngestionError::InvalidScenario {
                message: "tick_hz must be > 0".into(),
            });
        }
        if let Some(stop) = config.stop_tick {
            if stop <= config.start_tick {
                return Err(IngestionError::InvalidScenario {
                    message: format!(
                        "stop_tick ({stop}) must be after start_tick ({})",
                        config.start_tick
                    ),
                });
            }
        }
        Ok(Self {
            config,
            xs: trajectory_x(),
        })
    }

    pub fn config(&self) -> &ScenarioConfig {
        &self.config
    }

    fn started(&self, tick: u64) -> bool {
        tick >= self.config.start_tick && self.config.stop_tick.is_none_or(|stop| tick < stop)
    }

    fn in_range(range: &Option<Range<u64>>, tick: u64) -> bool {
        range.as_ref().is_some_and(|r| r.contains(&tick))
    }

    /// Every `n`-th tick of a period given in fractions of a second
    fn every(&self, tick: u64, per_second: u32) -> bool {
        let period = u64::from((self.config.tick_hz / per_second).max(1));
        tick % period == 0
    }

    /// Messages published during `tick`
    pub fn messages_for_tick(&self, tick: u64) -> Vec<Message> {
        let started = self.started(tick);
        let mut out = Vec::new();

        if self.every(tick, 2) {
            out.push(self.device_state(started));
            out.push(Message::LinkHealth(LinkHealth {
                gateway_type: GatewayType::Uno,
                ignition_line: started,
                ignition_can: false,
            }));
        }
        if self.every(tick, 1) {
            out.push(Message::GpsExternal(GpsFix {
                accuracy: 1.5,
                altitude: 42.0,
                bearing_deg: 90.0,
            }));
            out.push(Message::GnssReport(GnssReport::MeasurementReport { num_meas: 9 }));
            out.push(Message::Localization(Localization { gps_ok: true }));
            out.push(Message::VehicleParams(VehicleParams {
                longitudinal_control: true,
            }));
        }
        out.push(Message::SensorEvents(vec![
            SensorEvent::Acceleration(vec![0.1, 0.0, 9.81]),
            SensorEvent::GyroUncalibrated(vec![0.0, 0.002, 0.0]),
            SensorEvent::Light(300.0),
        ]));
        out.push(Message::RoadCameraState(CameraExposure {
            gain_frac: 1.0,
            global_gain: 50,
            integ_lines: 800,
        }));

        if !started {
            return out;
        }

        if self.every(tick, 4) {
            out.push(Message::Calibration(Calibration {
                rpy_calib: self.config.rpy_calib.to_vec(),
            }));
        }
        out.push(Message::Model(self.model_output()));
        out.push(Message::RadarState(self.radar_state()));
        out.push(Message::VehicleState(self.vehicle_state(tick)));
        out.push(Message::LanePlan(LanePlan {
            lane_width: 3.6,
            d_prob: 0.9,
            l_prob: 0.95,
            r_prob: 0.95,
            steer_rate_cost: 0.7,
            standstill_elapsed_time: 0.0,
            laneless_mode: false,
        }));
        if !Self::in_range(&self.config.controls_dropout, tick) {
            out.push(Message::ControlsState(self.controls_state(tick)));
        }

        trace!(tick, count = out.len(), "scenario tick");
        out
    }

    /// Publish this tick's messages; returns how many were sent
    pub fn publish_tick(&self, tick: u64, publisher: &BusPublisher) -> Result<usize> {
        let messages = self.messages_for_tick(tick);
        let count = messages.len();
        for msg in messages {
            publisher.publish(msg)?;
        }
        Ok(count)
    }

    fn device_state(&self, started: bool) -> Message {
        Message::DeviceState(DeviceState {
            started,
            cpu_usage_percent: 35.0,
            cpu_temp_c: vec![48.5, 47.0],
            fan_speed_percent_desired: 30,
            ip_addr: "192.168.43.1".into(),
        })
    }

    fn line(&self, y: f32, z: f32) -> XyztLine {
        let xs = self.xs.clone();
        let t = xs
            .iter()
            .map(|x| x / self.config.speed.max(1.0))
            .collect();
        // gentle right-hand curve
        let ys = xs.iter().map(|x| y + 0.0005 * x * x).collect();
        XyztLine {
            y: ys,
            z: vec![z; xs.len()],
            t,
            x: xs,
        }
    }

    fn model_output(&self) -> ModelOutput {
        ModelOutput {
            position: self.line(0.0, 0.0),
            lane_lines: [-5.4, -1.8, 1.8, 5.4]
                .iter()
                .map(|&y| self.line(y, 0.0))
                .collect(),
            lane_line_probs: vec![0.2, 0.9, 0.9, 0.2],
            road_edges: [-7.0, 7.0].iter().map(|&y| self.line(y, 0.0)).collect(),
            road_edge_stds: vec![0.5, 0.5],
        }
    }

    fn radar_state(&self) -> RadarState {
        let lead_one = match self.config.lead_distance {
            Some(d_rel) => LeadData {
                status: true,
                d_rel,
                y_rel: 0.3,
                v_rel: -1.0,
                a_rel: 0.0,
            },
            None => LeadData::default(),
        };
        RadarState {
            lead_one,
            lead_two: LeadData::default(),
        }
    }

    fn vehicle_state(&self, tick: u64) -> VehicleState {
        VehicleState {
            v_ego: self.config.speed,
            left_blinker: self.config.blinker_tick.is_some_and(|t| tick >= t),
            right_blinker: false,
            gear_shifter: GearShifter::Drive,
            tpms: TirePressures {
                fl: 36.0,
                fr: 36.0,
                rl: 35.0,
                rr: 35.0,
            },
            radar_distance: self.config.lead_distance.unwrap_or(0.0),
            v_set_dis: self.config.speed * 3.6 + 10.0,
            cruise_acc_status: true,
            steering_angle_deg: 1.5,
            ..Default::default()
        }
    }

    fn controls_state(&self, tick: u64) -> ControlsState {
        let enabled = self.config.engage_tick.is_some_and(|t| tick >= t);
        let mut state = ControlsState {
            enabled,
            lateral_control_state: LateralControlState::Lqr { output: 0.12 },
            steering_angle_desired_deg: 1.2,
            steer_ratio: 13.5,
            ..Default::default()
        };
        if Self::in_range(&self.config.prompt_alert, tick) {
            state.alert_text1 = "KEEP EYES ON ROAD".into();
            state.alert_text2 = "Driver Appears Distracted".into();
            state.alert_size = AlertSize::Mid;
            state.alert_status = AlertStatus::UserPrompt;
            state.alert_type = "promptDriverDistracted/permanent".into();
            state.alert_sound = AudibleAlert::ChimePrompt;
            state.alert_blinking_rate = 0.5;
        }
        state
    }
}
