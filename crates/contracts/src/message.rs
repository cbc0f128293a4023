//! Message - telemetry payloads
//!
//! One payload struct per topic. Variant-tagged payloads (positioning report
//! kind, sensor event kind, lateral controller kind) are sum types so handlers
//! match exhaustively instead of switching on runtime tags.

use serde::{Deserialize, Serialize};

use crate::Topic;

/// Number of samples in every model trajectory line
pub const TRAJECTORY_SIZE: usize = 33;

/// A payload received on the telemetry bus.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "topic", content = "payload", rename_all = "snake_case")]
pub enum Message {
    Calibration(Calibration),
    RadarState(RadarState),
    Model(ModelOutput),
    ControlsState(ControlsState),
    VehicleState(VehicleState),
    LiveParameters(LiveParameters),
    DeviceState(DeviceState),
    LinkHealth(LinkHealth),
    GnssReport(GnssReport),
    GpsExternal(GpsFix),
    Localization(Localization),
    VehicleParams(VehicleParams),
    DriverState(DriverState),
    DriverMonitoring(DriverMonitoring),
    SensorEvents(Vec<SensorEvent>),
    RoadCameraState(CameraExposure),
    LanePlan(LanePlan),
}

impl Message {
    /// Topic this payload belongs to
    pub fn topic(&self) -> Topic {
        match self {
            Message::Calibration(_) => Topic::Calibration,
            Message::RadarState(_) => Topic::RadarState,
            Message::Model(_) => Topic::Model,
            Message::ControlsState(_) => Topic::ControlsState,
            Message::VehicleState(_) => Topic::VehicleState,
            Message::LiveParameters(_) => Topic::LiveParameters,
            Message::DeviceState(_) => Topic::DeviceState,
            Message::LinkHealth(_) => Topic::LinkHealth,
            Message::GnssReport(_) => Topic::GnssReport,
            Message::GpsExternal(_) => Topic::GpsExternal,
            Message::Localization(_) => Topic::Localization,
            Message::VehicleParams(_) => Topic::VehicleParams,
            Message::DriverState(_) => Topic::DriverState,
            Message::DriverMonitoring(_) => Topic::DriverMonitoring,
            Message::SensorEvents(_) => Topic::SensorEvents,
            Message::RoadCameraState(_) => Topic::RoadCameraState,
            Message::LanePlan(_) => Topic::LanePlan,
        }
    }
}

// ===== Perception =====

/// Ordered 3D samples with per-sample time, in the calibrated frame
/// (x forward, y right, z down).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct XyztLine {
    pub x: Vec<f32>,
    pub y: Vec<f32>,
    pub z: Vec<f32>,
    #[serde(default)]
    pub t: Vec<f32>,
}

impl XyztLine {
    /// Number of complete (x, y, z) samples
    pub fn len(&self) -> usize {
        self.x.len().min(self.y.len()).min(self.z.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Perception model output
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelOutput {
    /// Predicted drivable centerline
    pub position: XyztLine,
    /// Lane lines, outer-left to outer-right
    pub lane_lines: Vec<XyztLine>,
    pub lane_line_probs: Vec<f32>,
    /// Road edges, left then right
    pub road_edges: Vec<XyztLine>,
    pub road_edge_stds: Vec<f32>,
}

/// Single radar lead track
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LeadData {
    /// Track is valid
    pub status: bool,
    /// Longitudinal distance (m)
    pub d_rel: f32,
    /// Lateral offset (m, left positive)
    pub y_rel: f32,
    /// Relative speed (m/s)
    pub v_rel: f32,
    /// Relative acceleration (m/s²)
    pub a_rel: f32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RadarState {
    pub lead_one: LeadData,
    pub lead_two: LeadData,
}

/// Calibration estimate: roll, pitch, yaw (rad) of the device relative to the
/// calibrated vehicle frame.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Calibration {
    pub rpy_calib: Vec<f32>,
}

// ===== Controls =====

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertSize {
    #[default]
    None,
    Small,
    Mid,
    Full,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertStatus {
    #[default]
    Normal,
    UserPrompt,
    Critical,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AudibleAlert {
    #[default]
    None,
    ChimeEngage,
    ChimeDisengage,
    ChimeError,
    ChimeWarning1,
    ChimeWarning2,
    ChimeWarningRepeat,
    ChimePrompt,
    ChimeWarning2Repeat,
}

/// Active lateral controller and its normalized output
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LateralControlState {
    Pid { output: f32 },
    Indi { output: f32 },
    Lqr { output: f32 },
    Angle { output: f32 },
}

impl LateralControlState {
    /// Numeric controller selector as persisted in the settings store
    pub fn method(&self) -> i32 {
        match self {
            LateralControlState::Pid { .. } => 0,
            LateralControlState::Indi { .. } => 1,
            LateralControlState::Lqr { .. } => 2,
            LateralControlState::Angle { .. } => 3,
        }
    }

    pub fn output(&self) -> f32 {
        match *self {
            LateralControlState::Pid { output }
            | LateralControlState::Indi { output }
            | LateralControlState::Lqr { output }
            | LateralControlState::Angle { output } => output,
        }
    }
}

impl Default for LateralControlState {
    fn default() -> Self {
        LateralControlState::Pid { output: 0.0 }
    }
}

/// Controller state and the alert it wants displayed
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ControlsState {
    pub enabled: bool,
    pub alert_text1: String,
    pub alert_text2: String,
    pub alert_size: AlertSize,
    pub alert_status: AlertStatus,
    /// Alert identity; audio only transitions when this changes
    pub alert_type: String,
    pub alert_sound: AudibleAlert,
    pub alert_blinking_rate: f32,
    pub lateral_control_state: LateralControlState,
    pub steering_angle_desired_deg: f32,
    #[serde(default)]
    pub debug_text1: String,
    #[serde(default)]
    pub debug_text2: String,
    #[serde(default)]
    pub speed_camera_limit: f32,
    #[serde(default)]
    pub speed_camera_distance: f32,
    #[serde(default)]
    pub steer_ratio: f32,
}

// ===== Vehicle =====

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GearShifter {
    #[default]
    Unknown,
    Park,
    Drive,
    Neutral,
    Reverse,
    Sport,
    Low,
    Brake,
    Eco,
    Manumatic,
}

/// Tire pressures (front-left, front-right, rear-left, rear-right)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TirePressures {
    pub fl: f32,
    pub fr: f32,
    pub rl: f32,
    pub rr: f32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VehicleState {
    pub v_ego: f32,
    pub left_blinker: bool,
    pub right_blinker: bool,
    pub left_blindspot: bool,
    pub right_blindspot: bool,
    pub brake_pressed: bool,
    pub brake_lights: bool,
    pub gear_shifter: GearShifter,
    pub tpms: TirePressures,
    pub radar_distance: f32,
    pub stand_still: bool,
    pub v_set_dis: f32,
    pub cruise_acc_status: bool,
    pub steering_angle_deg: f32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LiveParameters {
    pub angle_offset_deg: f32,
    pub angle_offset_average_deg: f32,
    pub stiffness_factor: f32,
    pub steer_ratio: f32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct VehicleParams {
    pub longitudinal_control: bool,
}

// ===== Device =====

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeviceState {
    pub started: bool,
    pub cpu_usage_percent: f32,
    pub cpu_temp_c: Vec<f32>,
    pub fan_speed_percent_desired: u16,
    pub ip_addr: String,
}

/// Hardware identity of the ECU gateway
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GatewayType {
    #[default]
    Unknown,
    White,
    Grey,
    Black,
    Pedal,
    Uno,
    Dos,
    Red,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LinkHealth {
    pub gateway_type: GatewayType,
    pub ignition_line: bool,
    pub ignition_can: bool,
}

/// Road camera exposure, used to estimate ambient light on devices without
/// a dedicated light sensor
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CameraExposure {
    pub gain_frac: f32,
    pub global_gain: u32,
    pub integ_lines: u32,
}

// ===== Positioning =====

/// Raw positioning receiver report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GnssReport {
    MeasurementReport { num_meas: u32 },
    Ephemeris,
    IonoData,
    HwStatus,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct GpsFix {
    pub accuracy: f32,
    pub altitude: f64,
    pub bearing_deg: f32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Localization {
    pub gps_ok: bool,
}

// ===== Driver =====

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DriverState {
    pub face_prob: f32,
    pub face_position: Vec<f32>,
    pub face_orientation: Vec<f32>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DriverMonitoring {
    pub face_detected: bool,
    pub is_distracted: bool,
    pub awareness_status: f32,
    pub is_rhd: bool,
}

// ===== Sensors =====

/// One raw sample from the sensor-fusion stream
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "v", rename_all = "snake_case")]
pub enum SensorEvent {
    Light(f32),
    Acceleration(Vec<f32>),
    GyroUncalibrated(Vec<f32>),
    Other,
}

// ===== Planning =====

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LanePlan {
    pub lane_width: f32,
    pub d_prob: f32,
    pub l_prob: f32,
    pub r_prob: f32,
    pub steer_rate_cost: f32,
    pub standstill_elapsed_time: f32,
    pub laneless_mode: bool,
}
