//! Scene - the canonical per-tick snapshot handed to the renderer
//!
//! Mutated only from the engine's update tick; everything downstream gets a
//! shared reference or a cloned `SceneFrame`.

use serde::{Deserialize, Serialize};

use crate::{
    AlertSize, AudibleAlert, DriverMonitoring, DriverState, GatewayType, GearShifter, LanePlan,
    LeadData, LiveParameters, TirePressures, TRAJECTORY_SIZE,
};

/// Vertex capacity of every projected polyline: one forward and one backward
/// pass over the trajectory.
pub const LINE_VERTEX_CAPACITY: usize = 2 * TRAJECTORY_SIZE;

/// Number of lane lines drawn
pub const LANE_LINE_COUNT: usize = 4;

/// Number of road edges drawn
pub const ROAD_EDGE_COUNT: usize = 2;

/// Operating status shown to the driver
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UiStatus {
    #[default]
    Offroad,
    Disengaged,
    Engaged,
    Warning,
    Alert,
}

impl UiStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            UiStatus::Offroad => "offroad",
            UiStatus::Disengaged => "disengaged",
            UiStatus::Engaged => "engaged",
            UiStatus::Warning => "warning",
            UiStatus::Alert => "alert",
        }
    }
}

/// Backend connectivity indicator
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NetStatus {
    Connected,
    #[default]
    Disconnected,
    Error,
}

/// Camera stream shown behind the overlay
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CameraSource {
    /// Forward-road narrow camera
    #[default]
    Road,
    /// Forward-road wide camera
    WideRoad,
    /// Driver-facing camera (self-view)
    Driver,
}

/// A projected point in framebuffer pixels
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vertex {
    pub x: f32,
    pub y: f32,
}

impl Vertex {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Returned when a bounded vertex buffer is already full
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VertexOverflow {
    pub capacity: usize,
}

/// Bounded append-only vertex buffer.
///
/// Capacity is fixed at construction; `push` refuses (and reports) anything
/// past it instead of writing out of bounds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VertexBuffer {
    vertices: Vec<Vertex>,
    capacity: usize,
}

impl VertexBuffer {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            vertices: Vec::with_capacity(capacity),
            capacity,
        }
    }

    /// Append one vertex
    #[inline]
    pub fn push(&mut self, vertex: Vertex) -> Result<(), VertexOverflow> {
        if self.vertices.len() >= self.capacity {
            return Err(VertexOverflow {
                capacity: self.capacity,
            });
        }
        self.vertices.push(vertex);
        Ok(())
    }

    /// Drop all vertices, keeping the capacity
    #[inline]
    pub fn clear(&mut self) {
        self.vertices.clear();
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    #[inline]
    pub fn as_slice(&self) -> &[Vertex] {
        &self.vertices
    }
}

impl Default for VertexBuffer {
    fn default() -> Self {
        Self::with_capacity(LINE_VERTEX_CAPACITY)
    }
}

/// Alert fields currently displayed
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AlertView {
    pub text1: String,
    pub text2: String,
    pub size: AlertSize,
    pub alert_type: String,
    pub sound: AudibleAlert,
    pub blinking_rate: f32,
}

/// Controller details mirrored for the debug overlay
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ControlsView {
    pub enabled: bool,
    pub lateral_control_method: i32,
    pub output_scale: f32,
    pub angle_steers_des: f32,
    pub debug_text1: String,
    pub debug_text2: String,
    pub speed_camera_limit: f32,
    pub speed_camera_distance: f32,
    pub steer_ratio: f32,
}

/// Vehicle CAN fields
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VehicleView {
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
    pub angle_steers: f32,
    /// Ticks left in the blinker animation; reset on any blinker edge
    pub blinker_blinking_rate: u32,
    pub longitudinal_control: bool,
}

/// Device health fields
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeviceView {
    pub started: bool,
    pub cpu_perc: f32,
    pub cpu_temp: f32,
    pub fan_speed: u16,
    pub ip_addr: String,
    pub gateway_type: GatewayType,
    pub ignition: bool,
    pub light_sensor: f32,
    /// Latched before start for zero-speed calibration UI
    pub accel_sensor: f32,
    pub gyro_sensor: f32,
}

/// Positioning fields
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GnssView {
    /// -1 until the first measurement report
    pub satellite_count: i32,
    pub accuracy: f32,
    pub altitude: f64,
    pub bearing: f32,
    pub gps_ok: bool,
}

impl Default for GnssView {
    fn default() -> Self {
        Self {
            satellite_count: -1,
            accuracy: 0.0,
            altitude: 0.0,
            bearing: 0.0,
            gps_ok: false,
        }
    }
}

/// Persisted settings mirrored into live state
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LiveSettings {
    pub is_metric: bool,
    /// Self-view-only mode: suppresses the "waiting for controls" alert
    pub self_view_only: bool,
    /// Preview the driver-facing camera instead of the road camera
    pub driver_view: bool,
    pub ui_brightness: i32,
    pub ui_volume_boost: i32,
    pub lat_control: i32,
    pub driving_record: bool,
    pub end_to_end: bool,
    pub auto_screen_dimming: bool,
    pub blind_spot_detect: bool,
    pub debug_ui1: bool,
    pub debug_ui2: bool,
    pub speed_limit_offset: i32,
    pub laneless_mode: i32,
}

/// The renderer-ready snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scene {
    pub started: bool,
    /// Bus frame at the last offroad→onroad transition
    pub started_frame: u64,
    pub status: UiStatus,
    pub sidebar_collapsed: bool,
    pub is_rhd: bool,

    /// False until the first calibration arrives (and after every camera reconnect)
    pub world_objects_visible: bool,
    /// Row-major rotation from the calibrated frame to the camera-view frame
    pub view_from_calib: [[f32; 3]; 3],

    pub lead_vertices: [Vertex; 2],
    pub lead_data: [LeadData; 2],
    pub lane_line_vertices: [VertexBuffer; LANE_LINE_COUNT],
    pub lane_line_probs: [f32; LANE_LINE_COUNT],
    pub road_edge_vertices: [VertexBuffer; ROAD_EDGE_COUNT],
    pub road_edge_stds: [f32; ROAD_EDGE_COUNT],
    pub track_vertices: VertexBuffer,

    pub alert: AlertView,
    pub controls: ControlsView,
    pub vehicle: VehicleView,
    pub live_params: LiveParameters,
    pub device: DeviceView,
    pub gnss: GnssView,
    pub lane_plan: LanePlan,
    pub driver_state: DriverState,
    pub driver_monitoring: DriverMonitoring,

    pub settings: LiveSettings,
    pub net_status: NetStatus,
}

impl Default for Scene {
    fn default() -> Self {
        Self {
            started: false,
            started_frame: 0,
            status: UiStatus::Offroad,
            sidebar_collapsed: false,
            is_rhd: false,
            world_objects_visible: false,
            view_from_calib: [[0.0; 3]; 3],
            lead_vertices: [Vertex::default(); 2],
            lead_data: [LeadData::default(); 2],
            lane_line_vertices: Default::default(),
            lane_line_probs: [0.0; LANE_LINE_COUNT],
            road_edge_vertices: Default::default(),
            road_edge_stds: [0.0; ROAD_EDGE_COUNT],
            track_vertices: VertexBuffer::default(),
            alert: AlertView::default(),
            controls: ControlsView::default(),
            vehicle: VehicleView::default(),
            live_params: LiveParameters::default(),
            device: DeviceView::default(),
            gnss: GnssView::default(),
            lane_plan: LanePlan::default(),
            driver_state: DriverState::default(),
            driver_monitoring: DriverMonitoring::default(),
            settings: LiveSettings::default(),
            net_status: NetStatus::Disconnected,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vertex_buffer_rejects_past_capacity() {
        let mut buf = VertexBuffer::with_capacity(2);
        assert!(buf.push(Vertex::new(0.0, 0.0)).is_ok());
        assert!(buf.push(Vertex::new(1.0, 1.0)).is_ok());
        assert_eq!(
            buf.push(Vertex::new(2.0, 2.0)),
            Err(VertexOverflow { capacity: 2 })
        );
        assert_eq!(buf.len(), 2);

        buf.clear();
        assert!(buf.is_empty());
        assert_eq!(buf.capacity(), 2);
    }

    #[test]
    fn test_default_scene_is_offroad_and_invisible() {
        let scene = Scene::default();
        assert_eq!(scene.status, UiStatus::Offroad);
        assert!(!scene.started);
        assert!(!scene.world_objects_visible);
        assert_eq!(scene.gnss.satellite_count, -1);
        assert_eq!(scene.track_vertices.capacity(), LINE_VERTEX_CAPACITY);
    }
}
