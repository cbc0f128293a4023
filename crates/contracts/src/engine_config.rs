//! HUD engine configuration contracts shared across crates.
//!
//! Everything here is decided once at startup; the engine never re-reads it.

use serde::{Deserialize, Serialize};

/// Where the ambient light estimate comes from
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LightSource {
    /// Dedicated light sensor on the sensor-fusion stream
    #[default]
    SensorEvents,
    /// Derived from road camera exposure
    RoadCamera,
}

/// Pinhole intrinsics of one camera
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraIntrinsics {
    pub fx: f32,
    pub fy: f32,
    pub cx: f32,
    pub cy: f32,
}

impl CameraIntrinsics {
    pub fn road() -> Self {
        Self {
            fx: 2648.0,
            fy: 2648.0,
            cx: 964.0,
            cy: 604.0,
        }
    }

    pub fn wide() -> Self {
        Self {
            fx: 567.0,
            fy: 567.0,
            cx: 964.0,
            cy: 604.0,
        }
    }

    /// Row-major 3×3 intrinsic matrix
    pub fn matrix(&self) -> [[f32; 3]; 3] {
        [
            [self.fx, 0.0, self.cx],
            [0.0, self.fy, self.cy],
            [0.0, 0.0, 1.0],
        ]
    }
}

/// Road and wide camera intrinsics
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraConfig {
    #[serde(default = "CameraIntrinsics::road")]
    pub road: CameraIntrinsics,
    #[serde(default = "CameraIntrinsics::wide")]
    pub wide: CameraIntrinsics,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            road: CameraIntrinsics::road(),
            wide: CameraIntrinsics::wide(),
        }
    }
}

/// Framebuffer and car-space viewport parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DisplayConfig {
    /// Framebuffer width (pixels)
    #[serde(default = "default_fb_width")]
    pub width: u32,
    /// Framebuffer height (pixels)
    #[serde(default = "default_fb_height")]
    pub height: u32,
    /// Zoom numerator; the effective zoom is `zoom / fx` (halved for the wide camera)
    #[serde(default = "default_zoom")]
    pub zoom: f32,
    /// Vertical shift of the projected image center (pixels)
    #[serde(default)]
    pub y_offset: f32,
    /// Off-screen tolerance on every side before a point is considered invisible
    #[serde(default = "default_offscreen_margin")]
    pub offscreen_margin: f32,
}

fn default_fb_width() -> u32 {
    1920
}

fn default_fb_height() -> u32 {
    1080
}

fn default_zoom() -> f32 {
    2912.8
}

fn default_offscreen_margin() -> f32 {
    500.0
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            width: default_fb_width(),
            height: default_fb_height(),
            zoom: default_zoom(),
            y_offset: 0.0,
            offscreen_margin: default_offscreen_margin(),
        }
    }
}

/// Draw distances and ribbon widths (meters)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeometryConfig {
    #[serde(default = "default_min_draw_distance")]
    pub min_draw_distance: f32,
    #[serde(default = "default_max_draw_distance")]
    pub max_draw_distance: f32,
    /// Height of the camera above the road
    #[serde(default = "default_camera_height")]
    pub camera_height: f32,
    #[serde(default = "default_path_half_width")]
    pub path_half_width: f32,
    /// Lane line half-width per unit of line probability
    #[serde(default = "default_line_half_width_scale")]
    pub line_half_width_scale: f32,
    #[serde(default = "default_road_edge_half_width")]
    pub road_edge_half_width: f32,
}

fn default_min_draw_distance() -> f32 {
    10.0
}

fn default_max_draw_distance() -> f32 {
    100.0
}

fn default_camera_height() -> f32 {
    1.22
}

fn default_path_half_width() -> f32 {
    0.7
}

fn default_line_half_width_scale() -> f32 {
    0.025
}

fn default_road_edge_half_width() -> f32 {
    0.025
}

impl Default for GeometryConfig {
    fn default() -> Self {
        Self {
            min_draw_distance: default_min_draw_distance(),
            max_draw_distance: default_max_draw_distance(),
            camera_height: default_camera_height(),
            path_half_width: default_path_half_width(),
            line_half_width_scale: default_line_half_width_scale(),
            road_edge_half_width: default_road_edge_half_width(),
        }
    }
}

/// Liveness and refresh periods, already converted to ticks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickPeriods {
    /// Grace period after start before the controls watchdog runs
    pub controls_wait: u64,
    /// Staleness after which controls are considered unresponsive
    pub controls_timeout: u64,
    /// Staleness after which the gateway type resets to unknown
    pub link_timeout: u64,
    pub settings_refresh: u64,
    pub connectivity_refresh: u64,
    /// Blinker animation length
    pub blinker_blink: u32,
}

impl TickPeriods {
    /// Periods for the given nominal tick rate using the stock durations
    pub fn for_tick_hz(tick_hz: u32) -> Self {
        let hz = u64::from(tick_hz);
        Self {
            controls_wait: 10 * hz,
            controls_timeout: 5 * hz,
            link_timeout: 5 * hz,
            settings_refresh: 5 * hz,
            connectivity_refresh: 6 * hz,
            blinker_blink: 120,
        }
    }
}

/// Runtime configuration of the HUD engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HudEngineConfig {
    /// Nominal UI tick rate (Hz)
    pub tick_hz: u32,
    /// Device has (and uses) the wide road camera
    pub wide_camera: bool,
    pub light_source: LightSource,
    pub camera: CameraConfig,
    pub display: DisplayConfig,
    pub geometry: GeometryConfig,
    pub periods: TickPeriods,
    /// A last-ping timestamp older than this is reported as a connectivity error
    pub ping_staleness_ns: u64,
}

impl Default for HudEngineConfig {
    fn default() -> Self {
        Self {
            tick_hz: 20,
            wide_camera: false,
            light_source: LightSource::SensorEvents,
            camera: CameraConfig::default(),
            display: DisplayConfig::default(),
            geometry: GeometryConfig::default(),
            periods: TickPeriods::for_tick_hz(20),
            ping_staleness_ns: 70_000_000_000,
        }
    }
}

impl HudEngineConfig {
    /// Intrinsics of the camera drawn behind the overlay
    pub fn intrinsics(&self) -> CameraIntrinsics {
        if self.wide_camera {
            self.camera.wide
        } else {
            self.camera.road
        }
    }
}
