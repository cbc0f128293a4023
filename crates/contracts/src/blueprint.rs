//! HudBlueprint - Config Loader output
//!
//! Describes a complete HUD deployment: device capabilities, camera and
//! display geometry, liveness timing, the persisted settings store and output
//! routing.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

use crate::{
    CameraConfig, DisplayConfig, GeometryConfig, HudEngineConfig, LightSource, TickPeriods,
};

/// Configuration version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConfigVersion {
    #[default]
    V1,
}

/// Complete HUD configuration blueprint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HudBlueprint {
    /// Configuration version
    #[serde(default)]
    pub version: ConfigVersion,

    /// Device capabilities
    #[serde(default)]
    pub device: DeviceConfig,

    /// Camera intrinsics
    #[serde(default)]
    pub camera: CameraConfig,

    /// Framebuffer / viewport
    #[serde(default)]
    pub display: DisplayConfig,

    /// Draw distances and ribbon widths
    #[serde(default)]
    pub geometry: GeometryConfig,

    /// Liveness and refresh periods
    #[serde(default)]
    pub timing: TimingConfig,

    /// Persisted settings store
    #[serde(default)]
    pub params: ParamsConfig,

    /// Output routing
    #[serde(default)]
    pub sinks: Vec<SinkConfig>,
}

/// Device capability section
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DeviceConfig {
    /// Nominal UI tick rate (Hz), must be > 0
    #[serde(default = "default_tick_hz")]
    pub tick_hz: u32,

    /// Use the wide road camera
    #[serde(default)]
    pub wide_camera: bool,

    /// Ambient light source
    #[serde(default)]
    pub light_source: LightSource,
}

fn default_tick_hz() -> u32 {
    20
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            tick_hz: default_tick_hz(),
            wide_camera: false,
            light_source: LightSource::SensorEvents,
        }
    }
}

/// Liveness and refresh periods (seconds unless noted)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimingConfig {
    #[serde(default = "default_controls_wait")]
    pub controls_wait_sec: f64,
    #[serde(default = "default_controls_timeout")]
    pub controls_timeout_sec: f64,
    #[serde(default = "default_link_timeout")]
    pub link_timeout_sec: f64,
    #[serde(default = "default_settings_refresh")]
    pub settings_refresh_sec: f64,
    #[serde(default = "default_connectivity_refresh")]
    pub connectivity_refresh_sec: f64,
    #[serde(default = "default_ping_staleness")]
    pub ping_staleness_sec: f64,
    /// Blinker animation length (ticks)
    #[serde(default = "default_blinker_blink_ticks")]
    pub blinker_blink_ticks: u32,
}

fn default_controls_wait() -> f64 {
    10.0
}

fn default_controls_timeout() -> f64 {
    5.0
}

fn default_link_timeout() -> f64 {
    5.0
}

fn default_settings_refresh() -> f64 {
    5.0
}

fn default_connectivity_refresh() -> f64 {
    6.0
}

fn default_ping_staleness() -> f64 {
    70.0
}

fn default_blinker_blink_ticks() -> u32 {
    120
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            controls_wait_sec: default_controls_wait(),
            controls_timeout_sec: default_controls_timeout(),
            link_timeout_sec: default_link_timeout(),
            settings_refresh_sec: default_settings_refresh(),
            connectivity_refresh_sec: default_connectivity_refresh(),
            ping_staleness_sec: default_ping_staleness(),
            blinker_blink_ticks: default_blinker_blink_ticks(),
        }
    }
}

impl TimingConfig {
    /// Convert to tick counts at the given rate
    pub fn to_ticks(&self, tick_hz: u32) -> TickPeriods {
        let hz = f64::from(tick_hz);
        let ticks = |secs: f64| (secs * hz).round().max(1.0) as u64;
        TickPeriods {
            controls_wait: ticks(self.controls_wait_sec),
            controls_timeout: ticks(self.controls_timeout_sec),
            link_timeout: ticks(self.link_timeout_sec),
            settings_refresh: ticks(self.settings_refresh_sec),
            connectivity_refresh: ticks(self.connectivity_refresh_sec),
            blinker_blink: self.blinker_blink_ticks,
        }
    }
}

/// Persisted settings store section
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ParamsConfig {
    /// Directory holding one file per key; in-memory store when absent
    #[serde(default)]
    pub store_dir: Option<PathBuf>,

    /// Values seeded into the store before the engine starts
    #[serde(default)]
    pub overrides: HashMap<String, String>,
}

/// Sink output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SinkConfig {
    /// Sink name
    pub name: String,

    /// Sink type
    pub sink_type: SinkType,

    /// Queue capacity
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,

    /// Type-specific parameters
    #[serde(default)]
    pub params: HashMap<String, String>,
}

fn default_queue_capacity() -> usize {
    100
}

/// Sink type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SinkType {
    /// Log output
    Log,
    /// JSON-lines file output
    File,
}

impl HudBlueprint {
    /// Build the runtime engine configuration
    pub fn engine_config(&self) -> HudEngineConfig {
        HudEngineConfig {
            tick_hz: self.device.tick_hz,
            wide_camera: self.device.wide_camera,
            light_source: self.device.light_source,
            camera: self.camera,
            display: self.display,
            geometry: self.geometry,
            periods: self.timing.to_ticks(self.device.tick_hz),
            ping_staleness_ns: (self.timing.ping_staleness_sec * 1e9) as u64,
        }
    }
}

impl Default for HudBlueprint {
    fn default() -> Self {
        Self {
            version: ConfigVersion::V1,
            device: DeviceConfig::default(),
            camera: CameraConfig::default(),
            display: DisplayConfig::default(),
            geometry: GeometryConfig::default(),
            timing: TimingConfig::default(),
            params: ParamsConfig::default(),
            sinks: Vec::new(),
        }
    }
}
