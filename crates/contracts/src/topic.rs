//! Topic - named telemetry streams consumed by the HUD core
//!
//! Every producer publishes onto exactly one topic. The set is closed, so a
//! plain `Copy` enum replaces string topic names everywhere in the core.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::ContractError;

/// Telemetry topic identifier.
///
/// The declaration order is the canonical handler order used by the scene
/// aggregator: calibration must be applied before any projection consumer
/// within the same tick, and radar leads before the model path so the path
/// can be foreshortened against the current lead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Topic {
    /// Camera calibration (roll/pitch/yaw)
    Calibration,
    /// Radar lead tracks
    RadarState,
    /// Perception model output (path, lane lines, road edges)
    Model,
    /// Longitudinal/lateral controller state and alerts
    ControlsState,
    /// Vehicle CAN state (blinkers, brake, gear, tires, cruise)
    VehicleState,
    /// Online vehicle parameter estimates
    LiveParameters,
    /// Device health (cpu, thermals, network)
    DeviceState,
    /// Ignition / ECU gateway link health
    LinkHealth,
    /// Raw positioning receiver reports
    GnssReport,
    /// External GPS fix
    GpsExternal,
    /// Fused localization
    Localization,
    /// Static vehicle parameters
    VehicleParams,
    /// Driver-facing camera model output
    DriverState,
    /// Driver monitoring policy output
    DriverMonitoring,
    /// Raw inertial / light sensor samples
    SensorEvents,
    /// Road camera exposure state
    RoadCameraState,
    /// Lateral lane plan
    LanePlan,
}

impl Topic {
    /// All topics in canonical handler order.
    pub const ALL: [Topic; 17] = [
        Topic::Calibration,
        Topic::RadarState,
        Topic::Model,
        Topic::ControlsState,
        Topic::VehicleState,
        Topic::LiveParameters,
        Topic::DeviceState,
        Topic::LinkHealth,
        Topic::GnssReport,
        Topic::GpsExternal,
        Topic::Localization,
        Topic::VehicleParams,
        Topic::DriverState,
        Topic::DriverMonitoring,
        Topic::SensorEvents,
        Topic::RoadCameraState,
        Topic::LanePlan,
    ];

    /// Stable snake_case name used in logs, metrics labels and config files.
    pub fn as_str(&self) -> &'static str {
        match self {
            Topic::Calibration => "calibration",
            Topic::RadarState => "radar_state",
            Topic::Model => "model",
            Topic::ControlsState => "controls_state",
            Topic::VehicleState => "vehicle_state",
            Topic::LiveParameters => "live_parameters",
            Topic::DeviceState => "device_state",
            Topic::LinkHealth => "link_health",
            Topic::GnssReport => "gnss_report",
            Topic::GpsExternal => "gps_external",
            Topic::Localization => "localization",
            Topic::VehicleParams => "vehicle_params",
            Topic::DriverState => "driver_state",
            Topic::DriverMonitoring => "driver_monitoring",
            Topic::SensorEvents => "sensor_events",
            Topic::RoadCameraState => "road_camera_state",
            Topic::LanePlan => "lane_plan",
        }
    }

    /// Dense index into per-topic tables.
    #[inline]
    pub fn index(&self) -> usize {
        *self as usize
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Topic {
    type Err = ContractError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Topic::ALL
            .iter()
            .copied()
            .find(|topic| topic.as_str() == s)
            .ok_or_else(|| ContractError::UnknownTopic { name: s.to_string() })
    }
}
