//! # Sync Engine
//!
//! Per-frame state synchronization core of the driver-assistance HUD.
//!
//! Responsibilities:
//! - Fold the latest telemetry of every topic into the `Scene`
//! - Project perception output (lane lines, road edges, path, leads) into
//!   framebuffer space
//! - Derive operating status and alerts, including the controls watchdog
//! - Keep the camera connected and hold the last received frame
//! - Periodically refresh persisted settings and the connectivity indicator
//!
//! ## Usage Example
//!
//! ```ignore
//! use sync_engine::{EngineParts, HudEngine, SystemClock};
//!
//! let mut engine = HudEngine::new(blueprint.engine_config(), EngineParts {
//!     bus: Box::new(bus),
//!     params,
//!     sound: Box::new(sound),
//!     vision: Box::new(transport),
//!     uploader: Box::new(uploader),
//!     clock: Box::new(SystemClock),
//! });
//!
//! loop {
//!     let report = engine.tick();
//!     renderer.draw(engine.scene(), engine.last_frame());
//! }
//! ```

mod aggregator;
mod clock;
mod engine;
mod polyline;
mod projection;
mod refresh;
mod status;
mod vision;

pub use aggregator::{light_from_exposure, SceneAggregator};
pub use clock::SystemClock;
pub use engine::{EngineParts, HudEngine, TickReport};
pub use polyline::{build_ribbon, path_length_idx};
pub use projection::{view_from_calib, view_from_device, ProjectionContext};
pub use refresh::{param_keys, ParamsRefresher, RefreshKind};
pub use status::{
    road_camera, StatusMachine, Transition, WatchdogState, UNRESPONSIVE_TEXT1, UNRESPONSIVE_TEXT2,
    WAITING_TEXT1, WAITING_TEXT2,
};
pub use vision::{ConnectionState, FrameOutcome, VisionController, VisionUpdate};

// Re-export contracts types
pub use contracts::{HudEngineConfig, Scene, SceneFrame, TickMeta};
