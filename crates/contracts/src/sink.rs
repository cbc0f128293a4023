//! SceneSink trait - Dispatcher output interface
//!
//! Renderer-side consumers receive one `SceneFrame` per tick.

use serde::{Deserialize, Serialize};

use crate::{CameraSource, ContractError, Scene};

/// Per-tick snapshot handed to sinks
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneFrame {
    /// Bus frame the snapshot was taken at
    pub tick: u64,
    /// Camera the overlay is drawn on
    pub camera_source: CameraSource,
    /// Id of the last received camera frame, if any
    pub last_frame_id: Option<u64>,
    pub scene: Scene,
}

/// Scene output trait
///
/// All sink implementations must implement this trait.
#[trait_variant::make(SceneSink: Send)]
pub trait LocalSceneSink {
    /// Sink name (used for logging/metrics)
    fn name(&self) -> &str;

    /// Write one scene frame
    ///
    /// # Errors
    /// Returns write error (should include context)
    async fn write(&mut self, frame: &SceneFrame) -> Result<(), ContractError>;

    /// Flush buffer (if any)
    async fn flush(&mut self) -> Result<(), ContractError>;

    /// Close sink
    async fn close(&mut self) -> Result<(), ContractError>;
}
