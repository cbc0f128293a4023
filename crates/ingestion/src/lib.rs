//! # Ingestion
//!
//! Telemetry bus and mock producers.
//!
//! Responsibilities:
//! - Per-topic at-most-latest delivery (`TopicBus` / `BusPublisher`)
//! - Scripted drive telemetry for runs without a vehicle (`DriveScenario`)
//! - Mock camera buffer transport (`MockVisionTransport`)
//!
//! ## Usage Example
//!
//! ```ignore
//! use contracts::TelemetryBus;
//! use ingestion::{DriveScenario, ScenarioConfig, TopicBus};
//!
//! let mut bus = TopicBus::new();
//! let publisher = bus.publisher();
//! let scenario = DriveScenario::new(ScenarioConfig::default())?;
//!
//! for tick in 1..=100 {
//!     scenario.publish_tick(tick, &publisher)?;
//!     let updated = bus.poll();
//! }
//! ```

mod bus;
mod config;
mod error;
mod scenario;
mod vision;

pub use bus::{BusPublisher, TopicBus};
pub use config::{IngestionMetrics, MetricsSnapshot};
pub use error::{IngestionError, Result};
pub use scenario::{trajectory_x, DriveScenario, ScenarioConfig};
pub use vision::{MockVisionConfig, MockVisionTransport};
