//! # Dispatcher
//!
//! Scene snapshot fan-out.
//!
//! Responsibilities:
//! - Consume one `SceneFrame` per tick
//! - Fan out to every configured sink
//! - Isolate slow sinks: a full queue drops the frame instead of stalling the tick

pub mod dispatcher;
pub mod error;
pub mod handle;
pub mod metrics;
pub mod sinks;

pub use contracts::{SceneFrame, SceneSink};
pub use dispatcher::{create_dispatcher, DispatchSummary, Dispatcher};
pub use error::DispatcherError;
pub use handle::{SendOutcome, SinkHandle};
pub use metrics::{MetricsSnapshot, SinkMetrics};
pub use sinks::{FileSink, FileSinkConfig, LogSink};
