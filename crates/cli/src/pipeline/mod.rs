//! Tick loop orchestration.

mod collaborators;
mod orchestrator;
mod stats;

pub use collaborators::{LogSoundPlayer, LogTextureUploader, SharedParamStore};
pub use orchestrator::{Pipeline, PipelineConfig};
pub use stats::RunStats;
