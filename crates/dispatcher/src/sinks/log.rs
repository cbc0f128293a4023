//! LogSink - logs scene summaries via tracing

use std::collections::HashMap;

use contracts::{ContractError, SceneFrame, SceneSink};
use tracing::{info, instrument};

use crate::error::DispatcherError;

/// Sink that logs one scene summary every `every` frames
pub struct LogSink {
    name: String,
    every: u64,
    seen: u64,
}

impl LogSink {
    /// Create a LogSink that logs every frame
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            every: 1,
            seen: 0,
        }
    }

    /// Create from params map; `every` thins the output
    pub fn from_params(
        name: impl Into<String>,
        params: &HashMap<String, String>,
    ) -> Result<Self, DispatcherError> {
        let name = name.into();
        let every = match params.get("every") {
            Some(raw) => match raw.parse::<u64>() {
                Ok(n) if n > 0 => n,
                _ => {
                    return Err(DispatcherError::InvalidParam {
                        name,
                        key: "every".into(),
                        value: raw.clone(),
                    })
                }
            },
            None => 1,
        };
        Ok(Self {
            name,
            every,
            seen: 0,
        })
    }

    fn log_scene_summary(&self, frame: &SceneFrame) {
        let scene = &frame.scene;
        info!(
            sink = %self.name,
            tick = frame.tick,
            status = scene.status.as_str(),
            started = scene.started,
            camera = ?frame.camera_source,
            last_frame_id = ?frame.last_frame_id,
            track_vertices = scene.track_vertices.len(),
            alert = %scene.alert.text1,
            v_ego = scene.vehicle.v_ego,
            "SceneFrame received"
        );
    }
}

impl SceneSink for LogSink {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "log_sink_write",
        skip(self, frame),
        fields(sink = %self.name, tick = frame.tick)
    )]
    async fn write(&mut self, frame: &SceneFrame) -> Result<(), ContractError> {
        self.seen += 1;
        if (self.seen - 1) % self.every == 0 {
            self.log_scene_summary(frame);
        }
        Ok(())
    }

    #[instrument(name = "log_sink_flush", skip(self))]
    async fn flush(&mut self) -> Result<(), ContractError> {
        Ok(())
    }

    #[instrument(name = "log_sink_close", skip(self))]
    async fn close(&mut self) -> Result<(), ContractError> {
        info!(sink = %self.name, frames = self.seen, "LogSink closed");
        Ok(())
    }
}
