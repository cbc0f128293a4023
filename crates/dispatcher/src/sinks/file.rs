//! FileSink - appends scene snapshots to a JSON-lines file per session

use chrono::Local;
use contracts::{ContractError, SceneFrame, SceneSink};
use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, error, instrument};

/// Configuration for FileSink
#[derive(Debug, Clone)]
pub struct FileSinkConfig {
    /// Base output directory
    pub base_path: PathBuf,
    /// Session directory name; timestamped when `None`
    pub session: Option<String>,
}

impl FileSinkConfig {
    /// Create config from params map
    pub fn from_params(params: &HashMap<String, String>) -> Self {
        let base_path = params
            .get("base_path")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("./output"));

        Self {
            base_path,
            session: params.get("session").cloned(),
        }
    }
}

/// Sink that writes one JSON line per scene frame
pub struct FileSink {
    name: String,
    path: PathBuf,
    writer: BufWriter<File>,
    lines: u64,
}

impl FileSink {
    /// Create a new FileSink, creating the session directory
    pub fn new(name: impl Into<String>, config: FileSinkConfig) -> std::io::Result<Self> {
        let session = config
            .session
            .unwrap_or_else(|| Local::now().format("%Y%m%d_%H%M%S").to_string());
        let dir = config.base_path.join(session);
        fs::create_dir_all(&dir)?;

        let path = dir.join("scene.jsonl");
        let file = File::options().create(true).append(true).open(&path)?;

        Ok(Self {
            name: name.into(),
            path,
            writer: BufWriter::new(file),
            lines: 0,
        })
    }

    /// Create from params map (for factory)
    pub fn from_params(
        name: impl Into<String>,
        params: &HashMap<String, String>,
    ) -> std::io::Result<Self> {
        let config = FileSinkConfig::from_params(params);
        Self::new(name, config)
    }

    /// Output file
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write_line(&mut self, frame: &SceneFrame) -> std::io::Result<()> {
        serde_json::to_writer(&mut self.writer, frame)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        self.writer.write_all(b"\n")?;
        self.lines += 1;
        Ok(())
    }

    fn persist_frame(&mut self, frame: &SceneFrame) -> Result<(), ContractError> {
        self.write_line(frame).map_err(|e| {
            error!(sink = %self.name, tick = frame.tick, error = %e, "Write failed");
            ContractError::sink_write(&self.name, e.to_string())
        })
    }
}

impl SceneSink for FileSink {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "file_sink_write",
        skip(self, frame),
        fields(sink = %self.name, tick = frame.tick)
    )]
    async fn write(&mut self, frame: &SceneFrame) -> Result<(), ContractError> {
        self.persist_frame(frame)
    }

    #[instrument(name = "file_sink_flush", skip(self))]
    async fn flush(&mut self) -> Result<(), ContractError> {
        self.writer
            .flush()
            .map_err(|e| ContractError::sink_write(&self.name, e.to_string()))
    }

    #[instrument(name = "file_sink_close", skip(self))]
    async fn close(&mut self) -> Result<(), ContractError> {
        self.flush().await?;
        debug!(sink = %self.name, lines = self.lines, path = %self.path.display(), "FileSink closed");
        Ok(())
    }
}
