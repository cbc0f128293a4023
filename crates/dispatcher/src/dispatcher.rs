//! Scene frame fan-out.
//!
//! One `Dispatcher` owns a `SinkHandle` per configured sink and forwards
//! every tick's snapshot to all of them without waiting on any.

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument};

use contracts::{SceneFrame, SinkConfig, SinkType};

use crate::error::DispatcherError;
use crate::handle::{SendOutcome, SinkHandle};
use crate::metrics::MetricsSnapshot;
use crate::sinks::{FileSink, LogSink};

/// Ticks between progress lines
const PROGRESS_EVERY: u64 = 200;

/// Totals for one dispatcher run
#[derive(Debug, Clone, Default)]
pub struct DispatchSummary {
    /// Snapshots received from the tick loop
    pub frames: u64,
    /// Per-sink deliveries refused (queue full or worker gone)
    pub refused: u64,
    /// Final per-sink counters, in configuration order
    pub sinks: Vec<(String, MetricsSnapshot)>,
}

/// Fans `SceneFrame`s out to sinks
pub struct Dispatcher {
    handles: Vec<SinkHandle>,
    input_rx: mpsc::Receiver<SceneFrame>,
}

impl Dispatcher {
    /// Spawn one worker per sink config
    #[instrument(name = "dispatcher_from_configs", skip_all, fields(sinks = configs.len()))]
    pub async fn from_configs(
        configs: &[SinkConfig],
        input_rx: mpsc::Receiver<SceneFrame>,
    ) -> Result<Self, DispatcherError> {
        let handles = configs
            .iter()
            .map(open_sink)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { handles, input_rx })
    }

    /// Use already running sink handles
    pub fn with_handles(handles: Vec<SinkHandle>, input_rx: mpsc::Receiver<SceneFrame>) -> Self {
        Self { handles, input_rx }
    }

    pub fn sink_count(&self) -> usize {
        self.handles.len()
    }

    pub fn metrics(&self) -> Vec<(String, MetricsSnapshot)> {
        self.handles
            .iter()
            .map(|h| (h.name().to_string(), h.metrics().snapshot()))
            .collect()
    }

    /// Forward snapshots until the tick loop drops its sender, then drain
    /// and close every sink.
    #[instrument(name = "dispatcher_run", skip(self), fields(sinks = self.handles.len()))]
    pub async fn run(mut self) -> DispatchSummary {
        let mut summary = DispatchSummary::default();

        while let Some(frame) = self.input_rx.recv().await {
            summary.frames += 1;
            summary.refused += self.offer(frame);
            if summary.frames % PROGRESS_EVERY == 0 {
                debug!(frames = summary.frames, refused = summary.refused, "dispatch progress");
            }
        }

        summary.sinks = self.metrics();
        for handle in self.handles {
            handle.shutdown().await;
        }
        info!(
            frames = summary.frames,
            refused = summary.refused,
            "dispatcher stopped"
        );
        summary
    }

    pub fn spawn(self) -> JoinHandle<DispatchSummary> {
        tokio::spawn(self.run())
    }

    /// Returns the number of sinks that refused the frame
    fn offer(&self, frame: SceneFrame) -> u64 {
        let Some((last, rest)) = self.handles.split_last() else {
            return 0;
        };
        let refused = rest
            .iter()
            .filter(|h| h.try_send(frame.clone()) != SendOutcome::Queued)
            .count() as u64;
        refused + u64::from(last.try_send(frame) != SendOutcome::Queued)
    }
}

fn open_sink(config: &SinkConfig) -> Result<SinkHandle, DispatcherError> {
    debug!(sink = %config.name, sink_type = ?config.sink_type, "opening sink");
    let handle = match config.sink_type {
        SinkType::Log => SinkHandle::spawn(
            LogSink::from_params(&config.name, &config.params)?,
            config.queue_capacity,
        ),
        SinkType::File => SinkHandle::spawn(
            FileSink::from_params(&config.name, &config.params)
                .map_err(|e| DispatcherError::sink_creation(&config.name, e.to_string()))?,
            config.queue_capacity,
        ),
    };
    Ok(handle)
}

/// Build a dispatcher for `configs` reading from `input_rx`
pub async fn create_dispatcher(
    configs: Vec<SinkConfig>,
    input_rx: mpsc::Receiver<SceneFrame>,
) -> Result<Dispatcher, DispatcherError> {
    Dispatcher::from_configs(&configs, input_rx).await
}
