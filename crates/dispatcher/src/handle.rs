//! SinkHandle - one sink behind a bounded queue and its own worker task

use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, instrument, warn};

use contracts::{SceneFrame, SceneSink};

use crate::metrics::SinkMetrics;

/// Result of offering a frame to a sink
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    Queued,
    /// Queue full; the frame was dropped
    Dropped,
    /// Worker is gone
    Closed,
}

/// Handle to a running sink worker
pub struct SinkHandle {
    name: String,
    tx: mpsc::Sender<SceneFrame>,
    metrics: Arc<SinkMetrics>,
    worker_handle: JoinHandle<()>,
}

impl SinkHandle {
    /// Spawn the worker task for `sink` behind a queue of `queue_capacity`
    pub fn spawn<S: SceneSink + 'static>(sink: S, queue_capacity: usize) -> Self {
        let name = sink.name().to_string();
        let (tx, rx) = mpsc::channel(queue_capacity.max(1));
        let metrics = Arc::new(SinkMetrics::new());

        let worker_metrics = Arc::clone(&metrics);
        let worker_name = name.clone();
        let worker_handle = tokio::spawn(async move {
            sink_worker(sink, rx, worker_metrics, worker_name).await;
        });

        Self {
            name,
            tx,
            metrics,
            worker_handle,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn metrics(&self) -> &Arc<SinkMetrics> {
        &self.metrics
    }

    /// Offer a frame without waiting
    pub fn try_send(&self, frame: SceneFrame) -> SendOutcome {
        match self.tx.try_send(frame) {
            Ok(()) => {
                let queued = self.tx.max_capacity() - self.tx.capacity();
                self.metrics.set_queue_len(queued);
                SendOutcome::Queued
            }
            Err(mpsc::error::TrySendError::Full(f)) => {
                self.metrics.inc_dropped_count();
                warn!(sink = %self.name, tick = f.tick, "Queue full, frame dropped");
                SendOutcome::Dropped
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                error!(sink = %self.name, "Sink worker closed unexpectedly");
                SendOutcome::Closed
            }
        }
    }

    /// Close the queue and wait for the worker to drain it
    #[instrument(name = "sink_handle_shutdown", skip(self), fields(sink = %self.name))]
    pub async fn shutdown(self) {
        drop(self.tx);
        if let Err(e) = self.worker_handle.await {
            error!(sink = %self.name, error = ?e, "Worker task panicked");
        }
        debug!(sink = %self.name, "SinkHandle shutdown complete");
    }
}

/// Drain the queue into the sink; flush whenever the queue runs empty
#[instrument(name = "sink_worker_loop", skip(sink, rx, metrics), fields(sink = %name))]
async fn sink_worker<S: SceneSink>(
    mut sink: S,
    mut rx: mpsc::Receiver<SceneFrame>,
    metrics: Arc<SinkMetrics>,
    name: String,
) {
    debug!(sink = %name, "Sink worker started");

    while let Some(frame) = rx.recv().await {
        metrics.set_queue_len(rx.len());

        match sink.write(&frame).await {
            Ok(()) => {
                metrics.inc_write_count();
                metrics.set_last_tick(frame.tick);
            }
            Err(e) => {
                metrics.inc_failure_count();
                error!(sink = %name, tick = frame.tick, error = %e, "Write failed");
            }
        }

        if rx.is_empty() {
            if let Err(e) = sink.flush().await {
                error!(sink = %name, error = %e, "Flush failed");
            }
        }
    }

    if let Err(e) = sink.close().await {
        error!(sink = %name, error = %e, "Close failed on shutdown");
    }
    debug!(sink = %name, "Sink worker stopped");
}
