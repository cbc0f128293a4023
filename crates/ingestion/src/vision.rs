//! Mock camera buffer transport
//!
//! Stands in for the camera daemon: hands out a fixed set of buffers on
//! connect and produces synthetic frames, with configurable connect failures
//! and receive timeouts.

use bytes::Bytes;
use contracts::{CameraSource, VisionBufferInfo, VisionFrame, VisionTransport};
use tracing::debug;

/// Mock transport configuration
#[derive(Debug, Clone)]
pub struct MockVisionConfig {
    pub width: u32,
    pub height: u32,
    pub num_buffers: usize,
    /// Number of initial connect attempts that fail
    pub failed_connects: u32,
    /// Every n-th receive times out
    pub timeout_every: Option<u64>,
}

impl Default for MockVisionConfig {
    fn default() -> Self {
        Self {
            width: 64,
            height: 48,
            num_buffers: 4,
            failed_connects: 0,
            timeout_every: None,
        }
    }
}

/// Mock transport
pub struct MockVisionTransport {
    config: MockVisionConfig,
    source: Option<CameraSource>,
    connected: bool,
    buffers: Vec<VisionBufferInfo>,
    connect_attempts: u32,
    recv_calls: u64,
    next_frame_id: u64,
}

impl MockVisionTransport {
    pub fn new(config: MockVisionConfig) -> Self {
        Self {
            config,
            source: None,
            connected: false,
            buffers: Vec::new(),
            connect_attempts: 0,
            recv_calls: 0,
            next_frame_id: 0,
        }
    }

    /// Source of the last successful connect
    pub fn source(&self) -> Option<CameraSource> {
        self.source
    }

    pub fn connect_attempts(&self) -> u32 {
        self.connect_attempts
    }
}

impl Default for MockVisionTransport {
    fn default() -> Self {
        Self::new(MockVisionConfig::default())
    }
}

impl VisionTransport for MockVisionTransport {
    fn connect(&mut self, source: CameraSource, _blocking: bool) -> bool {
        self.connect_attempts += 1;
        if self.connect_attempts <= self.config.failed_connects {
            debug!(?source, attempt = self.connect_attempts, "mock camera connect refused");
            return false;
        }

        let stride = self.config.width * 3;
        self.buffers = (0..self.config.num_buffers)
            .map(|index| VisionBufferInfo {
                index,
                width: self.config.width,
                height: self.config.height,
                stride,
            })
            .collect();
        self.source = Some(source);
        self.connected = true;
        true
    }

    fn connected(&self) -> bool {
        self.connected
    }

    fn disconnect(&mut self) {
        self.connected = false;
    }

    fn buffers(&self) -> &[VisionBufferInfo] {
        &self.buffers
    }

    fn recv(&mut self) -> Option<VisionFrame> {
        if !self.connected || self.buffers.is_empty() {
            return None;
        }
        self.recv_calls += 1;
        if self
            .config
            .timeout_every
            .is_some_and(|n| n > 0 && self.recv_calls % n == 0)
        {
            return None;
        }

        let frame_id = self.next_frame_id;
        self.next_frame_id += 1;
        let buffer = &self.buffers[frame_id as usize % self.buffers.len()];
        let len = (buffer.stride * buffer.height) as usize;
        Some(VisionFrame {
            buffer_index: buffer.index,
            frame_id,
            timestamp_ns: frame_id * 50_000_000,
            data: Bytes::from(vec![(frame_id % 256) as u8; len]),
        })
    }
}
