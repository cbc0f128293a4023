//! External collaborator interfaces
//!
//! The HUD core talks to the outside world only through these traits: the
//! telemetry bus, the camera buffer transport, the GPU texture uploader, the
//! persisted settings store, audio playback and the monotonic clock.

use bytes::Bytes;

use crate::{AudibleAlert, CameraSource, ContractError, Message, Topic};

/// Subscriber side of the telemetry bus.
///
/// `poll` never blocks. Each call advances the bus frame counter by one and
/// latches the latest payload of every topic that received data since the
/// previous poll; `updated` is true only for those topics until the next poll.
pub trait TelemetryBus: Send {
    /// Latch pending payloads; returns the number of topics updated
    fn poll(&mut self) -> usize;

    /// Topic received data during the last poll
    fn updated(&self, topic: Topic) -> bool;

    /// Latest payload ever received on the topic
    fn get(&self, topic: Topic) -> Option<&Message>;

    /// Bus frame of the last receipt (0 = never received)
    fn rcv_frame(&self, topic: Topic) -> u64;

    /// Current bus frame (number of polls so far)
    fn frame(&self) -> u64;
}

/// Metadata of one shared camera buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VisionBufferInfo {
    pub index: usize,
    pub width: u32,
    pub height: u32,
    pub stride: u32,
}

/// A received camera frame
#[derive(Debug, Clone, PartialEq)]
pub struct VisionFrame {
    /// Index of the shared buffer holding the frame
    pub buffer_index: usize,
    pub frame_id: u64,
    pub timestamp_ns: u64,
    pub data: Bytes,
}

/// Camera buffer transport.
///
/// `recv` has its own bounded wait; `None` means timeout.
pub trait VisionTransport: Send {
    fn connect(&mut self, source: CameraSource, blocking: bool) -> bool;

    fn connected(&self) -> bool;

    /// Mark the connection torn down
    fn disconnect(&mut self);

    /// Buffers of the current connection
    fn buffers(&self) -> &[VisionBufferInfo];

    fn recv(&mut self) -> Option<VisionFrame>;
}

/// Creates per-buffer GPU-side resources after a camera connects
pub trait TextureUploader: Send {
    fn init_buffers(&mut self, buffers: &[VisionBufferInfo]);
}

/// Persisted key/value settings store.
///
/// Booleans are stored as `"1"` / `"0"`, numbers as decimal text.
pub trait ParamStore: Send {
    /// Raw value, `None` when the key was never written
    fn get(&self, key: &str) -> Result<Option<String>, ContractError>;

    fn put(&mut self, key: &str, value: &str) -> Result<(), ContractError>;

    fn get_bool(&self, key: &str) -> Result<bool, ContractError> {
        Ok(self.get(key)?.is_some_and(|v| v.trim() == "1"))
    }

    /// Missing or unparsable values read as 0
    fn get_i32(&self, key: &str) -> Result<i32, ContractError> {
        Ok(self
            .get(key)?
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(0))
    }

    fn get_f64(&self, key: &str) -> Result<Option<f64>, ContractError> {
        Ok(self.get(key)?.and_then(|v| v.trim().parse().ok()))
    }
}

/// Audio playback
pub trait SoundPlayer: Send {
    fn play(&mut self, alert: AudibleAlert);

    fn stop(&mut self);
}

/// Monotonic nanosecond clock
pub trait Clock: Send {
    fn now_ns(&self) -> u64;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    struct MapStore(HashMap<String, String>);

    impl ParamStore for MapStore {
        fn get(&self, key: &str) -> Result<Option<String>, ContractError> {
            Ok(self.0.get(key).cloned())
        }

        fn put(&mut self, key: &str, value: &str) -> Result<(), ContractError> {
            self.0.insert(key.to_string(), value.to_string());
            Ok(())
        }
    }

    #[test]
    fn test_typed_param_helpers() {
        let mut store = MapStore(HashMap::new());
        store.put("IsMetric", "1").unwrap();
        store.put("Brightness", " 42\n").unwrap();
        store.put("LastPing", "123.5").unwrap();
        store.put("Garbage", "abc").unwrap();

        assert!(store.get_bool("IsMetric").unwrap());
        assert!(!store.get_bool("Missing").unwrap());
        assert_eq!(store.get_i32("Brightness").unwrap(), 42);
        assert_eq!(store.get_i32("Garbage").unwrap(), 0);
        assert_eq!(store.get_f64("LastPing").unwrap(), Some(123.5));
        assert_eq!(store.get_f64("Missing").unwrap(), None);
    }
}
