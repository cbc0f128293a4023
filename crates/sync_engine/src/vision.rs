//! Camera connection and frame receive.

use contracts::{CameraSource, Scene, TextureUploader, VisionFrame, VisionTransport};
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connected,
}

/// Receive result of one tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FrameOutcome {
    /// No connection, nothing attempted
    #[default]
    Idle,
    Received { frame_id: u64 },
    /// Bounded wait elapsed; previous frame kept
    Timeout,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VisionUpdate {
    /// Connection was (re)established this tick
    pub connected_now: bool,
    pub outcome: FrameOutcome,
}

/// Owns the camera transport and the last received frame
pub struct VisionController {
    source: CameraSource,
    transport: Box<dyn VisionTransport>,
    uploader: Box<dyn TextureUploader>,
    last_frame: Option<VisionFrame>,
    frames: u64,
    timeouts: u64,
}

impl VisionController {
    pub fn new(
        source: CameraSource,
        transport: Box<dyn VisionTransport>,
        uploader: Box<dyn TextureUploader>,
    ) -> Self {
        Self {
            source,
            transport,
            uploader,
            last_frame: None,
            frames: 0,
            timeouts: 0,
        }
    }

    /// Camera to use on the next connect
    pub fn select_source(&mut self, source: CameraSource) {
        self.source = source;
    }

    pub fn source(&self) -> CameraSource {
        self.source
    }

    /// Tear the connection down; the next started tick reconnects
    pub fn mark_disconnected(&mut self) {
        self.transport.disconnect();
    }

    pub fn state(&self) -> ConnectionState {
        if self.transport.connected() {
            ConnectionState::Connected
        } else {
            ConnectionState::Disconnected
        }
    }

    pub fn last_frame(&self) -> Option<&VisionFrame> {
        self.last_frame.as_ref()
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn timeouts(&self) -> u64 {
        self.timeouts
    }

    /// Reconnect when needed, then receive at most one frame.
    pub fn update(&mut self, scene: &mut Scene) -> VisionUpdate {
        let mut update = VisionUpdate::default();

        if !self.transport.connected() && scene.started && self.transport.connect(self.source, false)
        {
            let buffers = self.transport.buffers();
            self.uploader.init_buffers(buffers);
            // overlays wait for the next calibration after a reconnect
            scene.world_objects_visible = false;
            update.connected_now = true;
            info!(source = ?self.source, buffers = buffers.len(), "camera connected");
        }

        if self.transport.connected() {
            update.outcome = match self.transport.recv() {
                Some(frame) => {
                    let frame_id = frame.frame_id;
                    self.last_frame = Some(frame);
                    self.frames += 1;
                    FrameOutcome::Received { frame_id }
                }
                None => {
                    self.timeouts += 1;
                    debug!(source = ?self.source, "camera receive timeout");
                    metrics::counter!("hud_vision_timeouts_total").increment(1);
                    FrameOutcome::Timeout
                }
            };
        }
        update
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::VisionBufferInfo;
    use ingestion::{MockVisionConfig, MockVisionTransport};
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct CountingUploader(Arc<Mutex<Vec<usize>>>);

    impl TextureUploader for CountingUploader {
        fn init_buffers(&mut self, buffers: &[VisionBufferInfo]) {
            self.0.lock().unwrap().push(buffers.len());
        }
    }

    fn controller(config: MockVisionConfig) -> (VisionController, CountingUploader) {
        let uploader = CountingUploader::default();
        let controller = VisionController::new(
            CameraSource::Road,
            Box::new(MockVisionTransport::new(config)),
            Box::new(uploader.clone()),
        );
        (controller, uploader)
    }

    fn started_scene() -> Scene {
        Scene {
            started: true,
            world_objects_visible: true,
            ..Default::default()
        }
    }

    #[test]
    fn test_no_connect_while_offroad() {
        let (mut vision, uploader) = controller(MockVisionConfig::default());
        let mut scene = Scene::default();
        let update = vision.update(&mut scene);
        assert_eq!(update, VisionUpdate::default());
        assert_eq!(vision.state(), ConnectionState::Disconnected);
        assert!(uploader.0.lock().unwrap().is_empty());
    }

    #[test]
    fn test_connect_initializes_buffers_and_receives() {
        let (mut vision, uploader) = controller(MockVisionConfig::default());
        let mut scene = started_scene();

        let update = vision.update(&mut scene);
        assert!(update.connected_now);
        assert!(matches!(update.outcome, FrameOutcome::Received { .. }));
        assert!(!scene.world_objects_visible);
        assert_eq!(*uploader.0.lock().unwrap(), vec![4]);
        assert_eq!(vision.state(), ConnectionState::Connected);

        let update = vision.update(&mut scene);
        assert!(!update.connected_now);
        assert_eq!(vision.frames(), 2);
    }

    #[test]
    fn test_connect_retried_every_tick() {
        let (mut vision, _) = controller(MockVisionConfig {
            failed_connects: 2,
            ..Default::default()
        });
        let mut scene = started_scene();

        assert_eq!(vision.update(&mut scene), VisionUpdate::default());
        assert_eq!(vision.update(&mut scene), VisionUpdate::default());
        assert!(vision.update(&mut scene).connected_now);
    }

    #[test]
    fn test_timeout_keeps_previous_frame() {
        let (mut vision, _) = controller(MockVisionConfig {
            timeout_every: Some(2),
            ..Default::default()
        });
        let mut scene = started_scene();

        let first = vision.update(&mut scene);
        let FrameOutcome::Received { frame_id } = first.outcome else {
            panic!("expected a frame, got {first:?}");
        };
        assert_eq!(vision.update(&mut scene).outcome, FrameOutcome::Timeout);
        assert_eq!(vision.last_frame().map(|f| f.frame_id), Some(frame_id));
        assert_eq!(vision.timeouts(), 1);
    }

    #[test]
    fn test_disconnect_then_reconnect_on_new_source() {
        let (mut vision, uploader) = controller(MockVisionConfig::default());
        let mut scene = started_scene();
        vision.update(&mut scene);

        vision.mark_disconnected();
        assert_eq!(vision.state(), ConnectionState::Disconnected);

        vision.select_source(CameraSource::Driver);
        assert!(vision.update(&mut scene).connected_now);
        assert_eq!(vision.source(), CameraSource::Driver);
        assert_eq!(uploader.0.lock().unwrap().len(), 2);
    }
}
