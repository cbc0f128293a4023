//! Host-side stand-ins for the audio device, the GPU uploader and a settings
//! store shared between the engine and the uplink pinger.

use std::sync::{Arc, Mutex};

use contracts::{AudibleAlert, ContractError, ParamStore, SoundPlayer, TextureUploader, VisionBufferInfo};
use tracing::{debug, info};

/// Sound player that logs what it would play
#[derive(Debug, Default)]
pub struct LogSoundPlayer {
    playing: Option<AudibleAlert>,
}

impl SoundPlayer for LogSoundPlayer {
    fn play(&mut self, alert: AudibleAlert) {
        info!(alert = ?alert, "play sound");
        self.playing = Some(alert);
    }

    fn stop(&mut self) {
        if let Some(alert) = self.playing.take() {
            debug!(alert = ?alert, "stop sound");
        }
    }
}

/// Uploader that only records the buffer layout
#[derive(Debug, Default)]
pub struct LogTextureUploader {
    buffers: usize,
}

impl TextureUploader for LogTextureUploader {
    fn init_buffers(&mut self, buffers: &[VisionBufferInfo]) {
        self.buffers = buffers.len();
        debug!(buffers = self.buffers, "camera textures initialised");
    }
}

/// Cloneable handle to one settings store
#[derive(Clone)]
pub struct SharedParamStore {
    inner: Arc<Mutex<Box<dyn ParamStore>>>,
}

impl SharedParamStore {
    pub fn new(store: Box<dyn ParamStore>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(store)),
        }
    }
}

impl ParamStore for SharedParamStore {
    fn get(&self, key: &str) -> Result<Option<String>, ContractError> {
        let store = self
            .inner
            .lock()
            .map_err(|_| ContractError::param_store(key, "store lock poisoned"))?;
        store.get(key)
    }

    fn put(&mut self, key: &str, value: &str) -> Result<(), ContractError> {
        let mut store = self
            .inner
            .lock()
            .map_err(|_| ContractError::param_store(key, "store lock poisoned"))?;
        store.put(key, value)
    }
}
