//! Layered error definitions
//!
//! Categorized by source: config / bus / params / scene / sink

use thiserror::Error;

use crate::Topic;

/// Unified error type
#[derive(Debug, Error)]
pub enum ContractError {
    // ===== Configuration Errors =====
    /// Configuration parse error
    #[error("config parse error: {message}")]
    ConfigParse {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration validation error
    #[error("config validation error at '{field}': {message}")]
    ConfigValidation { field: String, message: String },

    // ===== Bus Errors =====
    /// Topic name not known to the bus
    #[error("unknown topic: {name}")]
    UnknownTopic { name: String },

    /// Payload does not match the topic it was published on
    #[error("payload mismatch on topic '{topic}': {message}")]
    PayloadMismatch { topic: Topic, message: String },

    // ===== Param Store Errors =====
    /// Persisted store read/write failure
    #[error("param store error for '{key}': {message}")]
    ParamStore { key: String, message: String },

    // ===== Scene Errors =====
    /// Bounded vertex buffer overflow
    #[error("buffer overflow for '{buffer}': capacity={capacity}")]
    BufferOverflow { buffer: String, capacity: usize },

    // ===== Sink Errors =====
    /// Sink write error
    #[error("sink '{sink_name}' write error: {message}")]
    SinkWrite { sink_name: String, message: String },

    // ===== General Errors =====
    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl ContractError {
    /// Create configuration parse error
    pub fn config_parse(message: impl Into<String>) -> Self {
        Self::ConfigParse {
            message: message.into(),
            source: None,
        }
    }

    /// Create configuration validation error
    pub fn config_validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create param store error
    pub fn param_store(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ParamStore {
            key: key.into(),
            message: message.into(),
        }
    }

    /// Create sink write error
    pub fn sink_write(sink_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SinkWrite {
            sink_name: sink_name.into(),
            message: message.into(),
        }
    }
}
