//! Ingestion error types

use contracts::Topic;
use thiserror::Error;

/// Ingestion error
#[derive(Debug, Error)]
pub enum IngestionError {
    /// Bus side of the topic channel has been dropped
    #[error("channel closed for topic {topic}")]
    ChannelClosed {
        /// Topic being published
        topic: Topic,
    },

    /// Scenario script is inconsistent
    #[error("invalid scenario: {message}")]
    InvalidScenario {
        /// Error message
        message: String,
    },
}

/// Ingestion Result alias
pub type Result<T> = std::result::Result<T, IngestionError>;
