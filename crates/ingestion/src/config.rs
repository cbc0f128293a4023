//! Bus metrics

use std::sync::atomic::{AtomicU64, Ordering};

/// Bus metrics shared between the bus and its publishers
#[derive(Debug, Default)]
pub struct IngestionMetrics {
    /// Total messages published
    pub messages_published: AtomicU64,

    /// Messages replaced by a newer one before the bus polled
    pub messages_overwritten: AtomicU64,

    /// Messages latched by a poll
    pub messages_delivered: AtomicU64,

    /// Polls performed
    pub polls: AtomicU64,
}

impl IngestionMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_published(&self) {
        self.messages_published.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_overwritten(&self) {
        self.messages_overwritten.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_delivered(&self, count: usize) {
        self.messages_delivered
            .fetch_add(count as u64, Ordering::Relaxed);
    }

    pub fn record_poll(&self) {
        self.polls.fetch_add(1, Ordering::Relaxed);
    }

    /// Get snapshot
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            messages_published: self.messages_published.load(Ordering::Relaxed),
            messages_overwritten: self.messages_overwritten.load(Ordering::Relaxed),
            messages_delivered: self.messages_delivered.load(Ordering::Relaxed),
            polls: self.polls.load(Ordering::Relaxed),
        }
    }
}

/// Metrics snapshot
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub messages_published: u64,
    pub messages_overwritten: u64,
    pub messages_delivered: u64,
    pub polls: u64,
}
