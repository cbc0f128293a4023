//! Telemetry bus
//!
//! One single-slot channel per topic: publishers overwrite whatever the bus
//! has not consumed yet, so every poll sees at most the latest payload of each
//! topic and producers never block on a slow consumer.

use std::sync::Arc;

use async_channel::{bounded, Receiver, Sender, TryRecvError};
use contracts::{Message, TelemetryBus, Topic};
use tracing::{instrument, trace};

use crate::config::IngestionMetrics;
use crate::error::{IngestionError, Result};

struct TopicSlot {
    rx: Receiver<Message>,
    latest: Option<Message>,
    updated: bool,
    rcv_frame: u64,
}

/// Subscriber side of the bus; owned by the engine
pub struct TopicBus {
    slots: Vec<TopicSlot>,
    senders: Arc<[Sender<Message>]>,
    frame: u64,
    metrics: Arc<IngestionMetrics>,
}

/// Cloneable producer handle
#[derive(Clone)]
pub struct BusPublisher {
    senders: Arc<[Sender<Message>]>,
    metrics: Arc<IngestionMetrics>,
}

impl TopicBus {
    pub fn new() -> Self {
        let mut slots = Vec::with_capacity(Topic::ALL.len());
        let mut senders = Vec::with_capacity(Topic::ALL.len());
        for _ in Topic::ALL {
            let (tx, rx) = bounded(1);
            senders.push(tx);
            slots.push(TopicSlot {
                rx,
                latest: None,
                updated: false,
                rcv_frame: 0,
            });
        }

        Self {
            slots,
            senders: senders.into(),
            frame: 0,
            metrics: Arc::new(IngestionMetrics::new()),
        }
    }

    /// New producer handle
    pub fn publisher(&self) -> BusPublisher {
        BusPublisher {
            senders: self.senders.clone(),
            metrics: self.metrics.clone(),
        }
    }

    /// Get metrics reference
    pub fn metrics(&self) -> Arc<IngestionMetrics> {
        self.metrics.clone()
    }
}

impl Default for TopicBus {
    fn default() -> Self {
        Self::new()
    }
}

impl TelemetryBus for TopicBus {
    #[instrument(name = "bus_poll", skip(self), fields(frame = self.frame + 1))]
    fn poll(&mut self) -> usize {
        self.frame += 1;
        self.metrics.record_poll();

        let mut updated = 0;
        for (topic, slot) in Topic::ALL.iter().zip(self.slots.iter_mut()) {
            slot.updated = false;
            match slot.rx.try_recv() {
                Ok(msg) => {
                    slot.latest = Some(msg);
                    slot.updated = true;
                    slot.rcv_frame = self.frame;
                    updated += 1;
                    metrics::counter!("hud_bus_messages_total", "topic" => topic.as_str())
                        .increment(1);
                    trace!(topic = %topic, frame = self.frame, "topic updated");
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => {}
            }
        }

        self.metrics.record_delivered(updated);
        updated
    }

    fn updated(&self, topic: Topic) -> bool {
        self.slots[topic.index()].updated
    }

    fn get(&self, topic: Topic) -> Option<&Message> {
        self.slots[topic.index()].latest.as_ref()
    }

    fn rcv_frame(&self, topic: Topic) -> u64 {
        self.slots[topic.index()].rcv_frame
    }

    fn frame(&self) -> u64 {
        self.frame
    }
}

impl BusPublisher {
    /// Publish a payload on its topic, replacing any unconsumed one
    pub fn publish(&self, msg: Message) -> Result<()> {
        let topic = msg.topic();
        self.metrics.record_published();
        match self.senders[topic.index()].force_send(msg) {
            Ok(Some(_)) => {
                self.metrics.record_overwritten();
                metrics::counter!("hud_bus_overwritten_total", "topic" => topic.as_str())
                    .increment(1);
                Ok(())
            }
            Ok(None) => Ok(()),
            Err(_) => Err(IngestionError::ChannelClosed { topic }),
        }
    }
}
