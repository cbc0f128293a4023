//! Run statistics.

use std::time::Duration;

use ingestion::MetricsSnapshot;
use observability::TickMetricsAggregator;

/// Statistics from one run
#[derive(Debug, Clone, Default)]
pub struct RunStats {
    /// Engine ticks executed
    pub ticks: u64,

    /// Scene snapshots dropped because the dispatcher queue was full
    pub frames_dropped: u64,

    pub duration: Duration,

    /// Number of configured sinks
    pub active_sinks: usize,

    /// Telemetry bus counters at the end of the run
    pub bus: MetricsSnapshot,

    pub tick_metrics: TickMetricsAggregator,
}

impl RunStats {
    /// Achieved tick rate
    pub fn tick_rate(&self) -> f64 {
        if self.duration.as_secs_f64() > 0.0 {
            self.ticks as f64 / self.duration.as_secs_f64()
        } else {
            0.0
        }
    }

    /// Print detailed summary
    pub fn print_summary(&self) {
        println!("\n╔══════════════════════════════════════════════════════════════╗");
        println!("║                      HUD Run Statistics                      ║");
        println!("╚══════════════════════════════════════════════════════════════╝\n");

        println!("📊 Overview");
        println!("   ├─ Duration: {:.2}s", self.duration.as_secs_f64());
        println!("   ├─ Ticks: {}", self.ticks);
        println!("   ├─ Tick rate: {:.2} Hz", self.tick_rate());
        println!("   ├─ Snapshots dropped: {}", self.frames_dropped);
        println!("   └─ Active sinks: {}", self.active_sinks);

        println!("\n📨 Telemetry Bus");
        println!("   ├─ Published: {}", self.bus.messages_published);
        println!("   ├─ Overwritten: {}", self.bus.messages_overwritten);
        println!("   ├─ Delivered: {}", self.bus.messages_delivered);
        println!("   └─ Polls: {}", self.bus.polls);

        println!("\n{}", self.tick_metrics.summary());
    }
}
