//! HUD engine metrics
//!
//! Per-tick recording through the `metrics` facade plus an in-memory
//! aggregator for run summaries.

use std::collections::HashMap;

use contracts::{TickMeta, UiStatus};
use metrics::{counter, gauge, histogram};

/// Numeric status for gauges (offroad = 0 .. alert = 4)
pub fn status_level(status: UiStatus) -> f64 {
    match status {
        UiStatus::Offroad => 0.0,
        UiStatus::Disengaged => 1.0,
        UiStatus::Engaged => 2.0,
        UiStatus::Warning => 3.0,
        UiStatus::Alert => 4.0,
    }
}

/// Record the metrics of one engine tick
pub fn record_tick_metrics(meta: &TickMeta) {
    counter!("hud_ticks_total").increment(1);
    gauge!("hud_bus_frame").set(meta.frame as f64);
    gauge!("hud_status").set(status_level(meta.status));

    if meta.topics_updated > 0 {
        counter!("hud_topics_updated_total").increment(meta.topics_updated as u64);
    } else {
        counter!("hud_idle_ticks_total").increment(1);
    }

    histogram!("hud_track_vertices").record(meta.track_vertices as f64);
    for (i, count) in meta.lane_line_vertices.iter().enumerate() {
        histogram!("hud_lane_line_vertices", "line" => i.to_string()).record(*count as f64);
    }
    for (i, count) in meta.road_edge_vertices.iter().enumerate() {
        histogram!("hud_road_edge_vertices", "edge" => i.to_string()).record(*count as f64);
    }

    if meta.vision_frame {
        counter!("hud_vision_frames_total").increment(1);
    }
    if meta.vision_connected {
        counter!("hud_vision_connects_total").increment(1);
    }
}

/// Record one frame offered to a sink
pub fn record_frame_dispatched(sink_name: &str, success: bool) {
    let status = if success { "success" } else { "dropped" };
    counter!(
        "hud_frames_dispatched_total",
        "sink" => sink_name.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}

/// Tick duration (ms)
pub fn record_tick_duration_ms(duration_ms: f64) {
    histogram!("hud_tick_duration_ms").record(duration_ms);
}

/// In-memory aggregation of a run
#[derive(Debug, Clone, Default)]
pub struct TickMetricsAggregator {
    pub total_ticks: u64,

    /// Ticks where the bus delivered nothing
    pub idle_ticks: u64,

    pub status_ticks: HashMap<UiStatus, u64>,

    pub watchdog_escalations: u64,

    pub vision_frames: u64,

    pub vision_timeouts: u64,

    pub vision_connects: u64,

    /// Total vertices per tick
    pub vertex_stats: RunningStats,

    pub tick_duration_stats: RunningStats,
}

impl TickMetricsAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, meta: &TickMeta) {
        self.total_ticks += 1;
        if meta.topics_updated == 0 {
            self.idle_ticks += 1;
        }
        *self.status_ticks.entry(meta.status).or_insert(0) += 1;

        if meta.watchdog_escalated {
            self.watchdog_escalations += 1;
        }
        if meta.vision_frame {
            self.vision_frames += 1;
        }
        if meta.vision_timeout {
            self.vision_timeouts += 1;
        }
        if meta.vision_connected {
            self.vision_connects += 1;
        }

        self.vertex_stats.push(meta.total_vertices() as f64);
    }

    pub fn record_duration_ms(&mut self, duration_ms: f64) {
        self.tick_duration_stats.push(duration_ms);
    }

    pub fn summary(&self) -> MetricsSummary {
        let ticks_in = |status| self.status_ticks.get(&status).copied().unwrap_or(0);
        MetricsSummary {
            total_ticks: self.total_ticks,
            idle_ticks: self.idle_ticks,
            offroad_ticks: ticks_in(UiStatus::Offroad),
            disengaged_ticks: ticks_in(UiStatus::Disengaged),
            engaged_ticks: ticks_in(UiStatus::Engaged),
            warning_ticks: ticks_in(UiStatus::Warning),
            alert_ticks: ticks_in(UiStatus::Alert),
            watchdog_escalations: self.watchdog_escalations,
            vision_frames: self.vision_frames,
            vision_timeouts: self.vision_timeouts,
            vision_connects: self.vision_connects,
            vertices: StatsSummary::from(&self.vertex_stats),
            tick_duration_ms: StatsSummary::from(&self.tick_duration_stats),
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Run summary
#[derive(Debug, Clone, Default)]
pub struct MetricsSummary {
    pub total_ticks: u64,
    pub idle_ticks: u64,
    pub offroad_ticks: u64,
    pub disengaged_ticks: u64,
    pub engaged_ticks: u64,
    pub warning_ticks: u64,
    pub alert_ticks: u64,
    pub watchdog_escalations: u64,
    pub vision_frames: u64,
    pub vision_timeouts: u64,
    pub vision_connects: u64,
    pub vertices: StatsSummary,
    pub tick_duration_ms: StatsSummary,
}

impl std::fmt::Display for MetricsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== HUD Run Summary ===")?;
        writeln!(f, "Total ticks: {} (idle: {})", self.total_ticks, self.idle_ticks)?;
        writeln!(
            f,
            "Status ticks: offroad={} disengaged={} engaged={} warning={} alert={}",
            self.offroad_ticks,
            self.disengaged_ticks,
            self.engaged_ticks,
            self.warning_ticks,
            self.alert_ticks
        )?;
        writeln!(f, "Watchdog escalations: {}", self.watchdog_escalations)?;
        writeln!(
            f,
            "Vision: frames={} timeouts={} connects={}",
            self.vision_frames, self.vision_timeouts, self.vision_connects
        )?;
        writeln!(f, "Vertices per tick: {}", self.vertices)?;
        writeln!(f, "Tick duration (ms): {}", self.tick_duration_ms)?;
        Ok(())
    }
}

/// Statistics summary
#[derive(Debug, Clone, Default)]
pub struct StatsSummary {
    pub count: u64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
}

impl From<&RunningStats> for StatsSummary {
    fn from(stats: &RunningStats) -> Self {
        Self {
            count: stats.count,
            min: stats.min,
            max: stats.max,
            mean: stats.mean(),
            std_dev: stats.std_dev(),
        }
    }
}

impl std::fmt::Display for StatsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.count == 0 {
            write!(f, "N/A")
        } else {
            write!(
                f,
                "min={:.3}, max={:.3}, mean={:.3}, std={:.3} (n={})",
                self.min, self.max, self.mean, self.std_dev, self.count
            )
        }
    }
}

/// Online mean/variance (Welford)
#[derive(Debug, Clone, Default)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl RunningStats {
    pub fn push(&mut self, value: f64) {
        self.count += 1;

        if self.count == 1 {
            self.min = value;
            self.max = value;
            self.mean = value;
            self.m2 = 0.0;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);

            let delta = value - self.mean;
            self.mean += delta / self.count as f64;
            self.m2 += delta * (value - self.mean);
        }
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.mean
        }
    }

    /// Sample variance
    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / (self.count - 1) as f64
        }
    }

    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_running_stats() {
        let mut stats = RunningStats::default();
        for v in [1.0, 2.0, 3.0, 4.0, 5.0] {
            stats.push(v);
        }

        assert_eq!(stats.count(), 5);
        assert!((stats.mean() - 3.0).abs() < 1e-10);
        assert!((stats.min() - 1.0).abs() < 1e-10);
        assert!((stats.max() - 5.0).abs() < 1e-10);
        assert!((stats.variance() - 2.5).abs() < 1e-10);
    }

    #[test]
    fn test_aggregator_update() {
        let mut aggregator = TickMetricsAggregator::new();

        aggregator.update(&TickMeta::default());
        aggregator.update(&TickMeta {
            topics_updated: 3,
            status: UiStatus::Alert,
            track_vertices: 20,
            watchdog_escalated: true,
            vision_timeout: true,
            ..Default::default()
        });

        let summary = aggregator.summary();
        assert_eq!(summary.total_ticks, 2);
        assert_eq!(summary.idle_ticks, 1);
        assert_eq!(summary.offroad_ticks, 1);
        assert_eq!(summary.alert_ticks, 1);
        assert_eq!(summary.watchdog_escalations, 1);
        assert_eq!(summary.vision_timeouts, 1);
        assert!((summary.vertices.max - 20.0).abs() < 1e-10);
    }

    #[test]
    fn test_status_level_ordering() {
        assert!(status_level(UiStatus::Offroad) < status_level(UiStatus::Engaged));
        assert!(status_level(UiStatus::Warning) < status_level(UiStatus::Alert));
    }

    #[test]
    fn test_summary_display() {
        let mut aggregator = TickMetricsAggregator::new();
        aggregator.update(&TickMeta {
            status: UiStatus::Engaged,
            ..Default::default()
        });
        aggregator.record_duration_ms(1.5);

        let output = format!("{}", aggregator.summary());
        assert!(output.contains("Total ticks: 1"));
        assert!(output.contains("engaged=1"));
        assert!(output.contains("n=1"));
    }

    #[test]
    fn test_record_without_recorder_is_noop() {
        record_tick_metrics(&TickMeta::default());
        record_frame_dispatched("log", true);
        record_tick_duration_ms(0.5);
    }
}
