//! TickMeta - HUD engine per-tick output metadata
//!
//! What one update tick did, for metrics and run summaries.

use serde::{Deserialize, Serialize};

use crate::{UiStatus, LANE_LINE_COUNT, ROAD_EDGE_COUNT};

/// Tick metadata
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TickMeta {
    /// Bus frame after this tick's poll
    pub frame: u64,

    /// Topics that delivered a new payload this tick
    pub topics_updated: usize,

    /// Status after the tick
    pub status: UiStatus,

    /// Vertices in the path polyline
    pub track_vertices: usize,

    /// Vertices per lane line
    pub lane_line_vertices: [usize; LANE_LINE_COUNT],

    /// Vertices per road edge
    pub road_edge_vertices: [usize; ROAD_EDGE_COUNT],

    /// Controls watchdog escalated on this tick
    pub watchdog_escalated: bool,

    /// Camera frame received
    pub vision_frame: bool,

    /// Camera receive timed out
    pub vision_timeout: bool,

    /// Camera connection established
    pub vision_connected: bool,
}

impl TickMeta {
    /// Total vertices across every projected polyline
    pub fn total_vertices(&self) -> usize {
        self.track_vertices
            + self.lane_line_vertices.iter().sum::<usize>()
            + self.road_edge_vertices.iter().sum::<usize>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_total_vertices() {
        let meta = TickMeta {
            track_vertices: 10,
            lane_line_vertices: [1, 2, 3, 4],
            road_edge_vertices: [5, 6],
            ..Default::default()
        };
        assert_eq!(meta.total_vertices(), 31);
    }
}
