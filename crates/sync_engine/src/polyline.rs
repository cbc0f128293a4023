//! Path-length truncation and ribbon construction.

use contracts::{VertexBuffer, XyztLine, TRAJECTORY_SIZE};
use tracing::warn;

use crate::projection::ProjectionContext;

/// Largest sample index whose x is still below `threshold`.
///
/// Samples are expected to be monotonically increasing in x; scanning stops
/// at the first sample at or beyond the threshold. Returns 0 when no sample
/// qualifies.
pub fn path_length_idx(line: &XyztLine, threshold: f32) -> usize {
    let len = line.len().min(TRAJECTORY_SIZE);
    let mut max_idx = 0;
    for (i, &x) in line.x.iter().take(len).enumerate() {
        if x >= threshold {
            break;
        }
        max_idx = i;
    }
    max_idx
}

/// Build a closed ribbon around `line`: samples `0..=max_idx` offset by
/// `-y_off`, then `max_idx..=0` offset by `+y_off`, all shifted down by
/// `z_off`. Only visible vertices are kept.
///
/// Returns the number of vertices written.
pub fn build_ribbon(
    ctx: &ProjectionContext,
    line: &XyztLine,
    y_off: f32,
    z_off: f32,
    max_idx: usize,
    out: &mut VertexBuffer,
) -> usize {
    out.clear();
    let len = line.len().min(TRAJECTORY_SIZE);
    if len == 0 {
        return 0;
    }
    let max_idx = max_idx.min(len - 1);

    let forward = (0..=max_idx).map(|i| (i, -y_off));
    let backward = (0..=max_idx).rev().map(|i| (i, y_off));
    for (i, off) in forward.chain(backward) {
        let (vertex, visible) = ctx.project(line.x[i], line.y[i] + off, line.z[i] + z_off);
        if !visible {
            continue;
        }
        if let Err(overflow) = out.push(vertex) {
            warn!(capacity = overflow.capacity, "ribbon vertex buffer full");
            break;
        }
    }
    out.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{HudEngineConfig, LINE_VERTEX_CAPACITY};
    use rand::Rng;

    fn line_from_x(xs: Vec<f32>) -> XyztLine {
        let n = xs.len();
        XyztLine {
            x: xs,
            y: vec![0.0; n],
            z: vec![0.0; n],
            t: vec![0.0; n],
        }
    }

    fn calibrated() -> ProjectionContext {
        let mut ctx = ProjectionContext::new(&HudEngineConfig::default());
        ctx.set_calibration(0.0, 0.0, 0.0);
        ctx
    }

    #[test]
    fn test_path_length_idx_basic() {
        let line = line_from_x(vec![0.0, 5.0, 10.0, 15.0, 20.0]);
        assert_eq!(path_length_idx(&line, 12.0), 2);
        assert_eq!(path_length_idx(&line, 10.0), 1);
        assert_eq!(path_length_idx(&line, 100.0), 4);
    }

    #[test]
    fn test_path_length_idx_nothing_below() {
        let line = line_from_x(vec![5.0, 6.0, 7.0]);
        assert_eq!(path_length_idx(&line, 1.0), 0);
        assert_eq!(path_length_idx(&line_from_x(vec![]), 50.0), 0);
    }

    #[test]
    fn test_path_length_idx_random_monotonic() {
        let mut rng = rand::rng();
        for _ in 0..200 {
            let mut x = 0.0f32;
            let xs: Vec<f32> = (0..TRAJECTORY_SIZE)
                .map(|_| {
                    x += rng.random_range(0.1..8.0);
                    x
                })
                .collect();
            let threshold = rng.random_range(0.0..250.0);
            let line = line_from_x(xs.clone());
            let idx = path_length_idx(&line, threshold);

            if xs[0] < threshold {
                assert!(xs[idx] < threshold);
                if idx + 1 < xs.len() {
                    assert!(xs[idx + 1] >= threshold);
                }
            } else {
                assert_eq!(idx, 0);
            }
        }
    }

    #[test]
    fn test_ribbon_forward_then_backward() {
        let ctx = calibrated();
        let line = line_from_x((1..=TRAJECTORY_SIZE).map(|i| 5.0 + i as f32).collect());
        let mut out = VertexBuffer::default();

        let count = build_ribbon(&ctx, &line, 0.5, 1.22, 3, &mut out);
        assert_eq!(count, 8);

        let v = out.as_slice();
        // first half on the left of the centerline, second half on the right,
        // and the loop closes at the nearest sample
        assert!(v[0].x < v[7].x);
        assert!(v[3].x < v[4].x);
        assert!((v[0].y - v[7].y).abs() < 1e-3);
    }

    #[test]
    fn test_ribbon_never_exceeds_capacity() {
        let ctx = calibrated();
        let line = line_from_x((0..TRAJECTORY_SIZE).map(|i| 6.0 + i as f32 * 3.0).collect());
        let mut out = VertexBuffer::default();

        let count = build_ribbon(&ctx, &line, 0.1, 1.22, usize::MAX, &mut out);
        assert!(count <= LINE_VERTEX_CAPACITY);
        assert_eq!(count, out.len());
    }

    #[test]
    fn test_ribbon_drops_invisible_vertices() {
        let ctx = calibrated();
        // samples behind the camera project nowhere
        let line = line_from_x(vec![-3.0, -2.0, 20.0, 30.0]);
        let mut out = VertexBuffer::default();

        let count = build_ribbon(&ctx, &line, 0.5, 0.0, 3, &mut out);
        assert_eq!(count, 4);
    }

    #[test]
    fn test_ribbon_replaces_previous_contents() {
        let ctx = calibrated();
        let line = line_from_x(vec![10.0, 20.0, 30.0]);
        let mut out = VertexBuffer::default();
        build_ribbon(&ctx, &line, 0.5, 0.0, 2, &mut out);
        assert_eq!(out.len(), 6);
        build_ribbon(&ctx, &line_from_x(vec![]), 0.5, 0.0, 2, &mut out);
        assert!(out.is_empty());
    }
}
