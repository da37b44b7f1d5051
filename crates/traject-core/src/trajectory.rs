//! Arc-length trajectory resampling.
//!
//! Recorded drags and synthetic strokes arrive with arbitrary point counts
//! and uneven spacing. Downstream consumers expect a fixed-size
//! representation, so trajectories are redistributed to `num_points` points
//! evenly spaced by cumulative path length (not by sample index), with x, y,
//! and time linearly interpolated between the bounding original points.

use crate::events::DragPoint;

/// Resample `points` to exactly `num_points` points spaced evenly by
/// cumulative arc length.
///
/// Inputs with 0 or 1 points are returned unchanged. A degenerate path whose
/// points all coincide (zero total length) returns the first point repeated
/// `num_points` times, keeping the output shape fixed.
#[allow(clippy::cast_precision_loss)]
#[must_use]
pub fn resample_points(points: &[DragPoint], num_points: usize) -> Vec<DragPoint> {
    if points.len() <= 1 {
        return points.to_vec();
    }
    if num_points == 0 {
        return Vec::new();
    }
    if num_points == 1 {
        return vec![points[0]];
    }

    // Cumulative path length at each original point.
    let mut total_length = 0.0_f64;
    let mut segments = Vec::with_capacity(points.len());
    segments.push(0.0_f64);
    for window in points.windows(2) {
        let dx = (window[1].x - window[0].x) as f64;
        let dy = (window[1].y - window[0].y) as f64;
        total_length += dx.hypot(dy);
        segments.push(total_length);
    }

    if total_length == 0.0 {
        return vec![points[0]; num_points];
    }

    let mut resampled = Vec::with_capacity(num_points);
    for i in 0..num_points {
        let target_length = (i as f64 / (num_points - 1) as f64) * total_length;

        // First segment whose end reaches the target length.
        let mut seg_idx = 1;
        while seg_idx < segments.len() - 1 && segments[seg_idx] < target_length {
            seg_idx += 1;
        }

        let prev_idx = seg_idx - 1;
        let segment_start = segments[prev_idx];
        let segment_end = segments[seg_idx];
        let span = segment_end - segment_start;
        let t = if span == 0.0 {
            0.0
        } else {
            (target_length - segment_start) / span
        };

        let p0 = points[prev_idx];
        let p1 = points[seg_idx];
        resampled.push(DragPoint {
            x: lerp_floor(p0.x, p1.x, t),
            y: lerp_floor(p0.y, p1.y, t),
            time: lerp_floor(p0.time, p1.time, t),
        });
    }

    resampled
}

#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
fn lerp_floor(a: i64, b: i64, t: f64) -> i64 {
    ((a as f64) + ((b - a) as f64) * t).floor() as i64
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn p(time: i64, x: i64, y: i64) -> DragPoint {
        DragPoint { time, x, y }
    }

    #[test]
    fn empty_input_unchanged() {
        assert!(resample_points(&[], 8).is_empty());
    }

    #[test]
    fn single_point_unchanged() {
        let pts = vec![p(5, 10, 20)];
        assert_eq!(resample_points(&pts, 8), pts);
    }

    #[test]
    fn straight_line_is_evenly_spaced() {
        let pts = vec![p(0, 0, 0), p(100, 100, 0)];
        let out = resample_points(&pts, 5);
        assert_eq!(out.len(), 5);
        let xs: Vec<i64> = out.iter().map(|q| q.x).collect();
        assert_eq!(xs, vec![0, 25, 50, 75, 100]);
        let times: Vec<i64> = out.iter().map(|q| q.time).collect();
        assert_eq!(times, vec![0, 25, 50, 75, 100]);
    }

    #[test]
    fn endpoints_are_preserved() {
        let pts = vec![p(0, 3, 7), p(40, 50, 9), p(90, 120, -4)];
        let out = resample_points(&pts, 8);
        assert_eq!(out[0], pts[0]);
        assert_eq!(out[7], pts[2]);
    }

    #[test]
    fn spacing_follows_arc_length_not_index() {
        // Two segments: a short one (10px) then a long one (90px). Even
        // index-based sampling would put the midpoint at the corner; even
        // arc-length sampling puts it well inside the second segment.
        let pts = vec![p(0, 0, 0), p(10, 10, 0), p(100, 100, 0)];
        let out = resample_points(&pts, 3);
        assert_eq!(out[1].x, 50);
    }

    #[test]
    fn coincident_points_return_fixed_shape() {
        let pts = vec![p(0, 5, 5), p(10, 5, 5), p(20, 5, 5)];
        let out = resample_points(&pts, 4);
        assert_eq!(out.len(), 4);
        assert!(out.iter().all(|q| q.x == 5 && q.y == 5));
    }

    proptest! {
        #[test]
        fn output_len_always_matches_request(
            raw in prop::collection::vec((0_i64..10_000, -500_i64..2000, -500_i64..2000), 2..60),
            n in 2_usize..40,
        ) {
            let pts: Vec<DragPoint> = raw.into_iter().map(|(t, x, y)| p(t, x, y)).collect();
            let out = resample_points(&pts, n);
            prop_assert_eq!(out.len(), n);
        }

        #[test]
        fn first_point_always_survives(
            raw in prop::collection::vec((0_i64..10_000, 0_i64..2000, 0_i64..2000), 2..60),
            n in 2_usize..40,
        ) {
            let pts: Vec<DragPoint> = raw.into_iter().map(|(t, x, y)| p(t, x, y)).collect();
            let out = resample_points(&pts, n);
            prop_assert_eq!(out[0], pts[0]);
        }
    }
}
