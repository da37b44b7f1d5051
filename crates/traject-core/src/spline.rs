//! B-spline curve evaluation for smoothing point sequences.
//!
//! Uses De Boor's algorithm, written iteratively with an explicit
//! coefficient array rather than recursively, over a uniform clamped knot
//! vector. Clamping makes the curve interpolate its first and last control
//! points, which the synthetic generator relies on so rendered strokes start
//! and end where the recorded trajectory does.

/// B-spline evaluator with a fixed degree.
#[derive(Clone, Copy, Debug)]
pub struct BSpline {
    degree: usize,
}

impl Default for BSpline {
    fn default() -> Self {
        Self::cubic()
    }
}

impl BSpline {
    /// Create an evaluator of the given degree (minimum 1).
    #[must_use]
    pub fn new(degree: usize) -> Self {
        Self {
            degree: degree.max(1),
        }
    }

    /// Cubic evaluator, the degree used throughout the pipeline.
    #[must_use]
    pub fn cubic() -> Self {
        Self::new(3)
    }

    /// Evaluate the curve defined by `control` at `samples` evenly spaced
    /// parameter values in `[0, 1]`, inclusive of both ends.
    ///
    /// Fewer than 2 control points are returned unchanged. When the control
    /// polygon is shorter than `degree + 1` points the effective degree drops
    /// to `control.len() - 1`, so a cubic evaluator over 2 points degrades to
    /// a straight segment.
    #[allow(clippy::cast_precision_loss)]
    #[must_use]
    pub fn generate_curve(&self, control: &[(f64, f64)], samples: usize) -> Vec<(f64, f64)> {
        if control.len() < 2 {
            return control.to_vec();
        }
        let samples = samples.max(2);
        let degree = self.degree.min(control.len() - 1);
        let knots = uniform_clamped_knots(control.len(), degree);

        (0..samples)
            .map(|i| {
                let t = i as f64 / (samples - 1) as f64;
                de_boor(&knots, control, degree, t)
            })
            .collect()
    }
}

/// Uniform clamped knot vector: `degree + 1` zeros, evenly spaced interior
/// knots, `degree + 1` ones. Length is `num_points + degree + 1`.
#[allow(clippy::cast_precision_loss)]
fn uniform_clamped_knots(num_points: usize, degree: usize) -> Vec<f64> {
    let interior = num_points - degree - 1;
    let mut knots = Vec::with_capacity(num_points + degree + 1);
    knots.extend(std::iter::repeat_n(0.0, degree + 1));
    for i in 1..=interior {
        knots.push(i as f64 / (interior + 1) as f64);
    }
    knots.extend(std::iter::repeat_n(1.0, degree + 1));
    knots
}

/// Iterative De Boor evaluation at parameter `t`.
fn de_boor(knots: &[f64], points: &[(f64, f64)], degree: usize, t: f64) -> (f64, f64) {
    let n = points.len();

    // Knot span containing t. Valid spans for a clamped vector are
    // degree..=n-1; t at (or past) the end of the domain clamps to the last
    // span so the curve interpolates the final control point.
    let mut span = n - 1;
    for i in degree..n {
        if t >= knots[i] && t < knots[i + 1] {
            span = i;
            break;
        }
    }

    // Working copy of the control points affecting this span.
    let mut v: Vec<(f64, f64)> = (0..=degree).map(|i| points[span - degree + i]).collect();

    for r in 1..=degree {
        for j in (r..=degree).rev() {
            let left = knots[span - degree + j];
            let right = knots[span + j - r + 1];
            let denom = right - left;
            let alpha = if denom == 0.0 { 0.0 } else { (t - left) / denom };
            v[j] = (
                (1.0 - alpha) * v[j - 1].0 + alpha * v[j].0,
                (1.0 - alpha) * v[j - 1].1 + alpha * v[j].1,
            );
        }
    }

    v[degree]
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
