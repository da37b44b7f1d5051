//! Overlay canvas rendering for synthetic drawings.
//!
//! Strokes are rasterized onto a half-resolution transparent overlay and
//! composited back over the base frame with nearest-neighbor 2× scaling,
//! which mimics the blocky look of a lower-resolution screen capture.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use image::{Rgba, RgbaImage, imageops};
use traject_core::{BSpline, DragPoint};

use crate::errors::SynthError;

const STROKE_COLOR: Rgba<u8> = Rgba([0, 0, 0, 255]);
/// Curve samples per control point when smoothing a stroke.
const SAMPLES_PER_POINT: usize = 4;

/// A base frame plus a half-resolution drawing overlay.
pub struct PaintCanvas {
    base: RgbaImage,
    overlay: RgbaImage,
    spline: BSpline,
}

impl PaintCanvas {
    /// Create a canvas over the given base frame. The overlay is allocated
    /// at half the base resolution and starts fully transparent.
    #[must_use]
    pub fn new(base: RgbaImage) -> Self {
        let overlay = RgbaImage::new((base.width() / 2).max(1), (base.height() / 2).max(1));
        Self {
            base,
            overlay,
            spline: BSpline::cubic(),
        }
    }

    /// Swap the base frame (e.g. to show an opened menu) while keeping the
    /// accumulated overlay.
    pub fn set_base(&mut self, base: RgbaImage) {
        self.base = base;
    }

    /// Erase everything drawn so far.
    pub fn clear_overlay(&mut self) {
        self.overlay = RgbaImage::new(self.overlay.width(), self.overlay.height());
    }

    /// Rasterize one stroke onto the overlay.
    ///
    /// Points are scaled to overlay space, smoothed with the B-spline, and
    /// connected with 1-px line segments.
    pub fn draw_stroke(&mut self, points: &[DragPoint]) {
        #[allow(clippy::cast_precision_loss)]
        let scaled: Vec<(f64, f64)> = points
            .iter()
            .map(|p| (p.x as f64 / 2.0, p.y as f64 / 2.0))
            .collect();
        if scaled.is_empty() {
            return;
        }

        let smooth = self
            .spline
            .generate_curve(&scaled, scaled.len() * SAMPLES_PER_POINT);
        for pair in smooth.windows(2) {
            self.draw_line(pair[0], pair[1]);
        }
    }

    /// Composite the overlay over the base at 2× with nearest-neighbor
    /// scaling and return the frame.
    #[must_use]
    pub fn render(&self) -> RgbaImage {
        let mut frame = self.base.clone();
        let upscaled = imageops::resize(
            &self.overlay,
            frame.width(),
            frame.height(),
            imageops::FilterType::Nearest,
        );
        for (x, y, pixel) in upscaled.enumerate_pixels() {
            if pixel[3] > 0 {
                frame.put_pixel(x, y, *pixel);
            }
        }
        frame
    }

    /// Render the current frame as base64-encoded PNG.
    pub fn render_base64(&self) -> Result<String, SynthError> {
        let frame = self.render();
        let mut bytes = Vec::new();
        frame.write_to(
            &mut std::io::Cursor::new(&mut bytes),
            image::ImageFormat::Png,
        )?;
        Ok(BASE64.encode(bytes))
    }

    /// Bresenham line segment in overlay space, clamped to bounds.
    #[allow(clippy::cast_possible_truncation)]
    fn draw_line(&mut self, from: (f64, f64), to: (f64, f64)) {
        let (mut x0, mut y0) = (from.0.round() as i64, from.1.round() as i64);
        let (x1, y1) = (to.0.round() as i64, to.1.round() as i64);

        let dx = (x1 - x0).abs();
        let dy = -(y1 - y0).abs();
        let sx = if x0 < x1 { 1 } else { -1 };
        let sy = if y0 < y1 { 1 } else { -1 };
        let mut err = dx + dy;

        loop {
            self.plot(x0, y0);
            if x0 == x1 && y0 == y1 {
                break;
            }
            let e2 = 2 * err;
            if e2 >= dy {
                err += dy;
                x0 += sx;
            }
            if e2 <= dx {
                err += dx;
                y0 += sy;
            }
        }
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn plot(&mut self, x: i64, y: i64) {
        if x >= 0 && y >= 0 && (x as u32) < self.overlay.width() && (y as u32) < self.overlay.height()
        {
            self.overlay.put_pixel(x as u32, y as u32, STROKE_COLOR);
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
