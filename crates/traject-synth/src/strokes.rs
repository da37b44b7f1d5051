//! Stroke dataset loading.
//!
//! Drawings arrive as NDJSON, one per line, with parallel coordinate arrays
//! per stroke in a 0–255 coordinate space. Only drawings the dataset marks
//! as recognized are eligible; unrecognized scribbles make poor training
//! targets.

use std::path::Path;

use rand::seq::IndexedRandom as _;
use serde::Deserialize;
use tracing::warn;
use traject_core::{DragPoint, ProcessedEvent, resample_points};

use crate::errors::SynthError;

/// Milliseconds of drawing time per raw stroke point.
const MS_PER_POINT: i64 = 20;
/// Pause between strokes.
const STROKE_GAP_MS: i64 = 500;
/// Pause after the quest prompt before drawing starts.
const PROMPT_PAUSE_MS: i64 = 1000;
/// Coordinate range of the source dataset.
const SOURCE_RANGE: f64 = 255.0;

const DRAWING_PROMPTS: [&str; 8] = [
    "Could you draw a {word} for me?",
    "Show me your best {word}!",
    "Let's see your artistic take on a {word}",
    "Draw a {word} in your own style",
    "Time to sketch a {word}!",
    "Can you illustrate a {word} for me?",
    "Your mission: draw a {word}",
    "Let's get creative - draw a {word}",
];

/// One dataset drawing: a word and its strokes as `[xs, ys]` array pairs.
#[derive(Clone, Debug, Deserialize)]
pub struct SketchDrawing {
    /// What the drawing depicts.
    pub word: String,
    /// Whether the dataset's classifier recognized the drawing.
    pub recognized: bool,
    /// Strokes as `[[x0, x1, ...], [y0, y1, ...]]` pairs.
    pub drawing: Vec<Vec<Vec<f64>>>,
}

/// Target rectangle strokes are scaled into, in screen pixels.
#[derive(Clone, Copy, Debug)]
pub struct CanvasBox {
    /// Left edge.
    pub x: f64,
    /// Top edge.
    pub y: f64,
    /// Width.
    pub width: f64,
    /// Height.
    pub height: f64,
}

/// The replayable pieces of one doodle: its quest prompt and drag events.
#[derive(Clone, Debug)]
pub struct DoodleEvents {
    /// Templated task prompt naming the drawing's word.
    pub prompt: String,
    /// One `mousedrag` event per valid stroke, in drawing order.
    pub strokes: Vec<ProcessedEvent>,
}

/// Loads dataset drawings and converts them into drag events.
#[derive(Clone, Copy, Debug)]
pub struct SketchLoader {
    control_points: usize,
}

impl SketchLoader {
    /// Create a loader that resamples every stroke to `control_points`.
    #[must_use]
    pub fn new(control_points: usize) -> Self {
        Self { control_points }
    }

    /// Pick a random recognized drawing from an NDJSON dataset file.
    ///
    /// Unparsable lines are skipped; a file with no recognized drawings is
    /// an error.
    pub fn load_random_drawing(&self, path: &Path) -> Result<SketchDrawing, SynthError> {
        let content = std::fs::read_to_string(path)?;
        let drawings: Vec<SketchDrawing> = content
            .lines()
            .filter(|line| !line.trim().is_empty())
            .filter_map(|line| serde_json::from_str::<SketchDrawing>(line).ok())
            .filter(|d| d.recognized)
            .collect();

        drawings
            .choose(&mut rand::rng())
            .cloned()
            .ok_or_else(|| SynthError::NoDrawings {
                path: path.to_path_buf(),
            })
    }

    /// Convert one drawing into its quest prompt and drag events.
    ///
    /// Drawing starts `PROMPT_PAUSE_MS` after `start_time`. Each stroke's
    /// raw points get 20 ms apiece, are scaled from dataset space into
    /// `bbox`, and are resampled to the configured control-point count.
    /// Malformed strokes are skipped; any non-finite scaled coordinate
    /// rejects the whole drawing so the caller can retry with another.
    #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
    pub fn drawing_events(
        &self,
        drawing: &SketchDrawing,
        bbox: &CanvasBox,
        start_time: i64,
    ) -> Result<DoodleEvents, SynthError> {
        let template = DRAWING_PROMPTS
            .choose(&mut rand::rng())
            .copied()
            .unwrap_or(DRAWING_PROMPTS[0]);
        let prompt = template.replace("{word}", &drawing.word);

        let mut strokes = Vec::new();
        let mut current_time = start_time + PROMPT_PAUSE_MS;

        for (index, stroke) in drawing.drawing.iter().enumerate() {
            let [xs, ys] = stroke.as_slice() else {
                warn!(index, "stroke does not hold an [xs, ys] pair, skipping");
                continue;
            };
            if xs.len() != ys.len() || xs.len() < 2 {
                warn!(index, "stroke coordinate arrays are unusable, skipping");
                continue;
            }

            let scaled: Vec<(f64, f64, i64)> = xs
                .iter()
                .zip(ys)
                .enumerate()
                .map(|(i, (x, y))| {
                    (
                        bbox.x + (x / SOURCE_RANGE) * bbox.width,
                        bbox.y + (y / SOURCE_RANGE) * bbox.height,
                        current_time + i as i64 * MS_PER_POINT,
                    )
                })
                .collect();

            if scaled.iter().any(|(x, y, _)| !x.is_finite() || !y.is_finite()) {
                return Err(SynthError::NonFiniteStroke);
            }

            let points: Vec<DragPoint> = scaled
                .iter()
                .map(|(x, y, time)| DragPoint {
                    time: *time,
                    x: x.floor() as i64,
                    y: y.floor() as i64,
                })
                .collect();

            let stroke_start = current_time;
            let resampled: Vec<DragPoint> = resample_points(&points, self.control_points)
                .into_iter()
                .map(|p| DragPoint {
                    time: p.time - stroke_start,
                    ..p
                })
                .collect();

            if !resampled.is_empty() {
                strokes.push(ProcessedEvent::Mousedrag {
                    timestamp: stroke_start,
                    coordinates: resampled,
                });
            }

            current_time = points.last().map_or(current_time, |p| p.time) + STROKE_GAP_MS;
        }

        Ok(DoodleEvents { prompt, strokes })
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
