//! The synthetic paint session state machine.
//!
//! Each synthetic session replays a fixed UI script against static reference
//! frames: show the canvas, clear it between doodles through the File → New
//! → discard-save click sequence, then draw strokes from the dataset with a
//! first-person rationale before every stroke and a rendered frame after it.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use image::RgbaImage;
use rand::seq::IndexedRandom as _;
use serde::Deserialize;
use tracing::{info, warn};
use traject_core::{DragPoint, ProcessedEvent};

use crate::canvas::PaintCanvas;
use crate::errors::SynthError;
use crate::strokes::{CanvasBox, SketchLoader};

/// Pause after the quest placeholder.
const QUEST_PAUSE_MS: i64 = 500;
/// Pause between steps of the clear-canvas click sequence.
const STEP_MS: i64 = 500;
/// Pause after showing the fresh canvas.
const CANVAS_PAUSE_MS: i64 = 1000;
/// Extra time between doodles.
const DOODLE_GAP_MS: i64 = 2000;
/// Retry budget multiplier: attempts allowed per requested doodle.
const ATTEMPTS_PER_DOODLE: usize = 10;

// ─────────────────────────────────────────────────────────────────────────────
// Metadata fixtures
// ─────────────────────────────────────────────────────────────────────────────

/// Element bounding box in screen pixels.
#[derive(Clone, Copy, Debug, Deserialize)]
pub struct BBox {
    /// Left edge.
    pub x1: f64,
    /// Top edge.
    pub y1: f64,
    /// Right edge.
    pub x2: f64,
    /// Bottom edge.
    pub y2: f64,
}

impl BBox {
    /// Click target: the box center.
    #[allow(clippy::cast_possible_truncation)]
    #[must_use]
    pub fn center(&self) -> (i64, i64) {
        (
            (self.x1 + (self.x2 - self.x1) / 2.0).floor() as i64,
            (self.y1 + (self.y2 - self.y1) / 2.0).floor() as i64,
        )
    }
}

/// One UI state: its reference frame and named element boxes.
#[derive(Clone, Debug, Deserialize)]
pub struct PaintState {
    /// Reference frame path, relative to the data directory.
    pub frame: String,
    /// Named element bounding boxes.
    pub elements: HashMap<String, BBox>,
}

/// Static description of the paint UI, keyed by state (`init`, `file`,
/// `save`). Loaded once per generator instance, read-only afterwards.
pub type PaintMetadata = HashMap<String, PaintState>;

// ─────────────────────────────────────────────────────────────────────────────
// Reasoning templates
// ─────────────────────────────────────────────────────────────────────────────

const NEW_DRAWING: [&str; 4] = [
    "I need to clear the canvas for a new drawing",
    "Let me start fresh by clearing the current canvas",
    "I'll clear this to make space for the next drawing",
    "Time to clear the canvas for a fresh start",
];

const CLICK_FILE: [&str; 4] = [
    "I'll click the File menu to find the clear option",
    "Opening the File menu to access canvas options",
    "Going to the File menu to start over",
    "Let me access the File menu first",
];

const CLICK_NEW: [&str; 4] = [
    "Selecting New to reset the canvas",
    "Clicking New to start fresh",
    "Creating a new canvas",
    "Going to create a new drawing space",
];

const SAVE_PROMPT: [&str; 4] = [
    "I don't need to save the current drawing",
    "No need to save this since we're starting fresh",
    "I'll click No to discard the current drawing",
    "Clicking No to proceed with clearing",
];

const DRAW_SEGMENT: [&str; 4] = [
    "Drawing stroke {n} of {total}, starting {direction}",
    "Adding stroke {n}/{total} going {direction}",
    "Making stroke {n} of {total} {direction}",
    "For stroke {n}/{total}, drawing {direction}",
];

fn pick(templates: &[&'static str]) -> &'static str {
    templates.choose(&mut rand::rng()).copied().unwrap_or("")
}

/// Snap a stroke's initial direction vector to one of 8 compass names.
fn stroke_direction(points: &[DragPoint]) -> &'static str {
    let [first, second, ..] = points else {
        return "forward";
    };
    #[allow(clippy::cast_precision_loss)]
    let angle = ((second.y - first.y) as f64)
        .atan2((second.x - first.x) as f64)
        .to_degrees();

    // Screen coordinates: y grows downward.
    match angle {
        a if (-22.5..22.5).contains(&a) => "rightward",
        a if (22.5..67.5).contains(&a) => "down and right",
        a if (67.5..112.5).contains(&a) => "downward",
        a if (112.5..157.5).contains(&a) => "down and left",
        a if (157.5..=180.0).contains(&a) || (-180.0..-157.5).contains(&a) => "leftward",
        a if (-157.5..-112.5).contains(&a) => "up and left",
        a if (-112.5..-67.5).contains(&a) => "upward",
        a if (-67.5..-22.5).contains(&a) => "up and right",
        _ => "forward",
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Pipeline
// ─────────────────────────────────────────────────────────────────────────────

/// Generates synthetic drawing sessions from stroke dataset files and the
/// paint UI metadata.
pub struct PaintPipeline {
    data_dir: PathBuf,
    metadata: PaintMetadata,
    loader: SketchLoader,
    canvas: Option<PaintCanvas>,
    start_time: i64,
}

impl PaintPipeline {
    /// Load metadata and create a generator.
    pub fn new(
        data_dir: impl Into<PathBuf>,
        metadata_path: &Path,
        stroke_control_points: usize,
        start_time: i64,
    ) -> Result<Self, SynthError> {
        let metadata: PaintMetadata =
            serde_json::from_str(&std::fs::read_to_string(metadata_path)?)?;
        Ok(Self {
            data_dir: data_dir.into(),
            metadata,
            loader: SketchLoader::new(stroke_control_points),
            canvas: None,
            start_time,
        })
    }

    /// Generate a full synthetic session of `num_doodles` doodles, choosing
    /// a random stroke dataset file per doodle.
    ///
    /// A doodle attempt that produces non-finite stroke coordinates is
    /// rewound (events and clock) and retried with another drawing. When the
    /// retry budget runs out the whole generation fails — partial sessions
    /// are never returned.
    pub fn generate(
        &mut self,
        doodle_files: &[PathBuf],
        num_doodles: usize,
    ) -> Result<Vec<ProcessedEvent>, SynthError> {
        if doodle_files.is_empty() {
            return Err(SynthError::Exhausted { attempts: 0 });
        }
        let max_attempts = num_doodles * ATTEMPTS_PER_DOODLE;

        let mut events = Vec::new();
        let mut current_time = self.start_time;
        let mut processed = 0;
        let mut attempts = 0;

        while processed < num_doodles {
            attempts += 1;
            if attempts > max_attempts {
                return Err(SynthError::Exhausted { attempts: attempts - 1 });
            }

            let Some(file) = doodle_files.choose(&mut rand::rng()) else {
                return Err(SynthError::Exhausted { attempts });
            };

            match self.attempt_doodle(&mut events, &mut current_time, processed, file) {
                Ok(()) => {
                    processed += 1;
                    current_time += DOODLE_GAP_MS;
                }
                // Metadata problems cannot succeed on retry.
                Err(
                    err @ (SynthError::MissingState { .. } | SynthError::MissingElement { .. }),
                ) => return Err(err),
                Err(err) => {
                    warn!(file = %file.display(), error = %err, "doodle attempt failed, retrying");
                }
            }
        }

        info!(doodles = processed, attempts, events = events.len(), "synthetic session generated");
        Ok(events)
    }

    /// One doodle attempt. On failure the event list and clock are rewound
    /// to the pre-attempt state.
    fn attempt_doodle(
        &mut self,
        events: &mut Vec<ProcessedEvent>,
        current_time: &mut i64,
        processed: usize,
        file: &Path,
    ) -> Result<(), SynthError> {
        let quest_idx = events.len();
        let quest_time = *current_time;
        events.push(ProcessedEvent::Quest {
            timestamp: quest_time,
            message: String::new(),
        });
        *current_time += QUEST_PAUSE_MS;

        match self.build_doodle(events, current_time, processed, file) {
            Ok(prompt) => {
                events[quest_idx] = ProcessedEvent::Quest {
                    timestamp: quest_time,
                    message: prompt,
                };
                Ok(())
            }
            Err(err) => {
                events.truncate(quest_idx);
                *current_time = events
                    .last()
                    .map_or(self.start_time, ProcessedEvent::timestamp);
                Err(err)
            }
        }
    }

    /// Emit the clear-canvas sequence (when needed), the fresh canvas frame,
    /// and the strokes of one drawing. Returns the quest prompt to backfill.
    fn build_doodle(
        &mut self,
        events: &mut Vec<ProcessedEvent>,
        current_time: &mut i64,
        processed: usize,
        file: &Path,
    ) -> Result<String, SynthError> {
        if processed > 0 {
            self.clear_canvas_sequence(events, current_time)?;
        }

        let frame = self.show_state_frame("init")?;
        events.push(ProcessedEvent::Frame {
            timestamp: *current_time,
            frame,
        });
        *current_time += CANVAS_PAUSE_MS;

        let drawing = self.loader.load_random_drawing(file)?;
        let canvas_box = self.canvas_box()?;
        let doodle = self
            .loader
            .drawing_events(&drawing, &canvas_box, *current_time)?;

        let total = doodle.strokes.len();
        for (index, stroke) in doodle.strokes.iter().enumerate() {
            let ProcessedEvent::Mousedrag {
                timestamp,
                coordinates,
            } = stroke
            else {
                continue;
            };

            let text = pick(&DRAW_SEGMENT)
                .replace("{n}", &(index + 1).to_string())
                .replace("{total}", &total.to_string())
                .replace("{direction}", stroke_direction(coordinates));
            events.push(ProcessedEvent::Reasoning {
                timestamp: timestamp - 1,
                text,
            });
            events.push(stroke.clone());

            if let Some(canvas) = self.canvas.as_mut() {
                canvas.draw_stroke(coordinates);
                events.push(ProcessedEvent::Frame {
                    timestamp: timestamp + 1,
                    frame: canvas.render_base64()?,
                });
            }

            *current_time = *timestamp;
        }

        Ok(doodle.prompt)
    }

    /// File → New → discard-save click script, with a rationale before every
    /// click and the intermediate UI frames in between.
    fn clear_canvas_sequence(
        &mut self,
        events: &mut Vec<ProcessedEvent>,
        current_time: &mut i64,
    ) -> Result<(), SynthError> {
        let push_reasoning =
            |events: &mut Vec<ProcessedEvent>, time: i64, templates: &[&'static str]| {
                events.push(ProcessedEvent::Reasoning {
                    timestamp: time,
                    text: pick(templates).to_string(),
                });
            };
        let push_click = |events: &mut Vec<ProcessedEvent>, time: i64, (x, y): (i64, i64)| {
            events.push(ProcessedEvent::Mouseclick {
                timestamp: time,
                x,
                y,
            });
        };

        push_reasoning(events, *current_time, &NEW_DRAWING);
        *current_time += CANVAS_PAUSE_MS;

        let file_coords = self.element("init", "File")?.center();
        push_reasoning(events, *current_time, &CLICK_FILE);
        *current_time += STEP_MS;
        push_click(events, *current_time, file_coords);
        *current_time += STEP_MS;

        let frame = self.show_state_frame("file")?;
        events.push(ProcessedEvent::Frame {
            timestamp: *current_time,
            frame,
        });
        *current_time += STEP_MS;

        let new_coords = self.element("file", "New")?.center();
        push_reasoning(events, *current_time, &CLICK_NEW);
        *current_time += STEP_MS;
        push_click(events, *current_time, new_coords);
        *current_time += STEP_MS;

        let frame = self.show_state_frame("save")?;
        events.push(ProcessedEvent::Frame {
            timestamp: *current_time,
            frame,
        });
        *current_time += STEP_MS;

        let no_coords = self.element("save", "No")?.center();
        push_reasoning(events, *current_time, &SAVE_PROMPT);
        *current_time += STEP_MS;
        push_click(events, *current_time, no_coords);
        *current_time += STEP_MS;

        if let Some(canvas) = self.canvas.as_mut() {
            canvas.clear_overlay();
        }
        Ok(())
    }

    fn state(&self, name: &str) -> Result<&PaintState, SynthError> {
        self.metadata.get(name).ok_or_else(|| SynthError::MissingState {
            name: name.to_string(),
        })
    }

    fn element(&self, state: &str, name: &str) -> Result<BBox, SynthError> {
        self.state(state)?
            .elements
            .get(name)
            .copied()
            .ok_or_else(|| SynthError::MissingElement {
                state: state.to_string(),
                name: name.to_string(),
            })
    }

    fn canvas_box(&self) -> Result<CanvasBox, SynthError> {
        let bbox = self.element("init", "canvas")?;
        Ok(CanvasBox {
            x: bbox.x1,
            y: bbox.y1,
            width: bbox.x2 - bbox.x1,
            height: bbox.y2 - bbox.y1,
        })
    }

    fn load_frame(&self, relative: &str) -> Result<RgbaImage, SynthError> {
        let image = image::ImageReader::open(self.data_dir.join(relative))?
            .decode()?
            .to_rgba8();
        Ok(image)
    }

    /// Switch the canvas base to the given UI state's reference frame and
    /// render the composite.
    fn show_state_frame(&mut self, state_name: &str) -> Result<String, SynthError> {
        let frame_path = self.state(state_name)?.frame.clone();
        let base = self.load_frame(&frame_path)?;
        let canvas = match self.canvas.take() {
            Some(mut canvas) => {
                canvas.set_base(base);
                canvas
            }
            None => PaintCanvas::new(base),
        };
        let rendered = canvas.render_base64();
        self.canvas = Some(canvas);
        rendered
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn p(x: i64, y: i64) -> DragPoint {
        DragPoint { time: 0, x, y }
    }

    #[test]
    fn direction_octants() {
        assert_eq!(stroke_direction(&[p(0, 0), p(10, 0)]), "rightward");
        assert_eq!(stroke_direction(&[p(0, 0), p(10, 10)]), "down and right");
        assert_eq!(stroke_direction(&[p(0, 0), p(0, 10)]), "downward");
        assert_eq!(stroke_direction(&[p(0, 0), p(-10, 10)]), "down and left");
        assert_eq!(stroke_direction(&[p(0, 0), p(-10, 0)]), "leftward");
        assert_eq!(stroke_direction(&[p(0, 0), p(-10, -10)]), "up and left");
        assert_eq!(stroke_direction(&[p(0, 0), p(0, -10)]), "upward");
        assert_eq!(stroke_direction(&[p(0, 0), p(10, -10)]), "up and right");
        assert_eq!(stroke_direction(&[p(0, 0)]), "forward");
    }

    #[test]
    fn bbox_center() {
        let bbox = BBox {
            x1: 10.0,
            y1: 20.0,
            x2: 30.0,
            y2: 60.0,
        };
        assert_eq!(bbox.center(), (20, 40));
    }

    // -- full generation --

    fn write_frame(dir: &Path, name: &str) {
        let img = image::RgbaImage::from_pixel(64, 64, image::Rgba([255, 255, 255, 255]));
        img.save(dir.join(name)).unwrap();
    }

    fn fixture_dir() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        write_frame(dir.path(), "init.png");
        write_frame(dir.path(), "file.png");
        write_frame(dir.path(), "save.png");

        let metadata = serde_json::json!({
            "init": {
                "frame": "init.png",
                "elements": {
                    "File": {"x1": 0.0, "y1": 0.0, "x2": 16.0, "y2": 8.0},
                    "canvas": {"x1": 8.0, "y1": 8.0, "x2": 56.0, "y2": 56.0}
                }
            },
            "file": {
                "frame": "file.png",
                "elements": {"New": {"x1": 0.0, "y1": 8.0, "x2": 16.0, "y2": 16.0}}
            },
            "save": {
                "frame": "save.png",
                "elements": {"No": {"x1": 20.0, "y1": 30.0, "x2": 36.0, "y2": 40.0}}
            }
        });
        std::fs::write(
            dir.path().join("paint_metadata.json"),
            serde_json::to_string_pretty(&metadata).unwrap(),
        )
        .unwrap();

        std::fs::write(
            dir.path().join("square.ndjson"),
            concat!(
                r#"{"word": "square", "recognized": true, "drawing": "#,
                r#"[[[0, 255, 255, 0, 0], [0, 0, 255, 255, 0]], [[10, 240], [10, 240]]]}"#,
                "\n",
            ),
        )
        .unwrap();
        dir
    }

    fn pipeline(dir: &Path) -> PaintPipeline {
        PaintPipeline::new(dir, &dir.join("paint_metadata.json"), 16, 0).unwrap()
    }

    #[test]
    fn generates_exactly_n_quests() {
        let dir = fixture_dir();
        let files = vec![dir.path().join("square.ndjson")];
        let events = pipeline(dir.path()).generate(&files, 3).unwrap();

        let quests: Vec<&ProcessedEvent> = events
            .iter()
            .filter(|e| matches!(e, ProcessedEvent::Quest { .. }))
            .collect();
        assert_eq!(quests.len(), 3);
        for quest in quests {
            let ProcessedEvent::Quest { message, .. } = quest else {
                unreachable!()
            };
            assert!(message.contains("square"), "prompt not backfilled: {message}");
        }
    }

    #[test]
    fn later_doodles_are_preceded_by_the_clear_sequence() {
        let dir = fixture_dir();
        let files = vec![dir.path().join("square.ndjson")];
        let events = pipeline(dir.path()).generate(&files, 2).unwrap();

        // Find the second quest, then the clicks before its first drag.
        let second_quest = events
            .iter()
            .enumerate()
            .filter(|(_, e)| matches!(e, ProcessedEvent::Quest { .. }))
            .map(|(i, _)| i)
            .nth(1)
            .unwrap();
        let first_drag_after = events[second_quest..]
            .iter()
            .position(|e| matches!(e, ProcessedEvent::Mousedrag { .. }))
            .map(|offset| second_quest + offset)
            .unwrap();

        let clicks: Vec<&ProcessedEvent> = events[second_quest..first_drag_after]
            .iter()
            .filter(|e| matches!(e, ProcessedEvent::Mouseclick { .. }))
            .collect();
        assert_eq!(clicks.len(), 3, "expected File, New, No clicks");
        // File menu click is at the File element center (8, 4).
        assert!(matches!(
            clicks[0],
            ProcessedEvent::Mouseclick { x: 8, y: 4, .. }
        ));
    }

    #[test]
    fn every_stroke_gets_reasoning_before_and_frame_after() {
        let dir = fixture_dir();
        let files = vec![dir.path().join("square.ndjson")];
        let events = pipeline(dir.path()).generate(&files, 1).unwrap();

        for (i, event) in events.iter().enumerate() {
            if let ProcessedEvent::Mousedrag { timestamp, .. } = event {
                assert!(
                    matches!(&events[i - 1], ProcessedEvent::Reasoning { timestamp: t, .. } if *t == timestamp - 1),
                    "drag at {timestamp} lacks preceding reasoning"
                );
                assert!(
                    matches!(&events[i + 1], ProcessedEvent::Frame { timestamp: t, .. } if *t == timestamp + 1),
                    "drag at {timestamp} lacks following frame"
                );
            }
        }
        assert!(events.iter().any(|e| matches!(e, ProcessedEvent::Mousedrag { .. })));
    }

    #[test]
    fn timestamps_are_strictly_ordered_per_session() {
        let dir = fixture_dir();
        let files = vec![dir.path().join("square.ndjson")];
        let events = pipeline(dir.path()).generate(&files, 2).unwrap();
        for pair in events.windows(2) {
            assert!(
                pair[0].timestamp() <= pair[1].timestamp(),
                "out of order: {} then {}",
                pair[0].timestamp(),
                pair[1].timestamp()
            );
        }
    }

    #[test]
    fn unusable_dataset_exhausts_and_errors() {
        let dir = fixture_dir();
        std::fs::write(
            dir.path().join("bad.ndjson"),
            r#"{"word": "x", "recognized": false, "drawing": [[[0, 1], [0, 1]]]}"#,
        )
        .unwrap();
        let files = vec![dir.path().join("bad.ndjson")];
        let err = pipeline(dir.path()).generate(&files, 1).unwrap_err();
        assert!(matches!(err, SynthError::Exhausted { .. }));
    }

    #[test]
    fn missing_metadata_element_is_fatal_not_retried() {
        let dir = fixture_dir();
        // Remove the File element so the clear sequence cannot be scripted.
        let path = dir.path().join("paint_metadata.json");
        let mut metadata: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        let _ = metadata["init"]["elements"]
            .as_object_mut()
            .unwrap()
            .remove("File");
        std::fs::write(&path, metadata.to_string()).unwrap();

        let files = vec![dir.path().join("square.ndjson")];
        let err = pipeline(dir.path()).generate(&files, 2).unwrap_err();
        assert!(matches!(err, SynthError::MissingElement { .. }));
    }

    #[test]
    fn no_files_is_an_immediate_error() {
        let dir = fixture_dir();
        let err = pipeline(dir.path()).generate(&[], 1).unwrap_err();
        assert!(matches!(err, SynthError::Exhausted { attempts: 0 }));
    }
}
