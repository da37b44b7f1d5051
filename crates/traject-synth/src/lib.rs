//! # traject-synth
//!
//! Wholly synthetic drawing-task sessions: strokes from a third-party
//! drawing dataset are replayed into the same event machinery a real
//! recording feeds, producing quest prompts, per-stroke rationales, drag
//! trajectories, and rendered frames — no recording required.

#![deny(unsafe_code)]

pub mod canvas;
pub mod errors;
pub mod paint;
pub mod strokes;

pub use canvas::PaintCanvas;
pub use errors::SynthError;
pub use paint::{BBox, PaintMetadata, PaintPipeline, PaintState};
pub use strokes::{CanvasBox, DoodleEvents, SketchDrawing, SketchLoader};
