//! Synthetic generator errors.

use std::path::PathBuf;

/// Errors from the synthetic drawing-session generator.
#[derive(Debug, thiserror::Error)]
pub enum SynthError {
    /// Filesystem error reading fixtures or stroke data.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A fixture or stroke file failed to parse.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Reference frame decoding or frame encoding failed.
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    /// A stroke dataset file held no recognized drawings.
    #[error("no recognized drawings in {}", path.display())]
    NoDrawings {
        /// The stroke dataset file.
        path: PathBuf,
    },

    /// A scaled stroke produced a non-finite coordinate; the doodle attempt
    /// is discarded and retried.
    #[error("stroke contains non-finite coordinates")]
    NonFiniteStroke,

    /// The paint metadata is missing a UI state.
    #[error("paint metadata missing state \"{name}\"")]
    MissingState {
        /// State key, e.g. `init`.
        name: String,
    },

    /// A UI state is missing a named element bounding box.
    #[error("paint metadata state \"{state}\" missing element \"{name}\"")]
    MissingElement {
        /// State key.
        state: String,
        /// Element key, e.g. `File`.
        name: String,
    },

    /// Every doodle attempt failed.
    #[error("failed to generate any doodles after {attempts} attempts")]
    Exhausted {
        /// Attempts made before giving up.
        attempts: usize,
    },
}
