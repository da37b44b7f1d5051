//! Shared error type for pipeline stages.

use std::path::PathBuf;

/// Errors a pipeline stage can surface to the orchestrator.
///
/// Any of these aborts the session run that produced it. Recoverable
/// failures (a malformed protocol instruction, one failed model call) are
/// handled inside the stage and never reach this type.
#[derive(Debug, thiserror::Error)]
pub enum StageError {
    /// A required session artifact is missing.
    #[error("missing session artifact: {}", path.display())]
    MissingArtifact {
        /// Path that was expected to exist.
        path: PathBuf,
    },

    /// Filesystem error while reading or writing session data.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A session artifact failed to parse as JSON.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Stage-specific fatal error.
    #[error("{stage}: {message}")]
    Stage {
        /// Name of the failing stage.
        stage: &'static str,
        /// Error description.
        message: String,
    },
}

impl StageError {
    /// Build a stage-specific error.
    #[must_use]
    pub fn stage(stage: &'static str, message: impl Into<String>) -> Self {
        Self::Stage {
            stage,
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_artifact_display_includes_path() {
        let err = StageError::MissingArtifact {
            path: PathBuf::from("/data/abc.trace"),
        };
        assert_eq!(err.to_string(), "missing session artifact: /data/abc.trace");
    }

    #[test]
    fn stage_error_display() {
        let err = StageError::stage("video", "ffprobe returned no duration");
        assert_eq!(err.to_string(), "video: ffprobe returned no duration");
    }
}
