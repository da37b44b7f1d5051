//! Video extractor stage.

use std::path::PathBuf;

use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use tracing::{debug, info};
use traject_core::{Extractor, ProcessedEvent, StageError};

use crate::frames::extract_frame;
use crate::probe::probe_duration_ms;

/// Emits one `frame` event per whole second of a session's screen recording
/// (`<data_dir>/<session_id>.m4v`).
#[derive(Clone, Debug)]
pub struct VideoExtractor {
    data_dir: PathBuf,
}

impl VideoExtractor {
    /// Create an extractor rooted at the session data directory.
    #[must_use]
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    fn video_path(&self, session_id: &str) -> PathBuf {
        self.data_dir.join(format!("{session_id}.m4v"))
    }
}

#[async_trait]
impl Extractor for VideoExtractor {
    fn name(&self) -> &'static str {
        "video"
    }

    async fn extract(&self, session_id: &str) -> Result<Vec<ProcessedEvent>, StageError> {
        let video = self.video_path(session_id);
        if !video.exists() {
            return Err(StageError::MissingArtifact { path: video });
        }

        let duration_ms = probe_duration_ms(&video).await?;
        let scratch = tempfile::tempdir()?;

        let mut events = Vec::new();
        let mut timestamp = 0;
        while timestamp < duration_ms {
            // Individual seek failures skip the timestamp, not the session.
            if let Some(bytes) = extract_frame(&video, timestamp, scratch.path()).await {
                events.push(ProcessedEvent::Frame {
                    timestamp,
                    frame: BASE64.encode(bytes),
                });
            } else {
                debug!(session_id, timestamp, "skipping unextractable frame");
            }
            timestamp += 1000;
        }

        info!(
            session_id,
            duration_ms,
            frames = events.len(),
            "video frames extracted"
        );
        Ok(events)
    }
}
