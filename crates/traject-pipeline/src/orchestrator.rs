//! Pipeline orchestration: stage sequencing, timeline ordering, and
//! concurrent session fan-out.

use std::path::Path;
use std::sync::Arc;

use futures::future::try_join_all;
use tracing::{info, instrument};
use traject_core::{Augmenter, Extractor, ProcessedEvent, StageError};

use crate::visualize::visualize_events;

/// The session pipeline: an ordered list of extractors followed by an
/// ordered list of augmenters.
///
/// Stages run strictly in sequence for one session — augmenters see every
/// extractor's output plus the additions of augmenters ordered before them.
/// A stage error aborts that session's run; per-item fallibility lives
/// inside the augmentation stages themselves.
pub struct Pipeline {
    extractors: Vec<Arc<dyn Extractor>>,
    augmenters: Vec<Arc<dyn Augmenter>>,
}

impl Pipeline {
    /// Assemble a pipeline from its stages.
    #[must_use]
    pub fn new(extractors: Vec<Arc<dyn Extractor>>, augmenters: Vec<Arc<dyn Augmenter>>) -> Self {
        Self {
            extractors,
            augmenters,
        }
    }

    /// Run the full pipeline for one session and return the ordered,
    /// frame-collapsed timeline.
    #[instrument(skip(self))]
    pub async fn process(&self, session_id: &str) -> Result<Vec<ProcessedEvent>, StageError> {
        let mut events = Vec::new();
        for extractor in &self.extractors {
            let extracted = extractor.extract(session_id).await?;
            info!(
                stage = extractor.name(),
                events = extracted.len(),
                "extractor finished"
            );
            events.extend(extracted);
        }

        for augmenter in &self.augmenters {
            let before = events.len();
            events = augmenter.augment(events).await?;
            info!(
                stage = augmenter.name(),
                added = events.len() - before,
                "augmenter finished"
            );
        }

        // Stable sort keeps insertion order for equal timestamps.
        events.sort_by_key(ProcessedEvent::timestamp);
        Ok(collapse_frame_runs(events))
    }

    /// Process every session concurrently, writing a debug visualization per
    /// session into `output_dir`.
    ///
    /// Sessions are independent; the whole batch is awaited together, and a
    /// failed session fails the batch (retries belong to the caller).
    pub async fn run(
        &self,
        session_ids: &[String],
        output_dir: &Path,
    ) -> Result<Vec<Vec<ProcessedEvent>>, StageError> {
        let results =
            try_join_all(session_ids.iter().map(|id| self.process(id))).await?;

        for (session_id, events) in session_ids.iter().zip(&results) {
            let html = visualize_events(events);
            let path = output_dir.join(format!("session_{session_id}_debug.html"));
            tokio::fs::write(&path, html).await?;
        }

        Ok(results)
    }
}

/// Collapse every maximal run of consecutive `frame` events down to its last
/// member.
///
/// Per-second video sampling plus event-driven frame captures produce
/// adjacent near-duplicate frames; only the most recent state of each run is
/// informative.
#[must_use]
pub fn collapse_frame_runs(events: Vec<ProcessedEvent>) -> Vec<ProcessedEvent> {
    let mut result = Vec::with_capacity(events.len());
    let mut pending_frame: Option<ProcessedEvent> = None;

    for event in events {
        if event.is_frame() {
            pending_frame = Some(event);
        } else {
            if let Some(frame) = pending_frame.take() {
                result.push(frame);
            }
            result.push(event);
        }
    }
    if let Some(frame) = pending_frame {
        result.push(frame);
    }

    result
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
