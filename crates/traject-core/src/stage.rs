//! Pipeline stage traits.
//!
//! Extractors turn a session's raw artifacts into events; augmenters enrich
//! an event list by appending new events. Both are object-safe so the
//! orchestrator can hold an ordered, heterogeneous stage list.

use async_trait::async_trait;

use crate::errors::StageError;
use crate::events::ProcessedEvent;

/// A stage that produces events from one session's recorded artifacts.
#[async_trait]
pub trait Extractor: Send + Sync {
    /// Stage name used in logs and error messages.
    fn name(&self) -> &'static str;

    /// Extract events for the session. A returned error aborts the whole
    /// session's pipeline run.
    async fn extract(&self, session_id: &str) -> Result<Vec<ProcessedEvent>, StageError>;
}

/// A stage that appends derived events to a merged timeline.
///
/// Augmenters never remove or edit existing events. Per-item failures inside
/// an augmenter (a single model call or OCR pass) are logged and skipped by
/// the stage itself; an error returned here is stage-fatal.
#[async_trait]
pub trait Augmenter: Send + Sync {
    /// Stage name used in logs and error messages.
    fn name(&self) -> &'static str;

    /// Append derived events to the timeline and return it.
    async fn augment(
        &self,
        events: Vec<ProcessedEvent>,
    ) -> Result<Vec<ProcessedEvent>, StageError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extractor_is_object_safe() {
        fn assert_object_safe(_: &dyn Extractor) {}
        let _ = assert_object_safe;
    }

    #[test]
    fn augmenter_is_object_safe() {
        fn assert_object_safe(_: &dyn Augmenter) {}
        let _ = assert_object_safe;
    }
}
