//! Dense caption augmentation: one sampled frame → one free-text UI
//! description.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};
use traject_core::{Augmenter, ProcessedEvent, StageError};
use traject_vision::{ChatModel, ChatRequest};

use super::sample_indices;

const CAPTION_PROMPT: &str = "\
Provide a detailed description of the GUI screenshot, including all visible elements, layout, and styling. Focus on:
1. Layout structure and organization
2. Interactive elements (buttons, forms, etc.)
3. Visual styling and design elements
4. Content and text elements
5. Navigation elements if present";

/// Attaches model-written captions to a bounded random sample of frames.
pub struct DenseCaptionAugmenter {
    model: Arc<dyn ChatModel>,
    max_samples: usize,
    max_tokens: u32,
}

impl DenseCaptionAugmenter {
    /// Create the stage with its sampling cap and per-call generation budget.
    #[must_use]
    pub fn new(model: Arc<dyn ChatModel>, max_samples: usize, max_tokens: u32) -> Self {
        Self {
            model,
            max_samples,
            max_tokens,
        }
    }
}

#[async_trait]
impl Augmenter for DenseCaptionAugmenter {
    fn name(&self) -> &'static str {
        "dense_caption"
    }

    async fn augment(
        &self,
        mut events: Vec<ProcessedEvent>,
    ) -> Result<Vec<ProcessedEvent>, StageError> {
        let frames: Vec<(i64, String)> = events
            .iter()
            .filter_map(|event| match event {
                ProcessedEvent::Frame { timestamp, frame } => Some((*timestamp, frame.clone())),
                _ => None,
            })
            .collect();

        let sampled = sample_indices(frames.len(), self.max_samples);
        info!(
            total_frames = frames.len(),
            sampled = sampled.len(),
            "generating dense captions"
        );

        for index in sampled {
            let (timestamp, frame) = &frames[index];
            let request =
                ChatRequest::new(CAPTION_PROMPT, vec![frame.clone()], self.max_tokens);
            match self.model.complete(request).await {
                Ok(text) => {
                    events.push(ProcessedEvent::DenseCaption {
                        timestamp: *timestamp,
                        frame: frame.clone(),
                        text,
                    });
                }
                Err(error) => {
                    warn!(timestamp, %error, "caption generation failed, skipping frame");
                }
            }
        }

        Ok(events)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use traject_vision::VisionError;

    struct FixedModel {
        reply: &'static str,
        calls: AtomicUsize,
    }

    impl FixedModel {
        fn new(reply: &'static str) -> Self {
            Self {
                reply,
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl ChatModel for FixedModel {
        async fn complete(&self, _request: ChatRequest) -> Result<String, VisionError> {
            let _ = self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.reply.to_string())
        }
    }

    struct FailingModel;

    #[async_trait]
    impl ChatModel for FailingModel {
        async fn complete(&self, _request: ChatRequest) -> Result<String, VisionError> {
            Err(VisionError::MissingContent)
        }
    }

    fn frame(timestamp: i64) -> ProcessedEvent {
        ProcessedEvent::Frame {
            timestamp,
            frame: format!("frame-{timestamp}"),
        }
    }

    #[tokio::test]
    async fn captions_every_frame_under_the_cap() {
        let model = Arc::new(FixedModel::new("a caption"));
        let stage = DenseCaptionAugmenter::new(model.clone(), 5, 500);
        let out = stage.augment(vec![frame(0), frame(1000)]).await.unwrap();

        assert_eq!(out.len(), 4);
        assert_eq!(model.calls.load(Ordering::SeqCst), 2);
        let captions: Vec<_> = out
            .iter()
            .filter(|e| matches!(e, ProcessedEvent::DenseCaption { .. }))
            .collect();
        assert_eq!(captions.len(), 2);
    }

    #[tokio::test]
    async fn caption_carries_source_frame_and_timestamp() {
        let stage = DenseCaptionAugmenter::new(Arc::new(FixedModel::new("caption")), 5, 500);
        let out = stage.augment(vec![frame(42)]).await.unwrap();
        assert!(out.contains(&ProcessedEvent::DenseCaption {
            timestamp: 42,
            frame: "frame-42".into(),
            text: "caption".into(),
        }));
    }

    #[tokio::test]
    async fn sampling_respects_the_cap() {
        let model = Arc::new(FixedModel::new("c"));
        let stage = DenseCaptionAugmenter::new(model.clone(), 2, 500);
        let events: Vec<ProcessedEvent> = (0..10).map(|i| frame(i * 1000)).collect();
        let out = stage.augment(events).await.unwrap();
        assert_eq!(model.calls.load(Ordering::SeqCst), 2);
        assert_eq!(out.len(), 12);
    }

    #[tokio::test]
    async fn per_item_failure_skips_without_failing_stage() {
        let stage = DenseCaptionAugmenter::new(Arc::new(FailingModel), 5, 500);
        let out = stage.augment(vec![frame(0)]).await.unwrap();
        assert_eq!(out.len(), 1);
    }

    #[tokio::test]
    async fn no_frames_means_no_model_calls() {
        let model = Arc::new(FixedModel::new("c"));
        let stage = DenseCaptionAugmenter::new(model.clone(), 3, 500);
        let events = vec![ProcessedEvent::Mouseclick {
            timestamp: 0,
            x: 1,
            y: 2,
        }];
        let out = stage.augment(events.clone()).await.unwrap();
        assert_eq!(out, events);
        assert_eq!(model.calls.load(Ordering::SeqCst), 0);
    }
}
