//! State transition augmentation: narrate what changed between two frames
//! that have user actions between them.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Value, json};
use tracing::{info, warn};
use traject_core::{Augmenter, ProcessedEvent, StageError};
use traject_vision::{ChatModel, ChatRequest};

use super::sample_indices;

/// A candidate transition: two frames and the actions strictly between them.
struct Transition {
    before_timestamp: i64,
    before_frame: String,
    after_timestamp: i64,
    after_frame: String,
    actions: Vec<Value>,
}

/// Narrates a bounded random sample of frame-pair transitions.
pub struct StateTransitionAugmenter {
    model: Arc<dyn ChatModel>,
    max_samples: usize,
    max_tokens: u32,
}

impl StateTransitionAugmenter {
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

/// Compact JSON description of one intervening user action.
fn action_json(event: &ProcessedEvent) -> Option<Value> {
    match event {
        ProcessedEvent::Mouseclick { timestamp, x, y } => Some(json!({
            "type": "click", "x": x, "y": y, "timestamp": timestamp
        })),
        ProcessedEvent::Type { timestamp, text } => Some(json!({
            "type": "keyboard", "text": text, "timestamp": timestamp
        })),
        ProcessedEvent::Mousedrag {
            timestamp,
            coordinates,
        } => Some(json!({
            "type": "drag", "coordinates": coordinates, "timestamp": timestamp
        })),
        ProcessedEvent::Hotkey { timestamp, text } => Some(json!({
            "type": "hotkey", "text": text, "timestamp": timestamp
        })),
        _ => None,
    }
}

/// Consecutive frame pairs with at least one action strictly between them.
fn find_transitions(events: &[ProcessedEvent]) -> Vec<Transition> {
    let frames: Vec<(i64, &String)> = events
        .iter()
        .filter_map(|event| match event {
            ProcessedEvent::Frame { timestamp, frame } => Some((*timestamp, frame)),
            _ => None,
        })
        .collect();

    frames
        .windows(2)
        .filter_map(|pair| {
            let (before_ts, before) = pair[0];
            let (after_ts, after) = pair[1];
            let actions: Vec<Value> = events
                .iter()
                .filter(|e| {
                    e.is_action() && e.timestamp() > before_ts && e.timestamp() < after_ts
                })
                .filter_map(action_json)
                .collect();
            if actions.is_empty() {
                return None;
            }
            Some(Transition {
                before_timestamp: before_ts,
                before_frame: before.clone(),
                after_timestamp: after_ts,
                after_frame: after.clone(),
                actions,
            })
        })
        .collect()
}

fn transition_prompt(actions: &[Value]) -> String {
    let events_json =
        serde_json::to_string_pretty(actions).unwrap_or_else(|_| "[]".to_string());
    format!(
        "Given two consecutive GUI screenshots and a JSON array of user interactions that \
occurred between them, describe what has changed and what user interaction occurred, as if \
you were describing a scene transition in a movie.

The events array contains the actual user interactions that occurred, with timestamps and \
coordinates where applicable. Use this information to provide an accurate description of what \
the user did.

Events: {events_json}

Requirements:
1. Describe what was shown in the first screenshot
2. Describe what changed in the second screenshot
3. Use the provided events data to explain exactly what user actions occurred in between
4. If you see text that seems incorrect (like \"Fie\" instead of \"File\"), use your vision & \
language capabilities to infer the correct text while maintaining the provided coordinates"
    )
}

#[async_trait]
impl Augmenter for StateTransitionAugmenter {
    fn name(&self) -> &'static str {
        "state_transition"
    }

    async fn augment(
        &self,
        mut events: Vec<ProcessedEvent>,
    ) -> Result<Vec<ProcessedEvent>, StageError> {
        let transitions = find_transitions(&events);
        let sampled = sample_indices(transitions.len(), self.max_samples);
        info!(
            candidates = transitions.len(),
            sampled = sampled.len(),
            "narrating state transitions"
        );

        for index in sampled {
            let transition = &transitions[index];
            let request = ChatRequest::new(
                transition_prompt(&transition.actions),
                vec![
                    transition.before_frame.clone(),
                    transition.after_frame.clone(),
                ],
                self.max_tokens,
            );
            match self.model.complete(request).await {
                Ok(text) => {
                    events.push(ProcessedEvent::StateTransition {
                        timestamp: transition.after_timestamp,
                        before_frame: transition.before_frame.clone(),
                        after_frame: transition.after_frame.clone(),
                        text,
                    });
                }
                Err(error) => {
                    warn!(
                        before = transition.before_timestamp,
                        after = transition.after_timestamp,
                        %error,
                        "transition narration failed, skipping pair"
                    );
                }
            }
        }

        Ok(events)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
