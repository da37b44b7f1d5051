//! Event types for the merged session timeline.
//!
//! A [`ProcessedEvent`] is the canonical unit flowing through the pipeline.
//! Extractors produce them and the formatter consumes the final ordered
//! list. Events are immutable once appended: augmentation adds new events
//! rather than editing existing ones.

use serde::{Deserialize, Serialize};

// ─────────────────────────────────────────────────────────────────────────────
// Drag points
// ─────────────────────────────────────────────────────────────────────────────

/// One point of a drag trajectory.
///
/// `time` is milliseconds relative to the start of the drag, not the session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DragPoint {
    /// Milliseconds since the drag began.
    pub time: i64,
    /// X pixel coordinate.
    pub x: i64,
    /// Y pixel coordinate.
    pub y: i64,
}

impl DragPoint {
    /// Create a point.
    #[must_use]
    pub fn new(time: i64, x: i64, y: i64) -> Self {
        Self { time, x, y }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Processed events
// ─────────────────────────────────────────────────────────────────────────────

/// One event on the session timeline (discriminated by `type`).
///
/// Every variant carries `timestamp`: milliseconds relative to session start.
/// Within one processed timeline events are totally ordered by timestamp,
/// with ties broken by insertion order.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProcessedEvent {
    /// A still frame of the session screen (base64-encoded image).
    Frame {
        /// Relative timestamp in ms.
        timestamp: i64,
        /// Base64-encoded image bytes.
        frame: String,
    },
    /// A mouse click at a fixed position.
    Mouseclick {
        /// Relative timestamp in ms.
        timestamp: i64,
        /// X pixel coordinate.
        x: i64,
        /// Y pixel coordinate.
        y: i64,
    },
    /// A mouse drag along a resampled trajectory.
    Mousedrag {
        /// Relative timestamp in ms.
        timestamp: i64,
        /// Ordered trajectory points, times relative to drag start.
        coordinates: Vec<DragPoint>,
    },
    /// A run of typed printable text.
    Type {
        /// Relative timestamp in ms (first character of the run).
        timestamp: i64,
        /// The typed text.
        text: String,
    },
    /// A key combination, e.g. `ctrl-alt-delete` or a bare `enter`.
    Hotkey {
        /// Relative timestamp in ms.
        timestamp: i64,
        /// Modifier-joined key name.
        text: String,
    },
    /// A task prompt shown to the session user.
    Quest {
        /// Relative timestamp in ms.
        timestamp: i64,
        /// Prompt text.
        message: String,
    },
    /// A hint shown to the session user.
    Hint {
        /// Relative timestamp in ms.
        timestamp: i64,
        /// Hint text.
        message: String,
    },
    /// A synthetic free-text description of one frame.
    DenseCaption {
        /// Relative timestamp in ms (matches the captioned frame).
        timestamp: i64,
        /// The captioned frame (base64).
        frame: String,
        /// Generated caption.
        text: String,
    },
    /// A synthetic narration of what changed between two frames.
    StateTransition {
        /// Relative timestamp in ms (matches the after frame).
        timestamp: i64,
        /// Frame before the transition (base64).
        before_frame: String,
        /// Frame after the transition (base64).
        after_frame: String,
        /// Generated narration.
        text: String,
    },
    /// Synthetic structured queries about one frame's interface layout.
    StructuredData {
        /// Relative timestamp in ms (matches the analyzed frame).
        timestamp: i64,
        /// The analyzed frame (base64).
        frame: String,
        /// JSON document embedding the OCR elements and generated queries.
        text: String,
    },
    /// A synthetic first-person rationale preceding an action.
    Reasoning {
        /// Relative timestamp in ms.
        timestamp: i64,
        /// Rationale text.
        text: String,
    },
}

impl ProcessedEvent {
    /// Relative timestamp of the event in milliseconds.
    #[must_use]
    pub fn timestamp(&self) -> i64 {
        match self {
            Self::Frame { timestamp, .. }
            | Self::Mouseclick { timestamp, .. }
            | Self::Mousedrag { timestamp, .. }
            | Self::Type { timestamp, .. }
            | Self::Hotkey { timestamp, .. }
            | Self::Quest { timestamp, .. }
            | Self::Hint { timestamp, .. }
            | Self::DenseCaption { timestamp, .. }
            | Self::StateTransition { timestamp, .. }
            | Self::StructuredData { timestamp, .. }
            | Self::Reasoning { timestamp, .. } => *timestamp,
        }
    }

    /// The serialized discriminator for this event.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Frame { .. } => "frame",
            Self::Mouseclick { .. } => "mouseclick",
            Self::Mousedrag { .. } => "mousedrag",
            Self::Type { .. } => "type",
            Self::Hotkey { .. } => "hotkey",
            Self::Quest { .. } => "quest",
            Self::Hint { .. } => "hint",
            Self::DenseCaption { .. } => "dense_caption",
            Self::StateTransition { .. } => "state_transition",
            Self::StructuredData { .. } => "structured_data",
            Self::Reasoning { .. } => "reasoning",
        }
    }

    /// Returns `true` for screen frame events.
    #[must_use]
    pub fn is_frame(&self) -> bool {
        matches!(self, Self::Frame { .. })
    }

    /// Returns `true` for user actions (click, drag, typed text, hotkey).
    ///
    /// These are the events that can sit between two frames and make the
    /// pair an interesting state transition.
    #[must_use]
    pub fn is_action(&self) -> bool {
        matches!(
            self,
            Self::Mouseclick { .. } | Self::Mousedrag { .. } | Self::Type { .. } | Self::Hotkey { .. }
        )
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn event_serde_tag_is_snake_case() {
        let ev = ProcessedEvent::DenseCaption {
            timestamp: 42,
            frame: "abc".into(),
            text: "a caption".into(),
        };
        let v = serde_json::to_value(&ev).unwrap();
        assert_eq!(v["type"], "dense_caption");
        assert_eq!(v["timestamp"], 42);
    }

    #[test]
    fn mouseclick_roundtrip() {
        let ev = ProcessedEvent::Mouseclick {
            timestamp: 100,
            x: 12,
            y: 34,
        };
        let json = serde_json::to_string(&ev).unwrap();
        let back: ProcessedEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(ev, back);
    }

    #[test]
    fn mousedrag_coordinates_serialize_in_order() {
        let ev = ProcessedEvent::Mousedrag {
            timestamp: 0,
            coordinates: vec![DragPoint::new(0, 1, 2), DragPoint::new(10, 3, 4)],
        };
        let v = serde_json::to_value(&ev).unwrap();
        assert_eq!(v["coordinates"][0]["time"], 0);
        assert_eq!(v["coordinates"][1]["x"], 3);
    }

    #[test]
    fn deserialize_from_wire_shape() {
        let v = json!({"type": "hotkey", "timestamp": 7, "text": "ctrl-c"});
        let ev: ProcessedEvent = serde_json::from_value(v).unwrap();
        assert_eq!(
            ev,
            ProcessedEvent::Hotkey {
                timestamp: 7,
                text: "ctrl-c".into()
            }
        );
    }

    #[test]
    fn timestamp_accessor_covers_all_variants() {
        let events = vec![
            ProcessedEvent::Frame {
                timestamp: 1,
                frame: String::new(),
            },
            ProcessedEvent::Type {
                timestamp: 2,
                text: "x".into(),
            },
            ProcessedEvent::Reasoning {
                timestamp: 3,
                text: "y".into(),
            },
        ];
        let ts: Vec<i64> = events.iter().map(ProcessedEvent::timestamp).collect();
        assert_eq!(ts, vec![1, 2, 3]);
    }

    #[test]
    fn is_action_matches_user_actions_only() {
        assert!(
            ProcessedEvent::Mouseclick {
                timestamp: 0,
                x: 0,
                y: 0
            }
            .is_action()
        );
        assert!(
            ProcessedEvent::Hotkey {
                timestamp: 0,
                text: "enter".into()
            }
            .is_action()
        );
        assert!(
            !ProcessedEvent::Frame {
                timestamp: 0,
                frame: String::new()
            }
            .is_action()
        );
        assert!(
            !ProcessedEvent::Quest {
                timestamp: 0,
                message: String::new()
            }
            .is_action()
        );
    }

    #[test]
    fn kind_matches_serde_tag() {
        let ev = ProcessedEvent::StateTransition {
            timestamp: 0,
            before_frame: String::new(),
            after_frame: String::new(),
            text: String::new(),
        };
        let v = serde_json::to_value(&ev).unwrap();
        assert_eq!(v["type"], ev.kind());
    }
}
