//! Event → message formatting.
//!
//! A pure mapping from the ordered timeline to a role-tagged transcript.
//! Frames and task text arrive from the user side; actions, rationales, and
//! model-derived annotations are attributed to the assistant. Actions render
//! as one fenced code block holding the canonical call expression, which is
//! the exact surface a trained agent is expected to emit.

use serde_json::Value;
use traject_core::{Message, ProcessedEvent};

const CAPTION_INSTRUCTION: &str = "Provide a detailed description of the GUI screenshot, \
including all visible elements, layout, and styling.";

const TRANSITION_INSTRUCTION: &str = "Describe what has changed and what user interaction \
likely occurred between these screenshots.";

/// Convert the final event timeline into a conversational transcript.
///
/// Events with no conversational representation (for example a drag with
/// fewer than two points) yield no message and are dropped.
#[must_use]
pub fn format_messages(events: &[ProcessedEvent]) -> Vec<Message> {
    let mut messages = Vec::new();

    for event in events {
        match event {
            ProcessedEvent::Frame { timestamp, frame } => {
                messages.push(Message::user_image(frame.clone(), *timestamp));
            }

            ProcessedEvent::Quest { timestamp, message }
            | ProcessedEvent::Hint { timestamp, message } => {
                messages.push(Message::user(message.clone(), *timestamp));
            }

            ProcessedEvent::Reasoning { timestamp, text } => {
                messages.push(Message::assistant(text.clone(), *timestamp));
            }

            ProcessedEvent::DenseCaption {
                timestamp,
                frame,
                text,
            } => {
                messages.push(Message::user_image(frame.clone(), *timestamp));
                messages.push(Message::user(CAPTION_INSTRUCTION, *timestamp));
                messages.push(Message::assistant(text.clone(), *timestamp));
            }

            ProcessedEvent::StateTransition {
                timestamp,
                before_frame,
                after_frame,
                text,
            } => {
                messages.push(Message::user_image(before_frame.clone(), *timestamp));
                messages.push(Message::user_image(after_frame.clone(), *timestamp));
                messages.push(Message::user(TRANSITION_INSTRUCTION, *timestamp));
                messages.push(Message::assistant(text.clone(), *timestamp));
            }

            ProcessedEvent::StructuredData {
                timestamp,
                frame,
                text,
            } => {
                format_structured(frame, text, *timestamp, &mut messages);
            }

            ProcessedEvent::Mouseclick { timestamp, x, y } => {
                messages.push(action_message(format!("click({x}, {y})"), *timestamp));
            }

            ProcessedEvent::Mousedrag {
                timestamp,
                coordinates,
            } => {
                if coordinates.len() >= 2 {
                    let flat: Vec<String> = coordinates
                        .iter()
                        .flat_map(|p| [p.x.to_string(), p.y.to_string()])
                        .collect();
                    messages.push(action_message(
                        format!("drag([{}])", flat.join(", ")),
                        *timestamp,
                    ));
                }
            }

            ProcessedEvent::Type { timestamp, text } => {
                messages.push(action_message(format!("type(\"{text}\")"), *timestamp));
            }

            ProcessedEvent::Hotkey { timestamp, text } => {
                messages.push(action_message(format!("hotkey(\"{text}\")"), *timestamp));
            }
        }
    }

    messages
}

fn action_message(call: String, timestamp: i64) -> Message {
    Message::assistant(format!("```python\n{call}\n```"), timestamp)
}

/// Expand a structured-data payload into per-query exchange triplets.
///
/// The payload embeds the OCR elements and the generated queries; a payload
/// that fails to parse contributes nothing.
fn format_structured(frame: &str, text: &str, timestamp: i64, messages: &mut Vec<Message>) {
    let Ok(payload) = serde_json::from_str::<Value>(text) else {
        return;
    };
    let Some(queries) = payload.get("queries").and_then(Value::as_array) else {
        return;
    };

    for query in queries {
        let Some(question) = query.get("query").and_then(Value::as_str) else {
            continue;
        };
        let Some(response) = query.get("response") else {
            continue;
        };
        let rendered = serde_json::to_string_pretty(response)
            .unwrap_or_else(|_| response.to_string());

        messages.push(Message::user_image(frame.to_string(), timestamp));
        messages.push(Message::user(
            format!("Analyze the interface and provide a structured JSON response to: {question}"),
            timestamp,
        ));
        messages.push(Message::assistant(rendered, timestamp));
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
