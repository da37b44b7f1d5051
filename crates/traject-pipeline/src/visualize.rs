//! Self-contained debug HTML for event and message timelines.
//!
//! Inspection aid only — the markup is not a stability contract.

use chrono::DateTime;
use traject_core::{Message, MessageContent, MessageRole, ProcessedEvent};

const DAY_MS: i64 = 24 * 60 * 60 * 1000;

/// Render a timestamp as a duration (`HH:MM:SS.mmm`) when it is
/// session-relative, or as a wall-clock instant otherwise.
fn format_timestamp(timestamp: i64) -> String {
    if (0..DAY_MS).contains(&timestamp) {
        let hours = timestamp / (60 * 60 * 1000);
        let minutes = (timestamp % (60 * 60 * 1000)) / (60 * 1000);
        let seconds = (timestamp % (60 * 1000)) / 1000;
        let millis = timestamp % 1000;
        format!("{hours:02}:{minutes:02}:{seconds:02}.{millis:03}")
    } else {
        DateTime::from_timestamp_millis(timestamp)
            .map_or_else(|| timestamp.to_string(), |dt| dt.to_rfc3339())
    }
}

fn event_content(event: &ProcessedEvent) -> String {
    match event {
        ProcessedEvent::Frame { frame, .. } => {
            format!(r#"<img src="data:image/jpeg;base64,{frame}" height="200"/>"#)
        }
        ProcessedEvent::Mouseclick { x, y, .. } => format!("click({x}, {y})"),
        ProcessedEvent::Mousedrag { coordinates, .. } => {
            let coords: Vec<String> = coordinates
                .iter()
                .map(|c| format!("[{}ms: ({}, {})]", c.time, c.x, c.y))
                .collect();
            format!("mousedrag: {}", coords.join(", "))
        }
        ProcessedEvent::Type { text, .. }
        | ProcessedEvent::Hotkey { text, .. }
        | ProcessedEvent::Reasoning { text, .. }
        | ProcessedEvent::DenseCaption { text, .. }
        | ProcessedEvent::StateTransition { text, .. }
        | ProcessedEvent::StructuredData { text, .. } => text.clone(),
        ProcessedEvent::Quest { message, .. } | ProcessedEvent::Hint { message, .. } => {
            message.clone()
        }
    }
}

/// Render the ordered event list as a standalone HTML fragment.
#[must_use]
pub fn visualize_events(events: &[ProcessedEvent]) -> String {
    let rows: Vec<String> = events
        .iter()
        .map(|event| {
            format!(
                r#"
            <div class="event">
                <span class="timestamp">{}</span>
                <span class="role {}">{}</span>
                <pre class="content">{}</pre>
            </div>"#,
                format_timestamp(event.timestamp()),
                event.kind(),
                event.kind(),
                event_content(event)
            )
        })
        .collect();

    format!(
        r#"
        <div class="event-stream">
            <style>
                .event {{ margin: 5px; padding: 5px; border-left: 3px solid #ccc; }}
                .timestamp {{ color: #666; margin-right: 10px; }}
                .role {{ font-weight: bold; margin-right: 10px; text-transform: uppercase; }}
                .role.frame {{ color: #2c5282; }}
                .role.type, .role.hotkey {{ color: #e53e3e; }}
                .role.mouseclick, .role.mousedrag {{ color: #2f855a; }}
                .role.quest, .role.hint {{ color: #b7791f; }}
                .content {{ margin: 0; white-space: pre-wrap; font-family: monospace; }}
            </style>
            {}
        </div>"#,
        rows.join("\n")
    )
}

/// Render the formatted transcript as a standalone HTML fragment.
#[must_use]
pub fn visualize_messages(messages: &[Message]) -> String {
    let rows: Vec<String> = messages
        .iter()
        .map(|message| {
            let role = match message.role {
                MessageRole::User => "user",
                MessageRole::Assistant => "assistant",
            };
            let content = match &message.content {
                MessageContent::Text(text) => text.clone(),
                MessageContent::Image { data, .. } => {
                    format!(r#"<img src="data:image/jpeg;base64,{data}"/>"#)
                }
            };
            format!(
                r#"
            <div class="message">
                <span class="timestamp">{}</span>
                <span class="role {role}">{role}</span>
                <pre class="content">{content}</pre>
            </div>"#,
                format_timestamp(message.timestamp)
            )
        })
        .collect();

    format!(
        r#"
        <div class="message-stream">
            <style>
                .message {{ margin: 5px; padding: 5px; }}
                .role {{ font-weight: bold; margin-right: 10px; text-transform: uppercase; }}
                .role.user {{ color: #e53e3e; }}
                .role.assistant {{ color: #2c5282; }}
                .timestamp {{ color: #666; margin-right: 10px; }}
                .content {{ margin: 0; white-space: pre-wrap; font-family: monospace; }}
                .content img {{ max-height: 200px; }}
            </style>
            {}
        </div>"#,
        rows.join("\n")
    )
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
