//! Vendor chat fine-tuning schema and transcript conversion.

use serde::{Deserialize, Serialize};
use traject_core::{Message, MessageContent, MessageRole};

/// System message prepended to every emitted conversation.
pub const SYSTEM_PROMPT: &str = "You are an expert drawing assistant that helps users create \
drawings by providing precise coordinate instructions. You break down complex drawings into a \
series of strokes, explaining each step clearly and providing exact coordinates using Python \
drag commands. Each drag command contains 32 coordinate pairs in absolute values.";

/// One conversation of the emitted dataset (`{"messages": [...]}` per line).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Conversation {
    /// Ordered fine-tune messages, system first, assistant last.
    pub messages: Vec<FineTuneMessage>,
}

/// One message in the vendor schema.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FineTuneMessage {
    /// `system`, `user`, or `assistant`.
    pub role: String,
    /// Plain string for text, content-part array for images.
    pub content: FineTuneContent,
}

/// Message content — plain text or an array of typed parts.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FineTuneContent {
    /// Plain text content.
    Text(String),
    /// Structured content parts (used for images).
    Parts(Vec<ContentPart>),
}

/// One part of a structured content array.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ContentPart {
    /// Part discriminator: `text` or `image_url`.
    #[serde(rename = "type")]
    pub part_type: String,
    /// Text payload for `text` parts.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Image payload for `image_url` parts.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<ImageUrl>,
}

/// Data-URI image reference.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageUrl {
    /// `data:image/jpeg;base64,...`
    pub url: String,
}

impl FineTuneMessage {
    fn text(role: &str, content: String) -> Self {
        Self {
            role: role.into(),
            content: FineTuneContent::Text(content),
        }
    }

    fn image(role: &str, base64_data: &str) -> Self {
        Self {
            role: role.into(),
            content: FineTuneContent::Parts(vec![ContentPart {
                part_type: "image_url".into(),
                text: None,
                image_url: Some(ImageUrl {
                    url: format!("data:image/jpeg;base64,{base64_data}"),
                }),
            }]),
        }
    }
}

fn role_name(role: MessageRole) -> &'static str {
    match role {
        MessageRole::User => "user",
        MessageRole::Assistant => "assistant",
    }
}

/// Convert a formatted transcript into the vendor fine-tuning schema.
///
/// - Prepends the fixed system message
/// - Text becomes plain string content; images become data-URI part arrays
/// - Consecutive same-role text messages merge with a newline; a text/image
///   boundary starts a new message instead of merging
/// - Trailing user messages are stripped so every conversation ends on an
///   assistant turn
#[must_use]
pub fn convert_messages(messages: &[Message]) -> Conversation {
    let converted: Vec<FineTuneMessage> = messages
        .iter()
        .map(|msg| match &msg.content {
            MessageContent::Text(text) => {
                FineTuneMessage::text(role_name(msg.role), text.clone())
            }
            MessageContent::Image { data, .. } => {
                FineTuneMessage::image(role_name(msg.role), data)
            }
        })
        .collect();

    // Merge runs of same-role text; everything else replaces the current
    // message rather than merging into it.
    let mut consolidated: Vec<FineTuneMessage> = Vec::new();
    let mut current: Option<FineTuneMessage> = None;

    for msg in converted {
        let Some(mut cur) = current.take() else {
            current = Some(msg);
            continue;
        };

        let merged = if cur.role == msg.role {
            match (&mut cur.content, &msg.content) {
                (FineTuneContent::Text(existing), FineTuneContent::Text(incoming)) => {
                    existing.push('\n');
                    existing.push_str(incoming);
                    true
                }
                _ => false,
            }
        } else {
            false
        };

        if merged {
            current = Some(cur);
        } else {
            consolidated.push(cur);
            current = Some(msg);
        }
    }
    if let Some(cur) = current {
        consolidated.push(cur);
    }

    // Conversations must end on an assistant turn.
    while consolidated.last().is_some_and(|m| m.role == "user") {
        let _ = consolidated.pop();
    }

    let mut out = vec![FineTuneMessage::text("system", SYSTEM_PROMPT.to_string())];
    out.extend(consolidated);
    Conversation { messages: out }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_message_comes_first() {
        let convo = convert_messages(&[Message::assistant("done", 0)]);
        assert_eq!(convo.messages[0].role, "system");
        assert_eq!(
            convo.messages[0].content,
            FineTuneContent::Text(SYSTEM_PROMPT.to_string())
        );
    }

    #[test]
    fn consecutive_same_role_text_merges() {
        let convo = convert_messages(&[
            Message::user("first", 0),
            Message::user("second", 1),
            Message::assistant("reply", 2),
        ]);
        assert_eq!(convo.messages.len(), 3);
        assert_eq!(
            convo.messages[1].content,
            FineTuneContent::Text("first\nsecond".into())
        );
    }

    #[test]
    fn text_then_image_does_not_merge() {
        let convo = convert_messages(&[
            Message::user("look:", 0),
            Message::user_image("QUJD", 1),
            Message::assistant("seen", 2),
        ]);
        // system + text + image + assistant
        assert_eq!(convo.messages.len(), 4);
        assert!(matches!(
            convo.messages[2].content,
            FineTuneContent::Parts(_)
        ));
    }

    #[test]
    fn consecutive_images_stay_separate() {
        let convo = convert_messages(&[
            Message::user_image("QQ==", 0),
            Message::user_image("Qg==", 1),
            Message::assistant("two frames", 2),
        ]);
        assert_eq!(convo.messages.len(), 4);
    }

    #[test]
    fn trailing_user_messages_are_stripped() {
        let convo = convert_messages(&[
            Message::user("prompt", 0),
            Message::assistant("reply", 1),
            Message::user("dangling", 2),
            Message::user_image("QUJD", 3),
        ]);
        let last = convo.messages.last().unwrap();
        assert_eq!(last.role, "assistant");
    }

    #[test]
    fn all_user_conversation_reduces_to_system_only() {
        let convo = convert_messages(&[Message::user("a", 0), Message::user("b", 1)]);
        assert_eq!(convo.messages.len(), 1);
        assert_eq!(convo.messages[0].role, "system");
    }

    #[test]
    fn image_becomes_data_uri_part() {
        let convo = convert_messages(&[
            Message::user_image("QUJD", 0),
            Message::assistant("ok", 1),
        ]);
        let FineTuneContent::Parts(parts) = &convo.messages[1].content else {
            panic!("expected parts");
        };
        assert_eq!(parts[0].part_type, "image_url");
        assert_eq!(
            parts[0].image_url.as_ref().unwrap().url,
            "data:image/jpeg;base64,QUJD"
        );
    }

    #[test]
    fn conversation_serializes_to_messages_object() {
        let convo = convert_messages(&[Message::assistant("x", 0)]);
        let v = serde_json::to_value(&convo).unwrap();
        assert!(v.get("messages").is_some());
        assert_eq!(v["messages"][0]["role"], "system");
    }
}
