//! Conversational message types produced by the formatter.
//!
//! A [`Message`] is the role-tagged unit of the transcript built from the
//! event timeline. One event maps to at most a handful of messages; events
//! with no conversational representation are dropped by the formatter.

use serde::{Deserialize, Serialize};

/// Who a message is attributed to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// The environment / task side of the conversation.
    User,
    /// The acting agent side of the conversation.
    Assistant,
}

/// Message content — plain text or a base64 image.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    /// Plain text.
    Text(String),
    /// An image payload.
    Image {
        /// Discriminator tag, always `"image"`.
        #[serde(rename = "type")]
        content_type: String,
        /// Base64-encoded image bytes.
        data: String,
    },
}

impl MessageContent {
    /// Text content, if this is a text message.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(t) => Some(t),
            Self::Image { .. } => None,
        }
    }

    /// Returns `true` for image content.
    #[must_use]
    pub fn is_image(&self) -> bool {
        matches!(self, Self::Image { .. })
    }
}

/// One message of the formatted transcript.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Message role.
    pub role: MessageRole,
    /// Text or image content.
    pub content: MessageContent,
    /// Relative timestamp (ms) of the originating event.
    pub timestamp: i64,
}

impl Message {
    /// Create a user text message.
    #[must_use]
    pub fn user(text: impl Into<String>, timestamp: i64) -> Self {
        Self {
            role: MessageRole::User,
            content: MessageContent::Text(text.into()),
            timestamp,
        }
    }

    /// Create a user image message from base64 data.
    #[must_use]
    pub fn user_image(data: impl Into<String>, timestamp: i64) -> Self {
        Self {
            role: MessageRole::User,
            content: MessageContent::Image {
                content_type: "image".into(),
                data: data.into(),
            },
            timestamp,
        }
    }

    /// Create an assistant text message.
    #[must_use]
    pub fn assistant(text: impl Into<String>, timestamp: i64) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: MessageContent::Text(text.into()),
            timestamp,
        }
    }
}
