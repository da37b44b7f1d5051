//! Capability traits for the external services augmentation depends on.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::errors::VisionError;

/// One completion request to a vision-capable chat model.
#[derive(Clone, Debug, Default)]
pub struct ChatRequest {
    /// The user prompt.
    pub prompt: String,
    /// Base64-encoded JPEG frames attached to the prompt, in order.
    pub images: Vec<String>,
    /// Maximum tokens to generate.
    pub max_tokens: u32,
    /// Sampling temperature, when the default should not apply.
    pub temperature: Option<f64>,
}

impl ChatRequest {
    /// Build a text-plus-images request with the given generation budget.
    #[must_use]
    pub fn new(prompt: impl Into<String>, images: Vec<String>, max_tokens: u32) -> Self {
        Self {
            prompt: prompt.into(),
            images,
            max_tokens,
            temperature: None,
        }
    }

    /// Set the sampling temperature.
    #[must_use]
    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = Some(temperature);
        self
    }
}

/// A vision-capable chat model.
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Run one completion and return the generated text.
    async fn complete(&self, request: ChatRequest) -> Result<String, VisionError>;
}

/// One recognized word and its bounding box, in image pixel coordinates.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextElement {
    /// Recognized text.
    pub text: String,
    /// Left edge.
    pub x: i64,
    /// Top edge.
    pub y: i64,
    /// Box width.
    pub width: i64,
    /// Box height.
    pub height: i64,
}

/// A word-level OCR engine.
#[async_trait]
pub trait OcrEngine: Send + Sync {
    /// Recognize words with bounding boxes in an encoded image.
    async fn recognize(&self, image: &[u8]) -> Result<Vec<TextElement>, VisionError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chat_model_is_object_safe() {
        fn assert_object_safe(_: &dyn ChatModel) {}
        let _ = assert_object_safe;
    }

    #[test]
    fn ocr_engine_is_object_safe() {
        fn assert_object_safe(_: &dyn OcrEngine) {}
        let _ = assert_object_safe;
    }

    #[test]
    fn text_element_serializes_flat() {
        let el = TextElement {
            text: "File".into(),
            x: 10,
            y: 4,
            width: 30,
            height: 12,
        };
        let v = serde_json::to_value(&el).unwrap();
        assert_eq!(v["text"], "File");
        assert_eq!(v["width"], 30);
    }
}
