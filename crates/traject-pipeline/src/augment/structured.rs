//! Structured data augmentation: OCR a sampled frame, then have the model
//! synthesize grounded queries about the interface layout.

use std::sync::Arc;

use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, warn};
use traject_core::{Augmenter, ProcessedEvent, StageError};
use traject_vision::{ChatModel, ChatRequest, OcrEngine, TextElement};

use super::sample_indices;

/// How many query/response pairs the model is asked for per frame.
const QUERIES_PER_FRAME: usize = 3;

/// One synthesized question about the interface and its structured answer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StructuredQuery {
    /// The question, e.g. "What buttons appear in the bottom-left corner?".
    pub query: String,
    /// Structured JSON answer grounded in the OCR coordinates.
    pub response: serde_json::Value,
}

/// Generates structured layout queries for a bounded random sample of
/// frames, grounded in word-level OCR boxes.
pub struct StructuredDataAugmenter {
    model: Arc<dyn ChatModel>,
    ocr: Arc<dyn OcrEngine>,
    max_samples: usize,
    max_tokens: u32,
}

impl StructuredDataAugmenter {
    /// Create the stage with its sampling cap and per-call generation budget.
    #[must_use]
    pub fn new(
        model: Arc<dyn ChatModel>,
        ocr: Arc<dyn OcrEngine>,
        max_samples: usize,
        max_tokens: u32,
    ) -> Self {
        Self {
            model,
            ocr,
            max_samples,
            max_tokens,
        }
    }

    async fn analyze_frame(
        &self,
        timestamp: i64,
        frame: &str,
    ) -> Result<ProcessedEvent, String> {
        let bytes = BASE64
            .decode(frame)
            .map_err(|e| format!("frame is not valid base64: {e}"))?;

        let elements = self
            .ocr
            .recognize(&bytes)
            .await
            .map_err(|e| format!("ocr failed: {e}"))?;

        let request = ChatRequest::new(query_prompt(&elements), vec![], self.max_tokens)
            .with_temperature(0.7);
        let raw = self
            .model
            .complete(request)
            .await
            .map_err(|e| format!("query synthesis failed: {e}"))?;

        let queries: Vec<StructuredQuery> = serde_json::from_str(strip_code_fences(&raw))
            .map_err(|e| format!("model returned invalid JSON: {e}"))?;
        if queries.len() != QUERIES_PER_FRAME {
            warn!(
                timestamp,
                count = queries.len(),
                "model returned an unexpected query count"
            );
        }

        let text = serde_json::to_string_pretty(&json!({
            "elements": elements,
            "queries": queries,
        }))
        .map_err(|e| e.to_string())?;

        Ok(ProcessedEvent::StructuredData {
            timestamp,
            frame: frame.to_string(),
            text,
        })
    }
}

/// Prompt asking for exactly three grounded `{query, response}` pairs.
fn query_prompt(elements: &[TextElement]) -> String {
    let element_lines: Vec<String> = elements
        .iter()
        .map(|e| format!("\"{}\" at ({},{})", e.text, e.x, e.y))
        .collect();
    format!(
        "You are a structured data analyzer. Given text elements and their coordinates from a \
GUI screenshot, generate {QUERIES_PER_FRAME} queries about the interface layout and their responses.

The text elements are:
{}

Respond with a JSON array containing exactly {QUERIES_PER_FRAME} objects. Each object should have a \
\"query\" field asking about some aspect of the interface (buttons, text fields, navigation, \
etc) and a \"response\" field with the structured answer.

Example response format (do not use markdown):
[{{\"query\":\"What buttons appear in the bottom-left corner?\",\"response\":{{\"buttons\":[{{\"text\":\"Cancel\",\"position\":{{\"x\":10,\"y\":450}}}}]}}}}]",
        element_lines.join("\n")
    )
}

/// Drop markdown code fences a chatty model may wrap its JSON in.
fn strip_code_fences(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Skip the language tag on the opening fence line.
    let body = rest.split_once('\n').map_or(rest, |(_, body)| body);
    body.trim().strip_suffix("```").unwrap_or(body).trim()
}

#[async_trait]
impl Augmenter for StructuredDataAugmenter {
    fn name(&self) -> &'static str {
        "structured_data"
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
            "generating structured queries"
        );

        for index in sampled {
            let (timestamp, frame) = &frames[index];
            match self.analyze_frame(*timestamp, frame).await {
                Ok(event) => events.push(event),
                Err(reason) => {
                    warn!(timestamp, %reason, "structured analysis failed, skipping frame");
                }
            }
        }

        Ok(events)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
