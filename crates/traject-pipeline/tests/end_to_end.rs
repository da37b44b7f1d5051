//! Full-pipeline integration: raw session artifacts through extraction,
//! augmentation with deterministic fakes, formatting, and dataset assembly.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use traject_core::{Augmenter, Extractor, ProcessedEvent, StageError};
use traject_dataset::{TokenCounter, convert_messages, write_dataset};
use traject_pipeline::augment::{
    DenseCaptionAugmenter, StateTransitionAugmenter, StructuredDataAugmenter,
};
use traject_pipeline::{AppEventExtractor, Pipeline, format_messages};
use traject_proto::{ProtocolConfig, ProtocolExtractor};
use traject_vision::{ChatModel, ChatRequest, OcrEngine, TextElement, VisionError};

// ─────────────────────────────────────────────────────────────────────────────
// Fixtures
// ─────────────────────────────────────────────────────────────────────────────

fn elem(payload: &str) -> String {
    format!("{}.{payload}", payload.chars().count())
}

fn inst(parts: &[&str]) -> String {
    let encoded: Vec<String> = parts.iter().map(|p| elem(p)).collect();
    format!("{};", encoded.join(","))
}

/// A recorded session: anchor, typed "hi", one click, one long drag.
fn write_trace(dir: &Path) {
    let log = [
        inst(&["sync", "1000"]),
        inst(&["key", "104", "1", "1100"]), // h
        inst(&["key", "104", "0", "1150"]),
        inst(&["key", "105", "1", "1200"]), // i
        inst(&["key", "105", "0", "1250"]),
        inst(&["mouse", "50", "60", "1", "2000"]),
        inst(&["mouse", "50", "60", "0", "2040"]),
        inst(&["mouse", "100", "100", "1", "3000"]),
        inst(&["mouse", "200", "100", "1", "3400"]),
        inst(&["mouse", "300", "100", "0", "3900"]),
    ]
    .concat();
    std::fs::write(dir.join("s1.trace"), log).unwrap();
}

fn write_events(dir: &Path) {
    std::fs::write(
        dir.join("s1.events.json"),
        r#"{
            "timestamp": 1000,
            "events": [
                {"type": "quest", "timestamp": 1000, "message": "Fill in the greeting"},
                {"type": "hint", "timestamp": 2500, "message": "Drag the slider right"}
            ]
        }"#,
    )
    .unwrap();
}

/// Stands in for the video extractor, which needs ffmpeg: emits one frame
/// per second like the real stage would.
struct FixtureFrames;

#[async_trait]
impl Extractor for FixtureFrames {
    fn name(&self) -> &'static str {
        "fixture-frames"
    }

    async fn extract(&self, _session_id: &str) -> Result<Vec<ProcessedEvent>, StageError> {
        // base64 of "frame"
        Ok((0..5)
            .map(|i| ProcessedEvent::Frame {
                timestamp: i * 1000,
                frame: "ZnJhbWU=".to_string(),
            })
            .collect())
    }
}

struct FakeModel;

#[async_trait]
impl ChatModel for FakeModel {
    async fn complete(&self, request: ChatRequest) -> Result<String, VisionError> {
        // The structured stage asks for JSON; everything else gets prose.
        if request.prompt.contains("structured data analyzer") {
            Ok(r#"[
                {"query": "What is in the menu bar?", "response": {"items": ["File"]}},
                {"query": "Where is the canvas?", "response": {"x": 8, "y": 8}},
                {"query": "What buttons exist?", "response": {"buttons": []}}
            ]"#
            .to_string())
        } else if request.images.len() == 2 {
            Ok("The user clicked and the menu opened.".to_string())
        } else {
            Ok("A paint application with an empty canvas.".to_string())
        }
    }
}

struct FakeOcr;

#[async_trait]
impl OcrEngine for FakeOcr {
    async fn recognize(&self, _image: &[u8]) -> Result<Vec<TextElement>, VisionError> {
        Ok(vec![TextElement {
            text: "File".into(),
            x: 10,
            y: 4,
            width: 30,
            height: 12,
        }])
    }
}

fn whitespace_counter() -> TokenCounter {
    let vocab = std::collections::HashMap::from([("<unk>".to_string(), 0_u32)]);
    let model = tokenizers::models::wordlevel::WordLevel::builder()
        .vocab(vocab)
        .unk_token("<unk>".to_string())
        .build()
        .unwrap();
    let mut tokenizer = tokenizers::Tokenizer::new(model);
    let _ = tokenizer.with_pre_tokenizer(Some(
        tokenizers::pre_tokenizers::whitespace::Whitespace,
    ));
    TokenCounter::new(tokenizer)
}

fn build_pipeline(data_dir: &Path) -> Pipeline {
    let model = Arc::new(FakeModel);
    let ocr = Arc::new(FakeOcr);
    let extractors: Vec<Arc<dyn Extractor>> = vec![
        Arc::new(FixtureFrames),
        Arc::new(ProtocolExtractor::new(data_dir, ProtocolConfig::default())),
        Arc::new(AppEventExtractor::new(data_dir)),
    ];
    let augmenters: Vec<Arc<dyn Augmenter>> = vec![
        Arc::new(DenseCaptionAugmenter::new(model.clone(), 2, 500)),
        Arc::new(StateTransitionAugmenter::new(model.clone(), 2, 500)),
        Arc::new(StructuredDataAugmenter::new(model, ocr, 1, 1000)),
    ];
    Pipeline::new(extractors, augmenters)
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn pipeline_produces_ordered_annotated_timeline() {
    let dir = tempfile::tempdir().unwrap();
    write_trace(dir.path());
    write_events(dir.path());

    let events = build_pipeline(dir.path()).process("s1").await.unwrap();

    // Ordered by timestamp.
    let timestamps: Vec<i64> = events.iter().map(ProcessedEvent::timestamp).collect();
    let mut sorted = timestamps.clone();
    sorted.sort_unstable();
    assert_eq!(timestamps, sorted);

    // No two adjacent frames survive collapsing.
    for pair in events.windows(2) {
        assert!(!(pair[0].is_frame() && pair[1].is_frame()));
    }

    // Extraction found the typed text, the click, and the drag.
    assert!(events.iter().any(
        |e| matches!(e, ProcessedEvent::Type { text, timestamp } if text == "hi" && *timestamp == 100)
    ));
    assert!(
        events
            .iter()
            .any(|e| matches!(e, ProcessedEvent::Mouseclick { x: 50, y: 60, .. }))
    );
    assert!(
        events
            .iter()
            .any(|e| matches!(e, ProcessedEvent::Mousedrag { coordinates, .. } if coordinates.len() == 8))
    );

    // Quest/hint text arrived on the shared time base.
    assert!(events.iter().any(
        |e| matches!(e, ProcessedEvent::Quest { timestamp, .. } if *timestamp == 0)
    ));

    // Every augmentation stage contributed.
    assert!(
        events
            .iter()
            .any(|e| matches!(e, ProcessedEvent::DenseCaption { .. }))
    );
    assert!(
        events
            .iter()
            .any(|e| matches!(e, ProcessedEvent::StateTransition { .. }))
    );
    assert!(
        events
            .iter()
            .any(|e| matches!(e, ProcessedEvent::StructuredData { .. }))
    );
}

#[tokio::test]
async fn formatted_dataset_round_trips_through_jsonl() {
    let dir = tempfile::tempdir().unwrap();
    write_trace(dir.path());
    write_events(dir.path());

    let events = build_pipeline(dir.path()).process("s1").await.unwrap();
    let messages = format_messages(&events);
    assert!(!messages.is_empty());

    let conversation = convert_messages(&messages);
    let counter = whitespace_counter();
    let tokens = counter
        .ensure_within_budget(&conversation, 65_536)
        .expect("fixture conversation fits the budget");
    assert!(tokens > 0);

    // Ends on an assistant turn, starts with the system prompt.
    assert_eq!(conversation.messages.first().unwrap().role, "system");
    assert_eq!(conversation.messages.last().unwrap().role, "assistant");

    let path = dir.path().join("out.jsonl");
    write_dataset(&path, std::slice::from_ref(&conversation))
        .await
        .unwrap();
    let content = std::fs::read_to_string(&path).unwrap();
    assert_eq!(content.lines().count(), 1);
    let parsed: serde_json::Value = serde_json::from_str(content.lines().next().unwrap()).unwrap();
    assert!(parsed["messages"].as_array().unwrap().len() >= 2);
}

#[tokio::test]
async fn missing_artifact_aborts_the_session() {
    let dir = tempfile::tempdir().unwrap();
    // events.json present, trace missing.
    write_events(dir.path());
    let err = build_pipeline(dir.path()).process("s1").await.unwrap_err();
    assert!(matches!(err, StageError::MissingArtifact { .. }));
}
