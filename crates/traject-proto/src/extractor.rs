//! Protocol extractor stage.

use std::path::PathBuf;

use async_trait::async_trait;
use tracing::debug;
use traject_core::{Extractor, ProcessedEvent, StageError};

use crate::instruction::parse_instructions;
use crate::keyboard::extract_keyboard_events;
use crate::mouse::extract_mouse_events;

/// Tunables for protocol event extraction.
///
/// The click thresholds and control-point count are conventions, not part of
/// the wire protocol; they exist so downstream consumers see consistent
/// click/drag classification and fixed-shape trajectories.
#[derive(Clone, Copy, Debug)]
pub struct ProtocolConfig {
    /// Maximum down→up displacement (pixels) for a click.
    pub click_threshold_px: f64,
    /// Maximum down→up duration (milliseconds) for a click.
    pub click_threshold_ms: i64,
    /// Control points every drag trajectory is resampled to.
    pub drag_control_points: usize,
}

impl Default for ProtocolConfig {
    fn default() -> Self {
        Self {
            click_threshold_px: 5.0,
            click_threshold_ms: 500,
            drag_control_points: 8,
        }
    }
}

/// Extracts keyboard and mouse events from a session's protocol log
/// (`<data_dir>/<session_id>.trace`).
#[derive(Clone, Debug)]
pub struct ProtocolExtractor {
    data_dir: PathBuf,
    config: ProtocolConfig,
}

impl ProtocolExtractor {
    /// Create an extractor rooted at the session data directory.
    #[must_use]
    pub fn new(data_dir: impl Into<PathBuf>, config: ProtocolConfig) -> Self {
        Self {
            data_dir: data_dir.into(),
            config,
        }
    }

    fn trace_path(&self, session_id: &str) -> PathBuf {
        self.data_dir.join(format!("{session_id}.trace"))
    }
}

#[async_trait]
impl Extractor for ProtocolExtractor {
    fn name(&self) -> &'static str {
        "protocol"
    }

    async fn extract(&self, session_id: &str) -> Result<Vec<ProcessedEvent>, StageError> {
        let path = self.trace_path(session_id);
        if !path.exists() {
            return Err(StageError::MissingArtifact { path });
        }
        let content = tokio::fs::read_to_string(&path).await?;

        let instructions = parse_instructions(&content);
        debug!(
            session_id,
            instructions = instructions.len(),
            "parsed protocol log"
        );

        let mut events = extract_keyboard_events(&instructions);
        events.extend(extract_mouse_events(&instructions, &self.config));
        Ok(events)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
