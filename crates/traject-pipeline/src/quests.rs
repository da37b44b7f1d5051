//! Application event extraction: quest and hint text from the session's
//! structured log.

use std::path::PathBuf;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::debug;
use traject_core::{Extractor, ProcessedEvent, StageError};

/// Structured session event log (`<data_dir>/<session_id>.events.json`).
#[derive(Debug, Deserialize)]
struct RawEventsFile {
    /// Wall-clock anchor (epoch ms) for the log's event timestamps.
    timestamp: Option<i64>,
    events: Vec<RawEvent>,
}

#[derive(Debug, Deserialize)]
struct RawEvent {
    #[serde(rename = "type")]
    kind: RawEventKind,
    timestamp: i64,
    message: Option<String>,
}

#[derive(Clone, Copy, Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
enum RawEventKind {
    Quest,
    Hint,
}

/// One record of the session index (`<data_dir>/sessions.json`).
#[derive(Debug, Deserialize)]
struct SessionRecord {
    id: String,
    created_at: DateTime<Utc>,
}

/// Extracts quest/hint events from a session's structured log, normalized
/// to the session-relative time base.
///
/// The base timestamp comes from the log's own `timestamp` anchor when
/// present; otherwise the session's creation time in the session index is
/// used as a fallback.
#[derive(Clone, Debug)]
pub struct AppEventExtractor {
    data_dir: PathBuf,
}

impl AppEventExtractor {
    /// Create an extractor rooted at the session data directory.
    #[must_use]
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    fn session_created_at(&self, session_id: &str) -> Result<i64, StageError> {
        let path = self.data_dir.join("sessions.json");
        if !path.exists() {
            return Err(StageError::MissingArtifact { path });
        }
        let records: Vec<SessionRecord> =
            serde_json::from_str(&std::fs::read_to_string(&path)?)?;
        records
            .iter()
            .find(|r| r.id == session_id)
            .map(|r| r.created_at.timestamp_millis())
            .ok_or_else(|| {
                StageError::stage("events", format!("session {session_id} not found in index"))
            })
    }
}

#[async_trait]
impl Extractor for AppEventExtractor {
    fn name(&self) -> &'static str {
        "events"
    }

    async fn extract(&self, session_id: &str) -> Result<Vec<ProcessedEvent>, StageError> {
        let path = self.data_dir.join(format!("{session_id}.events.json"));
        if !path.exists() {
            return Err(StageError::MissingArtifact { path });
        }
        let raw: RawEventsFile =
            serde_json::from_str(&tokio::fs::read_to_string(&path).await?)?;

        let base = match raw.timestamp {
            Some(anchor) => anchor,
            None => self.session_created_at(session_id)?,
        };
        debug!(session_id, base, events = raw.events.len(), "loaded event log");

        Ok(raw
            .events
            .into_iter()
            .filter_map(|event| {
                let message = event.message?;
                let timestamp = event.timestamp - base;
                Some(match event.kind {
                    RawEventKind::Quest => ProcessedEvent::Quest { timestamp, message },
                    RawEventKind::Hint => ProcessedEvent::Hint { timestamp, message },
                })
            })
            .collect())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
