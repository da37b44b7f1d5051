//! Settings loading with deep merge and environment variable overrides.
//!
//! Loading flow:
//! 1. Start with compiled [`TrajectSettings::default()`]
//! 2. If `~/.traject/settings.json` exists, deep-merge user values over
//!    defaults
//! 3. Apply environment variable overrides (highest priority)
//!
//! Deep merge rules:
//! - Objects are merged recursively (source overrides target per-key)
//! - Arrays and primitives are replaced entirely by source
//! - Null values in source are skipped (preserving target)

use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::debug;

use crate::errors::Result;
use crate::types::TrajectSettings;

/// Resolve the path to the settings file (`~/.traject/settings.json`).
pub fn settings_path() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
    PathBuf::from(home).join(".traject").join("settings.json")
}

/// Load settings from the default path with env var overrides.
pub fn load_settings() -> Result<TrajectSettings> {
    load_settings_from_path(&settings_path())
}

/// Load settings from a specific path with env var overrides.
///
/// If the file does not exist, returns defaults. If the file contains
/// invalid JSON, returns an error.
pub fn load_settings_from_path(path: &Path) -> Result<TrajectSettings> {
    let defaults = serde_json::to_value(TrajectSettings::default())?;

    let merged = if path.exists() {
        debug!(?path, "loading settings from file");
        let content = std::fs::read_to_string(path)?;
        let user: Value = serde_json::from_str(&content)?;
        deep_merge(defaults, user)
    } else {
        debug!(?path, "settings file not found, using defaults");
        defaults
    };

    let mut settings: TrajectSettings = serde_json::from_value(merged)?;
    apply_env_overrides(&mut settings);
    Ok(settings)
}

/// Recursive deep merge of two JSON values.
///
/// - Objects are merged recursively (source overrides target per-key)
/// - Arrays and primitives are replaced entirely by source
/// - Null values in source are skipped (preserving target)
pub fn deep_merge(target: Value, source: Value) -> Value {
    match (target, source) {
        (Value::Object(mut target_map), Value::Object(source_map)) => {
            for (key, source_val) in source_map {
                if source_val.is_null() {
                    continue;
                }
                let merged = if let Some(target_val) = target_map.remove(&key) {
                    deep_merge(target_val, source_val)
                } else {
                    source_val
                };
                let _ = target_map.insert(key, merged);
            }
            Value::Object(target_map)
        }
        (_, source) => source,
    }
}

/// Apply environment variable overrides to loaded settings.
///
/// Invalid values are silently ignored (falling back to file/default).
pub fn apply_env_overrides(settings: &mut TrajectSettings) {
    // ── Paths ───────────────────────────────────────────────────────
    if let Some(v) = read_env_string("TRAJECT_DATA_DIR") {
        settings.data_dir = v;
    }
    if let Some(v) = read_env_string("TRAJECT_OUTPUT_DIR") {
        settings.output_dir = v;
    }

    // ── Vision service ──────────────────────────────────────────────
    if let Some(v) = read_env_string("TRAJECT_VISION_BASE_URL") {
        settings.vision.base_url = v;
    }
    if let Some(v) = read_env_string("TRAJECT_VISION_MODEL") {
        settings.vision.model = v;
    }
    if let Some(v) = read_env_string("TRAJECT_OCR_LANGUAGE") {
        settings.vision.ocr_language = v;
    }

    // ── Augmentation caps ───────────────────────────────────────────
    if let Some(v) = read_env_usize("TRAJECT_DENSE_CAPTION_SAMPLES", 0, 1000) {
        settings.augmentation.dense_caption_samples = v;
    }
    if let Some(v) = read_env_usize("TRAJECT_STATE_TRANSITION_SAMPLES", 0, 1000) {
        settings.augmentation.state_transition_samples = v;
    }
    if let Some(v) = read_env_usize("TRAJECT_STRUCTURED_DATA_SAMPLES", 0, 1000) {
        settings.augmentation.structured_data_samples = v;
    }

    // ── Dataset ─────────────────────────────────────────────────────
    if let Some(v) = read_env_usize("TRAJECT_MAX_CONVERSATION_TOKENS", 1024, 10_000_000) {
        settings.dataset.max_conversation_tokens = v;
    }
    if let Some(v) = read_env_string("TRAJECT_TOKENIZER_PATH") {
        settings.dataset.tokenizer_path = Some(v);
    }
}

fn read_env_string(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

fn read_env_usize(name: &str, min: usize, max: usize) -> Option<usize> {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse::<usize>().ok())
        .filter(|v| (min..=max).contains(v))
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
