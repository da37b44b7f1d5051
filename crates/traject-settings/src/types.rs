//! Settings type definitions with compiled defaults.
//!
//! Every threshold the pipeline tunes lives here rather than as a hardcoded
//! constant: the click/drag classification bounds and control-point counts
//! have no protocol-mandated values, and the augmentation sample caps exist
//! purely to bound model-call volume.

use serde::{Deserialize, Serialize};

/// Root settings for a pipeline run.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TrajectSettings {
    /// Session artifact directory.
    pub data_dir: String,
    /// Output directory for datasets and debug visualizations.
    pub output_dir: String,
    /// Protocol extraction tunables.
    pub extraction: ExtractionSettings,
    /// Augmentation stage tunables.
    pub augmentation: AugmentationSettings,
    /// Vision model / OCR connection settings.
    pub vision: VisionSettings,
    /// Dataset assembly settings.
    pub dataset: DatasetSettings,
    /// Synthetic generator settings.
    pub synth: SynthSettings,
}

/// Click/drag classification and resampling tunables.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ExtractionSettings {
    /// Maximum down→up displacement (pixels) still counted as a click.
    pub click_threshold_px: f64,
    /// Maximum down→up duration (milliseconds) still counted as a click.
    pub click_threshold_ms: i64,
    /// Control points every recorded drag is resampled to.
    pub drag_control_points: usize,
}

impl Default for ExtractionSettings {
    fn default() -> Self {
        Self {
            click_threshold_px: 5.0,
            click_threshold_ms: 500,
            drag_control_points: 8,
        }
    }
}

/// Per-stage sample caps bounding model-call volume.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AugmentationSettings {
    /// Frames captioned per session.
    pub dense_caption_samples: usize,
    /// Frame pairs narrated per session.
    pub state_transition_samples: usize,
    /// Frames analyzed for structured queries per session.
    pub structured_data_samples: usize,
    /// Generation budget for each augmentation completion.
    pub max_completion_tokens: u32,
}

impl Default for AugmentationSettings {
    fn default() -> Self {
        Self {
            dense_caption_samples: 3,
            state_transition_samples: 3,
            structured_data_samples: 3,
            max_completion_tokens: 500,
        }
    }
}

/// External vision service connection settings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct VisionSettings {
    /// OpenAI-compatible API base URL.
    pub base_url: String,
    /// Model identifier for vision completions.
    pub model: String,
    /// Environment variable holding the API key.
    pub api_key_env: String,
    /// OCR language code passed to tesseract.
    pub ocr_language: String,
}

impl Default for VisionSettings {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".into(),
            model: "gpt-4o".into(),
            api_key_env: "OPENAI_API_KEY".into(),
            ocr_language: "eng".into(),
        }
    }
}

/// Dataset assembly settings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DatasetSettings {
    /// Hard token budget per emitted conversation.
    pub max_conversation_tokens: usize,
    /// Path to a `tokenizer.json` file for text token counting.
    pub tokenizer_path: Option<String>,
}

impl Default for DatasetSettings {
    fn default() -> Self {
        Self {
            max_conversation_tokens: 65_536,
            tokenizer_path: None,
        }
    }
}

/// Synthetic drawing-session generator settings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SynthSettings {
    /// Control points each synthetic stroke is resampled to.
    pub stroke_control_points: usize,
    /// Doodles drawn per synthetic session.
    pub doodles_per_session: usize,
    /// Path to the paint UI metadata file, relative to the data directory.
    pub metadata_file: String,
    /// Directory of stroke dataset NDJSON files, relative to the data
    /// directory.
    pub strokes_dir: String,
}

impl Default for SynthSettings {
    fn default() -> Self {
        Self {
            stroke_control_points: 32,
            doodles_per_session: 5,
            metadata_file: "paint_metadata.json".into(),
            strokes_dir: "doodles".into(),
        }
    }
}
