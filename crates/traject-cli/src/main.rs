//! # traject
//!
//! Pipeline binary — turns recorded remote-desktop sessions (or synthetic
//! drawing sessions) into conversational fine-tuning datasets.

#![deny(unsafe_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use traject_core::{Augmenter, Extractor, Message};
use traject_dataset::{Conversation, TokenCounter, convert_messages, write_dataset};
use traject_media::VideoExtractor;
use traject_pipeline::augment::{
    DenseCaptionAugmenter, StateTransitionAugmenter, StructuredDataAugmenter,
};
use traject_pipeline::visualize::visualize_messages;
use traject_pipeline::{AppEventExtractor, Pipeline, format_messages};
use traject_proto::{ProtocolConfig, ProtocolExtractor};
use traject_settings::TrajectSettings;
use traject_synth::PaintPipeline;
use traject_vision::{ChatClientConfig, OpenAiChatClient, TesseractOcr};

/// Session recording → fine-tune dataset pipeline.
#[derive(Parser, Debug)]
#[command(name = "traject", about = "Session recording → fine-tune dataset pipeline")]
struct Cli {
    /// Settings file (defaults to `~/.traject/settings.json`).
    #[arg(long)]
    settings: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Process recorded sessions into a dataset.
    Process {
        /// Session identifiers to process.
        #[arg(required = true)]
        sessions: Vec<String>,

        /// Output dataset filename (under the output directory).
        #[arg(long, default_value = "sessions.jsonl")]
        dataset: String,
    },

    /// Generate synthetic drawing sessions.
    Synth {
        /// Number of synthetic sessions to generate.
        #[arg(long, default_value_t = 1)]
        count: usize,

        /// Doodles per session (defaults to the settings value).
        #[arg(long)]
        doodles: Option<usize>,

        /// Output dataset filename (under the output directory).
        #[arg(long, default_value = "synthetic.jsonl")]
        dataset: String,
    },
}

fn load_settings(cli: &Cli) -> Result<TrajectSettings> {
    let path = cli
        .settings
        .clone()
        .unwrap_or_else(traject_settings::settings_path);
    traject_settings::load_settings_from_path(&path)
        .with_context(|| format!("failed to load settings from {}", path.display()))
}

/// Build the augmentation stages, or none when no API key is available.
///
/// Augmentation is best-effort enrichment; running without it still yields a
/// valid (unannotated) dataset.
fn build_augmenters(settings: &TrajectSettings) -> Vec<Arc<dyn Augmenter>> {
    let Ok(api_key) = std::env::var(&settings.vision.api_key_env) else {
        warn!(
            env = %settings.vision.api_key_env,
            "no vision API key found — augmentation disabled"
        );
        return Vec::new();
    };

    let model = Arc::new(OpenAiChatClient::new(ChatClientConfig {
        base_url: settings.vision.base_url.clone(),
        api_key,
        model: settings.vision.model.clone(),
    }));
    let ocr = Arc::new(TesseractOcr::new(settings.vision.ocr_language.clone()));
    let caps = &settings.augmentation;

    vec![
        Arc::new(DenseCaptionAugmenter::new(
            model.clone(),
            caps.dense_caption_samples,
            caps.max_completion_tokens,
        )),
        Arc::new(StateTransitionAugmenter::new(
            model.clone(),
            caps.state_transition_samples,
            caps.max_completion_tokens,
        )),
        Arc::new(StructuredDataAugmenter::new(
            model,
            ocr,
            caps.structured_data_samples,
            // The structured stage returns JSON for three queries; give it
            // twice the usual budget.
            caps.max_completion_tokens * 2,
        )),
    ]
}

fn token_counter(settings: &TrajectSettings) -> Result<Option<TokenCounter>> {
    match &settings.dataset.tokenizer_path {
        Some(path) => {
            let counter = TokenCounter::from_file(Path::new(path))
                .with_context(|| format!("failed to load tokenizer from {path}"))?;
            Ok(Some(counter))
        }
        None => {
            warn!("no tokenizer configured — dataset emission disabled, debug output only");
            Ok(None)
        }
    }
}

/// Budget-gate a formatted transcript into a dataset conversation.
fn gate_conversation(
    counter: &TokenCounter,
    messages: &[Message],
    budget: usize,
    label: &str,
) -> Option<Conversation> {
    let conversation = convert_messages(messages);
    match counter.ensure_within_budget(&conversation, budget) {
        Ok(tokens) => {
            info!(label, tokens, "conversation accepted");
            Some(conversation)
        }
        Err(error) => {
            warn!(label, %error, "conversation rejected");
            None
        }
    }
}

async fn run_process(
    settings: &TrajectSettings,
    sessions: Vec<String>,
    dataset: String,
) -> Result<()> {
    let data_dir = PathBuf::from(&settings.data_dir);
    let output_dir = PathBuf::from(&settings.output_dir);
    tokio::fs::create_dir_all(&output_dir).await?;

    let protocol_config = ProtocolConfig {
        click_threshold_px: settings.extraction.click_threshold_px,
        click_threshold_ms: settings.extraction.click_threshold_ms,
        drag_control_points: settings.extraction.drag_control_points,
    };
    let extractors: Vec<Arc<dyn Extractor>> = vec![
        Arc::new(VideoExtractor::new(&data_dir)),
        Arc::new(ProtocolExtractor::new(&data_dir, protocol_config)),
        Arc::new(AppEventExtractor::new(&data_dir)),
    ];

    let pipeline = Pipeline::new(extractors, build_augmenters(settings));
    let results = pipeline
        .run(&sessions, &output_dir)
        .await
        .context("pipeline run failed")?;

    let Some(counter) = token_counter(settings)? else {
        return Ok(());
    };

    let mut conversations = Vec::new();
    for (session_id, events) in sessions.iter().zip(&results) {
        let messages = format_messages(events);
        let html_path = output_dir.join(format!("session_{session_id}_messages.html"));
        tokio::fs::write(&html_path, visualize_messages(&messages)).await?;

        if let Some(conversation) = gate_conversation(
            &counter,
            &messages,
            settings.dataset.max_conversation_tokens,
            session_id,
        ) {
            conversations.push(conversation);
        }
    }

    write_dataset(&output_dir.join(dataset), &conversations).await?;
    Ok(())
}

async fn run_synth(
    settings: &TrajectSettings,
    count: usize,
    doodles: Option<usize>,
    dataset: String,
) -> Result<()> {
    let data_dir = PathBuf::from(&settings.data_dir);
    let output_dir = PathBuf::from(&settings.output_dir);
    tokio::fs::create_dir_all(&output_dir).await?;

    let doodles = doodles.unwrap_or(settings.synth.doodles_per_session);
    let strokes_dir = data_dir.join(&settings.synth.strokes_dir);
    let doodle_files = list_stroke_files(&strokes_dir)
        .with_context(|| format!("failed to list stroke files in {}", strokes_dir.display()))?;
    info!(files = doodle_files.len(), doodles, count, "generating synthetic sessions");

    let counter = token_counter(settings)?;
    let mut conversations = Vec::new();

    for index in 0..count {
        let mut generator = PaintPipeline::new(
            &data_dir,
            &data_dir.join(&settings.synth.metadata_file),
            settings.synth.stroke_control_points,
            0,
        )?;
        let events = generator
            .generate(&doodle_files, doodles)
            .with_context(|| format!("synthetic session {index} failed"))?;

        let messages = format_messages(&events);
        let html_path = output_dir.join(format!("synth_{index}_messages.html"));
        tokio::fs::write(&html_path, visualize_messages(&messages)).await?;

        if let Some(counter) = &counter {
            if let Some(conversation) = gate_conversation(
                counter,
                &messages,
                settings.dataset.max_conversation_tokens,
                &format!("synth_{index}"),
            ) {
                conversations.push(conversation);
            }
        }
    }

    if counter.is_some() {
        write_dataset(&output_dir.join(dataset), &conversations).await?;
    }
    Ok(())
}

fn list_stroke_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(std::result::Result::ok)
        .map(|entry| entry.path())
        .filter(|path| path.extension().is_some_and(|ext| ext == "ndjson"))
        .collect();
    files.sort();
    Ok(files)
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let settings = load_settings(&cli)?;

    match cli.command {
        Command::Process { sessions, dataset } => {
            run_process(&settings, sessions, dataset).await
        }
        Command::Synth {
            count,
            doodles,
            dataset,
        } => run_synth(&settings, count, doodles, dataset).await,
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
