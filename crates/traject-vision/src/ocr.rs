//! Word-level OCR via the `tesseract` binary.
//!
//! The engine stages the image in a temp file, asks tesseract for TSV
//! output, and keeps the word rows (level 5) that carry non-empty text with
//! a usable confidence.

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use crate::errors::VisionError;
use crate::traits::{OcrEngine, TextElement};

/// OCR engine backed by a locally installed `tesseract`.
#[derive(Clone, Debug, Default)]
pub struct TesseractOcr {
    /// Language code passed to tesseract (defaults to `eng`).
    language: String,
}

impl TesseractOcr {
    /// Create an engine for the given tesseract language code.
    #[must_use]
    pub fn new(language: impl Into<String>) -> Self {
        Self {
            language: language.into(),
        }
    }

    fn language(&self) -> &str {
        if self.language.is_empty() {
            "eng"
        } else {
            &self.language
        }
    }
}

#[async_trait]
impl OcrEngine for TesseractOcr {
    async fn recognize(&self, image: &[u8]) -> Result<Vec<TextElement>, VisionError> {
        let scratch = tempfile::tempdir()?;
        let input = scratch.path().join("ocr_input.png");
        tokio::fs::write(&input, image).await?;

        let output = Command::new("tesseract")
            .arg(&input)
            .args(["stdout", "-l", self.language(), "tsv"])
            .output()
            .await?;

        if !output.status.success() {
            return Err(VisionError::Ocr {
                message: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let elements = parse_tsv(&String::from_utf8_lossy(&output.stdout));
        debug!(words = elements.len(), "ocr recognized words");
        Ok(elements)
    }
}

/// Parse tesseract TSV output into word elements.
///
/// TSV columns: level, page, block, par, line, word, left, top, width,
/// height, conf, text. Word rows have level 5; rows with empty text or a
/// negative confidence are layout artifacts and are dropped.
#[must_use]
pub fn parse_tsv(tsv: &str) -> Vec<TextElement> {
    tsv.lines()
        .filter_map(|line| {
            let cols: Vec<&str> = line.split('\t').collect();
            if cols.len() < 12 || cols[0] != "5" {
                return None;
            }
            let text = cols[11].trim();
            if text.is_empty() {
                return None;
            }
            let conf: f64 = cols[10].parse().ok()?;
            if conf < 0.0 {
                return None;
            }
            Some(TextElement {
                text: text.to_string(),
                x: cols[6].parse().ok()?,
                y: cols[7].parse().ok()?,
                width: cols[8].parse().ok()?,
                height: cols[9].parse().ok()?,
            })
        })
        .collect()
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
