//! Token accounting for fine-tune conversations.
//!
//! Text is counted with a real tokenizer. Images are costed by reproducing
//! the vision model's ingestion rule: resize to fit within the maximum
//! dimension, scale the shortest side down to the target size, then charge a
//! base cost plus a per-512px-tile cost on the resized image.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;

use crate::errors::DatasetError;
use crate::schema::{Conversation, FineTuneContent, FineTuneMessage};

/// Base cost charged for every image.
const BASE_IMAGE_COST: usize = 85;
/// Cost per 512×512 tile of the resized image.
const TILE_COST: usize = 170;
/// Maximum dimension accepted before the first resize step.
const MAX_SIZE: u32 = 2048;
/// Target shortest side after the second resize step.
const TARGET_SIZE: u32 = 768;
/// Tile edge length.
const TILE_SIZE: u32 = 512;

/// Dimensions used when an image payload cannot be decoded.
const FALLBACK_DIMENSIONS: ImageDimensions = ImageDimensions {
    width: 1024,
    height: 1024,
};

/// Width and height of an image in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ImageDimensions {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

/// Apply the vision model's two-step resize rule.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
#[must_use]
pub fn resized_dimensions(dims: ImageDimensions) -> ImageDimensions {
    let mut width = dims.width;
    let mut height = dims.height;

    // First step: fit within MAX_SIZE on the longest side.
    if width > MAX_SIZE || height > MAX_SIZE {
        let scale = f64::from(MAX_SIZE) / f64::from(width.max(height));
        width = (f64::from(width) * scale) as u32;
        height = (f64::from(height) * scale) as u32;
    }

    // Second step: bring the shortest side down to TARGET_SIZE.
    let shortest = width.min(height);
    if shortest > TARGET_SIZE {
        let scale = f64::from(TARGET_SIZE) / f64::from(shortest);
        width = (f64::from(width) * scale) as u32;
        height = (f64::from(height) * scale) as u32;
    }

    ImageDimensions { width, height }
}

/// Token cost of one image at the given original dimensions.
#[must_use]
pub fn count_image_tokens(dims: ImageDimensions) -> usize {
    let resized = resized_dimensions(dims);
    let tiles_x = resized.width.div_ceil(TILE_SIZE) as usize;
    let tiles_y = resized.height.div_ceil(TILE_SIZE) as usize;
    TILE_COST * tiles_x * tiles_y + BASE_IMAGE_COST
}

/// Decode the dimensions of a data-URI or bare-base64 image payload.
fn dimensions_from_url(url: &str) -> Option<ImageDimensions> {
    let data = url.rsplit_once("base64,").map_or(url, |(_, d)| d);
    let bytes = BASE64.decode(data).ok()?;
    let img = image::load_from_memory(&bytes).ok()?;
    Some(ImageDimensions {
        width: img.width(),
        height: img.height(),
    })
}

/// Conversation token accounting backed by a tokenizer.
pub struct TokenCounter {
    tokenizer: tokenizers::Tokenizer,
}

impl TokenCounter {
    /// Wrap an already-built tokenizer.
    #[must_use]
    pub fn new(tokenizer: tokenizers::Tokenizer) -> Self {
        Self { tokenizer }
    }

    /// Load a tokenizer from a `tokenizer.json` file.
    pub fn from_file(path: &std::path::Path) -> Result<Self, DatasetError> {
        let tokenizer =
            tokenizers::Tokenizer::from_file(path).map_err(|e| DatasetError::Tokenizer {
                message: e.to_string(),
            })?;
        Ok(Self { tokenizer })
    }

    /// Count tokens in a text string.
    pub fn count_text(&self, text: &str) -> Result<usize, DatasetError> {
        let encoding =
            self.tokenizer
                .encode(text, false)
                .map_err(|e| DatasetError::Tokenizer {
                    message: e.to_string(),
                })?;
        Ok(encoding.get_ids().len())
    }

    /// Count total tokens in a conversation: role names, text content, and
    /// image costs.
    ///
    /// Undecodable image payloads are costed at the fallback dimensions
    /// rather than dropped, so accounting stays monotonic.
    pub fn count_conversation(&self, conversation: &Conversation) -> Result<usize, DatasetError> {
        let mut total = 0;
        for message in &conversation.messages {
            total += self.count_message(message)?;
        }
        Ok(total)
    }

    fn count_message(&self, message: &FineTuneMessage) -> Result<usize, DatasetError> {
        let mut total = self.count_text(&message.role)?;
        match &message.content {
            FineTuneContent::Text(text) => {
                total += self.count_text(text)?;
            }
            FineTuneContent::Parts(parts) => {
                for part in parts {
                    if let Some(text) = &part.text {
                        total += self.count_text(text)?;
                    }
                    if let Some(image) = &part.image_url {
                        let dims = dimensions_from_url(&image.url)
                            .unwrap_or(FALLBACK_DIMENSIONS);
                        total += count_image_tokens(dims);
                    }
                }
            }
        }
        Ok(total)
    }

    /// Reject a conversation that exceeds the token budget.
    pub fn ensure_within_budget(
        &self,
        conversation: &Conversation,
        budget: usize,
    ) -> Result<usize, DatasetError> {
        let tokens = self.count_conversation(conversation)?;
        if tokens > budget {
            return Err(DatasetError::BudgetExceeded { tokens, budget });
        }
        Ok(tokens)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
