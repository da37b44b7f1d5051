//! # traject-dataset
//!
//! Fine-tune dataset assembly: convert formatted transcripts into the
//! vendor chat fine-tuning schema, account for their token cost (text via a
//! tokenizer, images via the vision model's resize-and-tile cost rule), and
//! persist accepted conversations as newline-delimited JSON.
//!
//! The token budget is a hard gate: a conversation over budget is rejected
//! by the generation caller, never truncated.

#![deny(unsafe_code)]

pub mod errors;
pub mod schema;
pub mod tokens;
pub mod writer;

pub use errors::DatasetError;
pub use schema::{Conversation, FineTuneContent, FineTuneMessage, convert_messages};
pub use tokens::{ImageDimensions, TokenCounter, count_image_tokens, resized_dimensions};
pub use writer::write_dataset;
