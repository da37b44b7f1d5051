//! # traject-vision
//!
//! Narrow capability interfaces for the external services the augmentation
//! stages consume (a vision-capable chat model and an OCR engine), plus the
//! real implementations injected at the binary boundary:
//!
//! - [`OpenAiChatClient`]: an OpenAI-compatible `/chat/completions` client
//!   that attaches base64 frames as data-URI image parts
//! - [`TesseractOcr`]: word-level bounding boxes via the `tesseract` binary's
//!   TSV output
//!
//! The pipeline core only sees the [`ChatModel`] / [`OcrEngine`] traits, so
//! tests run against deterministic fakes. No retries live here: a failed
//! call is the caller's problem, and augmentation stages skip failed items.

#![deny(unsafe_code)]

pub mod client;
pub mod errors;
pub mod ocr;
pub mod traits;

pub use client::{ChatClientConfig, OpenAiChatClient};
pub use errors::VisionError;
pub use ocr::TesseractOcr;
pub use traits::{ChatModel, ChatRequest, OcrEngine, TextElement};
