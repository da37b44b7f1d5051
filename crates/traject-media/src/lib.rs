//! # traject-media
//!
//! Screen-recording handling for the pipeline: probe a session video's
//! duration with `ffprobe` and pull one still frame per whole second of
//! playback with `ffmpeg`. Both tools run as subprocesses — the pipeline is
//! offline, so subprocess latency is acceptable and keeps codec handling out
//! of process.

#![deny(unsafe_code)]

pub mod extractor;
pub mod frames;
pub mod probe;

pub use extractor::VideoExtractor;
