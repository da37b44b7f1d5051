//! # traject-proto
//!
//! Decoding for the remote-display wire protocol captured during a session.
//!
//! The protocol log is a text stream of semicolon-terminated instructions,
//! each a comma-separated list of length-prefixed elements. This crate
//! parses that stream into [`Instruction`]s and recovers user interactions
//! from them: typed text, hotkeys, clicks, and drags.
//!
//! Parsing is fault-tolerant by design — session crashes truncate logs
//! mid-instruction, so malformed units are skipped, never reported.

#![deny(unsafe_code)]

pub mod extractor;
pub mod instruction;
pub mod keyboard;
pub mod mouse;

pub use extractor::{ProtocolConfig, ProtocolExtractor};
pub use instruction::{Instruction, parse_instructions};
