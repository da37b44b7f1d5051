//! # traject-core
//!
//! Foundation types and trajectory math for the traject pipeline.
//!
//! This crate provides the shared vocabulary that every other traject crate
//! depends on:
//!
//! - **Events**: [`ProcessedEvent`], the canonical timestamped unit of the
//!   merged session timeline, as a tagged union with per-variant payloads
//! - **Messages**: [`Message`], the role-tagged conversational form produced
//!   by the formatter
//! - **Stages**: the [`Extractor`] / [`Augmenter`] traits the orchestrator
//!   sequences, and the [`StageError`] they surface
//! - **Trajectory math**: arc-length resampling ([`resample_points`]) and
//!   B-spline curve evaluation ([`BSpline`])

#![deny(unsafe_code)]

pub mod errors;
pub mod events;
pub mod message;
pub mod spline;
pub mod stage;
pub mod trajectory;

pub use errors::StageError;
pub use events::{DragPoint, ProcessedEvent};
pub use message::{Message, MessageContent, MessageRole};
pub use spline::BSpline;
pub use stage::{Augmenter, Extractor};
pub use trajectory::resample_points;
