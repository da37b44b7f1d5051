//! Augmentation stages.
//!
//! All three stages share a pattern: filter the timeline for eligible items,
//! draw a bounded random sample (cost control against model-call volume),
//! and append one new, distinct-typed event per successful item. A failed
//! item is logged and skipped — augmentation is best-effort and never fails
//! a session on its own.

pub mod dense_caption;
pub mod structured;
pub mod transition;

pub use dense_caption::DenseCaptionAugmenter;
pub use structured::{StructuredDataAugmenter, StructuredQuery};
pub use transition::StateTransitionAugmenter;

/// Sample up to `max_samples` distinct indices from `0..len`, without
/// replacement.
pub(crate) fn sample_indices(len: usize, max_samples: usize) -> Vec<usize> {
    let amount = max_samples.min(len);
    let mut rng = rand::rng();
    rand::seq::index::sample(&mut rng, len, amount).into_vec()
}
