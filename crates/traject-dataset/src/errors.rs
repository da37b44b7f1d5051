//! Dataset assembly errors.

/// Errors from dataset assembly and token accounting.
#[derive(Debug, thiserror::Error)]
pub enum DatasetError {
    /// Tokenizer failed to load or encode.
    #[error("tokenizer error: {message}")]
    Tokenizer {
        /// Error description.
        message: String,
    },

    /// A conversation exceeded the hard token budget.
    #[error("conversation has {tokens} tokens, budget is {budget}")]
    BudgetExceeded {
        /// Computed conversation tokens.
        tokens: usize,
        /// Configured maximum.
        budget: usize,
    },

    /// Filesystem error while writing the dataset.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error while writing the dataset.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
