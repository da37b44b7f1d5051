//! Error taxonomy for vision and OCR calls.

/// Errors from the external vision model or OCR engine.
#[derive(Debug, thiserror::Error)]
pub enum VisionError {
    /// HTTP request failed before a response arrived.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The endpoint returned a non-success status.
    #[error("API error ({status}): {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Error description from the response body.
        message: String,
    },

    /// Response body failed to parse.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The model returned a response with no usable content.
    #[error("model response contained no content")]
    MissingContent,

    /// Filesystem error while staging OCR input.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The OCR engine failed.
    #[error("OCR error: {message}")]
    Ocr {
        /// Error description.
        message: String,
    },
}
