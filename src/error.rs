//! Unified error type for the split pipeline.
//!
//! Every failure is terminal for the operation it occurred in; the user
//! retries with a new file. Partial slice sequences are never exposed.

/// Errors from decoding the source, encoding a band, or writing an artifact.
#[derive(Debug, thiserror::Error)]
pub enum SplitError {
    /// The supplied file could not be interpreted as an image.
    #[error("failed to decode image: {0}")]
    Decode(String),

    /// A band could not be serialized as PNG.
    #[error("failed to encode slice {index}: {message}")]
    Encode { index: usize, message: String },

    /// A produced artifact could not be written (native builds only).
    #[error("failed to write {name}: {message}")]
    Io { name: String, message: String },
}
