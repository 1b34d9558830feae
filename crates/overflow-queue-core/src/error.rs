//! Error types for queue operations.

use storage_runtime::{StorageError, ValidationError};
use thiserror::Error;

/// Comprehensive error type for all queue operations
#[derive(Debug, Error)]
pub enum QueueError {
    #[error("Message not found or pop receipt expired: {receipt}")]
    MessageNotFound { receipt: String },

    #[error("Message carries no pop receipt; peeked messages cannot be deleted or updated")]
    MessageMissingReceipt,

    #[error("Batch size {requested} out of range (must be 1-{max})")]
    BatchSizeOutOfRange { requested: u32, max: u32 },

    #[error("Message too large: {size} bytes (max: {max_size})")]
    MessageTooLarge { size: usize, max_size: usize },

    #[error("Codec error: {0}")]
    Codec(#[from] CodecError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Backend error ({code}): {message}")]
    Backend { code: String, message: String },
}

impl QueueError {
    /// Check if error is transient and should be retried
    pub fn is_transient(&self) -> bool {
        match self {
            Self::MessageNotFound { .. } => false,
            Self::MessageMissingReceipt => false,
            Self::BatchSizeOutOfRange { .. } => false,
            Self::MessageTooLarge { .. } => false,
            Self::Codec(_) => false,
            Self::Storage(err) => err.is_transient(),
            Self::Validation(_) => false,
            Self::Backend { .. } => true, // Backend-specific errors are usually transient
        }
    }
}

/// Errors during wire frame encoding and decoding
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unknown wire frame tag: {tag}")]
    UnknownTag { tag: String },

    #[error("Spillover blob contains another envelope instead of a payload")]
    NestedEnvelope,
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
