//! Error types for object store operations.

use crate::blob::BlobKind;
use thiserror::Error;

/// Comprehensive error type for all object store operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Container not found: {container}")]
    ContainerNotFound { container: String },

    #[error("Blob not found: {container}/{blob}")]
    BlobNotFound { container: String, blob: String },

    #[error("Blob already exists: {container}/{blob}")]
    BlobAlreadyExists { container: String, blob: String },

    #[error("A lease is already present on blob: {blob}")]
    LeaseConflict { blob: String },

    #[error("Blob '{blob}' has an active lease and no lease token was provided")]
    LeaseRequired { blob: String },

    #[error("Lease token does not match the active lease on blob: {blob}")]
    LeaseMismatch { blob: String },

    #[error("Blob '{blob}' is a {actual:?} blob but the operation requires {expected:?}")]
    BlobKindMismatch {
        blob: String,
        expected: BlobKind,
        actual: BlobKind,
    },

    #[error("Page write not aligned: offset {offset}, length {length}, page size {page_size}")]
    PageAlignment {
        offset: u64,
        length: usize,
        page_size: u64,
    },

    #[error("Write of {requested} bytes exceeds blob capacity of {capacity} bytes")]
    CapacityExceeded { requested: u64, capacity: u64 },

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Backend error ({code}): {message}")]
    Backend { code: String, message: String },
}

impl StorageError {
    /// Check if error is transient and should be retried
    pub fn is_transient(&self) -> bool {
        match self {
            Self::ContainerNotFound { .. } => false,
            Self::BlobNotFound { .. } => false,
            Self::BlobAlreadyExists { .. } => false,
            Self::LeaseConflict { .. } => true,
            Self::LeaseRequired { .. } => false,
            Self::LeaseMismatch { .. } => false,
            Self::BlobKindMismatch { .. } => false,
            Self::PageAlignment { .. } => false,
            Self::CapacityExceeded { .. } => false,
            Self::Validation(_) => false,
            Self::Backend { .. } => true, // Backend-specific errors are usually transient
        }
    }

    /// Check if error indicates the target blob or container is absent
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::BlobNotFound { .. } | Self::ContainerNotFound { .. }
        )
    }

    /// Check if error is the recognizable "lease already held" conflict
    pub fn is_lease_conflict(&self) -> bool {
        matches!(self, Self::LeaseConflict { .. })
    }
}

/// Validation errors
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Required field missing: {field}")]
    Required { field: String },

    #[error("Invalid format for {field}: {message}")]
    InvalidFormat { field: String, message: String },

    #[error("Value out of range for {field}: {message}")]
    OutOfRange { field: String, message: String },
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
