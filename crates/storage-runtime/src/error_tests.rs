//! Tests for storage error types.

use super::*;

#[test]
fn test_lease_conflict_classification() {
    let err = StorageError::LeaseConflict {
        blob: "state".to_string(),
    };
    assert!(err.is_lease_conflict());
    assert!(err.is_transient());
    assert!(!err.is_not_found());
}

#[test]
fn test_not_found_classification() {
    let blob_missing = StorageError::BlobNotFound {
        container: "data".to_string(),
        blob: "state".to_string(),
    };
    let container_missing = StorageError::ContainerNotFound {
        container: "data".to_string(),
    };

    assert!(blob_missing.is_not_found());
    assert!(container_missing.is_not_found());
    assert!(!blob_missing.is_transient());
    assert!(!blob_missing.is_lease_conflict());
}

#[test]
fn test_validation_error_conversion() {
    let err: StorageError = ValidationError::Required {
        field: "lease_token".to_string(),
    }
    .into();

    assert!(matches!(err, StorageError::Validation(_)));
    assert!(!err.is_transient());
}

#[test]
fn test_error_display() {
    let err = StorageError::PageAlignment {
        offset: 100,
        length: 200,
        page_size: 512,
    };
    let message = err.to_string();
    assert!(message.contains("100"));
    assert!(message.contains("512"));
}
