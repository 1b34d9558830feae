//! Tests for error classification.

use super::*;

#[test]
fn transient_classification() {
    assert!(!QueueError::MessageNotFound {
        receipt: "r1".to_string()
    }
    .is_transient());
    assert!(!QueueError::MessageMissingReceipt.is_transient());
    assert!(!QueueError::BatchSizeOutOfRange {
        requested: 0,
        max: 32
    }
    .is_transient());
    assert!(!QueueError::MessageTooLarge {
        size: 100_000,
        max_size: 65_536
    }
    .is_transient());
    assert!(!QueueError::Codec(CodecError::NestedEnvelope).is_transient());
    assert!(QueueError::Backend {
        code: "503".to_string(),
        message: "throttled".to_string()
    }
    .is_transient());
}

#[test]
fn storage_transience_is_delegated() {
    let transient = QueueError::Storage(StorageError::Backend {
        code: "500".to_string(),
        message: "server error".to_string(),
    });
    assert!(transient.is_transient());

    let fatal = QueueError::Storage(StorageError::BlobNotFound {
        container: "c".to_string(),
        blob: "b".to_string(),
    });
    assert!(!fatal.is_transient());
}

#[test]
fn storage_error_converts() {
    let err: QueueError = StorageError::ContainerNotFound {
        container: "missing".to_string(),
    }
    .into();
    assert!(matches!(err, QueueError::Storage(_)));
}

#[test]
fn codec_error_converts() {
    let err: QueueError = CodecError::UnknownTag {
        tag: "mystery".to_string(),
    }
    .into();
    assert!(matches!(err, QueueError::Codec(CodecError::UnknownTag { .. })));
}

#[test]
fn display_includes_context() {
    let err = QueueError::BatchSizeOutOfRange {
        requested: 50,
        max: 32,
    };
    let text = err.to_string();
    assert!(text.contains("50"));
    assert!(text.contains("32"));

    let err = QueueError::MessageTooLarge {
        size: 70_000,
        max_size: 65_536,
    };
    assert!(err.to_string().contains("70000"));
}
