//! Tests for lease coordination.

use super::*;
use crate::blob::BlobProperties;
use crate::providers::InMemoryObjectStore;
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

/// Store double that plays back scripted lease-acquisition outcomes and
/// counts the calls it receives
struct ScriptedStore {
    acquire_results: Mutex<VecDeque<Result<LeaseToken, StorageError>>>,
    acquire_calls: AtomicU32,
    create_calls: AtomicU32,
}

impl ScriptedStore {
    fn new(acquire_results: Vec<Result<LeaseToken, StorageError>>) -> Self {
        Self {
            acquire_results: Mutex::new(acquire_results.into()),
            acquire_calls: AtomicU32::new(0),
            create_calls: AtomicU32::new(0),
        }
    }

    fn always_conflict() -> Self {
        Self {
            acquire_results: Mutex::new(VecDeque::new()),
            acquire_calls: AtomicU32::new(0),
            create_calls: AtomicU32::new(0),
        }
    }

    fn acquire_count(&self) -> u32 {
        self.acquire_calls.load(Ordering::SeqCst)
    }

    fn create_count(&self) -> u32 {
        self.create_calls.load(Ordering::SeqCst)
    }
}

fn token(value: &str) -> LeaseToken {
    LeaseToken::new(value.to_string()).unwrap()
}

fn not_found(blob: &BlobName) -> StorageError {
    StorageError::BlobNotFound {
        container: "data".to_string(),
        blob: blob.to_string(),
    }
}

#[async_trait]
impl ObjectStore for ScriptedStore {
    async fn acquire_lease(
        &self,
        _container: &ContainerName,
        blob: &BlobName,
        _duration: Duration,
    ) -> Result<LeaseToken, StorageError> {
        self.acquire_calls.fetch_add(1, Ordering::SeqCst);
        let mut results = self.acquire_results.lock().unwrap();
        // An empty script means "always report the lease as held"
        results.pop_front().unwrap_or(Err(StorageError::LeaseConflict {
            blob: blob.to_string(),
        }))
    }

    async fn put_blob(
        &self,
        _container: &ContainerName,
        _blob: &BlobName,
        _kind: BlobKind,
        _content: Bytes,
        _options: &PutOptions,
    ) -> Result<(), StorageError> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn renew_lease(
        &self,
        _container: &ContainerName,
        blob: &BlobName,
        _token: &LeaseToken,
    ) -> Result<(), StorageError> {
        Err(StorageError::LeaseMismatch {
            blob: blob.to_string(),
        })
    }

    async fn create_container_if_not_exists(
        &self,
        _container: &ContainerName,
    ) -> Result<bool, StorageError> {
        unimplemented!()
    }

    async fn delete_container_if_exists(
        &self,
        _container: &ContainerName,
    ) -> Result<bool, StorageError> {
        unimplemented!()
    }

    async fn container_exists(&self, _container: &ContainerName) -> Result<bool, StorageError> {
        unimplemented!()
    }

    async fn download(
        &self,
        _container: &ContainerName,
        _blob: &BlobName,
        _lease: Option<&LeaseToken>,
    ) -> Result<Bytes, StorageError> {
        unimplemented!()
    }

    async fn blob_exists(
        &self,
        _container: &ContainerName,
        _blob: &BlobName,
    ) -> Result<bool, StorageError> {
        unimplemented!()
    }

    async fn delete_blob(
        &self,
        _container: &ContainerName,
        _blob: &BlobName,
        _include_snapshots: bool,
    ) -> Result<(), StorageError> {
        unimplemented!()
    }

    async fn delete_blob_if_exists(
        &self,
        _container: &ContainerName,
        _blob: &BlobName,
        _include_snapshots: bool,
    ) -> Result<bool, StorageError> {
        unimplemented!()
    }

    async fn get_properties(
        &self,
        _container: &ContainerName,
        _blob: &BlobName,
        _lease: Option<&LeaseToken>,
    ) -> Result<BlobProperties, StorageError> {
        unimplemented!()
    }

    async fn set_metadata(
        &self,
        _container: &ContainerName,
        _blob: &BlobName,
        _metadata: HashMap<String, String>,
        _lease: Option<&LeaseToken>,
    ) -> Result<(), StorageError> {
        unimplemented!()
    }

    async fn list_blobs(
        &self,
        _container: &ContainerName,
        _prefix: &str,
    ) -> Result<Vec<BlobName>, StorageError> {
        unimplemented!()
    }

    async fn write_pages(
        &self,
        _container: &ContainerName,
        _blob: &BlobName,
        _offset: u64,
        _content: Bytes,
        _lease: Option<&LeaseToken>,
    ) -> Result<(), StorageError> {
        unimplemented!()
    }

    async fn clear_pages(
        &self,
        _container: &ContainerName,
        _blob: &BlobName,
        _lease: Option<&LeaseToken>,
    ) -> Result<(), StorageError> {
        unimplemented!()
    }

    async fn append_block(
        &self,
        _container: &ContainerName,
        _blob: &BlobName,
        _content: Bytes,
        _lease: Option<&LeaseToken>,
    ) -> Result<(), StorageError> {
        unimplemented!()
    }

    async fn release_lease(
        &self,
        _container: &ContainerName,
        _blob: &BlobName,
        _token: &LeaseToken,
    ) -> Result<(), StorageError> {
        unimplemented!()
    }
}

fn fast_retry_config() -> LeaseConfig {
    LeaseConfig {
        retry_delay: Duration::milliseconds(1),
        ..LeaseConfig::default()
    }
}

fn names() -> (ContainerName, BlobName) {
    (
        ContainerName::new("data".to_string()).unwrap(),
        BlobName::new("state".to_string()).unwrap(),
    )
}

#[tokio::test]
async fn test_try_acquire_exhausts_exact_attempt_count() {
    let store = Arc::new(ScriptedStore::always_conflict());
    let coordinator = LeaseCoordinator::with_config(store.clone(), fast_retry_config());
    let (container, blob) = names();

    let result = coordinator
        .try_acquire(&container, &blob, None, 5)
        .await
        .unwrap();

    assert!(result.is_none());
    assert_eq!(store.acquire_count(), 5);
}

#[tokio::test]
async fn test_try_acquire_returns_token_on_first_success() {
    let store = Arc::new(ScriptedStore::new(vec![Ok(token("lease-1"))]));
    let coordinator = LeaseCoordinator::with_config(store.clone(), fast_retry_config());
    let (container, blob) = names();

    let result = coordinator
        .try_acquire(&container, &blob, None, 3)
        .await
        .unwrap();

    assert_eq!(result, Some(token("lease-1")));
    assert_eq!(store.acquire_count(), 1);
}

#[tokio::test]
async fn test_try_acquire_recovers_after_conflicts() {
    let (container, blob) = names();
    let store = Arc::new(ScriptedStore::new(vec![
        Err(StorageError::LeaseConflict {
            blob: blob.to_string(),
        }),
        Err(StorageError::LeaseConflict {
            blob: blob.to_string(),
        }),
        Ok(token("lease-2")),
    ]));
    let coordinator = LeaseCoordinator::with_config(store.clone(), fast_retry_config());

    let result = coordinator
        .try_acquire(&container, &blob, None, 5)
        .await
        .unwrap();

    assert_eq!(result, Some(token("lease-2")));
    assert_eq!(store.acquire_count(), 3);
}

#[tokio::test]
async fn test_try_acquire_propagates_unknown_errors() {
    let store = Arc::new(ScriptedStore::new(vec![Err(StorageError::Backend {
        code: "500".to_string(),
        message: "boom".to_string(),
    })]));
    let coordinator = LeaseCoordinator::with_config(store.clone(), fast_retry_config());
    let (container, blob) = names();

    let result = coordinator.try_acquire(&container, &blob, None, 5).await;

    assert!(matches!(result, Err(StorageError::Backend { .. })));
    assert_eq!(store.acquire_count(), 1);
}

#[tokio::test]
async fn test_try_acquire_validates_attempt_bounds() {
    let store = Arc::new(ScriptedStore::always_conflict());
    let coordinator = LeaseCoordinator::with_config(store.clone(), fast_retry_config());
    let (container, blob) = names();

    let zero = coordinator.try_acquire(&container, &blob, None, 0).await;
    assert!(matches!(zero, Err(StorageError::Validation(_))));

    let eleven = coordinator.try_acquire(&container, &blob, None, 11).await;
    assert!(matches!(eleven, Err(StorageError::Validation(_))));

    assert_eq!(store.acquire_count(), 0);
}

#[tokio::test]
async fn test_acquire_validates_duration_bounds() {
    let store = Arc::new(ScriptedStore::always_conflict());
    let coordinator = LeaseCoordinator::with_config(store.clone(), fast_retry_config());
    let (container, blob) = names();

    let too_short = coordinator
        .acquire(&container, &blob, Some(Duration::seconds(5)))
        .await;
    assert!(matches!(too_short, Err(StorageError::Validation(_))));

    let too_long = coordinator
        .acquire(&container, &blob, Some(Duration::seconds(90)))
        .await;
    assert!(matches!(too_long, Err(StorageError::Validation(_))));

    assert_eq!(store.acquire_count(), 0);
}

#[tokio::test]
async fn test_acquire_bootstraps_missing_blob() {
    let (container, blob) = names();
    let store = Arc::new(ScriptedStore::new(vec![
        Err(not_found(&blob)),
        Ok(token("lease-3")),
    ]));
    let coordinator = LeaseCoordinator::with_config(store.clone(), fast_retry_config());

    let acquired = coordinator.acquire(&container, &blob, None).await.unwrap();

    assert_eq!(acquired, token("lease-3"));
    assert_eq!(store.acquire_count(), 2);
    assert_eq!(store.create_count(), 1);
}

#[tokio::test]
async fn test_acquire_does_not_bootstrap_twice() {
    let (container, blob) = names();
    let store = Arc::new(ScriptedStore::new(vec![
        Err(not_found(&blob)),
        Err(not_found(&blob)),
    ]));
    let coordinator = LeaseCoordinator::with_config(store.clone(), fast_retry_config());

    let result = coordinator.acquire(&container, &blob, None).await;

    assert!(matches!(result, Err(StorageError::BlobNotFound { .. })));
    assert_eq!(store.acquire_count(), 2);
    assert_eq!(store.create_count(), 1);
}

#[tokio::test]
async fn test_try_renew_swallows_failures() {
    let store = Arc::new(ScriptedStore::always_conflict());
    let coordinator = LeaseCoordinator::with_config(store, fast_retry_config());
    let (container, blob) = names();

    let renewed = coordinator
        .try_renew(&container, &blob, &token("stale"))
        .await;

    assert!(!renewed);
}

#[tokio::test]
async fn test_lease_lifecycle_against_memory_store() {
    let store = Arc::new(InMemoryObjectStore::new());
    let coordinator = LeaseCoordinator::new(store.clone());
    let (container, blob) = names();

    store
        .create_container_if_not_exists(&container)
        .await
        .unwrap();

    // First acquisition bootstraps the blob
    let acquired = coordinator.acquire(&container, &blob, None).await.unwrap();
    assert!(store.blob_exists(&container, &blob).await.unwrap());

    // A second writer cannot take the lease while it is held
    let second = coordinator
        .try_acquire(
            &container,
            &blob,
            None,
            1,
        )
        .await
        .unwrap();
    assert!(second.is_none());

    assert!(coordinator.try_renew(&container, &blob, &acquired).await);

    coordinator
        .release(&container, &blob, &acquired)
        .await
        .unwrap();

    // Released lease can be re-acquired immediately
    let reacquired = coordinator
        .try_acquire(&container, &blob, None, 1)
        .await
        .unwrap();
    assert!(reacquired.is_some());
}
