//! In-memory object store implementation for testing and development.
//!
//! This module provides a fully functional in-memory store that:
//! - Enforces blob kinds (overwrite, page-aligned, append-only)
//! - Implements time-bounded leases with token checking
//! - Validates page alignment and capacity
//! - Provides thread-safe concurrent access
//!
//! This provider is intended for:
//! - Unit testing of storage-runtime consumers
//! - Development and prototyping
//! - Reference implementation for cloud providers

use crate::blob::{BlobKind, BlobName, BlobProperties, ContainerName, LeaseToken, StorageConfig};
use crate::error::{StorageError, ValidationError};
use crate::store::{ObjectStore, PutOptions};
use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

#[cfg(test)]
#[path = "memory_tests.rs"]
mod tests;

// ============================================================================
// Internal Storage Structures
// ============================================================================

/// An active lease on a blob
#[derive(Debug, Clone)]
struct ActiveLease {
    token: LeaseToken,
    duration: Duration,
    expires_at: DateTime<Utc>,
}

impl ActiveLease {
    fn is_expired(&self) -> bool {
        Utc::now() >= self.expires_at
    }
}

/// A blob stored in memory with its properties and lease state
#[derive(Debug, Clone)]
struct StoredBlob {
    kind: BlobKind,
    content: Vec<u8>,
    /// Capacity reservation; page-aligned blobs only
    capacity: Option<u64>,
    content_type: Option<String>,
    metadata: HashMap<String, String>,
    lease: Option<ActiveLease>,
}

impl StoredBlob {
    fn new(kind: BlobKind, content: Vec<u8>, options: &PutOptions, capacity: Option<u64>) -> Self {
        Self {
            kind,
            content,
            capacity,
            content_type: options.content_type.clone(),
            metadata: options.metadata.clone(),
            lease: None,
        }
    }

    /// Drop the lease if it has expired, then return the active one
    fn active_lease(&mut self) -> Option<&ActiveLease> {
        if self.lease.as_ref().is_some_and(ActiveLease::is_expired) {
            self.lease = None;
        }
        self.lease.as_ref()
    }

    /// Enforce lease rules for a write operation
    fn check_write_lease(
        &mut self,
        provided: Option<&LeaseToken>,
        blob: &BlobName,
    ) -> Result<(), StorageError> {
        match (self.active_lease(), provided) {
            (None, None) => Ok(()),
            (Some(active), Some(token)) if active.token == *token => Ok(()),
            (Some(_), None) => Err(StorageError::LeaseRequired {
                blob: blob.to_string(),
            }),
            // Wrong token, or a token presented with no lease active
            (Some(_), Some(_)) | (None, Some(_)) => Err(StorageError::LeaseMismatch {
                blob: blob.to_string(),
            }),
        }
    }

    /// Enforce lease rules for a read operation
    ///
    /// Reads without a token are always allowed; a provided token must
    /// still match the active lease.
    fn check_read_lease(
        &mut self,
        provided: Option<&LeaseToken>,
        blob: &BlobName,
    ) -> Result<(), StorageError> {
        match (self.active_lease(), provided) {
            (_, None) => Ok(()),
            (Some(active), Some(token)) if active.token == *token => Ok(()),
            (_, Some(_)) => Err(StorageError::LeaseMismatch {
                blob: blob.to_string(),
            }),
        }
    }

    fn check_kind(&self, expected: BlobKind, blob: &BlobName) -> Result<(), StorageError> {
        if self.kind != expected {
            return Err(StorageError::BlobKindMismatch {
                blob: blob.to_string(),
                expected,
                actual: self.kind,
            });
        }
        Ok(())
    }
}

type ContainerMap = HashMap<ContainerName, HashMap<BlobName, StoredBlob>>;

// ============================================================================
// InMemoryObjectStore
// ============================================================================

/// In-memory object store implementation
pub struct InMemoryObjectStore {
    containers: Arc<RwLock<ContainerMap>>,
    config: StorageConfig,
}

impl InMemoryObjectStore {
    /// Create new in-memory store with default configuration
    pub fn new() -> Self {
        Self::with_config(StorageConfig::default())
    }

    /// Create new in-memory store with explicit configuration
    pub fn with_config(config: StorageConfig) -> Self {
        Self {
            containers: Arc::new(RwLock::new(HashMap::new())),
            config,
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, ContainerMap> {
        self.containers
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, ContainerMap> {
        self.containers
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for InMemoryObjectStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Look up a blob mutably, mapping absence to the right error
fn blob_entry<'a>(
    containers: &'a mut ContainerMap,
    container: &ContainerName,
    blob: &BlobName,
) -> Result<&'a mut StoredBlob, StorageError> {
    let blobs = containers
        .get_mut(container)
        .ok_or_else(|| StorageError::ContainerNotFound {
            container: container.to_string(),
        })?;
    blobs.get_mut(blob).ok_or_else(|| StorageError::BlobNotFound {
        container: container.to_string(),
        blob: blob.to_string(),
    })
}

#[async_trait]
impl ObjectStore for InMemoryObjectStore {
    async fn create_container_if_not_exists(
        &self,
        container: &ContainerName,
    ) -> Result<bool, StorageError> {
        let mut containers = self.write();
        if containers.contains_key(container) {
            return Ok(false);
        }
        containers.insert(container.clone(), HashMap::new());
        Ok(true)
    }

    async fn delete_container_if_exists(
        &self,
        container: &ContainerName,
    ) -> Result<bool, StorageError> {
        Ok(self.write().remove(container).is_some())
    }

    async fn container_exists(&self, container: &ContainerName) -> Result<bool, StorageError> {
        Ok(self.read().contains_key(container))
    }

    async fn put_blob(
        &self,
        container: &ContainerName,
        blob: &BlobName,
        kind: BlobKind,
        content: Bytes,
        options: &PutOptions,
    ) -> Result<(), StorageError> {
        if kind != BlobKind::Overwrite && !content.is_empty() {
            return Err(ValidationError::InvalidFormat {
                field: "content".to_string(),
                message: format!("{:?} blobs are created empty and written incrementally", kind),
            }
            .into());
        }

        let capacity = match kind {
            BlobKind::PageAligned => {
                let capacity = options
                    .page_capacity
                    .unwrap_or(self.config.default_page_capacity);
                if capacity % self.config.page_size != 0 {
                    return Err(StorageError::PageAlignment {
                        offset: 0,
                        length: capacity as usize,
                        page_size: self.config.page_size,
                    });
                }
                Some(capacity)
            }
            _ => None,
        };

        let mut containers = self.write();
        let blobs = containers
            .get_mut(container)
            .ok_or_else(|| StorageError::ContainerNotFound {
                container: container.to_string(),
            })?;

        if let Some(existing) = blobs.get_mut(blob) {
            if options.if_not_exists {
                return Err(StorageError::BlobAlreadyExists {
                    container: container.to_string(),
                    blob: blob.to_string(),
                });
            }
            existing.check_kind(kind, blob)?;
            existing.check_write_lease(options.lease.as_ref(), blob)?;

            existing.content = content.to_vec();
            existing.content_type = options.content_type.clone();
            existing.metadata = options.metadata.clone();
        } else {
            blobs.insert(
                blob.clone(),
                StoredBlob::new(kind, content.to_vec(), options, capacity),
            );
        }

        Ok(())
    }

    async fn download(
        &self,
        container: &ContainerName,
        blob: &BlobName,
        lease: Option<&LeaseToken>,
    ) -> Result<Bytes, StorageError> {
        let mut containers = self.write();
        let stored = blob_entry(&mut containers, container, blob)?;
        stored.check_read_lease(lease, blob)?;
        Ok(Bytes::from(stored.content.clone()))
    }

    async fn blob_exists(
        &self,
        container: &ContainerName,
        blob: &BlobName,
    ) -> Result<bool, StorageError> {
        let containers = self.read();
        Ok(containers
            .get(container)
            .is_some_and(|blobs| blobs.contains_key(blob)))
    }

    async fn delete_blob(
        &self,
        container: &ContainerName,
        blob: &BlobName,
        _include_snapshots: bool,
    ) -> Result<(), StorageError> {
        let mut containers = self.write();
        // Deleting a leased blob requires no token here once the lease
        // expired; an active lease blocks deletion without its token
        blob_entry(&mut containers, container, blob)?.check_write_lease(None, blob)?;

        if let Some(blobs) = containers.get_mut(container) {
            blobs.remove(blob);
        }
        Ok(())
    }

    async fn delete_blob_if_exists(
        &self,
        container: &ContainerName,
        blob: &BlobName,
        include_snapshots: bool,
    ) -> Result<bool, StorageError> {
        match self.delete_blob(container, blob, include_snapshots).await {
            Ok(()) => Ok(true),
            Err(err) if err.is_not_found() => Ok(false),
            Err(err) => Err(err),
        }
    }

    async fn get_properties(
        &self,
        container: &ContainerName,
        blob: &BlobName,
        lease: Option<&LeaseToken>,
    ) -> Result<BlobProperties, StorageError> {
        let mut containers = self.write();
        let stored = blob_entry(&mut containers, container, blob)?;
        stored.check_read_lease(lease, blob)?;

        Ok(BlobProperties {
            kind: stored.kind,
            content_length: stored.content.len() as u64,
            content_type: stored.content_type.clone(),
            metadata: stored.metadata.clone(),
        })
    }

    async fn set_metadata(
        &self,
        container: &ContainerName,
        blob: &BlobName,
        metadata: HashMap<String, String>,
        lease: Option<&LeaseToken>,
    ) -> Result<(), StorageError> {
        let mut containers = self.write();
        let stored = blob_entry(&mut containers, container, blob)?;
        stored.check_write_lease(lease, blob)?;
        stored.metadata = metadata;
        Ok(())
    }

    async fn list_blobs(
        &self,
        container: &ContainerName,
        prefix: &str,
    ) -> Result<Vec<BlobName>, StorageError> {
        let containers = self.read();
        let blobs = containers
            .get(container)
            .ok_or_else(|| StorageError::ContainerNotFound {
                container: container.to_string(),
            })?;

        let mut names: Vec<BlobName> = blobs
            .keys()
            .filter(|name| name.as_str().starts_with(prefix))
            .cloned()
            .collect();
        names.sort_by(|a, b| a.as_str().cmp(b.as_str()));
        Ok(names)
    }

    async fn write_pages(
        &self,
        container: &ContainerName,
        blob: &BlobName,
        offset: u64,
        content: Bytes,
        lease: Option<&LeaseToken>,
    ) -> Result<(), StorageError> {
        if offset % self.config.page_size != 0 || content.len() as u64 % self.config.page_size != 0
        {
            return Err(StorageError::PageAlignment {
                offset,
                length: content.len(),
                page_size: self.config.page_size,
            });
        }

        let mut containers = self.write();
        let stored = blob_entry(&mut containers, container, blob)?;
        stored.check_kind(BlobKind::PageAligned, blob)?;
        stored.check_write_lease(lease, blob)?;

        let capacity = stored.capacity.unwrap_or(0);
        let end = offset + content.len() as u64;
        if end > capacity {
            return Err(StorageError::CapacityExceeded {
                requested: end,
                capacity,
            });
        }

        let end = end as usize;
        if stored.content.len() < end {
            stored.content.resize(end, 0);
        }
        stored.content[offset as usize..end].copy_from_slice(&content);
        Ok(())
    }

    async fn clear_pages(
        &self,
        container: &ContainerName,
        blob: &BlobName,
        lease: Option<&LeaseToken>,
    ) -> Result<(), StorageError> {
        let mut containers = self.write();
        let stored = blob_entry(&mut containers, container, blob)?;
        stored.check_kind(BlobKind::PageAligned, blob)?;
        stored.check_write_lease(lease, blob)?;
        stored.content.clear();
        Ok(())
    }

    async fn append_block(
        &self,
        container: &ContainerName,
        blob: &BlobName,
        content: Bytes,
        lease: Option<&LeaseToken>,
    ) -> Result<(), StorageError> {
        let mut containers = self.write();
        let stored = blob_entry(&mut containers, container, blob)?;
        stored.check_kind(BlobKind::AppendOnly, blob)?;
        stored.check_write_lease(lease, blob)?;
        stored.content.extend_from_slice(&content);
        Ok(())
    }

    async fn acquire_lease(
        &self,
        container: &ContainerName,
        blob: &BlobName,
        duration: Duration,
    ) -> Result<LeaseToken, StorageError> {
        let mut containers = self.write();
        let stored = blob_entry(&mut containers, container, blob)?;

        if stored.active_lease().is_some() {
            return Err(StorageError::LeaseConflict {
                blob: blob.to_string(),
            });
        }

        let token = LeaseToken::new(uuid::Uuid::new_v4().to_string())?;
        stored.lease = Some(ActiveLease {
            token: token.clone(),
            duration,
            expires_at: Utc::now() + duration,
        });
        Ok(token)
    }

    async fn release_lease(
        &self,
        container: &ContainerName,
        blob: &BlobName,
        token: &LeaseToken,
    ) -> Result<(), StorageError> {
        let mut containers = self.write();
        let stored = blob_entry(&mut containers, container, blob)?;

        if stored.active_lease().map(|a| &a.token) != Some(token) {
            return Err(StorageError::LeaseMismatch {
                blob: blob.to_string(),
            });
        }
        stored.lease = None;
        Ok(())
    }

    async fn renew_lease(
        &self,
        container: &ContainerName,
        blob: &BlobName,
        token: &LeaseToken,
    ) -> Result<(), StorageError> {
        let mut containers = self.write();
        let stored = blob_entry(&mut containers, container, blob)?;

        let duration = match stored.active_lease() {
            Some(active) if active.token == *token => active.duration,
            _ => {
                return Err(StorageError::LeaseMismatch {
                    blob: blob.to_string(),
                })
            }
        };

        stored.lease = Some(ActiveLease {
            token: token.clone(),
            duration,
            expires_at: Utc::now() + duration,
        });
        Ok(())
    }
}
