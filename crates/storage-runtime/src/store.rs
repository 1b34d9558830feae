//! The object store trait and write options.

use crate::blob::{BlobKind, BlobName, BlobProperties, ContainerName, LeaseToken};
use crate::error::StorageError;
use async_trait::async_trait;
use bytes::Bytes;
use chrono::Duration;
use std::collections::HashMap;

/// Options for whole-blob writes
#[derive(Debug, Clone, Default)]
pub struct PutOptions {
    /// Content type recorded on the blob
    pub content_type: Option<String>,
    /// User metadata recorded on the blob
    pub metadata: HashMap<String, String>,
    /// Lease token to present when the blob carries an active lease
    pub lease: Option<LeaseToken>,
    /// Fail with [`StorageError::BlobAlreadyExists`] instead of replacing
    pub if_not_exists: bool,
    /// Capacity reservation for page-aligned blobs
    pub page_capacity: Option<u64>,
}

impl PutOptions {
    /// Create new put options with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the content type
    pub fn with_content_type(mut self, content_type: String) -> Self {
        self.content_type = Some(content_type);
        self
    }

    /// Set the user metadata
    pub fn with_metadata(mut self, metadata: HashMap<String, String>) -> Self {
        self.metadata = metadata;
        self
    }

    /// Present a lease token with the write
    pub fn with_lease(mut self, lease: LeaseToken) -> Self {
        self.lease = Some(lease);
        self
    }

    /// Make the write conditional on the blob not existing yet
    pub fn if_not_exists(mut self) -> Self {
        self.if_not_exists = true;
        self
    }

    /// Reserve capacity for a page-aligned blob
    pub fn with_page_capacity(mut self, capacity: u64) -> Self {
        self.page_capacity = Some(capacity);
        self
    }
}

/// Interface implemented by specific object store providers
///
/// Key/blob addressed storage with per-blob leases, conditional writes,
/// and range-addressable pages for the page-aligned blob kind. Writes to
/// a blob with an active lease must present the exact token; the provider
/// is the authority that rejects stale or absent tokens.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Create container if it does not exist; returns true when created
    async fn create_container_if_not_exists(
        &self,
        container: &ContainerName,
    ) -> Result<bool, StorageError>;

    /// Delete container if it exists; returns true when deleted
    async fn delete_container_if_exists(
        &self,
        container: &ContainerName,
    ) -> Result<bool, StorageError>;

    /// Check whether a container exists
    async fn container_exists(&self, container: &ContainerName) -> Result<bool, StorageError>;

    /// Write a whole blob body, creating the blob when missing
    ///
    /// For [`BlobKind::PageAligned`] and [`BlobKind::AppendOnly`] this
    /// creates the blob; content for those kinds must be written through
    /// [`Self::write_pages`] / [`Self::append_block`].
    async fn put_blob(
        &self,
        container: &ContainerName,
        blob: &BlobName,
        kind: BlobKind,
        content: Bytes,
        options: &PutOptions,
    ) -> Result<(), StorageError>;

    /// Download the full blob body
    async fn download(
        &self,
        container: &ContainerName,
        blob: &BlobName,
        lease: Option<&LeaseToken>,
    ) -> Result<Bytes, StorageError>;

    /// Check whether a blob exists
    async fn blob_exists(
        &self,
        container: &ContainerName,
        blob: &BlobName,
    ) -> Result<bool, StorageError>;

    /// Delete a blob, optionally including its snapshots
    async fn delete_blob(
        &self,
        container: &ContainerName,
        blob: &BlobName,
        include_snapshots: bool,
    ) -> Result<(), StorageError>;

    /// Delete a blob if it exists; returns true when deleted
    async fn delete_blob_if_exists(
        &self,
        container: &ContainerName,
        blob: &BlobName,
        include_snapshots: bool,
    ) -> Result<bool, StorageError>;

    /// Fetch blob properties (kind, length, content type, metadata)
    async fn get_properties(
        &self,
        container: &ContainerName,
        blob: &BlobName,
        lease: Option<&LeaseToken>,
    ) -> Result<BlobProperties, StorageError>;

    /// Replace the user metadata on a blob
    async fn set_metadata(
        &self,
        container: &ContainerName,
        blob: &BlobName,
        metadata: HashMap<String, String>,
        lease: Option<&LeaseToken>,
    ) -> Result<(), StorageError>;

    /// List blob names starting with the given prefix
    async fn list_blobs(
        &self,
        container: &ContainerName,
        prefix: &str,
    ) -> Result<Vec<BlobName>, StorageError>;

    /// Write a page range; offset and length must be page-size multiples
    async fn write_pages(
        &self,
        container: &ContainerName,
        blob: &BlobName,
        offset: u64,
        content: Bytes,
        lease: Option<&LeaseToken>,
    ) -> Result<(), StorageError>;

    /// Clear all existing page ranges
    async fn clear_pages(
        &self,
        container: &ContainerName,
        blob: &BlobName,
        lease: Option<&LeaseToken>,
    ) -> Result<(), StorageError>;

    /// Append a block to the end of an append-only blob
    async fn append_block(
        &self,
        container: &ContainerName,
        blob: &BlobName,
        content: Bytes,
        lease: Option<&LeaseToken>,
    ) -> Result<(), StorageError>;

    /// Acquire a lease on a blob for the given duration
    async fn acquire_lease(
        &self,
        container: &ContainerName,
        blob: &BlobName,
        duration: Duration,
    ) -> Result<LeaseToken, StorageError>;

    /// Release an active lease
    async fn release_lease(
        &self,
        container: &ContainerName,
        blob: &BlobName,
        token: &LeaseToken,
    ) -> Result<(), StorageError>;

    /// Renew an active lease for its original duration
    async fn renew_lease(
        &self,
        container: &ContainerName,
        blob: &BlobName,
        token: &LeaseToken,
    ) -> Result<(), StorageError>;
}
