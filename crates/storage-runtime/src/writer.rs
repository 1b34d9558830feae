//! Per-kind upload and append strategies.
//!
//! Blobs come in three storage models with different write semantics; the
//! strategies here select the read-modify-write sequence for each kind
//! while preserving content type and metadata across overwrites. None of
//! these sequences is atomic with respect to concurrent writers: callers
//! that can race on the same blob must hold a lease (see
//! [`crate::lease::LeaseCoordinator`]) and pass its token in the options.

use crate::blob::{BlobKind, BlobName, ContainerName, LeaseToken, StorageConfig};
use crate::error::StorageError;
use crate::mime;
use crate::store::{ObjectStore, PutOptions};
use bytes::{Bytes, BytesMut};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Options for upload and append operations
#[derive(Debug, Clone, Default)]
pub struct UploadOptions {
    /// Explicit content type; falls back to the existing value, then to
    /// an extension-based lookup
    pub content_type: Option<String>,
    /// Replacement metadata; when absent, existing metadata is preserved
    pub metadata: Option<HashMap<String, String>>,
    /// Lease token to present when the blob carries an active lease
    pub lease: Option<LeaseToken>,
    /// Capacity reservation for newly created page-aligned blobs
    pub page_capacity: Option<u64>,
}

impl UploadOptions {
    /// Create new upload options with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Set an explicit content type
    pub fn with_content_type(mut self, content_type: String) -> Self {
        self.content_type = Some(content_type);
        self
    }

    /// Replace the blob metadata instead of preserving it
    pub fn with_metadata(mut self, metadata: HashMap<String, String>) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// Present a lease token with every write
    pub fn with_lease(mut self, lease: LeaseToken) -> Self {
        self.lease = Some(lease);
        self
    }

    /// Reserve capacity when the upload creates a page-aligned blob
    pub fn with_page_capacity(mut self, capacity: u64) -> Self {
        self.page_capacity = Some(capacity);
        self
    }
}

/// Upload and append algorithms dispatched on [`BlobKind`]
pub struct BlobWriter {
    store: Arc<dyn ObjectStore>,
    config: StorageConfig,
}

impl BlobWriter {
    /// Create new writer with default configuration
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self::with_config(store, StorageConfig::default())
    }

    /// Create new writer with explicit configuration
    pub fn with_config(store: Arc<dyn ObjectStore>, config: StorageConfig) -> Self {
        Self { store, config }
    }

    /// Replace the blob content using the strategy for its kind
    ///
    /// Creates the blob when it does not exist. For append-only blobs a
    /// replace is synthesized as delete-then-recreate-then-append, since
    /// the storage model has no in-place overwrite.
    pub async fn upload(
        &self,
        container: &ContainerName,
        blob: &BlobName,
        kind: BlobKind,
        content: Bytes,
        options: &UploadOptions,
    ) -> Result<(), StorageError> {
        match kind {
            BlobKind::Overwrite => self.upload_overwrite(container, blob, content, options).await,
            BlobKind::PageAligned => self.upload_pages(container, blob, content, options).await,
            BlobKind::AppendOnly => self.upload_append(container, blob, content, options).await,
        }
    }

    /// Append content after the existing blob content
    ///
    /// Append-only blobs get a native block append (creating the blob
    /// first when missing). The other kinds have no native append, so it
    /// is synthesized as download-concatenate-reupload; that sequence is
    /// what makes the lease discipline mandatory under concurrency.
    pub async fn append(
        &self,
        container: &ContainerName,
        blob: &BlobName,
        kind: BlobKind,
        content: Bytes,
        options: &UploadOptions,
    ) -> Result<(), StorageError> {
        match kind {
            BlobKind::AppendOnly => {
                match self
                    .store
                    .append_block(container, blob, content.clone(), options.lease.as_ref())
                    .await
                {
                    Ok(()) => Ok(()),
                    Err(StorageError::BlobNotFound { .. }) => {
                        debug!(blob = %blob, "append target missing, creating it");
                        let put = self.creation_options(blob, options, None);
                        self.store
                            .put_blob(container, blob, BlobKind::AppendOnly, Bytes::new(), &put)
                            .await?;
                        self.store
                            .append_block(container, blob, content, options.lease.as_ref())
                            .await
                    }
                    Err(err) => Err(err),
                }
            }
            BlobKind::Overwrite | BlobKind::PageAligned => {
                let existing = match self
                    .store
                    .download(container, blob, options.lease.as_ref())
                    .await
                {
                    Ok(bytes) => bytes,
                    // Missing blob reads as empty; the upload below creates it
                    Err(StorageError::BlobNotFound { .. }) => Bytes::new(),
                    Err(err) => return Err(err),
                };

                let mut combined = BytesMut::with_capacity(existing.len() + content.len());
                combined.extend_from_slice(&existing);
                combined.extend_from_slice(&content);
                self.upload(container, blob, kind, combined.freeze(), options)
                    .await
            }
        }
    }

    /// Download the full blob body
    pub async fn download(
        &self,
        container: &ContainerName,
        blob: &BlobName,
        lease: Option<&LeaseToken>,
    ) -> Result<Bytes, StorageError> {
        self.store.download(container, blob, lease).await
    }

    /// Whole-object replace, preserving properties of an existing blob
    async fn upload_overwrite(
        &self,
        container: &ContainerName,
        blob: &BlobName,
        content: Bytes,
        options: &UploadOptions,
    ) -> Result<(), StorageError> {
        let existing = match self
            .store
            .get_properties(container, blob, options.lease.as_ref())
            .await
        {
            Ok(properties) => Some(properties),
            Err(StorageError::BlobNotFound { .. }) => None,
            Err(err) => return Err(err),
        };

        let content_type = options
            .content_type
            .clone()
            .or_else(|| existing.as_ref().and_then(|p| p.content_type.clone()))
            .or_else(|| mime::content_type_for(blob.as_str()).map(str::to_string));

        let metadata = options
            .metadata
            .clone()
            .or_else(|| existing.map(|p| p.metadata))
            .unwrap_or_default();

        let mut put = PutOptions::new().with_metadata(metadata);
        if let Some(content_type) = content_type {
            put = put.with_content_type(content_type);
        }
        if let Some(lease) = options.lease.clone() {
            put = put.with_lease(lease);
        }

        self.store
            .put_blob(container, blob, BlobKind::Overwrite, content, &put)
            .await
    }

    /// Clear existing pages and rewrite content aligned to the page size
    async fn upload_pages(
        &self,
        container: &ContainerName,
        blob: &BlobName,
        content: Bytes,
        options: &UploadOptions,
    ) -> Result<(), StorageError> {
        if self.store.blob_exists(container, blob).await? {
            self.store
                .clear_pages(container, blob, options.lease.as_ref())
                .await?;
        } else {
            let capacity = options
                .page_capacity
                .unwrap_or(self.config.default_page_capacity);
            let capacity = align_up(capacity, self.config.page_size);

            debug!(blob = %blob, capacity, "creating page-aligned blob");
            let put = self.creation_options(blob, options, Some(capacity));
            self.store
                .put_blob(container, blob, BlobKind::PageAligned, Bytes::new(), &put)
                .await?;
        }

        if content.is_empty() {
            return Ok(());
        }

        let padded = pad_to_page(content, self.config.page_size);
        self.store
            .write_pages(container, blob, 0, padded, options.lease.as_ref())
            .await
    }

    /// Replace an append-only blob by recreating it
    async fn upload_append(
        &self,
        container: &ContainerName,
        blob: &BlobName,
        content: Bytes,
        options: &UploadOptions,
    ) -> Result<(), StorageError> {
        self.store
            .delete_blob_if_exists(container, blob, true)
            .await?;

        let put = self.creation_options(blob, options, None);
        self.store
            .put_blob(container, blob, BlobKind::AppendOnly, Bytes::new(), &put)
            .await?;

        if content.is_empty() {
            return Ok(());
        }

        self.store
            .append_block(container, blob, content, options.lease.as_ref())
            .await
    }

    /// Put options for a blob created fresh by one of the strategies
    fn creation_options(
        &self,
        blob: &BlobName,
        options: &UploadOptions,
        page_capacity: Option<u64>,
    ) -> PutOptions {
        let content_type = options
            .content_type
            .clone()
            .or_else(|| mime::content_type_for(blob.as_str()).map(str::to_string));

        let mut put = PutOptions::new().with_metadata(options.metadata.clone().unwrap_or_default());
        if let Some(content_type) = content_type {
            put = put.with_content_type(content_type);
        }
        if let Some(lease) = options.lease.clone() {
            put = put.with_lease(lease);
        }
        if let Some(capacity) = page_capacity {
            put = put.with_page_capacity(capacity);
        }
        put
    }
}

/// Zero-pad content up to the next page boundary
fn pad_to_page(content: Bytes, page_size: u64) -> Bytes {
    let aligned = align_up(content.len() as u64, page_size) as usize;
    if aligned == content.len() {
        return content;
    }

    let mut padded = BytesMut::with_capacity(aligned);
    padded.extend_from_slice(&content);
    padded.resize(aligned, 0);
    padded.freeze()
}

/// Round up to the next multiple of `alignment`
fn align_up(value: u64, alignment: u64) -> u64 {
    value.div_ceil(alignment) * alignment
}

/// Trim the zero padding a page-aligned upload added to the content
///
/// The inverse of the padding applied by page-aligned uploads: downloaded
/// page content is the written payload followed by NUL bytes up to the
/// page boundary.
pub fn trim_page_padding(content: &Bytes) -> Bytes {
    let end = content
        .iter()
        .rposition(|&b| b != 0)
        .map(|i| i + 1)
        .unwrap_or(0);
    content.slice(..end)
}

#[cfg(test)]
#[path = "writer_tests.rs"]
mod tests;
