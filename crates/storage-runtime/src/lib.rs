//! # Storage Runtime
//!
//! Object-store runtime for blob-backed queue infrastructure, providing
//! blob leases and per-kind write strategies over a provider-agnostic
//! storage interface.
//!
//! This library provides:
//! - A provider-agnostic [`store::ObjectStore`] trait with lease,
//!   conditional-write, page, and append operations
//! - Advisory blob leases with bounded-retry acquisition
//! - Upload and append strategies for overwrite, page-aligned, and
//!   append-only blobs that preserve content type and metadata
//! - An in-memory provider for testing and development
//!
//! ## Module Organization
//!
//! - [`blob`] - Blob identifiers, kinds, properties, and configuration
//! - [`error`] - Error types for all storage operations
//! - [`lease`] - Lease coordination with bounded retries
//! - [`mime`] - Content-type lookup by file extension
//! - [`store`] - The object store trait and write options
//! - [`writer`] - Per-kind upload and append strategies

// Module declarations
pub mod blob;
pub mod error;
pub mod lease;
pub mod mime;
pub mod providers;
pub mod store;
pub mod writer;

// Re-export commonly used types at crate root for convenience
pub use blob::{
    BlobKind, BlobName, BlobProperties, ContainerName, LeaseConfig, LeaseToken, StorageConfig,
};
pub use error::{StorageError, ValidationError};
pub use lease::LeaseCoordinator;
pub use providers::InMemoryObjectStore;
pub use store::{ObjectStore, PutOptions};
pub use writer::{trim_page_padding, BlobWriter, UploadOptions};
