//! # Overflow Queue Core
//!
//! Queue abstraction backed by a cloud object store, lifting the hard
//! per-message size limit of managed queue services: messages that exceed
//! the transport limit are transparently relocated to blob storage and a
//! small envelope pointing at the blob is enqueued instead. The inverse
//! path runs on dequeue, and the spillover blob is removed when the
//! message is deleted.
//!
//! This library provides:
//! - A provider-agnostic [`queue::QueueService`] trait
//! - The spillover protocol client [`overflow::OverflowQueueClient`]
//! - A tagged wire codec that round-trips the payload type
//! - A lazily-memoizing per-tenant router
//! - An in-memory queue provider for testing and development
//!
//! ## Module Organization
//!
//! - [`codec`] - Tagged wire frames and the spillover envelope
//! - [`error`] - Error types for all queue operations
//! - [`message`] - Message structures and identifiers
//! - [`naming`] - Spillover blob naming, clock and id generation
//! - [`overflow`] - The spillover protocol client
//! - [`queue`] - The queue service trait
//! - [`router`] - Tenant-keyed client registry

// Module declarations
pub mod codec;
pub mod error;
pub mod message;
pub mod naming;
pub mod overflow;
pub mod providers;
pub mod queue;
pub mod router;

// Re-export commonly used types at crate root for convenience
pub use codec::QueuePayload;
pub use error::{CodecError, QueueError};
pub use message::{CloudMessage, MessageId, PopReceipt, QueueName, RawQueueMessage, TenantId, Timestamp};
pub use naming::{BlobNameGenerator, Clock, IdGenerator, SystemClock, UuidGenerator};
pub use overflow::{OverflowConfig, OverflowQueueClient};
pub use providers::InMemoryQueueService;
pub use queue::{EnqueueOptions, QueueService};
pub use router::TenantQueueRouter;

// The storage side is part of the public API surface
pub use storage_runtime::ValidationError;
