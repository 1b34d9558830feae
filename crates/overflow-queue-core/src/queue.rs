//! The queue service trait.

use crate::error::QueueError;
use crate::message::{MessageId, PopReceipt, QueueName, RawQueueMessage};
use async_trait::async_trait;
use bytes::Bytes;
use chrono::Duration;

/// Options applied when enqueueing a message
#[derive(Debug, Clone, Default)]
pub struct EnqueueOptions {
    /// Time-to-live after which the transport drops the message
    pub time_to_live: Option<Duration>,
    /// Delay before the message becomes visible to consumers
    pub initial_visibility_delay: Option<Duration>,
}

impl EnqueueOptions {
    /// Create new enqueue options with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the message time-to-live
    pub fn with_time_to_live(mut self, ttl: Duration) -> Self {
        self.time_to_live = Some(ttl);
        self
    }

    /// Delay the first delivery of the message
    pub fn with_initial_visibility_delay(mut self, delay: Duration) -> Self {
        self.initial_visibility_delay = Some(delay);
        self
    }
}

/// Interface implemented by specific queue transports
///
/// FIFO-ish, at-least-once delivery with a hard per-message size limit,
/// visibility timeouts, and pop-receipt-based deletion. The spillover
/// protocol sits on top of this trait; implementations forward to their
/// backend without protocol logic of their own.
#[async_trait]
pub trait QueueService: Send + Sync {
    /// Create queue if it does not exist; returns true when created
    async fn create_if_not_exists(&self, queue: &QueueName) -> Result<bool, QueueError>;

    /// Delete queue if it exists; returns true when deleted
    async fn delete_if_exists(&self, queue: &QueueName) -> Result<bool, QueueError>;

    /// Check whether a queue exists
    async fn exists(&self, queue: &QueueName) -> Result<bool, QueueError>;

    /// Enqueue a raw body
    async fn enqueue(
        &self,
        queue: &QueueName,
        body: Bytes,
        options: &EnqueueOptions,
    ) -> Result<(), QueueError>;

    /// Dequeue up to `max_messages`, hiding them for the visibility timeout
    ///
    /// An empty result means the queue holds no visible messages.
    async fn dequeue(
        &self,
        queue: &QueueName,
        max_messages: u32,
        visibility_timeout: Option<Duration>,
    ) -> Result<Vec<RawQueueMessage>, QueueError>;

    /// Peek up to `max_messages` without affecting their visibility
    ///
    /// Peeked messages carry no pop receipt.
    async fn peek(
        &self,
        queue: &QueueName,
        max_messages: u32,
    ) -> Result<Vec<RawQueueMessage>, QueueError>;

    /// Delete a message by id and pop receipt
    async fn delete_message(
        &self,
        queue: &QueueName,
        id: &MessageId,
        pop_receipt: &PopReceipt,
    ) -> Result<(), QueueError>;

    /// Update the visibility timeout of an in-flight message
    ///
    /// Returns the fresh pop receipt that replaces the presented one.
    async fn update_visibility(
        &self,
        queue: &QueueName,
        id: &MessageId,
        pop_receipt: &PopReceipt,
        visibility_timeout: Duration,
    ) -> Result<PopReceipt, QueueError>;

    /// Approximate number of messages in the queue
    async fn approximate_message_count(&self, queue: &QueueName) -> Result<u64, QueueError>;

    /// Remove all messages from the queue
    async fn clear(&self, queue: &QueueName) -> Result<(), QueueError>;

    /// Hard per-message size limit of the transport, in bytes
    fn max_message_size(&self) -> usize;

    /// Maximum batch size for dequeue and peek operations
    fn max_peek_batch_size(&self) -> u32;
}
