//! The spillover protocol client.
//!
//! Sits between the caller and a [`QueueService`], relocating messages
//! that exceed the transport's effective size limit into blob storage and
//! enqueueing a small envelope instead. Dequeue runs the inverse path and
//! delete removes the spillover blob before the queue entry.
//!
//! Ordering between the two stores is deliberate and asymmetric: the blob
//! is written before the queue entry (a reader never sees an entry whose
//! blob is still missing under normal operation) but deleted before the
//! queue entry (a concurrent reader that loses that race treats the
//! missing blob as "already consumed"). A crash between the two steps
//! leaves at most an orphaned blob or an already-emptied entry, never a
//! dangling reference that breaks a consumer.

use crate::codec::{self, DecodedBody, OverflowEnvelope, QueuePayload};
use crate::error::{CodecError, QueueError};
use crate::message::{CloudMessage, QueueName, RawQueueMessage};
use crate::naming::BlobNameGenerator;
use crate::queue::{EnqueueOptions, QueueService};
use bytes::Bytes;
use chrono::Duration;
use std::marker::PhantomData;
use std::sync::Arc;
use storage_runtime::{BlobKind, BlobName, ContainerName, ObjectStore, PutOptions, StorageError};
use tracing::{debug, warn};

/// Configuration for a spillover queue client
#[derive(Debug, Clone, Default)]
pub struct OverflowConfig {
    /// Time-to-live applied to every enqueued message
    pub time_to_live: Option<Duration>,
    /// Delay before newly enqueued messages become visible
    pub initial_visibility_delay: Option<Duration>,
    /// Visibility timeout applied when dequeueing; transport default when
    /// absent
    pub visibility_timeout: Option<Duration>,
}

/// Queue client that transparently spills oversized messages to blobs
///
/// Spillover blobs are effectively single-writer (written once at
/// enqueue, read at dequeue, deleted with the message) and need no lease.
pub struct OverflowQueueClient<P: QueuePayload> {
    queue_service: Arc<dyn QueueService>,
    object_store: Arc<dyn ObjectStore>,
    queue: QueueName,
    container: ContainerName,
    config: OverflowConfig,
    names: BlobNameGenerator,
    _payload: PhantomData<fn() -> P>,
}

impl<P: QueuePayload> OverflowQueueClient<P> {
    /// Create new client with default configuration
    pub fn new(
        queue_service: Arc<dyn QueueService>,
        object_store: Arc<dyn ObjectStore>,
        queue: QueueName,
        container: ContainerName,
    ) -> Self {
        Self {
            queue_service,
            object_store,
            queue,
            container,
            config: OverflowConfig::default(),
            names: BlobNameGenerator::new(),
            _payload: PhantomData,
        }
    }

    /// Replace the configuration
    pub fn with_config(mut self, config: OverflowConfig) -> Self {
        self.config = config;
        self
    }

    /// Replace the spillover blob name generator
    pub fn with_name_generator(mut self, names: BlobNameGenerator) -> Self {
        self.names = names;
        self
    }

    /// The queue this client operates on
    pub fn queue(&self) -> &QueueName {
        &self.queue
    }

    /// The container holding this queue's spillover blobs
    pub fn container(&self) -> &ContainerName {
        &self.container
    }

    /// Largest frame that fits in a queue message
    ///
    /// The transport base64-expands the body on the wire, so the usable
    /// budget is three quarters of the hard limit (less one byte before
    /// the division to stay strictly under it).
    pub fn effective_max_size(&self) -> usize {
        (self.queue_service.max_message_size() - 1) / 4 * 3
    }

    /// Create the queue and its spillover container when missing
    pub async fn create_if_not_exists(&self) -> Result<(), QueueError> {
        self.queue_service.create_if_not_exists(&self.queue).await?;
        self.object_store
            .create_container_if_not_exists(&self.container)
            .await?;
        Ok(())
    }

    /// Delete the queue and its spillover container when present
    pub async fn delete_if_exists(&self) -> Result<(), QueueError> {
        self.queue_service.delete_if_exists(&self.queue).await?;
        self.object_store
            .delete_container_if_exists(&self.container)
            .await?;
        Ok(())
    }

    /// Check whether the queue exists
    pub async fn exists(&self) -> Result<bool, QueueError> {
        self.queue_service.exists(&self.queue).await
    }

    /// Enqueue a message, spilling it to a blob when oversized
    pub async fn add_message(&self, content: &P) -> Result<(), QueueError> {
        let frame = codec::encode_payload(content)?;
        let options = self.enqueue_options();

        if frame.len() <= self.effective_max_size() {
            return self.queue_service.enqueue(&self.queue, frame, &options).await;
        }

        // Blob first, then the envelope: a reader can never observe an
        // envelope pointing at a blob that does not exist yet
        let blob_name = self.names.generate()?;
        debug!(
            queue = %self.queue,
            blob = %blob_name,
            size = frame.len(),
            "message exceeds queue limit, spilling to blob"
        );
        self.write_spillover(&blob_name, frame).await?;

        let envelope = codec::encode_envelope(&OverflowEnvelope {
            blob_name: blob_name.clone(),
        })?;
        self.queue_service
            .enqueue(&self.queue, envelope, &options)
            .await
    }

    /// Dequeue up to `max_messages`, resolving spilled payloads
    ///
    /// `max_messages` must be between 1 and the transport's batch limit;
    /// violating either bound is a fatal input error. An empty queue
    /// yields an empty vector.
    pub async fn get_messages(
        &self,
        max_messages: u32,
    ) -> Result<Vec<CloudMessage<P>>, QueueError> {
        self.validate_batch_size(max_messages)?;

        let raw = self
            .queue_service
            .dequeue(&self.queue, max_messages, self.config.visibility_timeout)
            .await?;
        self.resolve_all(raw).await
    }

    /// Dequeue a single message, or `None` when the queue is empty
    pub async fn get_message(&self) -> Result<Option<CloudMessage<P>>, QueueError> {
        let mut messages = self.get_messages(1).await?;
        Ok(messages.pop())
    }

    /// Peek up to `max_messages` without affecting their visibility
    pub async fn peek_messages(
        &self,
        max_messages: u32,
    ) -> Result<Vec<CloudMessage<P>>, QueueError> {
        self.validate_batch_size(max_messages)?;

        let raw = self.queue_service.peek(&self.queue, max_messages).await?;
        self.resolve_all(raw).await
    }

    /// Peek a single message, or `None` when the queue is empty
    pub async fn peek_message(&self) -> Result<Option<CloudMessage<P>>, QueueError> {
        let mut messages = self.peek_messages(1).await?;
        Ok(messages.pop())
    }

    /// Delete a message, removing its spillover blob first
    ///
    /// The two deletions are not transactional: a crash in between leaves
    /// an entry whose blob is already gone, which the dequeue path treats
    /// as already consumed.
    pub async fn delete_message(&self, message: &CloudMessage<P>) -> Result<(), QueueError> {
        let receipt = message
            .pop_receipt()
            .ok_or(QueueError::MessageMissingReceipt)?;

        if let Some(blob_name) = message.overflow_blob() {
            debug!(
                queue = %self.queue,
                blob = %blob_name,
                "deleting spillover blob for message"
            );
            self.object_store
                .delete_blob_if_exists(&self.container, blob_name, true)
                .await?;
        }

        self.queue_service
            .delete_message(&self.queue, message.id(), receipt)
            .await
    }

    /// Extend or shorten the visibility timeout of an in-flight message
    ///
    /// Visibility-only: the body is never rewritten, because after the
    /// fact there is no reliable way to tell whether the enqueued body
    /// was the payload itself or a spillover envelope. The refreshed pop
    /// receipt is stored back on the message.
    pub async fn update_visibility(
        &self,
        message: &mut CloudMessage<P>,
        visibility_timeout: Duration,
    ) -> Result<(), QueueError> {
        let receipt = message
            .pop_receipt()
            .ok_or(QueueError::MessageMissingReceipt)?
            .clone();

        let refreshed = self
            .queue_service
            .update_visibility(&self.queue, message.id(), &receipt, visibility_timeout)
            .await?;
        message.set_pop_receipt(refreshed);
        Ok(())
    }

    /// Approximate number of messages in the queue
    pub async fn approximate_message_count(&self) -> Result<u64, QueueError> {
        self.queue_service
            .approximate_message_count(&self.queue)
            .await
    }

    /// Remove all messages from the queue
    pub async fn clear(&self) -> Result<(), QueueError> {
        self.queue_service.clear(&self.queue).await
    }

    fn enqueue_options(&self) -> EnqueueOptions {
        EnqueueOptions {
            time_to_live: self.config.time_to_live,
            initial_visibility_delay: self.config.initial_visibility_delay,
        }
    }

    fn validate_batch_size(&self, max_messages: u32) -> Result<(), QueueError> {
        let max = self.queue_service.max_peek_batch_size();
        if max_messages < 1 || max_messages > max {
            return Err(QueueError::BatchSizeOutOfRange {
                requested: max_messages,
                max,
            });
        }
        Ok(())
    }

    /// Write the frame to a fresh spillover blob
    ///
    /// A missing container is recovered once by creating it and retrying.
    async fn write_spillover(
        &self,
        blob_name: &BlobName,
        frame: Bytes,
    ) -> Result<(), QueueError> {
        let options = PutOptions::new().with_content_type("application/json".to_string());

        match self
            .object_store
            .put_blob(
                &self.container,
                blob_name,
                BlobKind::Overwrite,
                frame.clone(),
                &options,
            )
            .await
        {
            Ok(()) => Ok(()),
            Err(StorageError::ContainerNotFound { .. }) => {
                self.object_store
                    .create_container_if_not_exists(&self.container)
                    .await?;
                self.object_store
                    .put_blob(
                        &self.container,
                        blob_name,
                        BlobKind::Overwrite,
                        frame,
                        &options,
                    )
                    .await?;
                Ok(())
            }
            Err(err) => Err(err.into()),
        }
    }

    async fn resolve_all(
        &self,
        raw: Vec<RawQueueMessage>,
    ) -> Result<Vec<CloudMessage<P>>, QueueError> {
        let mut messages = Vec::with_capacity(raw.len());
        for entry in raw {
            if let Some(message) = self.resolve(entry).await? {
                messages.push(message);
            }
        }
        Ok(messages)
    }

    /// Turn a queue-native record into a caller-facing message
    ///
    /// Returns `None` when the record is an envelope whose blob is gone:
    /// the delete path removes the blob before the queue entry, so a
    /// missing blob means the message was already consumed.
    async fn resolve(&self, raw: RawQueueMessage) -> Result<Option<CloudMessage<P>>, QueueError> {
        match codec::decode::<P>(&raw.body)? {
            DecodedBody::Payload(payload) => Ok(Some(CloudMessage::from_raw(payload, &raw, None))),
            DecodedBody::Envelope(envelope) => {
                let bytes = match self
                    .object_store
                    .download(&self.container, &envelope.blob_name, None)
                    .await
                {
                    Ok(bytes) => bytes,
                    Err(err) if err.is_not_found() => {
                        warn!(
                            queue = %self.queue,
                            blob = %envelope.blob_name,
                            "spillover blob missing, treating message as already consumed"
                        );
                        return Ok(None);
                    }
                    Err(err) => return Err(err.into()),
                };

                match codec::decode::<P>(&bytes)? {
                    DecodedBody::Payload(payload) => Ok(Some(CloudMessage::from_raw(
                        payload,
                        &raw,
                        Some(envelope.blob_name),
                    ))),
                    DecodedBody::Envelope(_) => Err(CodecError::NestedEnvelope.into()),
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "overflow_tests.rs"]
mod tests;
