//! In-memory queue service for testing and local development.

use crate::error::QueueError;
use crate::message::{MessageId, PopReceipt, QueueName, RawQueueMessage, Timestamp};
use crate::queue::{EnqueueOptions, QueueService};
use async_trait::async_trait;
use bytes::Bytes;
use chrono::Duration;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Hard per-message size limit, matching the 64 KiB transport cap
const MAX_MESSAGE_SIZE: usize = 64 * 1024;

/// Largest batch a single dequeue or peek may request
const MAX_PEEK_BATCH_SIZE: u32 = 32;

/// Visibility timeout applied when the caller does not pass one
const DEFAULT_VISIBILITY_SECONDS: i64 = 30;

/// Time-to-live applied when the caller does not pass one
const DEFAULT_TTL_DAYS: i64 = 7;

/// One stored message with its delivery state
#[derive(Debug, Clone)]
struct QueueEntry {
    id: MessageId,
    body: Bytes,
    pop_receipt: Option<PopReceipt>,
    dequeue_count: u32,
    inserted_on: Timestamp,
    expires_on: Timestamp,
    next_visible_on: Option<Timestamp>,
}

impl QueueEntry {
    fn is_expired(&self, now: Timestamp) -> bool {
        self.expires_on <= now
    }

    fn is_visible(&self, now: Timestamp) -> bool {
        match self.next_visible_on {
            Some(visible_on) => visible_on <= now,
            None => true,
        }
    }

    fn to_raw(&self, with_receipt: bool) -> RawQueueMessage {
        RawQueueMessage {
            id: self.id.clone(),
            pop_receipt: if with_receipt {
                self.pop_receipt.clone()
            } else {
                None
            },
            body: self.body.clone(),
            dequeue_count: self.dequeue_count,
            inserted_on: Some(self.inserted_on),
            expires_on: Some(self.expires_on),
            next_visible_on: self.next_visible_on,
        }
    }
}

/// In-memory queue service backed by per-queue deques
///
/// Mirrors transport semantics closely enough for protocol tests: at
/// least-once delivery with visibility timeouts, pop receipts rotated on
/// every delivery, message expiry, and the size check applied to the
/// base64-expanded body the way the wire transport bills it. Queues are
/// created implicitly on first use.
#[derive(Debug, Clone, Default)]
pub struct InMemoryQueueService {
    queues: Arc<RwLock<HashMap<QueueName, VecDeque<QueueEntry>>>>,
}

impl InMemoryQueueService {
    /// Create a new empty queue service
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<QueueName, VecDeque<QueueEntry>>> {
        self.queues.read().unwrap_or_else(|p| p.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<QueueName, VecDeque<QueueEntry>>> {
        self.queues.write().unwrap_or_else(|p| p.into_inner())
    }

    fn fresh_receipt() -> Result<PopReceipt, QueueError> {
        Ok(PopReceipt::new(uuid::Uuid::new_v4().simple().to_string())?)
    }

    fn fresh_id() -> Result<MessageId, QueueError> {
        Ok(MessageId::new(uuid::Uuid::new_v4().simple().to_string())?)
    }

    /// Size of the body once base64-expanded on the wire
    fn billed_size(body: &Bytes) -> usize {
        body.len().div_ceil(3) * 4
    }

    fn drop_expired(entries: &mut VecDeque<QueueEntry>, now: Timestamp) {
        entries.retain(|entry| !entry.is_expired(now));
    }
}

#[async_trait]
impl QueueService for InMemoryQueueService {
    async fn create_if_not_exists(&self, queue: &QueueName) -> Result<bool, QueueError> {
        let mut queues = self.write();
        if queues.contains_key(queue) {
            return Ok(false);
        }
        queues.insert(queue.clone(), VecDeque::new());
        Ok(true)
    }

    async fn delete_if_exists(&self, queue: &QueueName) -> Result<bool, QueueError> {
        Ok(self.write().remove(queue).is_some())
    }

    async fn exists(&self, queue: &QueueName) -> Result<bool, QueueError> {
        Ok(self.read().contains_key(queue))
    }

    async fn enqueue(
        &self,
        queue: &QueueName,
        body: Bytes,
        options: &EnqueueOptions,
    ) -> Result<(), QueueError> {
        let billed = Self::billed_size(&body);
        if billed > MAX_MESSAGE_SIZE {
            return Err(QueueError::MessageTooLarge {
                size: billed,
                max_size: MAX_MESSAGE_SIZE,
            });
        }

        let now = Timestamp::now();
        let ttl = options
            .time_to_live
            .unwrap_or_else(|| Duration::days(DEFAULT_TTL_DAYS));
        let entry = QueueEntry {
            id: Self::fresh_id()?,
            body,
            pop_receipt: None,
            dequeue_count: 0,
            inserted_on: now,
            expires_on: Timestamp::from_datetime(now.as_datetime() + ttl),
            next_visible_on: options
                .initial_visibility_delay
                .map(|delay| Timestamp::from_datetime(now.as_datetime() + delay)),
        };

        let mut queues = self.write();
        queues.entry(queue.clone()).or_default().push_back(entry);
        Ok(())
    }

    async fn dequeue(
        &self,
        queue: &QueueName,
        max_messages: u32,
        visibility_timeout: Option<Duration>,
    ) -> Result<Vec<RawQueueMessage>, QueueError> {
        let now = Timestamp::now();
        let timeout =
            visibility_timeout.unwrap_or_else(|| Duration::seconds(DEFAULT_VISIBILITY_SECONDS));
        let hidden_until = Timestamp::from_datetime(now.as_datetime() + timeout);

        let mut queues = self.write();
        let Some(entries) = queues.get_mut(queue) else {
            return Ok(Vec::new());
        };
        Self::drop_expired(entries, now);

        let mut delivered = Vec::new();
        for entry in entries.iter_mut() {
            if delivered.len() as u32 >= max_messages {
                break;
            }
            if !entry.is_visible(now) {
                continue;
            }
            entry.pop_receipt = Some(Self::fresh_receipt()?);
            entry.dequeue_count += 1;
            entry.next_visible_on = Some(hidden_until);
            delivered.push(entry.to_raw(true));
        }
        Ok(delivered)
    }

    async fn peek(
        &self,
        queue: &QueueName,
        max_messages: u32,
    ) -> Result<Vec<RawQueueMessage>, QueueError> {
        let now = Timestamp::now();
        let queues = self.read();
        let Some(entries) = queues.get(queue) else {
            return Ok(Vec::new());
        };

        Ok(entries
            .iter()
            .filter(|entry| !entry.is_expired(now) && entry.is_visible(now))
            .take(max_messages as usize)
            .map(|entry| entry.to_raw(false))
            .collect())
    }

    async fn delete_message(
        &self,
        queue: &QueueName,
        id: &MessageId,
        pop_receipt: &PopReceipt,
    ) -> Result<(), QueueError> {
        let mut queues = self.write();
        let Some(entries) = queues.get_mut(queue) else {
            return Err(QueueError::MessageNotFound {
                receipt: pop_receipt.as_str().to_string(),
            });
        };

        let position = entries.iter().position(|entry| {
            entry.id == *id && entry.pop_receipt.as_ref() == Some(pop_receipt)
        });
        match position {
            Some(index) => {
                entries.remove(index);
                Ok(())
            }
            None => Err(QueueError::MessageNotFound {
                receipt: pop_receipt.as_str().to_string(),
            }),
        }
    }

    async fn update_visibility(
        &self,
        queue: &QueueName,
        id: &MessageId,
        pop_receipt: &PopReceipt,
        visibility_timeout: Duration,
    ) -> Result<PopReceipt, QueueError> {
        let now = Timestamp::now();
        let mut queues = self.write();
        let Some(entries) = queues.get_mut(queue) else {
            return Err(QueueError::MessageNotFound {
                receipt: pop_receipt.as_str().to_string(),
            });
        };

        let entry = entries.iter_mut().find(|entry| {
            entry.id == *id && entry.pop_receipt.as_ref() == Some(pop_receipt)
        });
        match entry {
            Some(entry) => {
                let refreshed = Self::fresh_receipt()?;
                entry.pop_receipt = Some(refreshed.clone());
                entry.next_visible_on = Some(Timestamp::from_datetime(
                    now.as_datetime() + visibility_timeout,
                ));
                Ok(refreshed)
            }
            None => Err(QueueError::MessageNotFound {
                receipt: pop_receipt.as_str().to_string(),
            }),
        }
    }

    async fn approximate_message_count(&self, queue: &QueueName) -> Result<u64, QueueError> {
        let now = Timestamp::now();
        let queues = self.read();
        Ok(queues
            .get(queue)
            .map(|entries| entries.iter().filter(|e| !e.is_expired(now)).count() as u64)
            .unwrap_or(0))
    }

    async fn clear(&self, queue: &QueueName) -> Result<(), QueueError> {
        if let Some(entries) = self.write().get_mut(queue) {
            entries.clear();
        }
        Ok(())
    }

    fn max_message_size(&self) -> usize {
        MAX_MESSAGE_SIZE
    }

    fn max_peek_batch_size(&self) -> u32 {
        MAX_PEEK_BATCH_SIZE
    }
}

#[cfg(test)]
#[path = "memory_tests.rs"]
mod tests;
