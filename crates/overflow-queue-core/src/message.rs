//! Message types for queue operations including core domain identifiers.

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::str::FromStr;
use storage_runtime::{BlobName, ValidationError};

// ============================================================================
// Core Domain Identifiers
// ============================================================================

/// Validated queue name with length and character restrictions
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QueueName(String);

impl QueueName {
    /// Create new queue name with validation
    pub fn new(name: String) -> Result<Self, ValidationError> {
        // Validate length
        if name.len() < 3 || name.len() > 63 {
            return Err(ValidationError::OutOfRange {
                field: "queue_name".to_string(),
                message: "must be 3-63 characters".to_string(),
            });
        }

        // Validate characters (lowercase ASCII alphanumeric and hyphens)
        if !name
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
        {
            return Err(ValidationError::InvalidFormat {
                field: "queue_name".to_string(),
                message: "only lowercase ASCII alphanumeric and hyphens allowed".to_string(),
            });
        }

        // Validate no consecutive hyphens or leading/trailing hyphens
        if name.starts_with('-') || name.ends_with('-') || name.contains("--") {
            return Err(ValidationError::InvalidFormat {
                field: "queue_name".to_string(),
                message: "no leading/trailing hyphens or consecutive hyphens".to_string(),
            });
        }

        Ok(Self(name))
    }

    /// Create queue name with prefix
    pub fn with_prefix(prefix: &str, base_name: &str) -> Result<Self, ValidationError> {
        let full_name = format!("{}-{}", prefix, base_name);
        Self::new(full_name)
    }

    /// Get queue name as string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for QueueName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for QueueName {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s.to_string())
    }
}

/// Identifier for a tenant whose traffic is isolated on its own queue
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TenantId(String);

impl TenantId {
    /// Create new tenant id with validation
    pub fn new(id: String) -> Result<Self, ValidationError> {
        if id.is_empty() || id.len() > 40 {
            return Err(ValidationError::OutOfRange {
                field: "tenant_id".to_string(),
                message: "must be 1-40 characters".to_string(),
            });
        }

        if !id
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
        {
            return Err(ValidationError::InvalidFormat {
                field: "tenant_id".to_string(),
                message: "only lowercase ASCII alphanumeric and hyphens allowed".to_string(),
            });
        }

        Ok(Self(id))
    }

    /// Get tenant id as string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for TenantId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for TenantId {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s.to_string())
    }
}

/// Unique identifier assigned to a message by the queue transport
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageId(String);

impl MessageId {
    /// Create message id from a transport-assigned value
    pub fn new(id: String) -> Result<Self, ValidationError> {
        if id.is_empty() {
            return Err(ValidationError::Required {
                field: "message_id".to_string(),
            });
        }

        Ok(Self(id))
    }

    /// Get message id as string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for MessageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque token proving the right to delete or update a dequeued message
///
/// Issued per delivery; an update operation invalidates the previous
/// receipt and issues a fresh one.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PopReceipt(String);

impl PopReceipt {
    /// Create pop receipt from a transport-assigned value
    pub fn new(receipt: String) -> Result<Self, ValidationError> {
        if receipt.is_empty() {
            return Err(ValidationError::Required {
                field: "pop_receipt".to_string(),
            });
        }

        Ok(Self(receipt))
    }

    /// Get receipt as string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for PopReceipt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Timestamp wrapper for consistent time handling
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Create timestamp for current time
    pub fn now() -> Self {
        Self(Utc::now())
    }

    /// Create timestamp from DateTime
    pub fn from_datetime(dt: DateTime<Utc>) -> Self {
        Self(dt)
    }

    /// Get underlying DateTime
    pub fn as_datetime(&self) -> DateTime<Utc> {
        self.0
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d %H:%M:%S UTC"))
    }
}

impl FromStr for Timestamp {
    type Err = chrono::ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let dt = s.parse::<DateTime<Utc>>()?;
        Ok(Self::from_datetime(dt))
    }
}

// ============================================================================
// Message Types
// ============================================================================

/// A message as exchanged with the queue transport
///
/// Carries the raw body and the transport-owned delivery metadata. Peeked
/// messages have no pop receipt.
#[derive(Debug, Clone)]
pub struct RawQueueMessage {
    pub id: MessageId,
    pub pop_receipt: Option<PopReceipt>,
    pub body: Bytes,
    pub dequeue_count: u32,
    pub inserted_on: Option<Timestamp>,
    pub expires_on: Option<Timestamp>,
    pub next_visible_on: Option<Timestamp>,
}

/// One logical message, decoupled from the queue transport
///
/// Constructed only by the dequeue path. The transport-owned fields (id,
/// pop receipt, dequeue count, timestamps) are copied from the underlying
/// queue entry unmodified and must be presented unchanged when deleting
/// or updating the message.
#[derive(Debug, Clone)]
pub struct CloudMessage<P> {
    content: P,
    id: MessageId,
    pop_receipt: Option<PopReceipt>,
    dequeue_count: u32,
    inserted_on: Option<Timestamp>,
    expires_on: Option<Timestamp>,
    next_visible_on: Option<Timestamp>,
    metadata: HashMap<String, String>,
    overflow_blob: Option<BlobName>,
}

impl<P> CloudMessage<P> {
    /// Build a message from its queue-native record and decoded payload
    pub(crate) fn from_raw(content: P, raw: &RawQueueMessage, overflow_blob: Option<BlobName>) -> Self {
        Self {
            content,
            id: raw.id.clone(),
            pop_receipt: raw.pop_receipt.clone(),
            dequeue_count: raw.dequeue_count,
            inserted_on: raw.inserted_on,
            expires_on: raw.expires_on,
            next_visible_on: raw.next_visible_on,
            metadata: HashMap::new(),
            overflow_blob,
        }
    }

    /// The deserialized payload
    pub fn content(&self) -> &P {
        &self.content
    }

    /// Consume the message and return its payload
    pub fn into_content(self) -> P {
        self.content
    }

    /// Transport-assigned message id
    pub fn id(&self) -> &MessageId {
        &self.id
    }

    /// Pop receipt for the current delivery; `None` for peeked messages
    pub fn pop_receipt(&self) -> Option<&PopReceipt> {
        self.pop_receipt.as_ref()
    }

    pub(crate) fn set_pop_receipt(&mut self, receipt: PopReceipt) {
        self.pop_receipt = Some(receipt);
    }

    /// Number of times this message has been delivered
    pub fn dequeue_count(&self) -> u32 {
        self.dequeue_count
    }

    pub fn inserted_on(&self) -> Option<Timestamp> {
        self.inserted_on
    }

    pub fn expires_on(&self) -> Option<Timestamp> {
        self.expires_on
    }

    pub fn next_visible_on(&self) -> Option<Timestamp> {
        self.next_visible_on
    }

    /// Caller-visible metadata attached to the message
    pub fn metadata(&self) -> &HashMap<String, String> {
        &self.metadata
    }

    /// Spillover blob backing this message, when it was oversized
    pub fn overflow_blob(&self) -> Option<&BlobName> {
        self.overflow_blob.as_ref()
    }
}

#[cfg(test)]
#[path = "message_tests.rs"]
mod tests;
