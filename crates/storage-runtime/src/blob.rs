//! Blob identifiers, kinds, properties, and storage configuration.

use crate::error::ValidationError;
use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::str::FromStr;

// ============================================================================
// Identifiers
// ============================================================================

/// Validated container name with length and character restrictions
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContainerName(String);

impl ContainerName {
    /// Create new container name with validation
    pub fn new(name: String) -> Result<Self, ValidationError> {
        // Validate length
        if name.len() < 3 || name.len() > 63 {
            return Err(ValidationError::OutOfRange {
                field: "container_name".to_string(),
                message: "must be 3-63 characters".to_string(),
            });
        }

        // Validate characters (lowercase ASCII alphanumeric and hyphens)
        if !name
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
        {
            return Err(ValidationError::InvalidFormat {
                field: "container_name".to_string(),
                message: "only lowercase ASCII alphanumeric and hyphens allowed".to_string(),
            });
        }

        // Validate no consecutive hyphens or leading/trailing hyphens
        if name.starts_with('-') || name.ends_with('-') || name.contains("--") {
            return Err(ValidationError::InvalidFormat {
                field: "container_name".to_string(),
                message: "no leading/trailing hyphens or consecutive hyphens".to_string(),
            });
        }

        Ok(Self(name))
    }

    /// Get container name as string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ContainerName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ContainerName {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s.to_string())
    }
}

/// Validated blob name
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlobName(String);

impl BlobName {
    /// Create new blob name with validation
    pub fn new(name: String) -> Result<Self, ValidationError> {
        if name.is_empty() || name.len() > 1024 {
            return Err(ValidationError::OutOfRange {
                field: "blob_name".to_string(),
                message: "must be 1-1024 characters".to_string(),
            });
        }

        if name.chars().any(|c| c.is_ascii_control()) {
            return Err(ValidationError::InvalidFormat {
                field: "blob_name".to_string(),
                message: "control characters not allowed".to_string(),
            });
        }

        if name.starts_with('/') || name.ends_with('/') {
            return Err(ValidationError::InvalidFormat {
                field: "blob_name".to_string(),
                message: "no leading or trailing path separators".to_string(),
            });
        }

        Ok(Self(name))
    }

    /// Get blob name as string
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Get the file extension, if the name carries one
    pub fn extension(&self) -> Option<&str> {
        let (_, ext) = self.0.rsplit_once('.')?;
        if ext.is_empty() || ext.contains('/') {
            None
        } else {
            Some(ext)
        }
    }
}

impl std::fmt::Display for BlobName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for BlobName {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s.to_string())
    }
}

/// Opaque token proving ownership of an active blob lease
///
/// An absent token means "no lease held". Tokens are forwarded to the
/// backend unmodified; the backend is the authority that rejects stale or
/// missing tokens while a lease is active.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LeaseToken(String);

impl LeaseToken {
    /// Create new lease token
    pub fn new(token: String) -> Result<Self, ValidationError> {
        if token.is_empty() {
            return Err(ValidationError::Required {
                field: "lease_token".to_string(),
            });
        }

        Ok(Self(token))
    }

    /// Get token as string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for LeaseToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Blob Kinds and Properties
// ============================================================================

/// Storage model of a blob, fixed at creation time
///
/// The kind determines which write strategy applies; see
/// [`crate::writer::BlobWriter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BlobKind {
    /// Whole-object replace; no native append
    Overwrite,
    /// Fixed-size pages written at aligned offsets
    PageAligned,
    /// Blocks can only be added at the current end
    AppendOnly,
}

/// Properties of a stored blob
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlobProperties {
    pub kind: BlobKind,
    pub content_length: u64,
    pub content_type: Option<String>,
    pub metadata: HashMap<String, String>,
}

// ============================================================================
// Configuration
// ============================================================================

/// Storage-level tunables for the write strategies
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Page size for page-aligned blobs; writes must be multiples of this
    pub page_size: u64,
    /// Capacity reserved when creating a page-aligned blob without an
    /// explicit reservation
    pub default_page_capacity: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            page_size: 512,
            default_page_capacity: 5 * 1024 * 1024, // 5 MiB
        }
    }
}

/// Tunables for lease acquisition and retry behavior
#[derive(Debug, Clone)]
pub struct LeaseConfig {
    /// Lease duration used when the caller does not specify one
    pub default_duration: Duration,
    /// Minimum lease duration accepted by the backend
    pub min_duration: Duration,
    /// Maximum lease duration accepted by the backend
    pub max_duration: Duration,
    /// Fixed delay between acquisition attempts when the lease is held
    pub retry_delay: Duration,
    /// Upper bound on the caller-supplied attempt count
    pub max_attempts: u32,
}

impl Default for LeaseConfig {
    fn default() -> Self {
        Self {
            default_duration: Duration::seconds(15),
            min_duration: Duration::seconds(15),
            max_duration: Duration::seconds(60),
            retry_delay: Duration::milliseconds(500),
            max_attempts: 10,
        }
    }
}

#[cfg(test)]
#[path = "blob_tests.rs"]
mod tests;
