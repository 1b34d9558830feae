//! Spillover blob naming, clock and id generation.
//!
//! The clock and id generator are injectable so tests can pin the date
//! prefix and the random suffix.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use storage_runtime::{BlobName, ValidationError};

/// Source of the current time
pub trait Clock: Send + Sync {
    fn now_utc(&self) -> DateTime<Utc>;
}

/// System clock
#[derive(Debug, Clone, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_utc(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Source of random identifiers
pub trait IdGenerator: Send + Sync {
    /// A fresh 32-character alphanumeric identifier
    fn random_id(&self) -> String;
}

/// Random identifiers backed by UUID v4
#[derive(Debug, Clone, Default)]
pub struct UuidGenerator;

impl IdGenerator for UuidGenerator {
    fn random_id(&self) -> String {
        uuid::Uuid::new_v4().simple().to_string()
    }
}

/// Generates spillover blob names of the form `{UTC-date}-{random-id}`
///
/// The date prefix aids manual inspection and cleanup; the random suffix
/// is the collision guard between concurrent writers.
#[derive(Clone)]
pub struct BlobNameGenerator {
    clock: Arc<dyn Clock>,
    ids: Arc<dyn IdGenerator>,
}

impl BlobNameGenerator {
    /// Create generator using the system clock and UUID ids
    pub fn new() -> Self {
        Self::with_parts(Arc::new(SystemClock), Arc::new(UuidGenerator))
    }

    /// Create generator with explicit clock and id source
    pub fn with_parts(clock: Arc<dyn Clock>, ids: Arc<dyn IdGenerator>) -> Self {
        Self { clock, ids }
    }

    /// Generate a fresh spillover blob name
    pub fn generate(&self) -> Result<BlobName, ValidationError> {
        let date = self.clock.now_utc().format("%Y-%m-%d");
        BlobName::new(format!("{}-{}", date, self.ids.random_id()))
    }
}

impl Default for BlobNameGenerator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "naming_tests.rs"]
mod tests;
