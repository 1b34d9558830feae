//! Lease coordination with bounded retries.
//!
//! Leases are advisory, time-bounded write locks on a single blob. They
//! exist to serialize the non-atomic read-modify-write sequences in
//! [`crate::writer::BlobWriter`]; nothing here auto-acquires a lease on
//! behalf of a caller.

use crate::blob::{BlobKind, BlobName, ContainerName, LeaseConfig, LeaseToken};
use crate::error::{StorageError, ValidationError};
use crate::store::{ObjectStore, PutOptions};
use bytes::Bytes;
use chrono::Duration;
use std::sync::Arc;
use tracing::{debug, warn};

/// Acquire, release, and renew logic for a single blob lease
///
/// Acquisition bootstraps missing blobs (create empty, then lease) and
/// the `try_` variants convert failure into `Option`/`bool` results per
/// their contract.
pub struct LeaseCoordinator {
    store: Arc<dyn ObjectStore>,
    config: LeaseConfig,
}

impl LeaseCoordinator {
    /// Create new coordinator with default configuration
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self::with_config(store, LeaseConfig::default())
    }

    /// Create new coordinator with explicit configuration
    pub fn with_config(store: Arc<dyn ObjectStore>, config: LeaseConfig) -> Self {
        Self { store, config }
    }

    /// Acquire a lease on the blob, creating the blob first when missing
    ///
    /// Uses the configured default duration when none is given. A missing
    /// blob is created empty (conditionally, so a concurrent creator wins
    /// harmlessly) and the lease is retried exactly once; a second
    /// not-found propagates.
    pub async fn acquire(
        &self,
        container: &ContainerName,
        blob: &BlobName,
        duration: Option<Duration>,
    ) -> Result<LeaseToken, StorageError> {
        let duration = self.validate_duration(duration)?;

        match self.store.acquire_lease(container, blob, duration).await {
            Ok(token) => Ok(token),
            Err(StorageError::BlobNotFound { .. }) => {
                debug!(blob = %blob, "blob missing during lease acquisition, creating it");

                let options = PutOptions::new().if_not_exists();
                match self
                    .store
                    .put_blob(container, blob, BlobKind::Overwrite, Bytes::new(), &options)
                    .await
                {
                    Ok(()) => {}
                    // Another writer created the blob between the two calls
                    Err(StorageError::BlobAlreadyExists { .. }) => {}
                    Err(err) => return Err(err),
                }

                self.store.acquire_lease(container, blob, duration).await
            }
            Err(err) => Err(err),
        }
    }

    /// Attempt to acquire a lease with a bounded number of attempts
    ///
    /// Retries only the "lease already present" conflict, waiting the
    /// configured fixed delay between attempts (skipped after the final
    /// one). Any other failure propagates immediately. Exhausting all
    /// attempts returns `None` rather than an error; the caller decides
    /// whether that is fatal.
    pub async fn try_acquire(
        &self,
        container: &ContainerName,
        blob: &BlobName,
        duration: Option<Duration>,
        max_attempts: u32,
    ) -> Result<Option<LeaseToken>, StorageError> {
        if max_attempts < 1 || max_attempts > self.config.max_attempts {
            return Err(ValidationError::OutOfRange {
                field: "max_attempts".to_string(),
                message: format!("must be 1-{}", self.config.max_attempts),
            }
            .into());
        }

        let retry_delay = self
            .config
            .retry_delay
            .to_std()
            .unwrap_or(std::time::Duration::ZERO);

        for attempt in 1..=max_attempts {
            match self.acquire(container, blob, duration).await {
                Ok(token) => return Ok(Some(token)),
                Err(err) if err.is_lease_conflict() => {
                    debug!(
                        blob = %blob,
                        attempt,
                        max_attempts,
                        "lease already held, will retry"
                    );
                    if attempt < max_attempts {
                        tokio::time::sleep(retry_delay).await;
                    }
                }
                Err(err) => return Err(err),
            }
        }

        Ok(None)
    }

    /// Release an active lease
    pub async fn release(
        &self,
        container: &ContainerName,
        blob: &BlobName,
        token: &LeaseToken,
    ) -> Result<(), StorageError> {
        self.store.release_lease(container, blob, token).await
    }

    /// Renew an active lease for its original duration
    pub async fn renew(
        &self,
        container: &ContainerName,
        blob: &BlobName,
        token: &LeaseToken,
    ) -> Result<(), StorageError> {
        self.store.renew_lease(container, blob, token).await
    }

    /// Renew an active lease, converting any failure into `false`
    pub async fn try_renew(
        &self,
        container: &ContainerName,
        blob: &BlobName,
        token: &LeaseToken,
    ) -> bool {
        match self.store.renew_lease(container, blob, token).await {
            Ok(()) => true,
            Err(err) => {
                warn!(blob = %blob, error = %err, "lease renewal failed");
                false
            }
        }
    }

    fn validate_duration(&self, duration: Option<Duration>) -> Result<Duration, StorageError> {
        let duration = duration.unwrap_or(self.config.default_duration);
        if duration < self.config.min_duration || duration > self.config.max_duration {
            return Err(ValidationError::OutOfRange {
                field: "lease_duration".to_string(),
                message: format!(
                    "must be {}-{} seconds",
                    self.config.min_duration.num_seconds(),
                    self.config.max_duration.num_seconds()
                ),
            }
            .into());
        }
        Ok(duration)
    }
}

#[cfg(test)]
#[path = "lease_tests.rs"]
mod tests;
