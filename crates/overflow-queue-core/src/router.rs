//! Per-tenant queue routing.
//!
//! Derives a queue and spillover container per tenant from a shared name
//! prefix and hands out memoized [`OverflowQueueClient`] instances, so
//! repeated lookups for the same tenant reuse the same client.

use crate::codec::QueuePayload;
use crate::error::QueueError;
use crate::message::{CloudMessage, QueueName, TenantId};
use crate::overflow::{OverflowConfig, OverflowQueueClient};
use crate::queue::QueueService;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use storage_runtime::{ContainerName, ObjectStore, ValidationError};
use tracing::info;

/// Routes messages to per-tenant queues under a shared name prefix
///
/// Tenant `acme` under prefix `orders` maps to queue `orders-acme` with
/// spillover container `orders-overflow-acme`. Clients are memoized per
/// tenant; resource creation runs once per process per tenant.
pub struct TenantQueueRouter<P: QueuePayload> {
    queue_service: Arc<dyn QueueService>,
    object_store: Arc<dyn ObjectStore>,
    prefix: String,
    config: OverflowConfig,
    clients: RwLock<HashMap<TenantId, Arc<OverflowQueueClient<P>>>>,
}

impl<P: QueuePayload> TenantQueueRouter<P> {
    /// Create a new router with default client configuration
    pub fn new(
        queue_service: Arc<dyn QueueService>,
        object_store: Arc<dyn ObjectStore>,
        prefix: impl Into<String>,
    ) -> Self {
        Self {
            queue_service,
            object_store,
            prefix: prefix.into(),
            config: OverflowConfig::default(),
            clients: RwLock::new(HashMap::new()),
        }
    }

    /// Replace the configuration applied to every tenant client
    pub fn with_config(mut self, config: OverflowConfig) -> Self {
        self.config = config;
        self
    }

    /// The shared queue name prefix
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Queue name for the given tenant
    pub fn queue_name(&self, tenant: &TenantId) -> Result<QueueName, ValidationError> {
        QueueName::new(format!("{}-{}", self.prefix, tenant.as_str()))
    }

    /// Spillover container name for the given tenant
    pub fn container_name(&self, tenant: &TenantId) -> Result<ContainerName, ValidationError> {
        ContainerName::new(format!("{}-overflow-{}", self.prefix, tenant.as_str()))
    }

    /// Get (or build) the client for a tenant, creating its resources
    /// the first time the tenant is seen
    pub async fn client_for(
        &self,
        tenant: &TenantId,
    ) -> Result<Arc<OverflowQueueClient<P>>, QueueError> {
        let (client, fresh) = self.client_entry(tenant)?;
        if fresh {
            info!(tenant = %tenant, queue = %client.queue(), "provisioning tenant queue");
            client.create_if_not_exists().await?;
        }
        Ok(client)
    }

    /// Enqueue a message on the tenant's queue
    pub async fn add_message(&self, tenant: &TenantId, content: &P) -> Result<(), QueueError> {
        self.client_for(tenant).await?.add_message(content).await
    }

    /// Dequeue up to `max_messages` from the tenant's queue
    pub async fn get_messages(
        &self,
        tenant: &TenantId,
        max_messages: u32,
    ) -> Result<Vec<CloudMessage<P>>, QueueError> {
        self.client_for(tenant).await?.get_messages(max_messages).await
    }

    /// Dequeue a single message from the tenant's queue
    pub async fn get_message(
        &self,
        tenant: &TenantId,
    ) -> Result<Option<CloudMessage<P>>, QueueError> {
        self.client_for(tenant).await?.get_message().await
    }

    /// Delete a previously dequeued message from the tenant's queue
    pub async fn delete_message(
        &self,
        tenant: &TenantId,
        message: &CloudMessage<P>,
    ) -> Result<(), QueueError> {
        self.client_for(tenant).await?.delete_message(message).await
    }

    /// Remove all messages from the tenant's queue
    pub async fn clear_tenant(&self, tenant: &TenantId) -> Result<(), QueueError> {
        self.client_for(tenant).await?.clear().await
    }

    /// Tear down the tenant's queue and spillover container
    ///
    /// Evicts the memoized client, so a later lookup re-provisions the
    /// tenant from scratch.
    pub async fn delete_tenant(&self, tenant: &TenantId) -> Result<(), QueueError> {
        let (client, _) = self.client_entry(tenant)?;
        client.delete_if_exists().await?;

        let mut clients = self.clients.write().unwrap_or_else(|p| p.into_inner());
        clients.remove(tenant);
        Ok(())
    }

    /// Build or fetch the memoized client entry
    ///
    /// Construction is pure wiring, so a write-locked double-checked
    /// insert is enough to keep the map single-flight. The `fresh` flag
    /// tells the caller whether backing resources still need creating.
    fn client_entry(
        &self,
        tenant: &TenantId,
    ) -> Result<(Arc<OverflowQueueClient<P>>, bool), QueueError> {
        {
            let clients = self.clients.read().unwrap_or_else(|p| p.into_inner());
            if let Some(client) = clients.get(tenant) {
                return Ok((Arc::clone(client), false));
            }
        }

        let mut clients = self.clients.write().unwrap_or_else(|p| p.into_inner());
        if let Some(client) = clients.get(tenant) {
            return Ok((Arc::clone(client), false));
        }

        let queue = self.queue_name(tenant)?;
        let container = self.container_name(tenant)?;
        let client = Arc::new(
            OverflowQueueClient::new(
                Arc::clone(&self.queue_service),
                Arc::clone(&self.object_store),
                queue,
                container,
            )
            .with_config(self.config.clone()),
        );
        clients.insert(tenant.clone(), Arc::clone(&client));
        Ok((client, true))
    }
}

#[cfg(test)]
#[path = "router_tests.rs"]
mod tests;
