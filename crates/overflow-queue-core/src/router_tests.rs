//! Tests for the tenant queue router.

use super::*;
use crate::providers::InMemoryQueueService;
use serde::{Deserialize, Serialize};
use storage_runtime::InMemoryObjectStore;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct WorkItem {
    task: String,
}

impl QueuePayload for WorkItem {
    const TYPE_TAG: &'static str = "work.item";
}

fn router() -> TenantQueueRouter<WorkItem> {
    TenantQueueRouter::new(
        Arc::new(InMemoryQueueService::new()),
        Arc::new(InMemoryObjectStore::new()),
        "orders",
    )
}

fn tenant(id: &str) -> TenantId {
    TenantId::new(id.to_string()).unwrap()
}

#[test]
fn derived_names_follow_the_prefix() {
    let router = router();
    let acme = tenant("acme");

    assert_eq!(router.queue_name(&acme).unwrap().as_str(), "orders-acme");
    assert_eq!(
        router.container_name(&acme).unwrap().as_str(),
        "orders-overflow-acme"
    );
}

#[test]
fn oversized_derived_name_is_rejected() {
    let router = TenantQueueRouter::<WorkItem>::new(
        Arc::new(InMemoryQueueService::new()),
        Arc::new(InMemoryObjectStore::new()),
        "orders-from-the-emea-billing-platform",
    );
    // Valid tenant id, but the combined queue name exceeds 63 characters
    let long = tenant(&"t".repeat(40));

    assert!(router.queue_name(&long).is_err());
}

#[tokio::test]
async fn clients_are_memoized_per_tenant() {
    let router = router();
    let acme = tenant("acme");
    let globex = tenant("globex");

    let first = router.client_for(&acme).await.unwrap();
    let second = router.client_for(&acme).await.unwrap();
    let other = router.client_for(&globex).await.unwrap();

    assert!(Arc::ptr_eq(&first, &second));
    assert!(!Arc::ptr_eq(&first, &other));
}

#[tokio::test]
async fn first_lookup_provisions_resources() {
    let router = router();
    let acme = tenant("acme");

    let client = router.client_for(&acme).await.unwrap();
    assert!(client.exists().await.unwrap());
}

#[tokio::test]
async fn tenants_are_isolated() {
    let router = router();
    let acme = tenant("acme");
    let globex = tenant("globex");

    router
        .add_message(
            &acme,
            &WorkItem {
                task: "ship".to_string(),
            },
        )
        .await
        .unwrap();

    assert!(router.get_messages(&globex, 32).await.unwrap().is_empty());

    let messages = router.get_messages(&acme, 32).await.unwrap();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].content().task, "ship");

    router.delete_message(&acme, &messages[0]).await.unwrap();
    let client = router.client_for(&acme).await.unwrap();
    assert_eq!(client.approximate_message_count().await.unwrap(), 0);
}

#[tokio::test]
async fn clear_tenant_empties_only_that_queue() {
    let router = router();
    let acme = tenant("acme");
    let globex = tenant("globex");
    let item = WorkItem {
        task: "ship".to_string(),
    };

    router.add_message(&acme, &item).await.unwrap();
    router.add_message(&globex, &item).await.unwrap();

    router.clear_tenant(&acme).await.unwrap();

    assert!(router.get_message(&acme).await.unwrap().is_none());
    assert!(router.get_message(&globex).await.unwrap().is_some());
}

#[tokio::test]
async fn delete_tenant_tears_down_and_evicts() {
    let router = router();
    let acme = tenant("acme");

    let before = router.client_for(&acme).await.unwrap();
    router.delete_tenant(&acme).await.unwrap();
    assert!(!before.exists().await.unwrap());

    // Next lookup builds a fresh client and re-provisions the queue
    let after = router.client_for(&acme).await.unwrap();
    assert!(!Arc::ptr_eq(&before, &after));
    assert!(after.exists().await.unwrap());
}
