//! Tests for the per-kind write strategies.

use super::*;
use crate::providers::InMemoryObjectStore;
use crate::store::ObjectStore;

async fn setup() -> (Arc<InMemoryObjectStore>, BlobWriter, ContainerName) {
    let store = Arc::new(InMemoryObjectStore::new());
    let container = ContainerName::new("data".to_string()).unwrap();
    store
        .create_container_if_not_exists(&container)
        .await
        .unwrap();
    let writer = BlobWriter::new(store.clone());
    (store, writer, container)
}

fn blob(name: &str) -> BlobName {
    BlobName::new(name.to_string()).unwrap()
}

#[tokio::test]
async fn test_overwrite_upload_creates_missing_blob() {
    let (store, writer, container) = setup().await;
    let name = blob("report.json");

    writer
        .upload(
            &container,
            &name,
            BlobKind::Overwrite,
            Bytes::from("{}"),
            &UploadOptions::new(),
        )
        .await
        .unwrap();

    let properties = store.get_properties(&container, &name, None).await.unwrap();
    assert_eq!(properties.kind, BlobKind::Overwrite);
    // Content type falls back to the extension lookup
    assert_eq!(properties.content_type.as_deref(), Some("application/json"));
}

#[tokio::test]
async fn test_overwrite_upload_preserves_existing_properties() {
    let (store, writer, container) = setup().await;
    let name = blob("state");

    let mut metadata = HashMap::new();
    metadata.insert("owner".to_string(), "billing".to_string());
    writer
        .upload(
            &container,
            &name,
            BlobKind::Overwrite,
            Bytes::from("v1"),
            &UploadOptions::new()
                .with_content_type("text/plain".to_string())
                .with_metadata(metadata),
        )
        .await
        .unwrap();

    // Second upload overrides neither the content type nor the metadata
    writer
        .upload(
            &container,
            &name,
            BlobKind::Overwrite,
            Bytes::from("v2"),
            &UploadOptions::new(),
        )
        .await
        .unwrap();

    let properties = store.get_properties(&container, &name, None).await.unwrap();
    assert_eq!(properties.content_type.as_deref(), Some("text/plain"));
    assert_eq!(
        properties.metadata.get("owner"),
        Some(&"billing".to_string())
    );
    let content = store.download(&container, &name, None).await.unwrap();
    assert_eq!(content, Bytes::from("v2"));
}

#[tokio::test]
async fn test_overwrite_upload_explicit_content_type_wins() {
    let (store, writer, container) = setup().await;
    let name = blob("payload.json");

    writer
        .upload(
            &container,
            &name,
            BlobKind::Overwrite,
            Bytes::from("csv,data"),
            &UploadOptions::new().with_content_type("text/csv".to_string()),
        )
        .await
        .unwrap();

    let properties = store.get_properties(&container, &name, None).await.unwrap();
    assert_eq!(properties.content_type.as_deref(), Some("text/csv"));
}

#[tokio::test]
async fn test_page_upload_pads_to_page_boundary() {
    let (store, writer, container) = setup().await;
    let name = blob("pages");
    let input = Bytes::from("short content");

    writer
        .upload(
            &container,
            &name,
            BlobKind::PageAligned,
            input.clone(),
            &UploadOptions::new(),
        )
        .await
        .unwrap();

    let downloaded = store.download(&container, &name, None).await.unwrap();
    assert_eq!(downloaded.len(), 512);
    assert!(downloaded[input.len()..].iter().all(|&b| b == 0));
    assert_eq!(trim_page_padding(&downloaded), input);
}

#[tokio::test]
async fn test_page_upload_replaces_previous_pages() {
    let (store, writer, container) = setup().await;
    let name = blob("pages");

    writer
        .upload(
            &container,
            &name,
            BlobKind::PageAligned,
            Bytes::from(vec![7u8; 1024]),
            &UploadOptions::new(),
        )
        .await
        .unwrap();
    writer
        .upload(
            &container,
            &name,
            BlobKind::PageAligned,
            Bytes::from("replacement"),
            &UploadOptions::new(),
        )
        .await
        .unwrap();

    let downloaded = store.download(&container, &name, None).await.unwrap();
    assert_eq!(downloaded.len(), 512);
    assert_eq!(trim_page_padding(&downloaded), Bytes::from("replacement"));
}

#[tokio::test]
async fn test_page_upload_respects_capacity_reservation() {
    let (store, writer, container) = setup().await;
    let name = blob("pages");

    writer
        .upload(
            &container,
            &name,
            BlobKind::PageAligned,
            Bytes::from("x"),
            &UploadOptions::new().with_page_capacity(1024),
        )
        .await
        .unwrap();

    // Rewriting beyond the reserved capacity fails in the store
    let result = writer
        .upload(
            &container,
            &name,
            BlobKind::PageAligned,
            Bytes::from(vec![1u8; 2048]),
            &UploadOptions::new(),
        )
        .await;
    assert!(matches!(result, Err(StorageError::CapacityExceeded { .. })));
    let _ = store;
}

#[tokio::test]
async fn test_append_only_upload_recreates_blob() {
    let (store, writer, container) = setup().await;
    let name = blob("log");

    writer
        .upload(
            &container,
            &name,
            BlobKind::AppendOnly,
            Bytes::from("first"),
            &UploadOptions::new(),
        )
        .await
        .unwrap();
    writer
        .upload(
            &container,
            &name,
            BlobKind::AppendOnly,
            Bytes::from("second"),
            &UploadOptions::new(),
        )
        .await
        .unwrap();

    // Replace semantics: prior content is gone, not appended to
    let content = store.download(&container, &name, None).await.unwrap();
    assert_eq!(content, Bytes::from("second"));
}

#[tokio::test]
async fn test_append_only_append_creates_then_extends() {
    let (store, writer, container) = setup().await;
    let name = blob("log");

    writer
        .append(
            &container,
            &name,
            BlobKind::AppendOnly,
            Bytes::from("one,"),
            &UploadOptions::new(),
        )
        .await
        .unwrap();
    writer
        .append(
            &container,
            &name,
            BlobKind::AppendOnly,
            Bytes::from("two"),
            &UploadOptions::new(),
        )
        .await
        .unwrap();

    let content = store.download(&container, &name, None).await.unwrap();
    assert_eq!(content, Bytes::from("one,two"));
}

#[tokio::test]
async fn test_overwrite_append_is_download_concat_reupload() {
    let (store, writer, container) = setup().await;
    let name = blob("notes.txt");

    writer
        .append(
            &container,
            &name,
            BlobKind::Overwrite,
            Bytes::from("hello "),
            &UploadOptions::new(),
        )
        .await
        .unwrap();
    writer
        .append(
            &container,
            &name,
            BlobKind::Overwrite,
            Bytes::from("world"),
            &UploadOptions::new(),
        )
        .await
        .unwrap();

    let content = store.download(&container, &name, None).await.unwrap();
    assert_eq!(content, Bytes::from("hello world"));
}

#[tokio::test]
async fn test_upload_under_lease_requires_token() {
    let (store, writer, container) = setup().await;
    let name = blob("guarded");

    writer
        .upload(
            &container,
            &name,
            BlobKind::Overwrite,
            Bytes::from("v1"),
            &UploadOptions::new(),
        )
        .await
        .unwrap();

    let token = store
        .acquire_lease(&container, &name, chrono::Duration::seconds(60))
        .await
        .unwrap();

    // Without the token the write is rejected by the store
    let denied = writer
        .upload(
            &container,
            &name,
            BlobKind::Overwrite,
            Bytes::from("v2"),
            &UploadOptions::new(),
        )
        .await;
    assert!(matches!(denied, Err(StorageError::LeaseRequired { .. })));

    // With the token it goes through
    writer
        .upload(
            &container,
            &name,
            BlobKind::Overwrite,
            Bytes::from("v2"),
            &UploadOptions::new().with_lease(token),
        )
        .await
        .unwrap();

    let content = store.download(&container, &name, None).await.unwrap();
    assert_eq!(content, Bytes::from("v2"));
}

#[tokio::test]
async fn test_kind_mismatch_is_fatal() {
    let (store, writer, container) = setup().await;
    let name = blob("log");

    writer
        .upload(
            &container,
            &name,
            BlobKind::AppendOnly,
            Bytes::from("entry"),
            &UploadOptions::new(),
        )
        .await
        .unwrap();

    let result = writer
        .upload(
            &container,
            &name,
            BlobKind::Overwrite,
            Bytes::from("other"),
            &UploadOptions::new(),
        )
        .await;

    assert!(matches!(result, Err(StorageError::BlobKindMismatch { .. })));
    let _ = store;
}

#[test]
fn test_trim_page_padding_edge_cases() {
    assert_eq!(trim_page_padding(&Bytes::new()), Bytes::new());
    assert_eq!(
        trim_page_padding(&Bytes::from(vec![0u8; 512])),
        Bytes::new()
    );

    let mut padded = vec![1u8, 2, 0, 3];
    padded.resize(512, 0);
    assert_eq!(
        trim_page_padding(&Bytes::from(padded)),
        Bytes::from(vec![1u8, 2, 0, 3])
    );
}
