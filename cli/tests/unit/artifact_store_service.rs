//! Tests for the `ArtifactStore` service: version listing, format probing
//! and uploads.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::io::{Cursor, Read as _};

use daybook_cli::application::ports::{ObjectReader, ObjectStore};
use daybook_cli::application::services::ArtifactStore;
use daybook_cli::infra::memory::MemoryObjectStore;
use daybook_common::{ArtifactFormats, Compression, DaybookError, Service};
use mockall::mock;
use tempfile::TempDir;

mock! {
    pub Objects {}

    impl ObjectStore for Objects {
        fn list(&self, prefix: &str) -> daybook_common::Result<Vec<String>>;
        fn get_reader(&self, key: &str) -> daybook_common::Result<ObjectReader>;
        fn put_reader(
            &self,
            key: &str,
            reader: ObjectReader,
            size: u64,
            content_type: &str,
        ) -> daybook_common::Result<()>;
    }
}

fn store() -> (MemoryObjectStore, ArtifactStore<MemoryObjectStore>) {
    let objects = MemoryObjectStore::new();
    (
        objects.clone(),
        ArtifactStore::new(objects, ArtifactFormats::default()),
    )
}

fn read_all(reader: ObjectReader) -> Vec<u8> {
    let mut reader = reader;
    let mut data = Vec::new();
    reader.read_to_end(&mut data).unwrap();
    data
}

// ── list_versions ────────────────────────────────────────────────────────────

#[test]
fn test_versions_are_parsed_from_keys() {
    let (objects, store) = store();
    objects.insert("payments-3.tar.gz", b"x".to_vec(), "application/x-gtar");
    objects.insert("payments-4.tar", b"x".to_vec(), "application/x-tar");
    objects.insert("payments-notes.txt", b"x".to_vec(), "text/plain");
    objects.insert("paymentsv2-1.tar", b"x".to_vec(), "application/x-tar");

    let versions = store.list_versions("payments").unwrap();
    assert_eq!(
        versions,
        vec![
            Service::versioned("payments", "3"),
            Service::versioned("payments", "4"),
        ]
    );
}

#[test]
fn test_version_stored_under_two_formats_is_listed_once() {
    let (objects, store) = store();
    objects.insert("api-1.tar", b"plain".to_vec(), "application/x-tar");
    objects.insert("api-1.tar.gz", b"gz".to_vec(), "application/x-gtar");
    assert_eq!(
        store.list_versions("api").unwrap(),
        vec![Service::versioned("api", "1")]
    );
}

#[test]
fn test_no_objects_means_no_versions() {
    let (_, store) = store();
    assert!(store.list_versions("api").unwrap().is_empty());
}

// ── fetch ────────────────────────────────────────────────────────────────────

#[test]
fn test_fetch_present_and_absent_versions() {
    let (objects, store) = store();
    objects.insert("payments-3.tar.gz", b"release-3".to_vec(), "application/x-gtar");

    let stream = store.fetch(&Service::versioned("payments", "3")).unwrap();
    assert_eq!(stream.key(), "payments-3.tar.gz");
    assert_eq!(stream.format().compression, Compression::Gzip);
    assert_eq!(read_all(stream.into_reader()), b"release-3");

    let err = store
        .fetch(&Service::versioned("payments", "4"))
        .unwrap_err();
    assert!(err.is_not_found());
}

#[test]
fn test_fetch_prefers_gzip_over_plain_tar() {
    let (objects, store) = store();
    objects.insert("api-1.tar", b"plain".to_vec(), "application/x-tar");
    objects.insert("api-1.tar.gz", b"gz".to_vec(), "application/x-gtar");
    let stream = store.fetch(&Service::versioned("api", "1")).unwrap();
    assert_eq!(stream.key(), "api-1.tar.gz");
}

#[test]
fn test_fetch_unversioned_service_is_invalid() {
    let (_, store) = store();
    let err = store.fetch(&Service::new("api")).unwrap_err();
    assert!(matches!(err, DaybookError::InvalidService(_)));
}

#[test]
fn test_fetch_falls_through_not_found_to_next_format() {
    let mut objects = MockObjects::new();
    objects
        .expect_get_reader()
        .withf(|key| key == "api-2.tar.gz")
        .times(1)
        .returning(|key| Err(DaybookError::not_found(format!("object {key}"))));
    objects
        .expect_get_reader()
        .withf(|key| key == "api-2.tar")
        .times(1)
        .returning(|_| Ok(Box::new(Cursor::new(b"tar".to_vec())) as ObjectReader));

    let store = ArtifactStore::new(objects, ArtifactFormats::default());
    let stream = store.fetch(&Service::versioned("api", "2")).unwrap();
    assert_eq!(stream.key(), "api-2.tar");
    assert_eq!(stream.format().compression, Compression::None);
}

#[test]
fn test_fetch_transport_error_stops_probing() {
    let mut objects = MockObjects::new();
    objects
        .expect_get_reader()
        .times(1)
        .returning(|key| Err(DaybookError::transport(format!("fetching {key}"), "connection reset")));

    let store = ArtifactStore::new(objects, ArtifactFormats::default());
    let err = store.fetch(&Service::versioned("api", "2")).unwrap_err();
    assert!(matches!(err, DaybookError::Transport { .. }));
}

// ── store ────────────────────────────────────────────────────────────────────

#[test]
fn test_store_uploads_private_object_under_versioned_key() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("build.tar.gz");
    std::fs::write(&path, b"archive-bytes").unwrap();
    let (objects, store) = store();

    let key = store
        .store(&Service::versioned("api", "1.2.0"), &path)
        .unwrap();

    assert_eq!(key, "api-1.2.0.tar.gz");
    let stored = objects.object(&key).unwrap();
    assert_eq!(stored.data, b"archive-bytes");
    assert_eq!(stored.content_type, "application/x-gtar");
}

#[test]
fn test_stored_artifact_fetches_byte_identical() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("release.tar");
    let bytes: Vec<u8> = (0..=255u8).cycle().take(70_000).collect();
    std::fs::write(&path, &bytes).unwrap();
    let (_, store) = store();

    let service = Service::versioned("worker", "7");
    store.store(&service, &path).unwrap();
    let stream = store.fetch(&service).unwrap();
    assert_eq!(stream.key(), "worker-7.tar");
    assert_eq!(read_all(stream.into_reader()), bytes);
}

#[test]
fn test_store_rejects_unrecognized_suffix_before_reading() {
    let (objects, store) = store();
    let err = store
        .store(
            &Service::versioned("api", "1"),
            std::path::Path::new("/nonexistent/build.zip"),
        )
        .unwrap_err();
    assert!(matches!(err, DaybookError::UnsupportedFormat(_)));
    assert!(objects.list("").unwrap().is_empty());
}

#[test]
fn test_store_requires_version() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("build.tar");
    std::fs::write(&path, b"x").unwrap();
    let (_, store) = store();
    let err = store.store(&Service::new("api"), &path).unwrap_err();
    assert!(matches!(err, DaybookError::InvalidService(_)));
}

#[test]
fn test_store_missing_file_is_io_error() {
    let dir = TempDir::new().unwrap();
    let (_, store) = store();
    let err = store
        .store(
            &Service::versioned("api", "1"),
            &dir.path().join("missing.tar.gz"),
        )
        .unwrap_err();
    assert!(matches!(err, DaybookError::Io { .. }));
}

#[test]
fn test_store_upload_failure_is_transport() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("build.tar");
    std::fs::write(&path, b"x").unwrap();
    let (objects, store) = store();
    objects.inject_failure("api-");
    let err = store
        .store(&Service::versioned("api", "1"), &path)
        .unwrap_err();
    assert!(matches!(err, DaybookError::Transport { .. }));
}
