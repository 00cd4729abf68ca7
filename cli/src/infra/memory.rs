//! In-memory backends for the KV and object store ports.
//!
//! Clones share state, so a test can hand one clone to a service and keep
//! another for assertions. Failures can be injected per key prefix.

use std::collections::BTreeMap;
use std::io::{Cursor, Read};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use daybook_common::{DaybookError, Result};

use crate::application::ports::{KvEntry, KvStore, ObjectReader, ObjectStore};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn check_failure(fail_prefixes: &Mutex<Vec<String>>, operation: &str, key: &str) -> Result<()> {
    if lock(fail_prefixes).iter().any(|p| key.starts_with(p.as_str())) {
        return Err(DaybookError::transport(
            format!("{operation} {key}"),
            format!("injected failure for {key}"),
        ));
    }
    Ok(())
}

// ── KV ────────────────────────────────────────────────────────────────────────

/// In-memory `KvStore` with a global revision counter.
#[derive(Debug, Clone, Default)]
pub struct MemoryKv {
    entries: Arc<Mutex<BTreeMap<String, (Vec<u8>, u64)>>>,
    next_revision: Arc<Mutex<u64>>,
    fail_prefixes: Arc<Mutex<Vec<String>>>,
}

impl MemoryKv {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every operation on keys under `prefix` fail with `Transport`.
    pub fn inject_failure(&self, prefix: impl Into<String>) {
        lock(&self.fail_prefixes).push(prefix.into());
    }

    /// Raw stored value, for assertions.
    #[must_use]
    pub fn raw(&self, key: &str) -> Option<Vec<u8>> {
        lock(&self.entries).get(key).map(|(value, _)| value.clone())
    }

    fn bump_revision(&self) -> u64 {
        let mut next = lock(&self.next_revision);
        *next += 1;
        *next
    }
}

impl KvStore for MemoryKv {
    fn list(&self, prefix: &str) -> Result<Vec<KvEntry>> {
        check_failure(&self.fail_prefixes, "listing", prefix)?;
        Ok(lock(&self.entries)
            .range(prefix.to_string()..)
            .take_while(|(key, _)| key.starts_with(prefix))
            .map(|(key, (value, revision))| KvEntry {
                key: key.clone(),
                value: value.clone(),
                revision: *revision,
            })
            .collect())
    }

    fn get(&self, key: &str) -> Result<Option<KvEntry>> {
        check_failure(&self.fail_prefixes, "reading", key)?;
        Ok(lock(&self.entries).get(key).map(|(value, revision)| KvEntry {
            key: key.to_string(),
            value: value.clone(),
            revision: *revision,
        }))
    }

    fn put(&self, key: &str, value: &[u8]) -> Result<()> {
        check_failure(&self.fail_prefixes, "writing", key)?;
        let revision = self.bump_revision();
        lock(&self.entries).insert(key.to_string(), (value.to_vec(), revision));
        Ok(())
    }

    fn put_if_revision(&self, key: &str, value: &[u8], expected: Option<u64>) -> Result<bool> {
        check_failure(&self.fail_prefixes, "writing", key)?;
        let mut entries = lock(&self.entries);
        let current = entries.get(key).map(|(_, revision)| *revision);
        if current != expected {
            return Ok(false);
        }
        let revision = self.bump_revision();
        entries.insert(key.to_string(), (value.to_vec(), revision));
        Ok(true)
    }
}

// ── Objects ───────────────────────────────────────────────────────────────────

/// Object as recorded by `MemoryObjectStore`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub data: Vec<u8>,
    pub content_type: String,
}

/// In-memory `ObjectStore`, listing keys in lexicographic order as S3 does.
#[derive(Debug, Clone, Default)]
pub struct MemoryObjectStore {
    objects: Arc<Mutex<BTreeMap<String, StoredObject>>>,
    fail_prefixes: Arc<Mutex<Vec<String>>>,
}

impl MemoryObjectStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an object directly.
    pub fn insert(&self, key: impl Into<String>, data: impl Into<Vec<u8>>, content_type: &str) {
        lock(&self.objects).insert(
            key.into(),
            StoredObject {
                data: data.into(),
                content_type: content_type.to_string(),
            },
        );
    }

    #[must_use]
    pub fn object(&self, key: &str) -> Option<StoredObject> {
        lock(&self.objects).get(key).cloned()
    }

    /// Make every operation on keys under `prefix` fail with `Transport`.
    pub fn inject_failure(&self, prefix: impl Into<String>) {
        lock(&self.fail_prefixes).push(prefix.into());
    }
}

impl ObjectStore for MemoryObjectStore {
    fn list(&self, prefix: &str) -> Result<Vec<String>> {
        check_failure(&self.fail_prefixes, "listing", prefix)?;
        Ok(lock(&self.objects)
            .keys()
            .filter(|key| key.starts_with(prefix))
            .cloned()
            .collect())
    }

    fn get_reader(&self, key: &str) -> Result<ObjectReader> {
        check_failure(&self.fail_prefixes, "fetching", key)?;
        match lock(&self.objects).get(key) {
            Some(object) => Ok(Box::new(Cursor::new(object.data.clone()))),
            None => Err(DaybookError::not_found(format!("object {key}"))),
        }
    }

    fn put_reader(
        &self,
        key: &str,
        mut reader: ObjectReader,
        size: u64,
        content_type: &str,
    ) -> Result<()> {
        check_failure(&self.fail_prefixes, "uploading", key)?;
        let mut data = Vec::new();
        reader
            .read_to_end(&mut data)
            .map_err(|e| DaybookError::transport(format!("uploading {key}"), e))?;
        if data.len() as u64 != size {
            return Err(DaybookError::transport(
                format!("uploading {key}"),
                format!("declared {size} bytes but read {}", data.len()),
            ));
        }
        lock(&self.objects).insert(
            key.to_string(),
            StoredObject {
                data,
                content_type: content_type.to_string(),
            },
        );
        Ok(())
    }
}
