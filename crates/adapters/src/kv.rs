// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Persistence: a single-key integer store used to remember the last
//! observed daemon pid across supervisor restarts, keyed by a
//! deployment-dependent string.

use std::collections::HashMap;
use std::path::PathBuf;

use async_trait::async_trait;
use parking_lot::Mutex;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("failed to read store {0}: {1}")]
    ReadFailed(PathBuf, #[source] std::io::Error),
    #[error("failed to write store {0}: {1}")]
    WriteFailed(PathBuf, #[source] std::io::Error),
    #[error("failed to decode store {0}: {1}")]
    DecodeFailed(PathBuf, #[source] serde_json::Error),
}

/// Single-key integer persistence: get/set `previous_cardano_pid` (or
/// whatever deployment-dependent key the caller chooses).
#[async_trait]
pub trait KvStore: Send + Sync + 'static {
    async fn get_int(&self, key: &str) -> Result<Option<i64>, PersistenceError>;
    async fn set_int(&self, key: &str, value: i64) -> Result<(), PersistenceError>;
}

/// JSON-file-backed `KvStore`. The whole table lives in one small file and
/// is rewritten atomically (write to a sibling temp file, then rename) so a
/// crash mid-write never corrupts the previous value.
pub struct FileKvStore {
    path: PathBuf,
    table: Mutex<HashMap<String, i64>>,
}

impl FileKvStore {
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, PersistenceError> {
        let path = path.into();
        let table = match tokio::fs::read(&path).await {
            Ok(bytes) => serde_json::from_slice(&bytes).map_err(|e| PersistenceError::DecodeFailed(path.clone(), e))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => HashMap::new(),
            Err(e) => return Err(PersistenceError::ReadFailed(path, e)),
        };
        Ok(Self { path, table: Mutex::new(table) })
    }

    async fn persist(&self, table: HashMap<String, i64>) -> Result<(), PersistenceError> {
        let bytes = serde_json::to_vec_pretty(&table)
            .map_err(|e| PersistenceError::DecodeFailed(self.path.clone(), e))?;
        let tmp_path = self.path.with_extension("tmp");
        tokio::fs::write(&tmp_path, &bytes).await.map_err(|e| PersistenceError::WriteFailed(tmp_path.clone(), e))?;
        tokio::fs::rename(&tmp_path, &self.path).await.map_err(|e| PersistenceError::WriteFailed(self.path.clone(), e))?;
        Ok(())
    }
}

#[async_trait]
impl KvStore for FileKvStore {
    async fn get_int(&self, key: &str) -> Result<Option<i64>, PersistenceError> {
        Ok(self.table.lock().get(key).copied())
    }

    async fn set_int(&self, key: &str, value: i64) -> Result<(), PersistenceError> {
        let snapshot = {
            let mut table = self.table.lock();
            table.insert(key.to_string(), value);
            table.clone()
        };
        self.persist(snapshot).await
    }
}

/// In-memory `KvStore` for supervisor tests.
#[cfg(any(test, feature = "test-support"))]
pub struct FakeKvStore {
    table: Mutex<HashMap<String, i64>>,
}

#[cfg(any(test, feature = "test-support"))]
impl Default for FakeKvStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(any(test, feature = "test-support"))]
impl FakeKvStore {
    pub fn new() -> Self {
        Self { table: Mutex::new(HashMap::new()) }
    }

    pub fn seed(&self, key: impl Into<String>, value: i64) {
        self.table.lock().insert(key.into(), value);
    }
}

#[cfg(any(test, feature = "test-support"))]
#[async_trait]
impl KvStore for FakeKvStore {
    async fn get_int(&self, key: &str) -> Result<Option<i64>, PersistenceError> {
        Ok(self.table.lock().get(key).copied())
    }

    async fn set_int(&self, key: &str, value: i64) -> Result<(), PersistenceError> {
        self.table.lock().insert(key.to_string(), value);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn file_store_round_trips_through_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sentinel-kv.json");

        let store = FileKvStore::open(&path).await.unwrap();
        assert_eq!(store.get_int("mainnet/previous_cardano_pid").await.unwrap(), None);
        store.set_int("mainnet/previous_cardano_pid", 4242).await.unwrap();

        let reopened = FileKvStore::open(&path).await.unwrap();
        assert_eq!(reopened.get_int("mainnet/previous_cardano_pid").await.unwrap(), Some(4242));
    }

    #[tokio::test]
    async fn file_store_missing_file_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("does-not-exist.json");
        let store = FileKvStore::open(&path).await.unwrap();
        assert_eq!(store.get_int("anything").await.unwrap(), None);
    }

    #[tokio::test]
    async fn fake_store_supports_seeding() {
        let store = FakeKvStore::new();
        store.seed("testnet/previous_cardano_pid", 99);
        assert_eq!(store.get_int("testnet/previous_cardano_pid").await.unwrap(), Some(99));
        store.set_int("testnet/previous_cardano_pid", 100).await.unwrap();
        assert_eq!(store.get_int("testnet/previous_cardano_pid").await.unwrap(), Some(100));
    }
}
