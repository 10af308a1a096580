//! In-memory storage backend for testing.
//!
//! Stores all data in a `BTreeMap` behind a `RwLock`. Nothing is persisted.
//! Keys go through the same [`validate_key`] rules as the filesystem backend
//! so tests observe identical naming behaviour.

use std::collections::BTreeMap;
use std::collections::btree_map::Entry;
use std::sync::Arc;

use tokio::sync::RwLock;

use crate::{StorageBackend, StorageError, validate_key};

/// An in-memory storage backend backed by a `BTreeMap`.
///
/// Cloning shares the underlying map. Keys come back from
/// [`list`](StorageBackend::list) already sorted.
///
/// # Examples
///
/// ```
/// # use flatcms_storage::{MemoryBackend, StorageBackend};
/// # #[tokio::main]
/// # async fn main() {
/// let backend = MemoryBackend::new();
/// backend.put("about.md", b"# About").await.unwrap();
/// let val = backend.get("about.md").await.unwrap();
/// assert_eq!(val, Some(b"# About".to_vec()));
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    data: Arc<RwLock<BTreeMap<String, Vec<u8>>>>,
}

impl MemoryBackend {
    /// Create a new empty in-memory backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl StorageBackend for MemoryBackend {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        validate_key(key)?;
        let data = self.data.read().await;
        Ok(data.get(key).cloned())
    }

    async fn put(&self, key: &str, value: &[u8]) -> Result<(), StorageError> {
        validate_key(key)?;
        let mut data = self.data.write().await;
        data.insert(key.to_owned(), value.to_vec());
        Ok(())
    }

    async fn create(&self, key: &str) -> Result<(), StorageError> {
        validate_key(key)?;
        let mut data = self.data.write().await;
        match data.entry(key.to_owned()) {
            Entry::Occupied(_) => Err(StorageError::AlreadyExists {
                key: key.to_owned(),
            }),
            Entry::Vacant(slot) => {
                slot.insert(Vec::new());
                Ok(())
            }
        }
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        validate_key(key)?;
        let mut data = self.data.write().await;
        data.remove(key).map(|_| ()).ok_or_else(|| StorageError::NotFound {
            key: key.to_owned(),
        })
    }

    async fn list(&self) -> Result<Vec<String>, StorageError> {
        let data = self.data.read().await;
        Ok(data.keys().cloned().collect())
    }

    async fn exists(&self, key: &str) -> Result<bool, StorageError> {
        validate_key(key)?;
        let data = self.data.read().await;
        Ok(data.contains_key(key))
    }
}
