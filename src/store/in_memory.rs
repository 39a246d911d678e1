//! InMemoryStore - HashMap-backed versioned store for tests, the simulator and embedding.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use super::{RawDocument, StoreError, Version, VersionedStore};

/// Internal stored representation of a document.
struct StoredDocument {
    bytes: Vec<u8>,
    version: Version,
}

/// In-memory versioned store backed by a HashMap.
///
/// Versions come from one store-wide sequence, so a key that is removed and
/// inserted again never hands out a token it used before. Clone-friendly via Arc.
#[derive(Clone)]
pub struct InMemoryStore {
    storage: Arc<RwLock<HashMap<String, StoredDocument>>>,
    sequence: Arc<AtomicU64>,
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self {
            storage: Arc::new(RwLock::new(HashMap::new())),
            sequence: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Number of documents currently stored.
    pub fn len(&self) -> usize {
        self.storage.read().map(|s| s.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every document (the equivalent of flushing a bucket).
    pub fn clear(&self) -> Result<(), StoreError> {
        let mut storage = self
            .storage
            .write()
            .map_err(|_| StoreError::Storage("lock poisoned".into()))?;
        storage.clear();
        Ok(())
    }

    fn next_version(&self) -> Version {
        Version::new(self.sequence.fetch_add(1, Ordering::SeqCst) + 1)
    }
}

impl VersionedStore for InMemoryStore {
    fn get(&self, key: &str) -> Result<RawDocument, StoreError> {
        let storage = self
            .storage
            .read()
            .map_err(|_| StoreError::Storage("lock poisoned".into()))?;

        storage
            .get(key)
            .map(|stored| RawDocument {
                bytes: stored.bytes.clone(),
                version: stored.version,
            })
            .ok_or_else(|| StoreError::NotFound {
                key: key.to_string(),
            })
    }

    fn insert(&self, key: &str, bytes: Vec<u8>) -> Result<Version, StoreError> {
        let mut storage = self
            .storage
            .write()
            .map_err(|_| StoreError::Storage("lock poisoned".into()))?;

        if storage.contains_key(key) {
            return Err(StoreError::AlreadyExists {
                key: key.to_string(),
            });
        }

        let version = self.next_version();
        storage.insert(key.to_string(), StoredDocument { bytes, version });
        Ok(version)
    }

    fn upsert(&self, key: &str, bytes: Vec<u8>) -> Result<Version, StoreError> {
        let mut storage = self
            .storage
            .write()
            .map_err(|_| StoreError::Storage("lock poisoned".into()))?;

        let version = self.next_version();
        storage.insert(key.to_string(), StoredDocument { bytes, version });
        Ok(version)
    }

    fn replace(
        &self,
        key: &str,
        bytes: Vec<u8>,
        expected: Version,
    ) -> Result<Version, StoreError> {
        let mut storage = self
            .storage
            .write()
            .map_err(|_| StoreError::Storage("lock poisoned".into()))?;

        let stored = storage.get_mut(key).ok_or_else(|| StoreError::NotFound {
            key: key.to_string(),
        })?;

        if stored.version != expected {
            return Err(StoreError::VersionConflict {
                key: key.to_string(),
                expected,
                actual: stored.version,
            });
        }

        let version = self.next_version();
        stored.bytes = bytes;
        stored.version = version;
        Ok(version)
    }

    fn remove(&self, key: &str, expected: Version) -> Result<(), StoreError> {
        let mut storage = self
            .storage
            .write()
            .map_err(|_| StoreError::Storage("lock poisoned".into()))?;

        let actual = storage
            .get(key)
            .map(|s| s.version)
            .ok_or_else(|| StoreError::NotFound {
                key: key.to_string(),
            })?;

        if actual != expected {
            return Err(StoreError::VersionConflict {
                key: key.to_string(),
                expected,
                actual,
            });
        }

        storage.remove(key);
        Ok(())
    }

    fn increment_field(&self, key: &str, field: &str, delta: i64) -> Result<i64, StoreError> {
        let mut storage = self
            .storage
            .write()
            .map_err(|_| StoreError::Storage("lock poisoned".into()))?;

        let stored = storage.get_mut(key).ok_or_else(|| StoreError::NotFound {
            key: key.to_string(),
        })?;

        let not_a_number = || StoreError::NotANumber {
            key: key.to_string(),
            field: field.to_string(),
        };

        let mut value: serde_json::Value =
            serde_json::from_slice(&stored.bytes).map_err(|e| StoreError::Serde {
                key: key.to_string(),
                message: e.to_string(),
            })?;
        let object = value.as_object_mut().ok_or_else(not_a_number)?;
        let current = object
            .get(field)
            .and_then(|v| v.as_i64())
            .ok_or_else(not_a_number)?;

        let mut next = current.saturating_add(delta);
        if delta < 0 && next < 0 {
            next = 0;
        }
        object.insert(field.to_string(), serde_json::Value::from(next));

        stored.bytes = serde_json::to_vec(&value).map_err(|e| StoreError::Serde {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        stored.version = self.next_version();
        Ok(next)
    }

    fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>, StoreError> {
        let storage = self
            .storage
            .read()
            .map_err(|_| StoreError::Storage("lock poisoned".into()))?;

        Ok(storage
            .keys()
            .filter(|key| key.starts_with(prefix))
            .cloned()
            .collect())
    }
}
