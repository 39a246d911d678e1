//! VersionedStore - the per-key CAS primitive everything else builds on.

use std::sync::Arc;

use super::{StoreError, Version};

/// Raw document bytes plus the version they were read at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawDocument {
    pub bytes: Vec<u8>,
    pub version: Version,
}

/// Linearizable per-key storage with version-checked writes.
///
/// Implementations must make each call atomic with respect to its key. No
/// guarantee is made across keys; multi-key atomicity is layered on top by
/// the transaction coordinator.
pub trait VersionedStore: Send + Sync {
    /// Read a document. Fails with `NotFound` when absent.
    fn get(&self, key: &str) -> Result<RawDocument, StoreError>;

    /// Create a document. Fails with `AlreadyExists` when present.
    fn insert(&self, key: &str, bytes: Vec<u8>) -> Result<Version, StoreError>;

    /// Insert or overwrite without a version check. Used by seeding only.
    fn upsert(&self, key: &str, bytes: Vec<u8>) -> Result<Version, StoreError>;

    /// Overwrite a document if it is still at `expected`.
    fn replace(&self, key: &str, bytes: Vec<u8>, expected: Version)
        -> Result<Version, StoreError>;

    /// Delete a document if it is still at `expected`.
    fn remove(&self, key: &str, expected: Version) -> Result<(), StoreError>;

    /// Atomically add `delta` to an integer field and return the new value.
    ///
    /// Negative deltas saturate at zero.
    fn increment_field(&self, key: &str, field: &str, delta: i64) -> Result<i64, StoreError>;

    /// All keys starting with `prefix`, in no particular order.
    fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>, StoreError>;

    /// Connectivity check.
    fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

impl<S: VersionedStore + ?Sized> VersionedStore for Arc<S> {
    fn get(&self, key: &str) -> Result<RawDocument, StoreError> {
        (**self).get(key)
    }

    fn insert(&self, key: &str, bytes: Vec<u8>) -> Result<Version, StoreError> {
        (**self).insert(key, bytes)
    }

    fn upsert(&self, key: &str, bytes: Vec<u8>) -> Result<Version, StoreError> {
        (**self).upsert(key, bytes)
    }

    fn replace(
        &self,
        key: &str,
        bytes: Vec<u8>,
        expected: Version,
    ) -> Result<Version, StoreError> {
        (**self).replace(key, bytes, expected)
    }

    fn remove(&self, key: &str, expected: Version) -> Result<(), StoreError> {
        (**self).remove(key, expected)
    }

    fn increment_field(&self, key: &str, field: &str, delta: i64) -> Result<i64, StoreError> {
        (**self).increment_field(key, field, delta)
    }

    fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>, StoreError> {
        (**self).keys_with_prefix(prefix)
    }

    fn ping(&self) -> Result<(), StoreError> {
        (**self).ping()
    }
}

impl<S: VersionedStore + ?Sized> VersionedStore for &S {
    fn get(&self, key: &str) -> Result<RawDocument, StoreError> {
        (**self).get(key)
    }

    fn insert(&self, key: &str, bytes: Vec<u8>) -> Result<Version, StoreError> {
        (**self).insert(key, bytes)
    }

    fn upsert(&self, key: &str, bytes: Vec<u8>) -> Result<Version, StoreError> {
        (**self).upsert(key, bytes)
    }

    fn replace(
        &self,
        key: &str,
        bytes: Vec<u8>,
        expected: Version,
    ) -> Result<Version, StoreError> {
        (**self).replace(key, bytes, expected)
    }

    fn remove(&self, key: &str, expected: Version) -> Result<(), StoreError> {
        (**self).remove(key, expected)
    }

    fn increment_field(&self, key: &str, field: &str, delta: i64) -> Result<i64, StoreError> {
        (**self).increment_field(key, field, delta)
    }

    fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>, StoreError> {
        (**self).keys_with_prefix(prefix)
    }

    fn ping(&self) -> Result<(), StoreError> {
        (**self).ping()
    }
}
