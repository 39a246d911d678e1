//! Optimistic single-document mutations.
//!
//! Read, change the local copy, write back with the version that was read.
//! A conflicting write is dropped rather than retried: the caller decided the
//! update was cheap enough to lose.

use tracing::warn;

use crate::store::{Document, DocumentsExt, StoreError, Version, Versioned, VersionedStore};

/// What happened to a single write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteStatus {
    /// The CAS write landed at the given version.
    Applied(Version),
    /// An atomic field adjustment landed; the field now holds this value.
    Adjusted(i64),
    /// The document was deleted.
    Removed,
    /// The document changed after it was read; nothing was written.
    Dropped { expected: Version, actual: Version },
    /// Nothing needed writing.
    Skipped,
}

impl WriteStatus {
    pub fn is_dropped(&self) -> bool {
        matches!(self, WriteStatus::Dropped { .. })
    }
}

/// Best-effort read-modify-write over a [`VersionedStore`].
#[derive(Clone)]
pub struct OptimisticMutator<S> {
    store: S,
}

impl<S: VersionedStore> OptimisticMutator<S> {
    pub fn new(store: S) -> Self {
        OptimisticMutator { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Plain read; no lock is taken and nothing is retried.
    pub fn read<D: Document>(&self, id: &str) -> Result<Versioned<D>, StoreError> {
        self.store.documents::<D>().get(id)
    }

    /// CAS write of a document read earlier. Conflicts are logged and dropped.
    pub fn write<D: Document>(&self, doc: &Versioned<D>) -> Result<WriteStatus, StoreError> {
        match self.store.documents::<D>().replace(&doc.data, doc.version) {
            Ok(written) => Ok(WriteStatus::Applied(written.version)),
            Err(StoreError::VersionConflict {
                key,
                expected,
                actual,
            }) => {
                warn!(%key, %expected, %actual, "update dropped due to cas write conflict");
                Ok(WriteStatus::Dropped { expected, actual })
            }
            Err(err) => Err(err),
        }
    }

    /// CAS delete of a document read earlier. Conflicts are logged and dropped.
    pub fn remove_if_unchanged<D: Document>(
        &self,
        doc: &Versioned<D>,
    ) -> Result<WriteStatus, StoreError> {
        match self.store.documents::<D>().remove(doc.data.id(), doc.version) {
            Ok(()) => Ok(WriteStatus::Removed),
            Err(StoreError::VersionConflict {
                key,
                expected,
                actual,
            }) => {
                warn!(%key, %expected, %actual, "remove dropped due to cas write conflict");
                Ok(WriteStatus::Dropped { expected, actual })
            }
            Err(err) => Err(err),
        }
    }

    /// Atomic counter adjustment; never conflicts.
    pub fn adjust<D: Document>(
        &self,
        id: &str,
        field: &str,
        delta: i64,
    ) -> Result<WriteStatus, StoreError> {
        self.store
            .documents::<D>()
            .increment(id, field, delta)
            .map(WriteStatus::Adjusted)
    }

    /// Read one document, apply `change` to the local copy and write it back.
    ///
    /// Returns the write status and the copy that was (or would have been) written.
    pub fn mutate<D, F>(&self, id: &str, change: F) -> Result<(WriteStatus, D), StoreError>
    where
        D: Document,
        F: FnOnce(&mut D),
    {
        let mut doc = self.read::<D>(id)?;
        change(&mut doc.data);
        let status = self.write(&doc)?;
        Ok((status, doc.data))
    }
}
