//! DocumentRepository - Typed accessor over a raw VersionedStore.

use std::marker::PhantomData;

use super::{decode, document_key, encode, Document, StoreError, Version, Versioned, VersionedStore};

/// Typed repository wrapper for documents of a specific type.
pub struct DocumentRepository<'a, S: ?Sized, D> {
    store: &'a S,
    _marker: PhantomData<D>,
}

impl<'a, S: VersionedStore + ?Sized, D: Document> DocumentRepository<'a, S, D> {
    pub fn new(store: &'a S) -> Self {
        Self {
            store,
            _marker: PhantomData,
        }
    }

    /// Get a document by id. Fails with `NotFound` when absent.
    pub fn get(&self, id: &str) -> Result<Versioned<D>, StoreError> {
        let key = document_key::<D>(id);
        let raw = self.store.get(&key)?;
        Ok(Versioned {
            data: decode(&key, &raw.bytes)?,
            version: raw.version,
        })
    }

    /// Like `get`, but a missing document is `None`.
    pub fn find(&self, id: &str) -> Result<Option<Versioned<D>>, StoreError> {
        match self.get(id) {
            Ok(doc) => Ok(Some(doc)),
            Err(StoreError::NotFound { .. }) => Ok(None),
            Err(err) => Err(err),
        }
    }

    /// Insert a new document. Fails if it already exists.
    pub fn insert(&self, doc: &D) -> Result<Versioned<D>, StoreError> {
        let key = doc.key();
        let version = self.store.insert(&key, encode(&key, doc)?)?;
        Ok(Versioned {
            data: doc.clone(),
            version,
        })
    }

    /// Insert or overwrite, no version check.
    pub fn upsert(&self, doc: &D) -> Result<Versioned<D>, StoreError> {
        let key = doc.key();
        let version = self.store.upsert(&key, encode(&key, doc)?)?;
        Ok(Versioned {
            data: doc.clone(),
            version,
        })
    }

    /// Replace an existing document if it is still at `expected`.
    pub fn replace(&self, doc: &D, expected: Version) -> Result<Versioned<D>, StoreError> {
        let key = doc.key();
        let version = self.store.replace(&key, encode(&key, doc)?, expected)?;
        Ok(Versioned {
            data: doc.clone(),
            version,
        })
    }

    /// Remove a document if it is still at `expected`.
    pub fn remove(&self, id: &str, expected: Version) -> Result<(), StoreError> {
        self.store.remove(&document_key::<D>(id), expected)
    }

    /// Atomically adjust an integer field without reading the document.
    pub fn increment(&self, id: &str, field: &str, delta: i64) -> Result<i64, StoreError> {
        self.store
            .increment_field(&document_key::<D>(id), field, delta)
    }

    /// Ids of every document in this collection.
    pub fn ids(&self) -> Result<Vec<String>, StoreError> {
        let prefix = format!("{}:", D::COLLECTION);
        Ok(self
            .store
            .keys_with_prefix(&prefix)?
            .into_iter()
            .filter_map(|key| key.strip_prefix(&prefix).map(str::to_string))
            .collect())
    }
}

/// Extension trait for typed document access on any VersionedStore.
pub trait DocumentsExt: VersionedStore {
    /// Get a typed document repository.
    fn documents<D: Document>(&self) -> DocumentRepository<'_, Self, D> {
        DocumentRepository::new(self)
    }
}

impl<S: VersionedStore + ?Sized> DocumentsExt for S {}
