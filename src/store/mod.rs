//! Versioned document store.
//!
//! Every document lives under a single key (`"<collection>:<id>"`) together
//! with an opaque [`Version`] token. Reads hand the token back to the caller;
//! `replace` and `remove` only succeed when the caller presents the token the
//! store currently holds, so a stale in-memory copy can never overwrite a
//! newer document.
//!
//! ## Example
//!
//! ```ignore
//! use cas_economy::{Document, DocumentsExt, InMemoryStore};
//!
//! #[derive(Clone, Serialize, Deserialize, Document)]
//! #[document(collection = "u")]
//! struct Player { id: String, coins: u64 }
//!
//! let store = InMemoryStore::new();
//! store.documents::<Player>().insert(&player)?;
//! let mut loaded = store.documents::<Player>().get("ingenthr")?;
//! loaded.data.coins += 10;
//! store.documents::<Player>().replace(&loaded.data, loaded.version)?;
//! ```

mod error;
mod in_memory;
mod repository;
mod versioned_store;

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::fmt;

pub use error::StoreError;
pub use in_memory::InMemoryStore;
pub use repository::{DocumentRepository, DocumentsExt};
pub use versioned_store::{RawDocument, VersionedStore};

/// Trait for types that are stored as standalone documents.
pub trait Document: Serialize + DeserializeOwned + Clone + Send + Sync {
    /// Key prefix for this document type (e.g. `"u"` for players).
    const COLLECTION: &'static str;

    /// Returns the unique identifier of this document within its collection.
    fn id(&self) -> &str;

    /// Full store key of this document.
    fn key(&self) -> String {
        document_key::<Self>(self.id())
    }
}

/// Builds the store key for a document id.
pub fn document_key<D: Document>(id: &str) -> String {
    format!("{}:{}", D::COLLECTION, id)
}

/// Opaque CAS token returned by every read and write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Version(u64);

impl Version {
    pub fn new(value: u64) -> Self {
        Version(value)
    }

    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

/// A document together with the version it was read or written at.
#[derive(Debug, Clone)]
pub struct Versioned<T> {
    pub data: T,
    pub version: Version,
}

pub(crate) fn encode<D: Serialize>(key: &str, doc: &D) -> Result<Vec<u8>, StoreError> {
    serde_json::to_vec(doc).map_err(|e| StoreError::Serde {
        key: key.to_string(),
        message: e.to_string(),
    })
}

pub(crate) fn decode<D: DeserializeOwned>(key: &str, bytes: &[u8]) -> Result<D, StoreError> {
    serde_json::from_slice(bytes).map_err(|e| StoreError::Serde {
        key: key.to_string(),
        message: e.to_string(),
    })
}
