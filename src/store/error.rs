use thiserror::Error;

use super::Version;

/// Errors surfaced by a [`VersionedStore`](super::VersionedStore).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("document not found: {key}")]
    NotFound { key: String },

    #[error("document already exists: {key}")]
    AlreadyExists { key: String },

    /// The presented CAS token no longer matches the stored document.
    #[error("version conflict on {key} (expected {expected}, actual {actual})")]
    VersionConflict {
        key: String,
        expected: Version,
        actual: Version,
    },

    #[error("cannot adjust {key}.{field}: not an integer field")]
    NotANumber { key: String, field: String },

    #[error("serialization error on {key}: {message}")]
    Serde { key: String, message: String },

    /// The request was sent but no answer came back; the write may or may not
    /// have been applied.
    #[error("timed out waiting for {key}")]
    Timeout { key: String },

    #[error("storage error: {0}")]
    Storage(String),
}

impl StoreError {
    /// Conflicts that a fresh read can resolve.
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            StoreError::VersionConflict { .. }
                | StoreError::AlreadyExists { .. }
                | StoreError::NotFound { .. }
        )
    }

    /// True when the write's effect on the store is unknown.
    pub fn is_ambiguous(&self) -> bool {
        matches!(self, StoreError::Timeout { .. })
    }
}
