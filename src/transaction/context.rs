//! TransactionContext - the read set and staged writes of one attempt.

use std::collections::HashMap;

use super::{AbortReason, TransactionError};
use crate::store::{decode, document_key, encode, Document, RawDocument, Version, VersionedStore};

/// A document read inside a transaction, tagged with the version it was read at.
///
/// Pass it back to [`TransactionContext::replace`] or
/// [`TransactionContext::remove`] to stage a version-checked write.
#[derive(Debug, Clone)]
pub struct TxDocument<D> {
    key: String,
    version: Version,
    content: D,
}

impl<D> TxDocument<D> {
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn version(&self) -> Version {
        self.version
    }

    pub fn content(&self) -> &D {
        &self.content
    }

    pub fn into_content(self) -> D {
        self.content
    }
}

/// A write registered by the body, applied only at commit.
#[derive(Debug, Clone)]
pub(crate) enum StagedWrite {
    Insert {
        key: String,
        bytes: Vec<u8>,
    },
    Replace {
        key: String,
        bytes: Vec<u8>,
        expected: Version,
        previous: Vec<u8>,
    },
    Remove {
        key: String,
        expected: Version,
        previous: Vec<u8>,
    },
}

impl StagedWrite {
    pub(crate) fn key(&self) -> &str {
        match self {
            StagedWrite::Insert { key, .. }
            | StagedWrite::Replace { key, .. }
            | StagedWrite::Remove { key, .. } => key,
        }
    }
}

/// Handed to the transaction body once per attempt.
///
/// Reads go straight to the store and are remembered; writes are only
/// staged. Nothing the body does here is visible to anyone else until the
/// coordinator commits.
pub struct TransactionContext<'s, S: ?Sized> {
    store: &'s S,
    attempt: u32,
    reads: HashMap<String, RawDocument>,
    writes: Vec<StagedWrite>,
}

impl<'s, S: VersionedStore + ?Sized> TransactionContext<'s, S> {
    pub(crate) fn new(store: &'s S, attempt: u32) -> Self {
        TransactionContext {
            store,
            attempt,
            reads: HashMap::new(),
            writes: Vec::new(),
        }
    }

    /// 1-based attempt number.
    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    /// Read a document. A second read of the same key in this attempt returns
    /// the first snapshot. Fails with `NotFound` if the document is missing.
    pub fn get<D: Document>(&mut self, id: &str) -> Result<TxDocument<D>, TransactionError> {
        let key = document_key::<D>(id);
        let raw = match self.reads.get(&key) {
            Some(raw) => raw.clone(),
            None => {
                let raw = self.store.get(&key)?;
                self.reads.insert(key.clone(), raw.clone());
                raw
            }
        };

        Ok(TxDocument {
            content: decode(&key, &raw.bytes)?,
            version: raw.version,
            key,
        })
    }

    /// Whether a document exists right now. An existing document joins the
    /// read set like [`get`](Self::get); absence is not tracked, so a
    /// concurrent creation surfaces as a conflict on a staged insert.
    pub fn exists<D: Document>(&mut self, id: &str) -> Result<bool, TransactionError> {
        match self.get::<D>(id) {
            Ok(_) => Ok(true),
            Err(TransactionError::NotFound { .. }) => Ok(false),
            Err(err) => Err(err),
        }
    }

    /// Stage the creation of a new document.
    pub fn insert<D: Document>(&mut self, doc: &D) -> Result<(), TransactionError> {
        let key = doc.key();
        let bytes = encode(&key, doc)?;
        self.stage(StagedWrite::Insert { key, bytes });
        Ok(())
    }

    /// Stage a version-checked overwrite of a document read in this attempt.
    pub fn replace<D: Document>(
        &mut self,
        handle: &TxDocument<D>,
        content: &D,
    ) -> Result<(), TransactionError> {
        let bytes = encode(&handle.key, content)?;
        let previous = self.snapshot_bytes(&handle.key);
        self.stage(StagedWrite::Replace {
            key: handle.key.clone(),
            bytes,
            expected: handle.version,
            previous,
        });
        Ok(())
    }

    /// Stage a version-checked delete of a document read in this attempt.
    pub fn remove<D: Document>(&mut self, handle: &TxDocument<D>) -> Result<(), TransactionError> {
        let previous = self.snapshot_bytes(&handle.key);
        self.stage(StagedWrite::Remove {
            key: handle.key.clone(),
            expected: handle.version,
            previous,
        });
        Ok(())
    }

    /// Give up on this transaction. Nothing staged is written.
    ///
    /// ```ignore
    /// if buyer.content().uuid == seller.content().uuid {
    ///     return ctx.abort(AbortReason::SelfTrade);
    /// }
    /// ```
    pub fn abort<T>(&self, reason: AbortReason) -> Result<T, TransactionError> {
        Err(TransactionError::Aborted(reason))
    }

    pub(crate) fn into_parts(self) -> (HashMap<String, RawDocument>, Vec<StagedWrite>) {
        (self.reads, self.writes)
    }

    fn snapshot_bytes(&self, key: &str) -> Vec<u8> {
        self.reads
            .get(key)
            .map(|raw| raw.bytes.clone())
            .unwrap_or_default()
    }

    /// Later intents for a key supersede earlier ones.
    fn stage(&mut self, write: StagedWrite) {
        self.writes.retain(|staged| staged.key() != write.key());
        self.writes.push(write);
    }
}
