//! TransactionCoordinator - retrying all-or-nothing commits over a per-key CAS store.
//!
//! ## Example
//!
//! ```ignore
//! let coordinator = TransactionCoordinator::new(store.clone(), TransactionConfig::default());
//!
//! let report = coordinator.run(|ctx| {
//!     let andy = ctx.get::<Customer>("andy")?;
//!     let beth = ctx.get::<Customer>("beth")?;
//!     if andy.content().balance < 80 {
//!         return ctx.abort(AbortReason::InsufficientFunds { balance: andy.content().balance, requested: 80 });
//!     }
//!     // ... stage replaces ...
//!     Ok(())
//! });
//! ```
//!
//! The body may run several times. It must only read through the context and
//! stage writes; anything else it does is repeated on every attempt.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use rand::Rng;
use tracing::{debug, debug_span, warn};
use uuid::Uuid;

use super::context::StagedWrite;
use super::{
    Ambiguity, AmbiguityCause, Failure, Outcome, TransactionContext, TransactionError,
    TransactionReport,
};
use crate::store::{StoreError, Version, VersionedStore};

/// Retry policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransactionConfig {
    /// Attempts before giving up with `ContentionExhausted`. At least 1.
    pub max_attempts: u32,
    /// Lower bound of the randomized pause between attempts.
    pub backoff_min: Duration,
    /// Upper bound of the pause; the window doubles per attempt up to this.
    pub backoff_max: Duration,
}

impl Default for TransactionConfig {
    fn default() -> Self {
        TransactionConfig {
            max_attempts: 5,
            backoff_min: Duration::from_millis(1),
            backoff_max: Duration::from_millis(50),
        }
    }
}

/// Cooperative cancellation flag, shareable across threads.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// How to put back a write this attempt already applied.
enum Undo {
    Restore {
        key: String,
        bytes: Vec<u8>,
        version: Version,
    },
    Delete {
        key: String,
        version: Version,
    },
    Reinsert {
        key: String,
        bytes: Vec<u8>,
    },
}

impl Undo {
    fn key(&self) -> &str {
        match self {
            Undo::Restore { key, .. } | Undo::Delete { key, .. } | Undo::Reinsert { key, .. } => {
                key
            }
        }
    }
}

enum CommitResult {
    Committed,
    /// Lost a race; everything this attempt wrote has been undone.
    Conflict(StoreError),
    /// Failed before anything was written.
    Failed(StoreError),
    /// Cancelled mid-commit; everything this attempt wrote has been undone.
    Cancelled,
    Ambiguous(Ambiguity),
}

/// Runs transaction bodies against a [`VersionedStore`].
///
/// Holds no state between runs beyond its configuration; clone it or share
/// it freely.
#[derive(Clone)]
pub struct TransactionCoordinator<S> {
    store: S,
    config: TransactionConfig,
}

impl<S: VersionedStore> TransactionCoordinator<S> {
    pub fn new(store: S, config: TransactionConfig) -> Self {
        TransactionCoordinator { store, config }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &TransactionConfig {
        &self.config
    }

    /// Run `body` until it commits, fails, or runs out of attempts.
    pub fn run<T, F>(&self, body: F) -> TransactionReport<T>
    where
        F: FnMut(&mut TransactionContext<'_, S>) -> Result<T, TransactionError>,
    {
        self.run_with_cancel(&CancelToken::new(), body)
    }

    /// Like [`run`](Self::run), observing `cancel` between phases.
    ///
    /// Cancellation is checked before each write. If writes of the current
    /// attempt already landed they are rolled back first, so the outcome is
    /// `Failed(Cancelled)` unless that rollback fails, which makes it
    /// `CommitAmbiguous`.
    pub fn run_with_cancel<T, F>(&self, cancel: &CancelToken, mut body: F) -> TransactionReport<T>
    where
        F: FnMut(&mut TransactionContext<'_, S>) -> Result<T, TransactionError>,
    {
        let id = Uuid::new_v4();
        let started = Instant::now();
        let span = debug_span!("transaction", %id);
        let _entered = span.enter();

        let max_attempts = self.config.max_attempts.max(1);
        let mut attempt = 0;

        let outcome = loop {
            if attempt == max_attempts {
                warn!(attempts = attempt, "transaction gave up after repeated conflicts");
                break Outcome::Failed(Failure::ContentionExhausted { attempts: attempt });
            }
            if attempt > 0 {
                self.backoff(attempt);
            }
            attempt += 1;

            if cancel.is_cancelled() {
                break Outcome::Failed(Failure::Cancelled);
            }

            let mut ctx = TransactionContext::new(&self.store, attempt);
            let value = match body(&mut ctx) {
                Ok(value) => value,
                Err(TransactionError::Aborted(reason)) => {
                    debug!(attempt, %reason, "transaction aborted by body");
                    break Outcome::Failed(Failure::Aborted(reason));
                }
                Err(TransactionError::NotFound { key }) => {
                    debug!(attempt, %key, "transaction read a missing document");
                    break Outcome::Failed(Failure::MissingEntity { key });
                }
                Err(TransactionError::Store(err)) => {
                    warn!(attempt, error = %err, "store error while reading");
                    break Outcome::Failed(Failure::Store(err));
                }
            };

            if cancel.is_cancelled() {
                break Outcome::Failed(Failure::Cancelled);
            }

            match self.commit(ctx, cancel) {
                CommitResult::Committed => {
                    debug!(attempt, "transaction committed");
                    break Outcome::Committed(value);
                }
                CommitResult::Conflict(err) => {
                    debug!(attempt, error = %err, "commit conflict, retrying");
                }
                CommitResult::Failed(err) => {
                    warn!(attempt, error = %err, "commit failed before any write");
                    break Outcome::Failed(Failure::Store(err));
                }
                CommitResult::Cancelled => break Outcome::Failed(Failure::Cancelled),
                CommitResult::Ambiguous(ambiguity) => {
                    warn!(attempt, %ambiguity, "commit outcome unknown");
                    break Outcome::CommitAmbiguous(ambiguity);
                }
            }
        };

        TransactionReport {
            id,
            outcome,
            attempts: attempt,
            elapsed: started.elapsed(),
        }
    }

    fn commit(&self, ctx: TransactionContext<'_, S>, cancel: &CancelToken) -> CommitResult {
        let (reads, writes) = ctx.into_parts();
        if writes.is_empty() {
            return CommitResult::Committed;
        }

        // Every read must still be current before the first write.
        for (key, snapshot) in &reads {
            match self.store.get(key) {
                Ok(current) if current.version == snapshot.version => {}
                Ok(current) => {
                    return CommitResult::Conflict(StoreError::VersionConflict {
                        key: key.clone(),
                        expected: snapshot.version,
                        actual: current.version,
                    })
                }
                Err(err) if err.is_conflict() => return CommitResult::Conflict(err),
                Err(err) => return CommitResult::Failed(err),
            }
        }

        let mut undo_log: Vec<Undo> = Vec::with_capacity(writes.len());
        for write in writes {
            if !undo_log.is_empty() && cancel.is_cancelled() {
                debug!(applied = undo_log.len(), "cancelled mid-commit, rolling back");
                return match self.compensate(undo_log) {
                    Ok(()) => CommitResult::Cancelled,
                    Err(ambiguity) => CommitResult::Ambiguous(ambiguity),
                };
            }

            let key = write.key().to_string();
            match self.apply(write) {
                Ok(undo) => undo_log.push(undo),
                Err(err) if err.is_conflict() => {
                    return match self.compensate(undo_log) {
                        Ok(()) => CommitResult::Conflict(err),
                        Err(ambiguity) => CommitResult::Ambiguous(ambiguity),
                    };
                }
                Err(err) if undo_log.is_empty() && !err.is_ambiguous() => {
                    return CommitResult::Failed(err);
                }
                Err(err) => {
                    return CommitResult::Ambiguous(Ambiguity {
                        key,
                        applied: undo_log.len(),
                        cause: AmbiguityCause::Store(err),
                    });
                }
            }
        }

        CommitResult::Committed
    }

    fn apply(&self, write: StagedWrite) -> Result<Undo, StoreError> {
        match write {
            StagedWrite::Insert { key, bytes } => {
                let version = self.store.insert(&key, bytes)?;
                Ok(Undo::Delete { key, version })
            }
            StagedWrite::Replace {
                key,
                bytes,
                expected,
                previous,
            } => {
                let version = self.store.replace(&key, bytes, expected)?;
                Ok(Undo::Restore {
                    key,
                    bytes: previous,
                    version,
                })
            }
            StagedWrite::Remove {
                key,
                expected,
                previous,
            } => {
                self.store.remove(&key, expected)?;
                Ok(Undo::Reinsert {
                    key,
                    bytes: previous,
                })
            }
        }
    }

    /// Undo applied writes, newest first, each guarded by the version our own
    /// write produced.
    fn compensate(&self, undo_log: Vec<Undo>) -> Result<(), Ambiguity> {
        let applied = undo_log.len();
        for undo in undo_log.into_iter().rev() {
            let key = undo.key().to_string();
            let result = match undo {
                Undo::Restore {
                    key,
                    bytes,
                    version,
                } => self.store.replace(&key, bytes, version).map(|_| ()),
                Undo::Delete { key, version } => self.store.remove(&key, version),
                Undo::Reinsert { key, bytes } => self.store.insert(&key, bytes).map(|_| ()),
            };
            if let Err(err) = result {
                return Err(Ambiguity {
                    key,
                    applied,
                    cause: AmbiguityCause::CompensationFailed(err),
                });
            }
            debug!(%key, "rolled back partial commit");
        }
        Ok(())
    }

    /// Randomized pause; the window doubles each attempt. No lock is held here.
    fn backoff(&self, completed_attempts: u32) {
        let min = self.config.backoff_min;
        let max = self.config.backoff_max.max(min);
        let exponent = completed_attempts.saturating_sub(1).min(16);
        let ceiling = min.saturating_mul(1 << exponent).min(max);

        let pause = if ceiling > min {
            rand::thread_rng().gen_range(min..=ceiling)
        } else {
            min
        };
        if !pause.is_zero() {
            thread::sleep(pause);
        }
    }
}
