use std::fmt;
use std::time::Duration;

use uuid::Uuid;

use super::AbortReason;
use crate::store::StoreError;

/// Final result of a transaction run.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<T> {
    /// Every staged write landed.
    Committed(T),
    /// Nothing was written (or everything written was undone).
    Failed(Failure),
    /// Some writes may have landed. Re-read the affected keys before acting.
    CommitAmbiguous(Ambiguity),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Failure {
    Aborted(AbortReason),
    MissingEntity { key: String },
    ContentionExhausted { attempts: u32 },
    Cancelled,
    /// A store error before any write was applied.
    Store(StoreError),
}

impl Failure {
    pub fn label(&self) -> &'static str {
        match self {
            Failure::Aborted(reason) => reason.label(),
            Failure::MissingEntity { .. } => "missing-entity",
            Failure::ContentionExhausted { .. } => "contention-exhausted",
            Failure::Cancelled => "cancelled",
            Failure::Store(_) => "store-error",
        }
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Failure::Aborted(reason) => write!(f, "aborted: {}", reason),
            Failure::MissingEntity { key } => write!(f, "missing entity {}", key),
            Failure::ContentionExhausted { attempts } => {
                write!(f, "contention exhausted after {} attempts", attempts)
            }
            Failure::Cancelled => write!(f, "cancelled, nothing written"),
            Failure::Store(err) => write!(f, "store error: {}", err),
        }
    }
}

/// Why a commit could not be classified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ambiguity {
    /// Key whose write (or undo) failed.
    pub key: String,
    /// Writes known to have landed before the failure.
    pub applied: usize,
    pub cause: AmbiguityCause,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AmbiguityCause {
    /// The write failed for a reason other than a conflict.
    Store(StoreError),
    /// Rolling back an earlier write of this attempt failed.
    CompensationFailed(StoreError),
}

impl fmt::Display for Ambiguity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.cause {
            AmbiguityCause::Store(err) => write!(
                f,
                "write to {} failed after {} applied: {}",
                self.key, self.applied, err
            ),
            AmbiguityCause::CompensationFailed(err) => {
                write!(f, "could not roll back {}: {}", self.key, err)
            }
        }
    }
}

/// Outcome class reported to observers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutcomeTag {
    Committed,
    Failed(&'static str),
    CommitAmbiguous,
}

impl OutcomeTag {
    pub fn label(&self) -> &'static str {
        match self {
            OutcomeTag::Committed => "committed",
            OutcomeTag::Failed(_) => "failed",
            OutcomeTag::CommitAmbiguous => "commit-ambiguous",
        }
    }

    pub fn reason(&self) -> Option<&'static str> {
        match self {
            OutcomeTag::Failed(reason) => Some(*reason),
            _ => None,
        }
    }
}

impl fmt::Display for OutcomeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutcomeTag::Failed(reason) => write!(f, "failed({})", reason),
            other => f.write_str(other.label()),
        }
    }
}

impl<T> Outcome<T> {
    pub fn is_committed(&self) -> bool {
        matches!(self, Outcome::Committed(_))
    }

    pub fn committed(&self) -> Option<&T> {
        match self {
            Outcome::Committed(value) => Some(value),
            _ => None,
        }
    }

    pub fn failure(&self) -> Option<&Failure> {
        match self {
            Outcome::Failed(failure) => Some(failure),
            _ => None,
        }
    }

    pub fn tag(&self) -> OutcomeTag {
        match self {
            Outcome::Committed(_) => OutcomeTag::Committed,
            Outcome::Failed(failure) => OutcomeTag::Failed(failure.label()),
            Outcome::CommitAmbiguous(_) => OutcomeTag::CommitAmbiguous,
        }
    }
}

/// What a caller gets back from the coordinator.
#[derive(Debug, Clone)]
pub struct TransactionReport<T> {
    pub id: Uuid,
    pub outcome: Outcome<T>,
    pub attempts: u32,
    pub elapsed: Duration,
}
