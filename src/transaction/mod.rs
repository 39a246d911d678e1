//! Multi-document transactions over a per-key CAS store.
//!
//! The store only guarantees atomicity for a single key. The coordinator
//! builds all-or-nothing commits on top of that: a body reads through a
//! [`TransactionContext`], stages its writes, and the coordinator validates the
//! read set, applies the writes with their captured versions and undoes them
//! if a later write loses a race. Lost races are retried with backoff.
//!
//! Every run ends in exactly one [`Outcome`]:
//!
//! - `Committed(value)`: all writes landed.
//! - `Failed(failure)`: nothing was left behind.
//! - `CommitAmbiguous(ambiguity)`: the store's final state is unknown and the
//!   caller must re-read before deciding what happened.

mod context;
mod coordinator;
mod error;
mod outcome;

pub use context::{TransactionContext, TxDocument};
pub use coordinator::{CancelToken, TransactionConfig, TransactionCoordinator};
pub use error::{AbortReason, TransactionError};
pub use outcome::{Ambiguity, AmbiguityCause, Failure, Outcome, OutcomeTag, TransactionReport};
