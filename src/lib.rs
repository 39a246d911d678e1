//! Optimistic concurrency for a game economy kept in a versioned key-value store.
//!
//! - [`store`]: per-key CAS store contract, typed repositories, in-memory store.
//! - [`mutator`]: best-effort single-document writes that drop on conflict.
//! - [`transaction`]: retrying all-or-nothing commits across documents.
//! - [`reward`]: weighted weapon drops.
//! - [`game`]: battle, hit, trade and transfer built on the above.
//! - [`observe`]: outcome sinks for logs, metrics and in-process listeners.

// Lets `#[derive(Document)]` refer to `cas_economy::` from inside this crate.
extern crate self as cas_economy;

pub mod config;
pub mod game;
pub mod mutator;
pub mod observe;
pub mod reward;
pub mod simulation;
pub mod store;
pub mod transaction;

pub use cas_economy_macros::Document;
pub use config::{ConfigError, SimulationConfig};
pub use game::{
    seed_customers, seed_skirmish, seed_world, transfer_record_exists, BattleConfig,
    BattleReport, Customer, DeathPolicy, Economy, HitReceipt, HitpointWrite, Monster, Player,
    Roster, SeedOutcome, TradeReceipt, TransferReceipt, TransferRecord,
};
pub use mutator::{OptimisticMutator, WriteStatus};
pub use observe::{FanoutSink, Metrics, NoopSink, OperationKind, OutcomeSink, TracingSink};
#[cfg(feature = "emitter")]
pub use observe::EmitterSink;
pub use reward::{celtic_weapons, RewardError, RewardTable, Weapon};
pub use simulation::{Simulation, SimulationPlan, SimulationStats};
pub use store::{
    Document, DocumentRepository, DocumentsExt, InMemoryStore, RawDocument, StoreError, Version,
    Versioned, VersionedStore,
};
pub use transaction::{
    AbortReason, Ambiguity, AmbiguityCause, CancelToken, Failure, Outcome, OutcomeTag,
    TransactionConfig, TransactionContext, TransactionCoordinator, TransactionError,
    TransactionReport, TxDocument,
};
