//! The game economy: players fight monsters, trade weapons and move money.
//!
//! Battles go through the [`OptimisticMutator`] and tolerate lost writes.
//! Hits, trades and transfers go through the [`TransactionCoordinator`] and
//! are all-or-nothing.
//!
//! ## Example
//!
//! ```ignore
//! let store = InMemoryStore::new();
//! let rewards = Arc::new(RewardTable::new(celtic_weapons())?);
//! let economy = Economy::new(store.clone(), rewards);
//!
//! let world = seed_world(&store, 100, economy.rewards().weapons(), &mut rng)?;
//! let report = economy.battle("ingenthr", "Kelpie", &mut rng)?;
//! let trade = economy.trade("ingenthr", world.roster.players()[1].as_str(), &mut rng);
//! ```

mod battle;
mod hit;
mod model;
mod roster;
mod seed;
mod trade;
mod transfer;

use std::sync::Arc;

pub use battle::{BattleConfig, BattleReport, DeathPolicy, HitpointWrite};
pub use hit::HitReceipt;
pub use model::{Customer, Monster, Player, TransferRecord};
pub use roster::Roster;
pub use seed::{
    seed_customers, seed_skirmish, seed_world, SeedOutcome, MONSTER_NAMES, SENTINEL_PLAYER,
    SKIRMISH_MONSTER, SKIRMISH_PLAYER,
};
pub use trade::TradeReceipt;
pub use transfer::{transfer_record_exists, TransferReceipt};

use crate::mutator::OptimisticMutator;
use crate::reward::RewardTable;
use crate::store::VersionedStore;
use crate::transaction::{TransactionConfig, TransactionCoordinator};

/// Domain operations over one store.
///
/// Holds no mutable state; clone it into each worker thread.
#[derive(Clone)]
pub struct Economy<S> {
    mutator: OptimisticMutator<S>,
    coordinator: TransactionCoordinator<S>,
    rewards: Arc<RewardTable>,
    battle: BattleConfig,
}

impl<S: VersionedStore + Clone> Economy<S> {
    pub fn new(store: S, rewards: Arc<RewardTable>) -> Self {
        Economy {
            mutator: OptimisticMutator::new(store.clone()),
            coordinator: TransactionCoordinator::new(store, TransactionConfig::default()),
            rewards,
            battle: BattleConfig::default(),
        }
    }

    pub fn with_battle_config(mut self, config: BattleConfig) -> Self {
        self.battle = config;
        self
    }

    pub fn with_transaction_config(mut self, config: TransactionConfig) -> Self {
        self.coordinator = TransactionCoordinator::new(self.coordinator.store().clone(), config);
        self
    }

    pub fn store(&self) -> &S {
        self.mutator.store()
    }

    pub fn rewards(&self) -> &RewardTable {
        &self.rewards
    }

    pub fn battle_config(&self) -> &BattleConfig {
        &self.battle
    }

    pub fn mutator(&self) -> &OptimisticMutator<S> {
        &self.mutator
    }

    pub fn coordinator(&self) -> &TransactionCoordinator<S> {
        &self.coordinator
    }
}
