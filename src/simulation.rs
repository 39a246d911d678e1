//! Concurrent game loop.
//!
//! Each worker thread repeats: a few battles between random players and
//! monsters, then one trade between two random players. Every operation's
//! outcome goes to the configured [`OutcomeSink`].

use std::sync::Arc;
use std::thread;
use std::time::Instant;

use rand::Rng;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::game::{Economy, Roster};
use crate::observe::{OperationKind, OutcomeSink};
use crate::store::{StoreError, VersionedStore};
use crate::transaction::{Outcome, OutcomeTag};

/// Totals across all workers.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct SimulationStats {
    pub iterations: usize,
    pub battles: usize,
    pub kills: usize,
    /// Battles that lost at least one write to a conflict.
    pub battles_dropped: usize,
    /// Battles that failed outright, e.g. against a removed monster.
    pub battle_errors: usize,
    pub trades_committed: usize,
    pub trades_failed: usize,
    pub trades_ambiguous: usize,
}

impl SimulationStats {
    fn merge(&mut self, other: &SimulationStats) {
        self.iterations += other.iterations;
        self.battles += other.battles;
        self.kills += other.kills;
        self.battles_dropped += other.battles_dropped;
        self.battle_errors += other.battle_errors;
        self.trades_committed += other.trades_committed;
        self.trades_failed += other.trades_failed;
        self.trades_ambiguous += other.trades_ambiguous;
    }
}

/// Shape of a simulation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimulationPlan {
    pub workers: usize,
    pub iterations: usize,
    pub battles_per_trade: usize,
}

impl Default for SimulationPlan {
    fn default() -> Self {
        SimulationPlan {
            workers: 4,
            iterations: 1000,
            battles_per_trade: 6,
        }
    }
}

pub struct Simulation<S, K> {
    economy: Economy<S>,
    roster: Arc<Roster>,
    sink: K,
    plan: SimulationPlan,
}

impl<S, K> Simulation<S, K>
where
    S: VersionedStore + Clone,
    K: OutcomeSink,
{
    pub fn new(economy: Economy<S>, roster: Arc<Roster>, sink: K, plan: SimulationPlan) -> Self {
        Simulation {
            economy,
            roster,
            sink,
            plan,
        }
    }

    /// Run every worker to completion and sum their stats.
    pub fn run(&self) -> SimulationStats {
        if self.roster.is_empty() {
            warn!("roster has no players or no monsters, nothing to simulate");
            return SimulationStats::default();
        }

        let started = Instant::now();
        let workers = self.plan.workers.max(1);

        let stats = thread::scope(|scope| {
            let handles: Vec<_> = (0..workers)
                .map(|worker| scope.spawn(move || self.worker(worker)))
                .collect();

            let mut total = SimulationStats::default();
            for handle in handles {
                match handle.join() {
                    Ok(stats) => total.merge(&stats),
                    Err(_) => warn!("simulation worker panicked"),
                }
            }
            total
        });

        info!(
            workers,
            iterations = stats.iterations,
            battles = stats.battles,
            trades = stats.trades_committed,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "simulation finished"
        );
        stats
    }

    fn worker(&self, worker: usize) -> SimulationStats {
        let mut rng = rand::thread_rng();
        let mut stats = SimulationStats::default();

        for _ in 0..self.plan.iterations {
            for _ in 0..self.plan.battles_per_trade {
                self.battle(&mut rng, &mut stats);
            }
            self.trade(&mut rng, &mut stats);
            stats.iterations += 1;
        }

        debug!(worker, iterations = stats.iterations, "worker done");
        stats
    }

    fn battle<R: Rng>(&self, rng: &mut R, stats: &mut SimulationStats) {
        let (Some(player), Some(monster)) = (
            self.roster.random_player(rng),
            self.roster.random_monster(rng),
        ) else {
            return;
        };

        let started = Instant::now();
        stats.battles += 1;
        let tag = match self.economy.battle(player, monster, rng) {
            Ok(report) => {
                if report.slain {
                    stats.kills += 1;
                }
                if report.tag() != OutcomeTag::Committed {
                    stats.battles_dropped += 1;
                }
                report.tag()
            }
            Err(StoreError::NotFound { key }) => {
                debug!(%key, "battle participant is gone");
                stats.battle_errors += 1;
                OutcomeTag::Failed("missing-entity")
            }
            Err(err) => {
                warn!(error = %err, "battle failed");
                stats.battle_errors += 1;
                OutcomeTag::Failed("store-error")
            }
        };
        self.sink.record(OperationKind::Battle, tag, started.elapsed());
    }

    fn trade<R: Rng>(&self, rng: &mut R, stats: &mut SimulationStats) {
        let (Some(buyer), Some(seller)) = (
            self.roster.random_player(rng),
            self.roster.random_player(rng),
        ) else {
            return;
        };

        let report = self.economy.trade(buyer, seller, rng);
        match &report.outcome {
            Outcome::Committed(_) => stats.trades_committed += 1,
            Outcome::Failed(_) => stats.trades_failed += 1,
            Outcome::CommitAmbiguous(_) => stats.trades_ambiguous += 1,
        }
        self.sink
            .record(OperationKind::Trade, report.outcome.tag(), report.elapsed);
    }
}
