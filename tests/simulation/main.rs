//! Whole-loop tests: seeded world, concurrent workers, invariants afterwards.

use std::sync::Arc;

use rand::rngs::StdRng;
use rand::SeedableRng;

use cas_economy::{
    celtic_weapons, seed_world, DocumentsExt, Economy, InMemoryStore, Metrics, Monster,
    OperationKind, Player, RewardTable, Simulation, SimulationPlan, TransactionConfig,
};

fn players(store: &InMemoryStore) -> Vec<Player> {
    let repo = store.documents::<Player>();
    repo.ids()
        .unwrap()
        .iter()
        .map(|id| repo.get(id).unwrap().data)
        .collect()
}

#[test]
fn concurrent_loop_keeps_the_economy_consistent() {
    let store = InMemoryStore::new();
    let mut rng = StdRng::seed_from_u64(11);
    let world = seed_world(&store, 30, &celtic_weapons(), &mut rng).unwrap();
    assert!(world.seeded);

    let coins_before: i64 = players(&store).iter().map(|p| p.coins).sum();

    let rewards = Arc::new(RewardTable::new(celtic_weapons()).unwrap());
    let economy = Economy::new(store.clone(), rewards).with_transaction_config(
        TransactionConfig {
            max_attempts: 5,
            ..TransactionConfig::default()
        },
    );
    let metrics = Arc::new(Metrics::new());
    let plan = SimulationPlan {
        workers: 4,
        iterations: 40,
        battles_per_trade: 6,
    };

    let stats = Simulation::new(economy, Arc::new(world.roster), metrics.clone(), plan).run();

    assert_eq!(stats.iterations, 160);
    assert_eq!(stats.battles, 960);
    assert_eq!(stats.trades_ambiguous, 0);
    assert_eq!(metrics.total(OperationKind::Battle), 960);
    assert_eq!(metrics.total(OperationKind::Trade), 160);

    let after = players(&store);
    assert_eq!(after.iter().map(|p| p.coins).sum::<i64>(), coins_before);
    for player in &after {
        assert!(player.coins >= 0, "{} has negative coins", player.id);
        assert!(player.experience >= 0, "{} has negative experience", player.id);
        assert!(player.items.values().all(|&count| count >= 1), "{}", player.id);
    }

    let monsters = store.documents::<Monster>();
    for id in monsters.ids().unwrap() {
        assert!(monsters.get(&id).unwrap().data.hitpoints >= 0);
    }
}

#[test]
fn reseeding_reuses_the_existing_world() {
    let store = InMemoryStore::new();
    let mut rng = StdRng::seed_from_u64(5);
    let first = seed_world(&store, 10, &celtic_weapons(), &mut rng).unwrap();
    let second = seed_world(&store, 10, &celtic_weapons(), &mut rng).unwrap();

    assert!(!second.seeded);
    assert_eq!(second.roster.players(), first.roster.players());
    assert_eq!(players(&store).len(), 10);
}
