//! Battle integration tests: lost writes are tolerated, invariants are not.

use std::sync::{Arc, Barrier};
use std::thread;

use rand::rngs::mock::StepRng;
use rand::rngs::StdRng;
use rand::SeedableRng;

use cas_economy::{
    celtic_weapons, BattleConfig, DeathPolicy, DocumentsExt, Economy, Failure, HitpointWrite,
    InMemoryStore, Monster, Player, RewardTable, StoreError, WriteStatus,
};

fn economy(store: InMemoryStore, config: BattleConfig) -> Economy<InMemoryStore> {
    let rewards = Arc::new(RewardTable::new(celtic_weapons()).unwrap());
    Economy::new(store, rewards).with_battle_config(config)
}

fn add_player(store: &InMemoryStore, id: &str, experience: i64) {
    store
        .documents::<Player>()
        .insert(&Player {
            id: id.to_string(),
            name: id.to_string(),
            uuid: format!("uuid-{}", id),
            hitpoints: 100,
            experience,
            level: Player::level_for(experience),
            coins: 0,
            items: Default::default(),
        })
        .unwrap();
}

fn add_monster(store: &InMemoryStore, id: &str, hitpoints: i64) {
    store
        .documents::<Monster>()
        .insert(&Monster::new(id, hitpoints))
        .unwrap();
}

/// Always wins the coin flip.
fn winning() -> StepRng {
    StepRng::new(0, 0)
}

#[test]
fn hitpoints_and_experience_never_go_negative() {
    let store = InMemoryStore::new();
    for (i, experience) in [0, 1, 2].into_iter().enumerate() {
        add_player(&store, &format!("p{}", i), experience);
    }
    add_monster(&store, "Kelpie", 0);
    add_monster(&store, "Merrow", 3);

    let economy = economy(store.clone(), BattleConfig::default());
    let mut rng = StdRng::seed_from_u64(42);

    for round in 0..2_000 {
        let player = format!("p{}", round % 3);
        let monster = if round % 2 == 0 { "Kelpie" } else { "Merrow" };
        economy.battle(&player, monster, &mut rng).unwrap();

        for id in ["Kelpie", "Merrow"] {
            assert!(store.documents::<Monster>().get(id).unwrap().data.hitpoints >= 0);
        }
        assert!(store.documents::<Player>().get(&player).unwrap().data.experience >= 0);
    }
}

#[test]
fn contended_kill_pays_out_once_per_landed_write() {
    let store = InMemoryStore::new();
    let contenders = 8;
    for i in 0..contenders {
        add_player(&store, &format!("p{}", i), 0);
    }
    add_monster(&store, "Knocker", 1);

    let economy = economy(store.clone(), BattleConfig::default());
    let barrier = Arc::new(Barrier::new(contenders));

    let reports: Vec<_> = thread::scope(|scope| {
        let handles: Vec<_> = (0..contenders)
            .map(|i| {
                let economy = economy.clone();
                let barrier = Arc::clone(&barrier);
                scope.spawn(move || {
                    barrier.wait();
                    economy
                        .battle(&format!("p{}", i), "Knocker", &mut winning())
                        .unwrap()
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    let kills = reports.iter().filter(|r| r.slain).count() as i64;
    let items: i64 = (0..contenders)
        .map(|i| {
            let player = store.documents::<Player>().get(&format!("p{}", i)).unwrap().data;
            player.items.values().sum::<i64>()
        })
        .sum();

    assert!(kills >= 1);
    assert_eq!(items, kills);
    for report in reports.iter().filter(|r| r.reward.is_some()) {
        assert!(report.slain);
        assert!(!report.monster_write.is_dropped());
    }
}

#[test]
fn remove_policy_takes_the_monster_out_of_play() {
    let store = InMemoryStore::new();
    add_player(&store, "hunter", 10);
    add_monster(&store, "Fuath", 2);

    let config = BattleConfig {
        on_death: DeathPolicy::Remove,
        ..BattleConfig::default()
    };
    let economy = economy(store.clone(), config);

    let first = economy.battle("hunter", "Fuath", &mut winning()).unwrap();
    assert!(!first.slain);
    let second = economy.battle("hunter", "Fuath", &mut winning()).unwrap();
    assert!(second.slain);
    assert_eq!(second.monster_write, WriteStatus::Removed);

    let hunter = store.documents::<Player>().get("hunter").unwrap().data;
    assert_eq!(hunter.experience, 10 + 2 + 91);
    assert_eq!(hunter.level, 1);
    assert_eq!(hunter.items.values().sum::<i64>(), 1);

    assert!(matches!(
        economy.battle("hunter", "Fuath", &mut winning()),
        Err(StoreError::NotFound { .. })
    ));
}

#[test]
fn increment_mode_never_drops_damage() {
    let store = InMemoryStore::new();
    let fighters = 4;
    let rounds = 50;
    for i in 0..fighters {
        add_player(&store, &format!("p{}", i), 0);
    }
    add_monster(&store, "Morgen", 1_000);

    let config = BattleConfig {
        hitpoint_write: HitpointWrite::Increment,
        ..BattleConfig::default()
    };
    let economy = economy(store.clone(), config);

    thread::scope(|scope| {
        for i in 0..fighters {
            let economy = economy.clone();
            scope.spawn(move || {
                let player = format!("p{}", i);
                for _ in 0..rounds {
                    let report = economy.battle(&player, "Morgen", &mut winning()).unwrap();
                    assert!(matches!(report.monster_write, WriteStatus::Adjusted(_)));
                }
            });
        }
    });

    let monster = store.documents::<Monster>().get("Morgen").unwrap().data;
    assert_eq!(monster.hitpoints, 1_000 - (fighters * rounds) as i64);
}

#[test]
fn contended_killing_blow_is_awarded_once() {
    let store = InMemoryStore::new();
    let contenders = 6;
    for i in 0..contenders {
        add_player(&store, &format!("p{}", i), 0);
    }
    add_monster(&store, "Bauchan", 50);

    let economy = economy(store.clone(), BattleConfig::default());
    let barrier = Arc::new(Barrier::new(contenders));

    let reports: Vec<_> = thread::scope(|scope| {
        let handles: Vec<_> = (0..contenders)
            .map(|i| {
                let economy = economy.clone();
                let barrier = Arc::clone(&barrier);
                scope.spawn(move || {
                    barrier.wait();
                    economy.hit(&format!("p{}", i), "Bauchan", 80)
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    let winners: Vec<_> = reports
        .iter()
        .filter_map(|r| r.outcome.committed())
        .collect();
    assert_eq!(winners.len(), 1);
    assert!(winners[0].killed);
    for report in reports.iter().filter(|r| !r.outcome.is_committed()) {
        assert_eq!(
            report.outcome.failure(),
            Some(&Failure::MissingEntity {
                key: "m:Bauchan".into()
            })
        );
    }

    let experience: i64 = (0..contenders)
        .map(|i| store.documents::<Player>().get(&format!("p{}", i)).unwrap().data.experience)
        .sum();
    assert_eq!(experience, Monster::DEFAULT_EXPERIENCE_WHEN_KILLED);
    assert!(store.documents::<Monster>().find("Bauchan").unwrap().is_none());
}

