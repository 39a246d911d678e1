//! Bootstrap data for an empty store.

use std::collections::BTreeMap;

use rand::seq::SliceRandom;
use rand::Rng;
use tracing::{info, warn};
use uuid::Uuid;

use super::{Customer, Monster, Player, Roster};
use crate::reward::Weapon;
use crate::store::{DocumentsExt, StoreError, VersionedStore};

/// Id of the first player written. Finding it means the store is already seeded.
pub const SENTINEL_PLAYER: &str = "ingenthr";

pub const MONSTER_NAMES: [&str; 10] = [
    "Bauchan",
    "Fachen",
    "Fuath",
    "Joint-eater",
    "Kelpie",
    "Knocker",
    "Merrow",
    "Morgen",
    "Pictish-beast",
    "Wild-man",
];

const FIRST_NAMES: [&str; 16] = [
    "Aileen", "Brendan", "Ciara", "Declan", "Eileen", "Fergus", "Grainne", "Hugh", "Isla",
    "Kieran", "Liam", "Maeve", "Niamh", "Oisin", "Roisin", "Seamus",
];

const LAST_NAMES: [&str; 12] = [
    "Byrne", "Doyle", "Gallagher", "Kavanagh", "Kelly", "Lynch", "Murphy", "Nolan", "OBrien",
    "Quinn", "Ryan", "Walsh",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedOutcome {
    /// False when the sentinel was already present and nothing was written.
    pub seeded: bool,
    pub roster: Roster,
}

/// Populate players, monsters and the weapon catalog unless the store already
/// holds the sentinel player.
///
/// `players` counts the sentinel. Either way the returned roster lists what
/// the store holds afterwards.
pub fn seed_world<S, R>(
    store: &S,
    players: usize,
    weapons: &[Weapon],
    rng: &mut R,
) -> Result<SeedOutcome, StoreError>
where
    S: VersionedStore + ?Sized,
    R: Rng + ?Sized,
{
    let sentinel = Player {
        id: SENTINEL_PLAYER.to_string(),
        name: "Matt Ingenthron".to_string(),
        uuid: Uuid::new_v4().to_string(),
        hitpoints: 1000,
        experience: 100,
        level: Player::level_for(100),
        coins: 1_000_000,
        items: BTreeMap::new(),
    };

    match store.documents::<Player>().insert(&sentinel) {
        Ok(_) => {}
        Err(StoreError::AlreadyExists { .. }) => {
            info!("data already present, skipping seed");
            return Ok(SeedOutcome {
                seeded: false,
                roster: Roster::load(store)?,
            });
        }
        Err(err) => return Err(err),
    }

    let target = players.max(1);
    let mut created = 1;
    let mut attempts = 0;
    let max_attempts = target.saturating_mul(20);
    while created < target && attempts < max_attempts {
        attempts += 1;
        let player = random_player(rng);
        match store.documents::<Player>().insert(&player) {
            Ok(_) => created += 1,
            Err(StoreError::AlreadyExists { .. }) => {}
            Err(err) => return Err(err),
        }
    }
    if created < target {
        warn!(created, requested = target, "ran out of distinct player names");
    }

    for name in MONSTER_NAMES {
        store
            .documents::<Monster>()
            .upsert(&Monster::new(name, rng.gen_range(0..999)))?;
    }

    for weapon in weapons {
        store.documents::<Weapon>().upsert(weapon)?;
    }

    info!(
        players = created,
        monsters = MONSTER_NAMES.len(),
        weapons = weapons.len(),
        "seeded world"
    );

    Ok(SeedOutcome {
        seeded: true,
        roster: Roster::load(store)?,
    })
}

/// Reset the two transfer demo accounts to `balance` each.
pub fn seed_customers<S>(store: &S, balance: i64) -> Result<(), StoreError>
where
    S: VersionedStore + ?Sized,
{
    for (id, name) in [("andy", "Andy"), ("beth", "Beth")] {
        store.documents::<Customer>().upsert(&Customer {
            id: id.to_string(),
            name: name.to_string(),
            balance,
        })?;
    }
    Ok(())
}

pub const SKIRMISH_PLAYER: &str = "player_jane";
pub const SKIRMISH_MONSTER: &str = "a_grue";

/// Reset the single player and monster used by the `hit` demo.
pub fn seed_skirmish<S>(store: &S) -> Result<(), StoreError>
where
    S: VersionedStore + ?Sized,
{
    let experience = 14_248;
    store.documents::<Player>().upsert(&Player {
        id: SKIRMISH_PLAYER.to_string(),
        name: "Jane".to_string(),
        uuid: Uuid::new_v4().to_string(),
        hitpoints: 23_832,
        experience,
        level: Player::level_for(experience),
        coins: 0,
        items: BTreeMap::new(),
    })?;

    let mut grue = Monster::new(SKIRMISH_MONSTER, 4_000);
    grue.name = "Grue".to_string();
    store.documents::<Monster>().upsert(&grue)?;
    Ok(())
}

fn random_player<R: Rng + ?Sized>(rng: &mut R) -> Player {
    let first = FIRST_NAMES.choose(rng).copied().unwrap_or("Player");
    let last = LAST_NAMES.choose(rng).copied().unwrap_or("One");
    let suffix: u32 = rng.gen_range(0..10_000);

    let experience = rng.gen_range(0..50);
    Player {
        id: format!("{}{}{}", first.to_lowercase(), last.to_lowercase(), suffix),
        name: format!("{} {}", first, last),
        uuid: Uuid::new_v4().to_string(),
        hitpoints: 100,
        experience,
        level: Player::level_for(experience),
        coins: rng.gen_range(0..999),
        items: BTreeMap::new(),
    }
}
