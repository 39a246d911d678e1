use rand::seq::SliceRandom;
use rand::Rng;

use super::{Monster, Player};
use crate::store::{DocumentsExt, StoreError, VersionedStore};

/// Read-only snapshot of who can take part in battles and trades.
///
/// Build it once, share it behind an `Arc`, and call [`Roster::load`] again
/// to pick up documents created since.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Roster {
    players: Vec<String>,
    monsters: Vec<String>,
}

impl Roster {
    pub fn new(mut players: Vec<String>, mut monsters: Vec<String>) -> Self {
        players.sort();
        players.dedup();
        monsters.sort();
        monsters.dedup();
        Roster { players, monsters }
    }

    /// List every player and monster id currently in the store.
    pub fn load<S: VersionedStore + ?Sized>(store: &S) -> Result<Self, StoreError> {
        let players = store.documents::<Player>().ids()?;
        let monsters = store.documents::<Monster>().ids()?;
        Ok(Roster::new(players, monsters))
    }

    pub fn players(&self) -> &[String] {
        &self.players
    }

    pub fn monsters(&self) -> &[String] {
        &self.monsters
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty() || self.monsters.is_empty()
    }

    pub fn random_player<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<&str> {
        self.players.choose(rng).map(String::as_str)
    }

    pub fn random_monster<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<&str> {
        self.monsters.choose(rng).map(String::as_str)
    }
}
