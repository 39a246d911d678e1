//! Documents of the game economy.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::Document;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Document)]
#[document(collection = "u")]
pub struct Player {
    pub id: String,
    pub name: String,
    /// Identity token; two handles with the same uuid are the same person.
    pub uuid: String,
    pub hitpoints: i64,
    pub experience: i64,
    /// Always `experience / 100`; kept in step by [`Player::add_experience`].
    #[serde(default)]
    pub level: i64,
    pub coins: i64,
    /// Weapon name to count. Counts are always positive; an item that runs
    /// out is removed.
    #[serde(default)]
    pub items: BTreeMap<String, i64>,
}

impl Player {
    pub const EXPERIENCE_PER_LEVEL: i64 = 100;

    pub fn level_for(experience: i64) -> i64 {
        experience / Self::EXPERIENCE_PER_LEVEL
    }

    /// Change experience by `delta`, floored at zero, and recompute the level.
    pub fn add_experience(&mut self, delta: i64) {
        self.experience = (self.experience + delta).max(0);
        self.level = Self::level_for(self.experience);
    }

    pub fn item_count(&self, item: &str) -> i64 {
        self.items.get(item).copied().unwrap_or(0)
    }

    pub fn add_item(&mut self, item: &str) {
        *self.items.entry(item.to_string()).or_insert(0) += 1;
    }

    /// Take one of `item` away. Returns false if the player has none.
    pub fn remove_item(&mut self, item: &str) -> bool {
        match self.items.get_mut(item) {
            Some(count) if *count > 1 => {
                *count -= 1;
                true
            }
            Some(_) => {
                self.items.remove(item);
                true
            }
            None => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Document)]
#[document(collection = "m")]
pub struct Monster {
    pub id: String,
    pub name: String,
    pub hitpoints: i64,
    /// Experience granted to whoever removes this monster from play.
    #[serde(default = "default_experience_when_killed")]
    pub experience_when_killed: i64,
}

impl Monster {
    pub const DEFAULT_EXPERIENCE_WHEN_KILLED: i64 = 91;

    /// A monster keyed by its name.
    pub fn new(name: &str, hitpoints: i64) -> Self {
        Monster {
            id: name.to_string(),
            name: name.to_string(),
            hitpoints,
            experience_when_killed: Self::DEFAULT_EXPERIENCE_WHEN_KILLED,
        }
    }
}

fn default_experience_when_killed() -> i64 {
    Monster::DEFAULT_EXPERIENCE_WHEN_KILLED
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Document)]
#[document(collection = "customer")]
pub struct Customer {
    pub id: String,
    pub name: String,
    pub balance: i64,
}

/// Ledger entry written once by a committed transfer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Document)]
#[document(collection = "transfer")]
pub struct TransferRecord {
    pub id: String,
    pub from: String,
    pub to: String,
    pub amount: i64,
    #[serde(rename = "type")]
    pub kind: String,
}

impl TransferRecord {
    pub const KIND: &'static str = "Transfer";

    pub fn new(id: impl Into<String>, from: &str, to: &str, amount: i64) -> Self {
        TransferRecord {
            id: id.into(),
            from: from.to_string(),
            to: to.to_string(),
            amount,
            kind: Self::KIND.to_string(),
        }
    }
}
