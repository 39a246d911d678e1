//! Reward table - weighted weapon selection over a fixed catalog.
//!
//! Each weapon owns a half-open slice `[start, start + rarity)` of the
//! integer line `[0, total)`. A uniform draw on that line picks a weapon with
//! probability `rarity / total`.

mod catalog;
mod table;

use thiserror::Error;

pub use catalog::{celtic_weapons, Weapon};
pub use table::RewardTable;

/// Errors building or querying a [`RewardTable`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RewardError {
    #[error("requested a nonexistent weapon: {0}")]
    UnknownWeapon(String),

    #[error("weapon {name} has invalid rarity {rarity}; rarity must be positive")]
    InvalidWeight { name: String, rarity: i64 },

    #[error("weapon {0} appears more than once in the catalog")]
    DuplicateWeapon(String),

    #[error("weapon catalog is empty")]
    EmptyCatalog,
}
