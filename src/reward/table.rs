use std::collections::HashMap;

use rand::Rng;

use super::{RewardError, Weapon};

/// Weighted lookup over a fixed weapon catalog.
///
/// Read-only after `new`; share it behind an `Arc` across threads.
#[derive(Debug, Clone)]
pub struct RewardTable {
    weapons: Vec<Weapon>,
    /// `starts[i]` is the first draw owned by `weapons[i]`.
    starts: Vec<i64>,
    total: i64,
    by_name: HashMap<String, usize>,
}

impl RewardTable {
    /// Lay the catalog's rarity ranges end to end, in catalog order.
    pub fn new(catalog: Vec<Weapon>) -> Result<Self, RewardError> {
        if catalog.is_empty() {
            return Err(RewardError::EmptyCatalog);
        }

        let mut starts = Vec::with_capacity(catalog.len());
        let mut by_name = HashMap::with_capacity(catalog.len());
        let mut total: i64 = 0;

        for (index, weapon) in catalog.iter().enumerate() {
            if weapon.rarity <= 0 {
                return Err(RewardError::InvalidWeight {
                    name: weapon.name.clone(),
                    rarity: weapon.rarity,
                });
            }
            if by_name.insert(weapon.name.clone(), index).is_some() {
                return Err(RewardError::DuplicateWeapon(weapon.name.clone()));
            }
            starts.push(total);
            total += weapon.rarity;
        }

        Ok(RewardTable {
            weapons: catalog,
            starts,
            total,
            by_name,
        })
    }

    /// Sum of all rarity weights.
    pub fn total(&self) -> i64 {
        self.total
    }

    pub fn weapons(&self) -> &[Weapon] {
        &self.weapons
    }

    /// The weapon owning `draw`, or `None` when `draw` is outside `[0, total)`.
    pub fn pick(&self, draw: i64) -> Option<&Weapon> {
        if draw < 0 || draw >= self.total {
            return None;
        }
        Some(&self.weapons[self.slot(draw)])
    }

    /// Draw uniformly in `[0, total)` and return the owning weapon.
    pub fn pick_random<R: Rng + ?Sized>(&self, rng: &mut R) -> &Weapon {
        let draw = rng.gen_range(0..self.total);
        &self.weapons[self.slot(draw)]
    }

    /// Look a weapon up by name.
    pub fn weapon(&self, name: &str) -> Result<&Weapon, RewardError> {
        self.by_name
            .get(name)
            .map(|&index| &self.weapons[index])
            .ok_or_else(|| RewardError::UnknownWeapon(name.to_string()))
    }

    fn slot(&self, draw: i64) -> usize {
        self.starts
            .partition_point(|&start| start <= draw)
            .saturating_sub(1)
    }
}
