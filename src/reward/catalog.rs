use serde::{Deserialize, Serialize};

use crate::Document;

/// Catalog entry. Immutable once the reward table is built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Document)]
#[document(collection = "w")]
pub struct Weapon {
    #[document(id)]
    pub name: String,
    /// Selection weight; larger is more common.
    pub rarity: i64,
    pub hitpoints: i64,
}

impl Weapon {
    pub fn new(name: impl Into<String>, rarity: i64, hitpoints: i64) -> Self {
        Weapon {
            name: name.into(),
            rarity,
            hitpoints,
        }
    }
}

/// The built-in weapon catalog.
pub fn celtic_weapons() -> Vec<Weapon> {
    vec![
        Weapon::new("Javelin", 80, 1),
        Weapon::new("Harpoon", 40, 2),
        Weapon::new("Bow", 25, 5),
        Weapon::new("Sling", 100, 1),
        Weapon::new("Light Crossbow", 8, 8),
        Weapon::new("Spear", 30, 10),
        Weapon::new("Two-hand Hammer", 20, 6),
        Weapon::new("Sword", 10, 12),
        Weapon::new("Sword (two-sided)", 8, 15),
        Weapon::new("Long Sword", 6, 16),
        Weapon::new("Axe", 5, 22),
        Weapon::new("Claymore", 1, 25),
    ]
}
