//! Hit - transactional combat with variable damage.
//!
//! Unlike [`battle`](Economy::battle), a hit never drops a write: the damage
//! to the monster and the experience for a kill land together or not at all.

use serde::{Deserialize, Serialize};
use tracing::trace;

use super::{Economy, Monster, Player};
use crate::store::VersionedStore;
use crate::transaction::{AbortReason, TransactionReport};

/// State after a committed hit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HitReceipt {
    pub player: String,
    pub monster: String,
    pub damage: i64,
    /// The monster's hitpoints reached zero and it was removed.
    pub killed: bool,
    /// Hitpoints left; zero after a kill.
    pub monster_hitpoints: i64,
    pub experience: i64,
    pub level: i64,
}

impl<S: VersionedStore + Clone> Economy<S> {
    /// Player hits monster for `damage` points.
    ///
    /// A surviving monster is replaced with its reduced hitpoints and the
    /// player is left alone. A monster brought to zero or below is removed and
    /// the player gains the monster's `experience_when_killed`, with the level
    /// recomputed. Two players landing the killing blow at once cannot both
    /// collect: the loser re-reads, finds no monster and fails with
    /// `MissingEntity`.
    pub fn hit(
        &self,
        player_id: &str,
        monster_id: &str,
        damage: i64,
    ) -> TransactionReport<HitReceipt> {
        self.coordinator().run(|ctx| {
            if damage < 0 {
                return ctx.abort(AbortReason::InvalidAmount(damage));
            }

            let monster = ctx.get::<Monster>(monster_id)?;
            let player = ctx.get::<Player>(player_id)?;

            let remaining = monster.content().hitpoints - damage;
            trace!(
                attempt = ctx.attempt(),
                player = player_id,
                monster = monster_id,
                damage,
                remaining,
                "hit staged"
            );

            if remaining > 0 {
                let mut damaged = monster.content().clone();
                damaged.hitpoints = remaining;
                ctx.replace(&monster, &damaged)?;

                return Ok(HitReceipt {
                    player: player_id.to_string(),
                    monster: monster_id.to_string(),
                    damage,
                    killed: false,
                    monster_hitpoints: remaining,
                    experience: player.content().experience,
                    level: player.content().level,
                });
            }

            let mut victor = player.content().clone();
            victor.add_experience(monster.content().experience_when_killed);
            ctx.remove(&monster)?;
            ctx.replace(&player, &victor)?;

            Ok(HitReceipt {
                player: player_id.to_string(),
                monster: monster_id.to_string(),
                damage,
                killed: true,
                monster_hitpoints: 0,
                experience: victor.experience,
                level: victor.level,
            })
        })
    }
}
