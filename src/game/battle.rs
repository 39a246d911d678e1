//! Battle - best-effort combat over two independent documents.
//!
//! A battle touches one player and one monster with plain CAS writes. Lost
//! races are logged and dropped; combat happens often enough that a missed
//! point of damage or experience heals itself.

use std::ops::Range;
use std::time::{Duration, Instant};

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{Economy, Monster, Player};
use crate::mutator::WriteStatus;
use crate::store::{StoreError, VersionedStore};
use crate::transaction::OutcomeTag;

/// What happens to a monster whose hitpoints reach zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeathPolicy {
    /// Reset hitpoints to a fresh random value; the monster stays in play.
    #[default]
    Respawn,
    /// Delete the monster and grant the killer its `experience_when_killed`.
    Remove,
}

/// How a surviving monster's hitpoint loss is written.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HitpointWrite {
    /// CAS replace of the monster read at the start of the battle.
    #[default]
    Replace,
    /// Atomic counter decrement. Never conflicts.
    Increment,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BattleConfig {
    pub on_death: DeathPolicy,
    /// Hitpoints given to a respawned monster.
    pub respawn_hitpoints: Range<i64>,
    pub hitpoint_write: HitpointWrite,
}

impl Default for BattleConfig {
    fn default() -> Self {
        BattleConfig {
            on_death: DeathPolicy::Respawn,
            respawn_hitpoints: 10..100,
            hitpoint_write: HitpointWrite::Replace,
        }
    }
}

/// Result of one battle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BattleReport {
    pub victory: bool,
    /// This battle's monster write won the kill.
    pub slain: bool,
    /// Weapon added to the player's inventory.
    pub reward: Option<String>,
    pub player_write: WriteStatus,
    pub monster_write: WriteStatus,
    pub elapsed: Duration,
}

impl BattleReport {
    /// `Committed` when every write landed, `Failed("conflict-dropped")` otherwise.
    pub fn tag(&self) -> OutcomeTag {
        if self.player_write.is_dropped() || self.monster_write.is_dropped() {
            OutcomeTag::Failed("conflict-dropped")
        } else {
            OutcomeTag::Committed
        }
    }
}

impl<S: VersionedStore + Clone> Economy<S> {
    /// One round of combat between a player and a monster.
    ///
    /// The coin flip is fair and ignores stats. On a win the monster loses one
    /// hitpoint (floored at zero) and the player gains one experience; a win
    /// that leaves the monster at zero is a kill, even if it was already at
    /// zero when read. On a loss the player loses one experience, floored at
    /// zero.
    ///
    /// The kill is decided by the monster's CAS write. Only the contender
    /// whose write lands collects the reward, and reward plus respawn land in
    /// that single write.
    pub fn battle<R: Rng + ?Sized>(
        &self,
        player_id: &str,
        monster_id: &str,
        rng: &mut R,
    ) -> Result<BattleReport, StoreError> {
        let started = Instant::now();
        let mutator = self.mutator();

        let mut player = mutator.read::<Player>(player_id)?;
        let mut monster = mutator.read::<Monster>(monster_id)?;

        if !rng.gen_bool(0.5) {
            player.data.add_experience(-1);
            let player_write = mutator.write(&player)?;
            debug!(player = player_id, monster = monster_id, "player lost the battle");
            return Ok(BattleReport {
                victory: false,
                slain: false,
                reward: None,
                player_write,
                monster_write: WriteStatus::Skipped,
                elapsed: started.elapsed(),
            });
        }

        let config = self.battle_config();
        let remaining = (monster.data.hitpoints - 1).max(0);
        player.data.add_experience(1);

        if remaining > 0 {
            let monster_write = match config.hitpoint_write {
                HitpointWrite::Replace => {
                    monster.data.hitpoints = remaining;
                    mutator.write(&monster)?
                }
                HitpointWrite::Increment => {
                    mutator.adjust::<Monster>(monster_id, "hitpoints", -1)?
                }
            };
            let player_write = mutator.write(&player)?;
            debug!(
                player = player_id,
                monster = monster_id,
                hitpoints = remaining,
                "player hit the monster"
            );
            return Ok(BattleReport {
                victory: true,
                slain: false,
                reward: None,
                player_write,
                monster_write,
                elapsed: started.elapsed(),
            });
        }

        let reward = self.rewards().pick_random(rng).name.clone();
        let monster_write = match config.on_death {
            DeathPolicy::Respawn => {
                monster.data.hitpoints = respawn_hitpoints(&config.respawn_hitpoints, rng);
                mutator.write(&monster)?
            }
            DeathPolicy::Remove => mutator.remove_if_unchanged(&monster)?,
        };

        let slain = !monster_write.is_dropped();
        if slain {
            player.data.add_item(&reward);
            if config.on_death == DeathPolicy::Remove {
                player.data.add_experience(monster.data.experience_when_killed);
            }
        }
        let player_write = mutator.write(&player)?;

        debug!(
            player = player_id,
            monster = monster_id,
            slain,
            reward = %reward,
            "player defeated the monster"
        );

        Ok(BattleReport {
            victory: true,
            slain,
            reward: slain.then_some(reward),
            player_write,
            monster_write,
            elapsed: started.elapsed(),
        })
    }
}

fn respawn_hitpoints<R: Rng + ?Sized>(range: &Range<i64>, rng: &mut R) -> i64 {
    if range.is_empty() {
        range.start.max(0)
    } else {
        rng.gen_range(range.clone())
    }
}
