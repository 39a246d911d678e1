//! Runner configuration, read from TOML.
//!
//! Every field has a default, so an empty file (or no file) is a valid
//! configuration:
//!
//! ```toml
//! [store]
//! flush = true
//!
//! [transactions]
//! max_attempts = 5
//! backoff_min_ms = 1
//! backoff_max_ms = 50
//! iterations = 1000
//! workers = 4
//!
//! [battle]
//! on_death = "respawn"      # or "remove"
//! respawn_min = 10
//! respawn_max = 100
//! hitpoint_write = "replace" # or "increment"
//! battles_per_trade = 6
//!
//! [transfer]
//! amount = 80
//!
//! [seed]
//! players = 5000
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::game::{BattleConfig, DeathPolicy, HitpointWrite};
use crate::transaction::TransactionConfig;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write config file {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulationConfig {
    #[serde(default)]
    pub store: StoreSection,
    #[serde(default)]
    pub transactions: TransactionSection,
    #[serde(default)]
    pub battle: BattleSection,
    #[serde(default)]
    pub transfer: TransferSection,
    #[serde(default)]
    pub seed: SeedSection,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreSection {
    /// Empty the store before seeding.
    #[serde(default = "default_flush")]
    pub flush: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionSection {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_backoff_min_ms")]
    pub backoff_min_ms: u64,
    #[serde(default = "default_backoff_max_ms")]
    pub backoff_max_ms: u64,
    /// Simulation loop iterations per worker.
    #[serde(default = "default_iterations")]
    pub iterations: usize,
    #[serde(default = "default_workers")]
    pub workers: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BattleSection {
    #[serde(default)]
    pub on_death: DeathPolicy,
    #[serde(default = "default_respawn_min")]
    pub respawn_min: i64,
    #[serde(default = "default_respawn_max")]
    pub respawn_max: i64,
    #[serde(default)]
    pub hitpoint_write: HitpointWrite,
    #[serde(default = "default_battles_per_trade")]
    pub battles_per_trade: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferSection {
    #[serde(default = "default_transfer_amount")]
    pub amount: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeedSection {
    /// Players to create, counting the sentinel.
    #[serde(default = "default_players")]
    pub players: usize,
}

fn default_flush() -> bool {
    true
}

fn default_max_attempts() -> u32 {
    5
}

fn default_backoff_min_ms() -> u64 {
    1
}

fn default_backoff_max_ms() -> u64 {
    50
}

fn default_iterations() -> usize {
    1000
}

fn default_workers() -> usize {
    4
}

fn default_respawn_min() -> i64 {
    10
}

fn default_respawn_max() -> i64 {
    100
}

fn default_battles_per_trade() -> usize {
    6
}

fn default_transfer_amount() -> i64 {
    80
}

fn default_players() -> usize {
    5000
}

impl Default for StoreSection {
    fn default() -> Self {
        Self {
            flush: default_flush(),
        }
    }
}

impl Default for TransactionSection {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            backoff_min_ms: default_backoff_min_ms(),
            backoff_max_ms: default_backoff_max_ms(),
            iterations: default_iterations(),
            workers: default_workers(),
        }
    }
}

impl Default for BattleSection {
    fn default() -> Self {
        Self {
            on_death: DeathPolicy::default(),
            respawn_min: default_respawn_min(),
            respawn_max: default_respawn_max(),
            hitpoint_write: HitpointWrite::default(),
            battles_per_trade: default_battles_per_trade(),
        }
    }
}

impl Default for TransferSection {
    fn default() -> Self {
        Self {
            amount: default_transfer_amount(),
        }
    }
}

impl Default for SeedSection {
    fn default() -> Self {
        Self {
            players: default_players(),
        }
    }
}

impl SimulationConfig {
    /// Read and validate a config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: SimulationConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Write the default configuration to `path`.
    pub fn write_default(path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let content = toml::to_string_pretty(&SimulationConfig::default())?;
        fs::write(path, content).map_err(|source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let tx = &self.transactions;
        if tx.max_attempts == 0 {
            return Err(ConfigError::Invalid(
                "transactions.max_attempts must be at least 1".into(),
            ));
        }
        if tx.backoff_min_ms > tx.backoff_max_ms {
            return Err(ConfigError::Invalid(format!(
                "transactions.backoff_min_ms ({}) exceeds backoff_max_ms ({})",
                tx.backoff_min_ms, tx.backoff_max_ms
            )));
        }
        if tx.workers == 0 {
            return Err(ConfigError::Invalid("transactions.workers must be at least 1".into()));
        }

        let battle = &self.battle;
        if battle.respawn_min < 0 || battle.respawn_min >= battle.respawn_max {
            return Err(ConfigError::Invalid(format!(
                "battle respawn range {}..{} is empty or negative",
                battle.respawn_min, battle.respawn_max
            )));
        }

        if self.transfer.amount <= 0 {
            return Err(ConfigError::Invalid("transfer.amount must be positive".into()));
        }
        if self.seed.players == 0 {
            return Err(ConfigError::Invalid("seed.players must be at least 1".into()));
        }
        Ok(())
    }

    pub fn transaction_config(&self) -> TransactionConfig {
        TransactionConfig {
            max_attempts: self.transactions.max_attempts,
            backoff_min: Duration::from_millis(self.transactions.backoff_min_ms),
            backoff_max: Duration::from_millis(self.transactions.backoff_max_ms),
        }
    }

    pub fn battle_config(&self) -> BattleConfig {
        BattleConfig {
            on_death: self.battle.on_death,
            respawn_hitpoints: self.battle.respawn_min..self.battle.respawn_max,
            hitpoint_write: self.battle.hitpoint_write,
        }
    }
}
