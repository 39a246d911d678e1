use thiserror::Error;

use crate::reward::RewardError;
use crate::store::StoreError;

/// Business-rule reasons a transaction body gives up.
///
/// Retrying would not change the answer without new input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AbortReason {
    #[error("cannot trade with self")]
    SelfTrade,

    #[error("seller has nothing in stock")]
    NoStock,

    #[error("buyer cannot afford the item")]
    InsufficientCoins,

    #[error("insufficient funds: balance {balance}, requested {requested}")]
    InsufficientFunds { balance: i64, requested: i64 },

    #[error("cannot transfer to the same account")]
    SelfTransfer,

    #[error("invalid amount {0}")]
    InvalidAmount(i64),

    #[error("unknown weapon {0}")]
    UnknownWeapon(String),

    #[error("transfer {0} is already recorded")]
    DuplicateTransfer(String),

    #[error("{0}")]
    Other(String),
}

impl AbortReason {
    /// Stable label for logs and metrics.
    pub fn label(&self) -> &'static str {
        match self {
            AbortReason::SelfTrade => "self-trade",
            AbortReason::NoStock => "no-stock",
            AbortReason::InsufficientCoins => "insufficient-coins",
            AbortReason::InsufficientFunds { .. } => "insufficient-funds",
            AbortReason::SelfTransfer => "self-transfer",
            AbortReason::InvalidAmount(_) => "invalid-amount",
            AbortReason::UnknownWeapon(_) => "unknown-weapon",
            AbortReason::DuplicateTransfer(_) => "duplicate-transfer",
            AbortReason::Other(_) => "aborted",
        }
    }
}

/// Errors a transaction body returns to the coordinator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransactionError {
    #[error("transaction aborted: {0}")]
    Aborted(AbortReason),

    #[error("document not found: {key}")]
    NotFound { key: String },

    #[error(transparent)]
    Store(StoreError),
}

impl From<StoreError> for TransactionError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { key } => TransactionError::NotFound { key },
            other => TransactionError::Store(other),
        }
    }
}

impl From<AbortReason> for TransactionError {
    fn from(reason: AbortReason) -> Self {
        TransactionError::Aborted(reason)
    }
}

impl From<RewardError> for TransactionError {
    fn from(err: RewardError) -> Self {
        match err {
            RewardError::UnknownWeapon(name) => {
                TransactionError::Aborted(AbortReason::UnknownWeapon(name))
            }
            other => TransactionError::Aborted(AbortReason::Other(other.to_string())),
        }
    }
}
