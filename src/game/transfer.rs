use serde::{Deserialize, Serialize};
use tracing::trace;
use uuid::Uuid;

use super::{Customer, Economy, TransferRecord};
use crate::store::{DocumentsExt, StoreError, VersionedStore};
use crate::transaction::{AbortReason, TransactionReport};

/// Balances after a committed transfer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferReceipt {
    /// Id of the [`TransferRecord`] written with the transfer.
    pub id: String,
    pub from: String,
    pub to: String,
    pub amount: i64,
    pub from_balance: i64,
    pub to_balance: i64,
}

impl<S: VersionedStore + Clone> Economy<S> {
    /// Move `amount` between two customers and ledger it with a
    /// [`TransferRecord`] under a fresh id.
    pub fn transfer(&self, from: &str, to: &str, amount: i64) -> TransactionReport<TransferReceipt> {
        self.transfer_with_id(&Uuid::new_v4().to_string(), from, to, amount)
    }

    /// Like [`transfer`](Self::transfer) with a caller-chosen record id.
    ///
    /// The record is staged with the balance changes, so it exists exactly
    /// when the transfer committed. After a `CommitAmbiguous` outcome, check
    /// with [`transfer_record_exists`] before trying again. Reusing the id of
    /// a committed transfer aborts with [`AbortReason::DuplicateTransfer`]
    /// on the first attempt and moves no money.
    pub fn transfer_with_id(
        &self,
        id: &str,
        from: &str,
        to: &str,
        amount: i64,
    ) -> TransactionReport<TransferReceipt> {
        self.coordinator().run(|ctx| {
            if from == to {
                return ctx.abort(AbortReason::SelfTransfer);
            }
            if amount <= 0 {
                return ctx.abort(AbortReason::InvalidAmount(amount));
            }

            if ctx.exists::<TransferRecord>(id)? {
                return ctx.abort(AbortReason::DuplicateTransfer(id.to_string()));
            }

            let payer = ctx.get::<Customer>(from)?;
            let payee = ctx.get::<Customer>(to)?;

            ctx.insert(&TransferRecord::new(id, from, to, amount))?;

            let balance = payer.content().balance;
            if balance < amount {
                return ctx.abort(AbortReason::InsufficientFunds {
                    balance,
                    requested: amount,
                });
            }

            let mut debited = payer.content().clone();
            debited.balance -= amount;
            let mut credited = payee.content().clone();
            credited.balance += amount;

            ctx.replace(&payer, &debited)?;
            ctx.replace(&payee, &credited)?;

            trace!(attempt = ctx.attempt(), %id, amount, "transfer staged");
            Ok(TransferReceipt {
                id: id.to_string(),
                from: from.to_string(),
                to: to.to_string(),
                amount,
                from_balance: debited.balance,
                to_balance: credited.balance,
            })
        })
    }
}

/// Whether the ledger holds a record with this id.
pub fn transfer_record_exists<S>(store: &S, id: &str) -> Result<bool, StoreError>
where
    S: VersionedStore + ?Sized,
{
    Ok(store.documents::<TransferRecord>().find(id)?.is_some())
}
