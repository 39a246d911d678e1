use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::trace;

use super::{Economy, Player};
use crate::store::VersionedStore;
use crate::transaction::{AbortReason, CancelToken, TransactionReport};

/// What a committed trade moved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeReceipt {
    pub buyer: String,
    pub seller: String,
    pub item: String,
    pub price: i64,
}

impl<S: VersionedStore + Clone> Economy<S> {
    /// Buyer pays the seller for one randomly chosen item from the seller's
    /// inventory. Both players change together or not at all.
    pub fn trade<R: Rng + ?Sized>(
        &self,
        buyer_id: &str,
        seller_id: &str,
        rng: &mut R,
    ) -> TransactionReport<TradeReceipt> {
        let pick: usize = rng.gen();
        self.trade_with_pick(buyer_id, seller_id, pick)
    }

    /// Like [`trade`](Self::trade) with the random draw supplied.
    ///
    /// The item is `pick % n` into the seller's item names in sorted order,
    /// so every retry of the transaction chooses the same way.
    pub fn trade_with_pick(
        &self,
        buyer_id: &str,
        seller_id: &str,
        pick: usize,
    ) -> TransactionReport<TradeReceipt> {
        self.trade_with_cancel(buyer_id, seller_id, pick, &CancelToken::new())
    }

    /// Like [`trade_with_pick`](Self::trade_with_pick), stopping early once
    /// `cancel` fires. A cancelled trade leaves both players untouched unless
    /// the outcome is `CommitAmbiguous`.
    pub fn trade_with_cancel(
        &self,
        buyer_id: &str,
        seller_id: &str,
        pick: usize,
        cancel: &CancelToken,
    ) -> TransactionReport<TradeReceipt> {
        let rewards = self.rewards();

        self.coordinator().run_with_cancel(cancel, |ctx| {
            let buyer = ctx.get::<Player>(buyer_id)?;
            let seller = ctx.get::<Player>(seller_id)?;

            if buyer.content().uuid == seller.content().uuid {
                return ctx.abort(AbortReason::SelfTrade);
            }

            let stock = &seller.content().items;
            let item = match stock.keys().nth(pick % stock.len().max(1)) {
                Some(item) => item.clone(),
                None => return ctx.abort(AbortReason::NoStock),
            };
            if seller.content().item_count(&item) < 1 {
                return ctx.abort(AbortReason::NoStock);
            }

            let rarity = rewards.weapon(&item)?.rarity;
            let price = buyer.content().coins / rarity;
            if price < 1 {
                return ctx.abort(AbortReason::InsufficientCoins);
            }

            let mut next_buyer = buyer.content().clone();
            next_buyer.coins -= price;
            next_buyer.add_item(&item);

            let mut next_seller = seller.content().clone();
            next_seller.coins += price;
            next_seller.remove_item(&item);

            ctx.replace(&buyer, &next_buyer)?;
            ctx.replace(&seller, &next_seller)?;

            trace!(attempt = ctx.attempt(), %item, price, "trade staged");
            Ok(TradeReceipt {
                buyer: buyer_id.to_string(),
                seller: seller_id.to_string(),
                item,
                price,
            })
        })
    }
}
