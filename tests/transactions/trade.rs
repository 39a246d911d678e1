//! Trades: the two-player item-for-coins swap.

use cas_economy::{DocumentsExt, Outcome, Player, TradeReceipt};

use crate::support::{economy, get_player, trading_pair, Fault, FaultyStore};

fn totals(players: &[Player], item: &str) -> (i64, i64) {
    (
        players.iter().map(|p| p.coins).sum(),
        players.iter().map(|p| p.item_count(item)).sum(),
    )
}

#[test]
fn trade_scenario_sword_for_ten_coins() {
    let store = trading_pair();
    let report = economy(store.clone()).trade_with_pick("a", "b", 0);

    assert_eq!(report.attempts, 1);
    assert_eq!(
        report.outcome,
        Outcome::Committed(TradeReceipt {
            buyer: "a".into(),
            seller: "b".into(),
            item: "Sword".into(),
            price: 10,
        })
    );

    let a = get_player(&store, "a");
    let b = get_player(&store, "b");
    assert_eq!(a.coins, 90);
    assert_eq!(a.items.get("Sword"), Some(&1));
    assert_eq!(b.coins, 60);
    assert_eq!(b.items.get("Sword"), Some(&1));
}

#[test]
fn committed_trades_conserve_coins_and_items() {
    let store = trading_pair();
    let economy = economy(store.clone());
    let before = totals(&[get_player(&store, "a"), get_player(&store, "b")], "Sword");

    let mut committed = 0;
    for pick in 0..6 {
        let (buyer, seller) = if pick % 2 == 0 { ("a", "b") } else { ("b", "a") };
        if economy.trade_with_pick(buyer, seller, pick).outcome.is_committed() {
            committed += 1;
        }
        let now = totals(&[get_player(&store, "a"), get_player(&store, "b")], "Sword");
        assert_eq!(now, before);
    }
    assert!(committed > 0);
}

#[test]
fn conflict_on_first_commit_lands_the_same_state_as_a_clean_run() {
    let clean = trading_pair();
    let clean_report = economy(clean.clone()).trade_with_pick("a", "b", 0);
    assert!(clean_report.outcome.is_committed());

    let faulty = FaultyStore::new(trading_pair());
    // the seller's write, after the buyer's already landed
    faulty.fail_replace(2, Fault::Conflict);
    let report = economy(faulty.clone()).trade_with_pick("a", "b", 0);

    assert_eq!(report.attempts, 2);
    assert_eq!(report.outcome, clean_report.outcome);
    // buyer, seller (conflict), buyer rolled back, then buyer and seller again
    assert_eq!(faulty.replace_calls(), 5);
    for id in ["a", "b"] {
        assert_eq!(get_player(&faulty, id), get_player(&clean, id));
    }
}

#[test]
fn conflict_before_any_write_just_retries() {
    let faulty = FaultyStore::new(trading_pair());
    faulty.fail_replace(1, Fault::Conflict);
    let report = economy(faulty.clone()).trade_with_pick("a", "b", 0);

    assert!(report.outcome.is_committed());
    assert_eq!(report.attempts, 2);
    assert_eq!(faulty.replace_calls(), 3);
    assert_eq!(get_player(&faulty, "a").coins, 90);
}

#[test]
fn self_trade_by_shared_identity_is_refused() {
    let store = trading_pair();
    let mut alias = get_player(&store, "b");
    alias.id = "b-alt".into();
    store.documents::<Player>().insert(&alias).unwrap();

    let report = economy(store.clone()).trade_with_pick("b-alt", "b", 0);
    assert_eq!(report.outcome.tag().reason(), Some("self-trade"));
    assert_eq!(get_player(&store, "b").items.get("Sword"), Some(&2));
}
