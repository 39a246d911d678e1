//! Store failures during commit that are not plain conflicts.

use cas_economy::{AmbiguityCause, CancelToken, Failure, Outcome, StoreError};

use crate::support::{economy, get_player, trading_pair, Fault, FaultyStore};

#[test]
fn refused_first_write_fails_cleanly() {
    let faulty = FaultyStore::new(trading_pair());
    faulty.fail_replace(1, Fault::Unavailable);

    let report = economy(faulty.clone()).trade_with_pick("a", "b", 0);

    assert_eq!(
        report.outcome.failure(),
        Some(&Failure::Store(StoreError::Storage("node unavailable".into())))
    );
    assert_eq!(get_player(&faulty, "a").coins, 100);
    assert_eq!(get_player(&faulty, "b").coins, 50);
}

#[test]
fn timeout_on_first_write_is_ambiguous() {
    let faulty = FaultyStore::new(trading_pair());
    faulty.fail_replace(1, Fault::Timeout);

    let report = economy(faulty.clone()).trade_with_pick("a", "b", 0);

    match report.outcome {
        Outcome::CommitAmbiguous(ambiguity) => {
            assert_eq!(ambiguity.key, "u:a");
            assert_eq!(ambiguity.applied, 0);
        }
        other => panic!("expected an ambiguous commit, got {:?}", other),
    }
    assert_eq!(faulty.replace_calls(), 1);
}

#[test]
fn failure_after_a_write_landed_is_ambiguous_and_not_retried() {
    let faulty = FaultyStore::new(trading_pair());
    faulty.fail_replace(2, Fault::Unavailable);

    let report = economy(faulty.clone()).trade_with_pick("a", "b", 0);

    assert!(matches!(
        report.outcome,
        Outcome::CommitAmbiguous(ref ambiguity)
            if ambiguity.applied == 1 && matches!(ambiguity.cause, AmbiguityCause::Store(_))
    ));
    assert_eq!(report.attempts, 1);
    // the buyer's side landed and the seller's did not: callers must re-read
    assert_eq!(get_player(&faulty, "a").coins, 90);
    assert_eq!(get_player(&faulty, "b").coins, 50);
}

#[test]
fn failed_rollback_is_ambiguous() {
    let faulty = FaultyStore::new(trading_pair());
    faulty.fail_replace(2, Fault::Conflict);
    faulty.fail_replace(3, Fault::Unavailable);

    let report = economy(faulty.clone()).trade_with_pick("a", "b", 0);

    match report.outcome {
        Outcome::CommitAmbiguous(ambiguity) => {
            assert_eq!(ambiguity.key, "u:a");
            assert!(matches!(ambiguity.cause, AmbiguityCause::CompensationFailed(_)));
        }
        other => panic!("expected an ambiguous commit, got {:?}", other),
    }
}

#[test]
fn conflicts_on_every_attempt_exhaust_the_budget() {
    let faulty = FaultyStore::new(trading_pair());
    for call in 1..=5 {
        faulty.fail_replace(call, Fault::Conflict);
    }

    let report = economy(faulty.clone()).trade_with_pick("a", "b", 0);

    assert_eq!(
        report.outcome.failure(),
        Some(&Failure::ContentionExhausted { attempts: 5 })
    );
    assert_eq!(report.attempts, 5);
    assert_eq!(get_player(&faulty, "a").coins, 100);
}

#[test]
fn cancel_mid_commit_rolls_back_the_landed_write() {
    let faulty = FaultyStore::new(trading_pair());
    let cancel = CancelToken::new();
    faulty.cancel_during_replace(1, &cancel);

    let report = economy(faulty.clone()).trade_with_cancel("a", "b", 0, &cancel);

    assert_eq!(report.outcome.failure(), Some(&Failure::Cancelled));
    assert_eq!(report.attempts, 1);
    // buyer write, seller write skipped, buyer restored
    assert_eq!(faulty.replace_calls(), 2);

    let a = get_player(&faulty, "a");
    let b = get_player(&faulty, "b");
    assert_eq!(a.coins + b.coins, 150);
    assert_eq!((a.coins, b.coins), (100, 50));
    assert_eq!(a.item_count("Sword") + b.item_count("Sword"), 2);
    assert_eq!(b.item_count("Sword"), 2);
}

#[test]
fn cancel_with_failed_rollback_is_ambiguous() {
    let faulty = FaultyStore::new(trading_pair());
    let cancel = CancelToken::new();
    faulty.cancel_during_replace(1, &cancel);
    faulty.fail_replace(2, Fault::Unavailable);

    let report = economy(faulty.clone()).trade_with_cancel("a", "b", 0, &cancel);

    match report.outcome {
        Outcome::CommitAmbiguous(ambiguity) => {
            assert_eq!(ambiguity.key, "u:a");
            assert_eq!(ambiguity.applied, 1);
            assert!(matches!(ambiguity.cause, AmbiguityCause::CompensationFailed(_)));
        }
        other => panic!("expected an ambiguous commit, got {:?}", other),
    }
}

#[test]
fn cancel_before_commit_touches_nothing() {
    let faulty = FaultyStore::new(trading_pair());
    let cancel = CancelToken::new();
    cancel.cancel();

    let report = economy(faulty.clone()).trade_with_cancel("a", "b", 0, &cancel);

    assert_eq!(report.outcome.failure(), Some(&Failure::Cancelled));
    assert_eq!(faulty.replace_calls(), 0);
    assert_eq!(get_player(&faulty, "a").coins, 100);
}
