//! Transfers: ledgered money movement between customers.

use cas_economy::{
    transfer_record_exists, AbortReason, AmbiguityCause, DocumentsExt, Failure, Outcome,
    StoreError, TransferRecord,
};

use crate::support::{balance, customers, economy, Fault, FaultyStore};

#[test]
fn transfer_scenario_andy_pays_beth_eighty() {
    let store = customers(100, 100);
    let report = economy(store.clone()).transfer("andy", "beth", 80);

    let receipt = report.outcome.committed().cloned().unwrap();
    assert_eq!(balance(&store, "andy"), 20);
    assert_eq!(balance(&store, "beth"), 180);

    let record = store.documents::<TransferRecord>().get(&receipt.id).unwrap().data;
    assert_eq!(record.from, "andy");
    assert_eq!(record.to, "beth");
    assert_eq!(record.amount, 80);
    assert_eq!(record.kind, "Transfer");
}

#[test]
fn insufficient_funds_changes_nothing() {
    let store = customers(50, 100);
    let report = economy(store.clone()).transfer("andy", "beth", 80);

    assert_eq!(
        report.outcome.failure(),
        Some(&Failure::Aborted(AbortReason::InsufficientFunds {
            balance: 50,
            requested: 80,
        }))
    );
    assert_eq!(balance(&store, "andy"), 50);
    assert_eq!(balance(&store, "beth"), 100);
    assert!(store.documents::<TransferRecord>().ids().unwrap().is_empty());
}

#[test]
fn committed_transfers_conserve_money_and_leave_one_record_each() {
    let store = customers(100, 100);
    let economy = economy(store.clone());

    let mut committed = Vec::new();
    for _ in 0..5 {
        let report = economy.transfer("andy", "beth", 30);
        match report.outcome {
            Outcome::Committed(receipt) => committed.push(receipt.id),
            Outcome::Failed(Failure::Aborted(AbortReason::InsufficientFunds { .. })) => {}
            other => panic!("unexpected outcome {:?}", other),
        }
        assert_eq!(balance(&store, "andy") + balance(&store, "beth"), 200);
    }

    assert_eq!(committed.len(), 3);
    assert_eq!(balance(&store, "andy"), 10);
    let mut ids = store.documents::<TransferRecord>().ids().unwrap();
    ids.sort();
    committed.sort();
    assert_eq!(ids, committed);
}

#[test]
fn retried_transfer_writes_its_record_once() {
    let faulty = FaultyStore::new(customers(100, 100));
    // andy's debit fails after the record insert already landed
    faulty.fail_replace(1, Fault::Conflict);

    let report = economy(faulty.clone()).transfer_with_id("t-42", "andy", "beth", 80);

    assert!(report.outcome.is_committed());
    assert_eq!(report.attempts, 2);
    assert_eq!(
        faulty.documents::<TransferRecord>().ids().unwrap(),
        vec!["t-42".to_string()]
    );
    assert_eq!(balance(&faulty, "andy"), 20);
    assert_eq!(balance(&faulty, "beth"), 180);
}

#[test]
fn ambiguous_transfer_is_resolved_by_checking_the_ledger() {
    let faulty = FaultyStore::new(customers(100, 100));
    faulty.fail_replace(2, Fault::Timeout);

    let report = economy(faulty.clone()).transfer_with_id("t-7", "andy", "beth", 80);

    let ambiguity = match report.outcome {
        Outcome::CommitAmbiguous(ambiguity) => ambiguity,
        other => panic!("expected an ambiguous commit, got {:?}", other),
    };
    assert_eq!(ambiguity.key, "customer:beth");
    assert_eq!(ambiguity.applied, 2);
    assert_eq!(
        ambiguity.cause,
        AmbiguityCause::Store(StoreError::Timeout {
            key: "customer:beth".into()
        })
    );
    assert_eq!(report.attempts, 1);
    assert!(transfer_record_exists(&faulty, "t-7").unwrap());

    // a blind retry under the same id is refused at once and moves nothing
    let debited = balance(&faulty, "andy");
    let retry = economy(faulty.clone()).transfer_with_id("t-7", "andy", "beth", 80);
    assert_eq!(
        retry.outcome.failure(),
        Some(&Failure::Aborted(AbortReason::DuplicateTransfer("t-7".into())))
    );
    assert_eq!(retry.attempts, 1);
    assert_eq!(balance(&faulty, "andy"), debited);
}
