//! Store wrapper that injects faults into chosen `replace` calls.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use cas_economy::{
    celtic_weapons, CancelToken, Customer, DocumentsExt, Economy, InMemoryStore, Player,
    RawDocument, RewardTable, StoreError, TransactionConfig, Version, VersionedStore,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    /// Behave as if another writer got there first.
    Conflict,
    /// The request was sent but no answer came back.
    Timeout,
    /// The store refused the request outright.
    Unavailable,
}

/// Counts `replace` calls (1-based) and fails the ones with a planned fault.
/// A faulted call never reaches the inner store.
pub struct FaultyStore {
    inner: InMemoryStore,
    replaces: AtomicUsize,
    faults: Mutex<HashMap<usize, Fault>>,
    cancels: Mutex<HashMap<usize, CancelToken>>,
}

impl FaultyStore {
    pub fn new(inner: InMemoryStore) -> Arc<Self> {
        Arc::new(FaultyStore {
            inner,
            replaces: AtomicUsize::new(0),
            faults: Mutex::new(HashMap::new()),
            cancels: Mutex::new(HashMap::new()),
        })
    }

    pub fn fail_replace(&self, call: usize, fault: Fault) {
        self.faults.lock().unwrap().insert(call, fault);
    }

    /// Fire `token` while replace call `call` is in flight. The call itself
    /// still goes ahead.
    pub fn cancel_during_replace(&self, call: usize, token: &CancelToken) {
        self.cancels.lock().unwrap().insert(call, token.clone());
    }

    pub fn replace_calls(&self) -> usize {
        self.replaces.load(Ordering::SeqCst)
    }
}

impl VersionedStore for FaultyStore {
    fn get(&self, key: &str) -> Result<RawDocument, StoreError> {
        self.inner.get(key)
    }

    fn insert(&self, key: &str, bytes: Vec<u8>) -> Result<Version, StoreError> {
        self.inner.insert(key, bytes)
    }

    fn upsert(&self, key: &str, bytes: Vec<u8>) -> Result<Version, StoreError> {
        self.inner.upsert(key, bytes)
    }

    fn replace(
        &self,
        key: &str,
        bytes: Vec<u8>,
        expected: Version,
    ) -> Result<Version, StoreError> {
        let call = self.replaces.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some(token) = self.cancels.lock().unwrap().remove(&call) {
            token.cancel();
        }
        let fault = self.faults.lock().unwrap().remove(&call);
        match fault {
            Some(Fault::Conflict) => Err(StoreError::VersionConflict {
                key: key.to_string(),
                expected,
                actual: Version::new(expected.value() + 1),
            }),
            Some(Fault::Timeout) => Err(StoreError::Timeout {
                key: key.to_string(),
            }),
            Some(Fault::Unavailable) => Err(StoreError::Storage("node unavailable".into())),
            None => self.inner.replace(key, bytes, expected),
        }
    }

    fn remove(&self, key: &str, expected: Version) -> Result<(), StoreError> {
        self.inner.remove(key, expected)
    }

    fn increment_field(&self, key: &str, field: &str, delta: i64) -> Result<i64, StoreError> {
        self.inner.increment_field(key, field, delta)
    }

    fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>, StoreError> {
        self.inner.keys_with_prefix(prefix)
    }
}

pub fn economy<S: VersionedStore + Clone>(store: S) -> Economy<S> {
    let rewards = Arc::new(RewardTable::new(celtic_weapons()).unwrap());
    Economy::new(store, rewards).with_transaction_config(TransactionConfig {
        max_attempts: 5,
        backoff_min: Duration::ZERO,
        backoff_max: Duration::from_millis(2),
    })
}

pub fn player(id: &str, coins: i64, items: &[(&str, i64)]) -> Player {
    Player {
        id: id.to_string(),
        name: id.to_string(),
        uuid: format!("uuid-{}", id),
        hitpoints: 100,
        experience: 0,
        level: 0,
        coins,
        items: items.iter().map(|(n, c)| (n.to_string(), *c)).collect(),
    }
}

/// Player A (100 coins, no items) and player B (50 coins, two swords).
pub fn trading_pair() -> InMemoryStore {
    let store = InMemoryStore::new();
    store.documents::<Player>().insert(&player("a", 100, &[])).unwrap();
    store
        .documents::<Player>()
        .insert(&player("b", 50, &[("Sword", 2)]))
        .unwrap();
    store
}

pub fn customers(andy: i64, beth: i64) -> InMemoryStore {
    let store = InMemoryStore::new();
    for (id, balance) in [("andy", andy), ("beth", beth)] {
        store
            .documents::<Customer>()
            .insert(&Customer {
                id: id.to_string(),
                name: id.to_string(),
                balance,
            })
            .unwrap();
    }
    store
}

pub fn get_player<S: VersionedStore>(store: &S, id: &str) -> Player {
    store.documents::<Player>().get(id).unwrap().data
}

pub fn balance<S: VersionedStore>(store: &S, id: &str) -> i64 {
    store.documents::<Customer>().get(id).unwrap().data.balance
}
