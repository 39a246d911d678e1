use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use serde::Serialize;
use tracing::warn;

use super::{OperationKind, OutcomeSink};
use crate::transaction::OutcomeTag;

/// Upper bounds, in microseconds, of the latency buckets. Anything slower
/// lands in a final overflow bucket.
pub const LATENCY_BUCKETS_US: [u64; 14] = [
    250, 375, 500, 1_000, 2_500, 5_000, 10_000, 25_000, 50_000, 100_000, 200_000, 400_000,
    1_000_000, 2_000_000,
];

const BUCKETS: usize = LATENCY_BUCKETS_US.len() + 1;

/// In-process counters and latency histograms, per operation kind.
pub struct Metrics {
    outcomes: Mutex<HashMap<(OperationKind, OutcomeTag), u64>>,
    latency: [[AtomicU64; BUCKETS]; OperationKind::ALL.len()],
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Metrics {
    pub fn new() -> Self {
        Metrics {
            outcomes: Mutex::new(HashMap::new()),
            latency: std::array::from_fn(|_| std::array::from_fn(|_| AtomicU64::new(0))),
        }
    }

    /// How many `kind` operations ended with `outcome`.
    pub fn count(&self, kind: OperationKind, outcome: OutcomeTag) -> u64 {
        self.outcomes
            .lock()
            .map(|outcomes| outcomes.get(&(kind, outcome)).copied().unwrap_or(0))
            .unwrap_or(0)
    }

    /// How many `kind` operations were recorded.
    pub fn total(&self, kind: OperationKind) -> u64 {
        self.latency[kind.index()]
            .iter()
            .map(|bucket| bucket.load(Ordering::Relaxed))
            .sum()
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let mut snapshot = MetricsSnapshot::default();

        if let Ok(outcomes) = self.outcomes.lock() {
            for ((kind, tag), count) in outcomes.iter() {
                snapshot
                    .outcomes
                    .entry(kind.label().to_string())
                    .or_default()
                    .insert(tag.to_string(), *count);
            }
        }

        for kind in OperationKind::ALL {
            let buckets: Vec<u64> = self.latency[kind.index()]
                .iter()
                .map(|bucket| bucket.load(Ordering::Relaxed))
                .collect();
            if buckets.iter().any(|&count| count > 0) {
                snapshot.latency_us.insert(kind.label().to_string(), buckets);
            }
        }

        snapshot
    }

    fn bucket(elapsed: Duration) -> usize {
        let micros = elapsed.as_micros().min(u64::MAX as u128) as u64;
        LATENCY_BUCKETS_US.partition_point(|&bound| bound < micros)
    }
}

impl OutcomeSink for Metrics {
    fn record(&self, kind: OperationKind, outcome: OutcomeTag, elapsed: Duration) {
        self.latency[kind.index()][Self::bucket(elapsed)].fetch_add(1, Ordering::Relaxed);

        match self.outcomes.lock() {
            Ok(mut outcomes) => *outcomes.entry((kind, outcome)).or_insert(0) += 1,
            Err(_) => warn!(operation = %kind, "metrics lock poisoned, outcome not counted"),
        }
    }
}

/// Point-in-time copy of [`Metrics`], ready to print.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    /// Operation label to outcome label to count.
    pub outcomes: BTreeMap<String, BTreeMap<String, u64>>,
    /// Operation label to bucket counts, aligned with [`LATENCY_BUCKETS_US`]
    /// plus one overflow bucket.
    pub latency_us: BTreeMap<String, Vec<u64>>,
}
