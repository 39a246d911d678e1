//! Outcome reporting.
//!
//! Domain operations stay silent about metrics. Whoever drives them hands each
//! finished operation's [`OutcomeTag`] and latency to an [`OutcomeSink`].

#[cfg(feature = "emitter")]
mod emitter;
mod metrics;

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::transaction::OutcomeTag;

#[cfg(feature = "emitter")]
pub use emitter::{EmitterSink, OutcomeEvent};
pub use metrics::{Metrics, MetricsSnapshot, LATENCY_BUCKETS_US};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationKind {
    Battle,
    Hit,
    Trade,
    Transfer,
}

impl OperationKind {
    pub const ALL: [OperationKind; 4] = [
        OperationKind::Battle,
        OperationKind::Hit,
        OperationKind::Trade,
        OperationKind::Transfer,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            OperationKind::Battle => "battle",
            OperationKind::Hit => "hit",
            OperationKind::Trade => "trade",
            OperationKind::Transfer => "transfer",
        }
    }

    fn index(&self) -> usize {
        match self {
            OperationKind::Battle => 0,
            OperationKind::Hit => 1,
            OperationKind::Trade => 2,
            OperationKind::Transfer => 3,
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Receives one call per completed operation. Must not block for long.
pub trait OutcomeSink: Send + Sync {
    fn record(&self, kind: OperationKind, outcome: OutcomeTag, elapsed: Duration);
}

impl<T: OutcomeSink + ?Sized> OutcomeSink for Arc<T> {
    fn record(&self, kind: OperationKind, outcome: OutcomeTag, elapsed: Duration) {
        (**self).record(kind, outcome, elapsed)
    }
}

impl<T: OutcomeSink + ?Sized> OutcomeSink for &T {
    fn record(&self, kind: OperationKind, outcome: OutcomeTag, elapsed: Duration) {
        (**self).record(kind, outcome, elapsed)
    }
}

/// Discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSink;

impl OutcomeSink for NoopSink {
    fn record(&self, _kind: OperationKind, _outcome: OutcomeTag, _elapsed: Duration) {}
}

/// Logs each outcome as a structured event.
///
/// Committed operations log at `debug`, failures at `info` and ambiguous
/// commits at `warn`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl OutcomeSink for TracingSink {
    fn record(&self, kind: OperationKind, outcome: OutcomeTag, elapsed: Duration) {
        let elapsed_us = elapsed.as_micros() as u64;
        match outcome {
            OutcomeTag::Committed => {
                debug!(operation = %kind, outcome = %outcome, elapsed_us, "operation finished")
            }
            OutcomeTag::Failed(_) => {
                info!(operation = %kind, outcome = %outcome, elapsed_us, "operation finished")
            }
            OutcomeTag::CommitAmbiguous => {
                warn!(operation = %kind, outcome = %outcome, elapsed_us, "operation finished")
            }
        }
    }
}

/// Forwards every outcome to each inner sink in turn.
#[derive(Default)]
pub struct FanoutSink {
    sinks: Vec<Box<dyn OutcomeSink>>,
}

impl FanoutSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, sink: impl OutcomeSink + 'static) -> Self {
        self.sinks.push(Box::new(sink));
        self
    }
}

impl OutcomeSink for FanoutSink {
    fn record(&self, kind: OperationKind, outcome: OutcomeTag, elapsed: Duration) {
        for sink in &self.sinks {
            sink.record(kind, outcome, elapsed);
        }
    }
}
