use std::sync::Mutex;
use std::time::Duration;

use event_emitter_rs::EventEmitter;
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::{OperationKind, OutcomeSink};
use crate::transaction::OutcomeTag;

/// JSON payload emitted for each outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutcomeEvent {
    pub operation: OperationKind,
    pub outcome: String,
    pub reason: Option<String>,
    pub elapsed_us: u64,
}

/// Publishes outcomes to in-process listeners through an [`EventEmitter`].
///
/// Events are named after the operation (`"battle"`, `"trade"`,
/// `"transfer"`) and carry an [`OutcomeEvent`] as a JSON string. Listeners
/// run on the emitter's own threads.
///
/// ```ignore
/// let sink = EmitterSink::new();
/// sink.on("trade", |payload| println!("{}", payload));
/// ```
pub struct EmitterSink {
    emitter: Mutex<EventEmitter>,
}

impl Default for EmitterSink {
    fn default() -> Self {
        Self::new()
    }
}

impl EmitterSink {
    pub fn new() -> Self {
        Self::with_emitter(EventEmitter::new())
    }

    pub fn with_emitter(emitter: EventEmitter) -> Self {
        EmitterSink {
            emitter: Mutex::new(emitter),
        }
    }

    /// Register a listener for one operation kind's events.
    pub fn on<F>(&self, event: &str, listener: F)
    where
        F: Fn(String) + Send + Sync + 'static,
    {
        match self.emitter.lock() {
            Ok(mut emitter) => {
                emitter.on(event, listener);
            }
            Err(_) => warn!(event, "emitter lock poisoned, listener not registered"),
        }
    }
}

impl OutcomeSink for EmitterSink {
    fn record(&self, kind: OperationKind, outcome: OutcomeTag, elapsed: Duration) {
        let event = OutcomeEvent {
            operation: kind,
            outcome: outcome.label().to_string(),
            reason: outcome.reason().map(str::to_string),
            elapsed_us: elapsed.as_micros() as u64,
        };
        let payload = match serde_json::to_string(&event) {
            Ok(payload) => payload,
            Err(err) => {
                warn!(error = %err, "could not encode outcome event");
                return;
            }
        };

        match self.emitter.lock() {
            Ok(mut emitter) => {
                emitter.emit(kind.label(), payload);
            }
            Err(_) => warn!(operation = %kind, "emitter lock poisoned, outcome dropped"),
        }
    }
}
