//! Decoupled event bus for research progress.
//!
//! The pipeline emits events via [`EventBus::emit`]; the CLI subscribes via
//! [`EventBus::subscribe`] to drive its spinner. Built on
//! [`tokio::sync::broadcast`] so multiple listeners can react independently.

use tokio::sync::broadcast;

/// Milestones of a research run.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// Asking the model to rank the case index.
    Ranking { top_n: usize },
    /// Ranking finished with these case ids.
    Ranked { case_ids: Vec<String> },
    /// Starting on case `index` (1-based) of `total`.
    Summarizing {
        index: usize,
        total: usize,
        case_id: String,
    },
    /// A ranked id had no case file.
    Skipped { case_id: String },
    /// Waiting on the final report.
    Writing,
    /// Report written to disk.
    Finished,
}

/// A broadcast channel that any component can emit to or subscribe from.
#[derive(Debug)]
pub struct EventBus {
    tx: broadcast::Sender<Event>,
}

impl EventBus {
    /// Create a new event bus with the given channel capacity.
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Emit an event to all current subscribers.
    /// Returns the number of receivers that will see it.
    pub fn emit(&self, event: Event) -> usize {
        self.tx.send(event).unwrap_or(0)
    }

    /// Subscribe to events. Returns a receiver that yields all
    /// future events (does not replay past ones).
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.tx.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(64)
    }
}
