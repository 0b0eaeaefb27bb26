//! The engine's single debounced signal source.
//!
//! Resize and mutation signals for all containers land here; the batch is
//! released once no new signal has arrived for a full window (trailing edge).

use std::collections::BTreeSet;
use std::time::{Duration, Instant};

use crate::dom::NodeId;

/// Signals released together when the window closes.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Batch {
    /// Containers to re-measure, in document-handle order.
    pub containers: Vec<NodeId>,
    /// Whether a page scan was requested (DOM mutation, viewport reset).
    pub rescan: bool,
}

#[derive(Debug)]
pub struct Debouncer {
    window: Duration,
    deadline: Option<Instant>,
    dirty: BTreeSet<NodeId>,
    rescan: bool,
}

impl Debouncer {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            deadline: None,
            dirty: BTreeSet::new(),
            rescan: false,
        }
    }

    pub fn signal(&mut self, container: NodeId, now: Instant) {
        self.dirty.insert(container);
        self.deadline = Some(now + self.window);
    }

    pub fn signal_rescan(&mut self, now: Instant) {
        self.rescan = true;
        self.deadline = Some(now + self.window);
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    /// Release the batch if its window has closed.
    pub fn take_due(&mut self, now: Instant) -> Option<Batch> {
        match self.deadline {
            Some(d) if d <= now => {
                self.deadline = None;
                Some(Batch {
                    containers: std::mem::take(&mut self.dirty).into_iter().collect(),
                    rescan: std::mem::take(&mut self.rescan),
                })
            }
            _ => None,
        }
    }
}
