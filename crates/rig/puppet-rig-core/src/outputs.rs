//! Output contracts from the expression manager.
//!
//! Outputs carry the semantic events of one update plus whether any
//! expression contributed to the model this tick.

use serde::{Deserialize, Serialize};

use crate::ids::EntryId;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum ExpressionEvent {
    Started { entry: EntryId, name: String },
    Finished { entry: EntryId, name: String },
    /// Dropped because a newer expression finished fading in.
    Superseded {
        entry: EntryId,
        name: String,
        by: EntryId,
    },
}

/// Outputs returned by `ExpressionManager::update()`.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Outputs {
    #[serde(default)]
    pub events: Vec<ExpressionEvent>,
    /// True when at least one expression contributed this tick.
    #[serde(default)]
    pub applied: bool,
    /// Events discarded because of `max_events_per_tick`.
    #[serde(default)]
    pub dropped_events: usize,
}

impl Outputs {
    #[inline]
    pub fn clear(&mut self) {
        self.events.clear();
        self.applied = false;
        self.dropped_events = 0;
    }

    #[inline]
    pub fn push_event(&mut self, event: ExpressionEvent, cap: usize) {
        if self.events.len() < cap {
            self.events.push(event);
        } else {
            self.dropped_events += 1;
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty() && !self.applied
    }
}
