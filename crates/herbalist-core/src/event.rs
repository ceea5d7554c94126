//! Station events and the per-station ring buffer observers read from.
//!
//! Every successful mutation pushes at least one event followed by a
//! [`StationEvent::Synced`] snapshot. Long-running phases also push a
//! snapshot every sync interval.

use crate::fixed::Ticks;
use crate::id::{KindId, RecipeId};
use crate::station::{Phase, StationView};

// ---------------------------------------------------------------------------
// Event types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum StationEvent {
    PhaseChanged {
        from: Phase,
        to: Phase,
    },
    MaterialAdded {
        kind: KindId,
        count: u32,
    },
    MaterialTaken {
        kind: KindId,
        count: u32,
    },
    HerbAdded {
        kind: KindId,
        count: u32,
    },
    HeatChanged {
        has_heat: bool,
    },
    CraftingStarted {
        recipe: RecipeId,
        total_ticks: Ticks,
    },
    CraftingFinished {
        output: KindId,
        count: u32,
    },
    OutputExtracted {
        kind: KindId,
        count: u32,
    },
    /// The station was emptied. `returned` is the number of stacks handed back.
    Reset {
        returned: usize,
    },
    /// One-way snapshot push for observers.
    Synced(StationView),
}

impl StationEvent {
    pub fn is_sync(&self) -> bool {
        matches!(self, StationEvent::Synced(_))
    }
}

// ---------------------------------------------------------------------------
// Ring buffer
// ---------------------------------------------------------------------------

/// Fixed-capacity ring of recent station events.
#[derive(Debug)]
pub struct EventBuffer {
    /// Pre-allocated storage.
    events: Vec<Option<StationEvent>>,
    /// Write position (wraps around).
    head: usize,
    len: usize,
    /// Total events ever written (including dropped).
    total_written: u64,
}

impl EventBuffer {
    /// Create a new ring buffer with the given capacity.
    /// A capacity of 0 is clamped to 1.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            events: (0..capacity).map(|_| None).collect(),
            head: 0,
            len: 0,
            total_written: 0,
        }
    }

    /// Push an event. If full, the oldest event is dropped.
    pub fn push(&mut self, event: StationEvent) {
        self.events[self.head] = Some(event);
        self.head = (self.head + 1) % self.capacity();
        if self.len < self.capacity() {
            self.len += 1;
        }
        self.total_written += 1;
    }

    pub fn capacity(&self) -> usize {
        self.events.len()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn total_written(&self) -> u64 {
        self.total_written
    }

    /// Number of events that were dropped because the buffer was full.
    pub fn dropped_count(&self) -> u64 {
        self.total_written.saturating_sub(self.capacity() as u64)
    }

    /// Iterate from oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = &StationEvent> {
        let start = if self.len < self.capacity() { 0 } else { self.head };
        let cap = self.capacity();
        (0..self.len).filter_map(move |i| self.events[(start + i) % cap].as_ref())
    }

    /// The most recent snapshot, if any is still buffered.
    pub fn last_view(&self) -> Option<&StationView> {
        self.iter()
            .filter_map(|e| match e {
                StationEvent::Synced(view) => Some(view),
                _ => None,
            })
            .last()
    }

    /// Remove and return all buffered events, oldest first.
    pub fn drain(&mut self) -> Vec<StationEvent> {
        let start = if self.len < self.capacity() { 0 } else { self.head };
        let cap = self.capacity();
        let out = (0..self.len)
            .filter_map(|i| self.events[(start + i) % cap].take())
            .collect();
        self.head = 0;
        self.len = 0;
        out
    }

    pub fn clear(&mut self) {
        for slot in &mut self.events {
            *slot = None;
        }
        self.head = 0;
        self.len = 0;
    }
}
