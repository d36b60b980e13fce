// Rolling two-slot window over aggregate totals and the display rate
// derived from it.

use std::collections::VecDeque;

/// One aggregate-total observation (cumulative counter sum at a tick).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Observation {
    pub value: f64,
    pub timestamp_ms: i64,
}

/// Keeps the most recent two observations; older entries are dropped as
/// soon as a third arrives.
#[derive(Debug, Clone, Default)]
pub struct ThroughputWindow {
    slots: VecDeque<Observation>,
}

const WINDOW_SIZE: usize = 2;

impl ThroughputWindow {
    pub fn new() -> Self {
        ThroughputWindow {
            slots: VecDeque::with_capacity(WINDOW_SIZE),
        }
    }

    pub fn push(&mut self, value: f64, timestamp_ms: i64) {
        if self.slots.len() == WINDOW_SIZE {
            self.slots.pop_front();
        }
        self.slots.push_back(Observation {
            value,
            timestamp_ms,
        });
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn latest(&self) -> Option<Observation> {
        self.slots.back().copied()
    }

    /// Two-point average rate over the window: `(last - first) / (2 * (n - 1))`.
    /// The normalization is load-bearing; the axis-scale heuristics downstream
    /// assume it.
    ///
    /// Returns 0 until two observations exist, and while either endpoint is
    /// exactly 0 (counter not yet warmed up rather than a legitimate zero).
    /// A counter reset is not detected; the clamp under-reports for one
    /// window and the rate recovers on the next.
    pub fn rate(&self) -> f64 {
        if self.slots.len() < WINDOW_SIZE {
            return 0.0;
        }
        let first = self.slots[0].value;
        let last = self.slots[self.slots.len() - 1].value;
        if first == 0.0 || last == 0.0 {
            return 0.0;
        }
        let rate = (last - first) / (2.0 * (self.slots.len() - 1) as f64);
        rate.max(0.0)
    }
}
