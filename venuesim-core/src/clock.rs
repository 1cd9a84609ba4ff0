//! Simulated clock.
//!
//! There is no real-time behavior anywhere in the core: the clock only moves
//! when a tick arrives, which keeps every backtest replayable.

use chrono::{DateTime, Utc};

/// A clock advanced explicitly by incoming market data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimClock {
    now: DateTime<Utc>,
}

impl SimClock {
    pub fn new() -> Self {
        Self {
            now: DateTime::UNIX_EPOCH,
        }
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.now
    }

    /// Advance to `time`. Ticks are assumed monotonic; a backwards move is
    /// logged by the caller, not here.
    pub fn set_time(&mut self, time: DateTime<Utc>) {
        self.now = time;
    }

    pub fn reset(&mut self) {
        self.now = DateTime::UNIX_EPOCH;
    }
}

impl Default for SimClock {
    fn default() -> Self {
        Self::new()
    }
}
