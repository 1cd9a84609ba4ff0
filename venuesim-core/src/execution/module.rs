//! Simulation modules: per-tick plugins.
//!
//! Modules are registered in order and invoked in registration order with
//! every tick, before order matching. Typical uses are rollover interest,
//! funding payments, or synthetic data checks.

use crate::domain::tick::QuoteTick;
use chrono::{DateTime, Utc};

pub trait SimulationModule {
    fn process(&mut self, tick: &QuoteTick, now: DateTime<Utc>);

    /// Restore the module to its initial state on exchange reset.
    fn reset(&mut self);
}
