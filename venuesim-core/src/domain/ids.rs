//! Identifier newtypes and the per-symbol allocator.
//!
//! Position and order identifiers are minted per symbol as dense monotonic
//! sequences (`B-EURUSD-1`, `B-EURUSD-2`, …); execution identifiers form a
//! single global sequence (`E-1`, `E-2`, …). The allocator owns all counters
//! so a `reset` restores the exchange to a freshly constructed id space.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Instrument symbol as a plain concatenated code, e.g. `EURUSD`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Symbol(pub String);

impl Symbol {
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    pub fn code(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

macro_rules! string_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(pub String);

        impl $name {
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

string_id!(
    /// Client-assigned order identifier, unique per order for the whole run.
    ClientOrderId
);
string_id!(
    /// Venue-assigned order identifier, minted when an order is accepted.
    VenueOrderId
);
string_id!(
    /// Position identifier, minted per symbol.
    PositionId
);
string_id!(
    /// Execution (fill) identifier, minted globally.
    ExecutionId
);
string_id!(
    /// Account identifier, supplied by the execution client.
    AccountId
);
string_id!(
    /// Strategy identifier. The exchange itself never assigns one; fill
    /// events carry an optional placeholder for downstream routing.
    StrategyId
);

/// Mints venue order, position, and execution identifiers.
///
/// Sequences are dense (`1, 2, 3, …`), monotonic, and scoped: per symbol for
/// orders and positions, global for executions.
#[derive(Debug, Default, Clone)]
pub struct IdAllocator {
    symbol_pos_count: HashMap<Symbol, u64>,
    symbol_ord_count: HashMap<Symbol, u64>,
    executions_count: u64,
}

impl IdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Next position id for the symbol: `B-<code>-<n>`.
    pub fn position_id(&mut self, symbol: &Symbol) -> PositionId {
        let count = self.symbol_pos_count.entry(symbol.clone()).or_insert(0);
        *count += 1;
        PositionId(format!("B-{}-{}", symbol.code(), count))
    }

    /// Next venue order id for the symbol: `B-<code>-<n>`.
    pub fn order_id(&mut self, symbol: &Symbol) -> VenueOrderId {
        let count = self.symbol_ord_count.entry(symbol.clone()).or_insert(0);
        *count += 1;
        VenueOrderId(format!("B-{}-{}", symbol.code(), count))
    }

    /// Next global execution id: `E-<n>`.
    pub fn execution_id(&mut self) -> ExecutionId {
        self.executions_count += 1;
        ExecutionId(format!("E-{}", self.executions_count))
    }

    pub fn executions_count(&self) -> u64 {
        self.executions_count
    }

    /// Drop all counters, returning the allocator to its initial state.
    pub fn reset(&mut self) {
        self.symbol_pos_count.clear();
        self.symbol_ord_count.clear();
        self.executions_count = 0;
    }
}
