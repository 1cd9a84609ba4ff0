//! Top-of-book quote ticks.

use crate::domain::ids::Symbol;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Which side of the book a price is read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PriceType {
    Bid,
    Ask,
    Mid,
}

/// A top-of-book quote update. The engine only ever reads bid and ask.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuoteTick {
    pub symbol: Symbol,
    pub bid: Decimal,
    pub ask: Decimal,
    pub timestamp: DateTime<Utc>,
}

impl QuoteTick {
    pub fn new(symbol: Symbol, bid: Decimal, ask: Decimal, timestamp: DateTime<Utc>) -> Self {
        debug_assert!(bid <= ask, "crossed quote: bid {bid} > ask {ask}");
        Self {
            symbol,
            bid,
            ask,
            timestamp,
        }
    }

    pub fn extract(&self, price_type: PriceType) -> Decimal {
        match price_type {
            PriceType::Bid => self.bid,
            PriceType::Ask => self.ask,
            PriceType::Mid => (self.bid + self.ask) / Decimal::TWO,
        }
    }
}
