//! Position — an open holding referenced by the exchange through the
//! execution cache.
//!
//! The exchange never mutates positions; it reads the entry side, the average
//! open price, and the closed flag, and asks for realized P&L points. The
//! netting model here is what an execution engine downstream of the event
//! stream maintains: same-side fills increase the position, opposite-side
//! fills flatten it.

use crate::domain::ids::{PositionId, Symbol};
use crate::domain::order::OrderSide;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub id: PositionId,
    pub symbol: Symbol,
    /// Side of the opening fill.
    pub entry: OrderSide,
    /// Currently open quantity (never negative; zero means closed).
    pub quantity: Decimal,
    pub avg_open_price: Decimal,
}

impl Position {
    pub fn open(
        id: PositionId,
        symbol: Symbol,
        entry: OrderSide,
        quantity: Decimal,
        price: Decimal,
    ) -> Self {
        Self {
            id,
            symbol,
            entry,
            quantity,
            avg_open_price: price,
        }
    }

    pub fn is_closed(&self) -> bool {
        self.quantity.is_zero()
    }

    /// Net a fill into the position.
    ///
    /// Entry-side fills add quantity and reblend the average open price;
    /// opposite-side fills reduce the open quantity, clamped at zero.
    pub fn apply_fill(&mut self, side: OrderSide, quantity: Decimal, price: Decimal) {
        if side == self.entry {
            let total = self.quantity + quantity;
            if !total.is_zero() {
                self.avg_open_price =
                    (self.avg_open_price * self.quantity + price * quantity) / total;
            }
            self.quantity = total;
        } else {
            self.quantity = (self.quantity - quantity).max(Decimal::ZERO);
        }
    }

    /// Realized P&L points for closing `quantity` at `avg_close`, signed by
    /// the entry direction. Returned in quote-currency units.
    pub fn calculate_pnl(&self, avg_open: Decimal, avg_close: Decimal, quantity: Decimal) -> Decimal {
        match self.entry {
            OrderSide::Buy => (avg_close - avg_open) * quantity,
            OrderSide::Sell => (avg_open - avg_close) * quantity,
        }
    }
}
