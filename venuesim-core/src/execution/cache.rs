//! Read-only execution cache.
//!
//! The cache is owned outside the exchange (by the driver or execution
//! engine); the exchange only ever reads from it, looking up positions for
//! P&L and the position-closed check, and orders for diagnostics.

use crate::domain::ids::{ClientOrderId, PositionId};
use crate::domain::order::Order;
use crate::domain::position::Position;
use std::collections::HashMap;

/// Lookup of orders and positions by id. Implementations return snapshots.
pub trait ExecutionCache {
    fn position(&self, id: &PositionId) -> Option<Position>;

    fn order(&self, id: &ClientOrderId) -> Option<Order>;
}

/// Simple in-memory cache for drivers and tests.
#[derive(Debug, Default)]
pub struct MemoryExecutionCache {
    positions: HashMap<PositionId, Position>,
    orders: HashMap<ClientOrderId, Order>,
}

impl MemoryExecutionCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_position(&mut self, position: Position) {
        self.positions.insert(position.id.clone(), position);
    }

    pub fn position_mut(&mut self, id: &PositionId) -> Option<&mut Position> {
        self.positions.get_mut(id)
    }

    pub fn add_order(&mut self, order: Order) {
        self.orders.insert(order.cl_ord_id.clone(), order);
    }

    pub fn clear(&mut self) {
        self.positions.clear();
        self.orders.clear();
    }
}

impl ExecutionCache for MemoryExecutionCache {
    fn position(&self, id: &PositionId) -> Option<Position> {
        self.positions.get(id).cloned()
    }

    fn order(&self, id: &ClientOrderId) -> Option<Order> {
        self.orders.get(id).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ids::Symbol;
    use crate::domain::order::OrderSide;
    use rust_decimal_macros::dec;

    #[test]
    fn position_lookup_returns_snapshot() {
        let mut cache = MemoryExecutionCache::new();
        let id = PositionId::new("B-EURUSD-1");
        cache.add_position(Position::open(
            id.clone(),
            Symbol::new("EURUSD"),
            OrderSide::Buy,
            dec!(10000),
            dec!(1.1000),
        ));

        let snapshot = cache.position(&id).unwrap();
        assert_eq!(snapshot.quantity, dec!(10000));
        assert!(cache.position(&PositionId::new("B-EURUSD-9")).is_none());
    }

    #[test]
    fn clear_empties_both_tables() {
        let mut cache = MemoryExecutionCache::new();
        cache.add_position(Position::open(
            PositionId::new("B-EURUSD-1"),
            Symbol::new("EURUSD"),
            OrderSide::Buy,
            dec!(1),
            dec!(1.1),
        ));
        cache.clear();
        assert!(cache.position(&PositionId::new("B-EURUSD-1")).is_none());
    }
}
