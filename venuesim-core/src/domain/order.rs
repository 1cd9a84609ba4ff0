//! Order variants, lifecycle state machine, and guarded transitions.
//!
//! `OrderType` is a tagged union over the supported variants; `OrderStatus`
//! is a separate enum. The pair (variant, status) is the phase of the state
//! machine, and every transition is a guarded method returning a `Result` so
//! the exchange can log and skip violations instead of corrupting state.

use crate::domain::ids::{ClientOrderId, Symbol, VenueOrderId};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderSide {
    Buy,
    Sell,
}

impl OrderSide {
    pub fn opposite(self) -> Self {
        match self {
            OrderSide::Buy => OrderSide::Sell,
            OrderSide::Sell => OrderSide::Buy,
        }
    }
}

/// Fill liquidity side: TAKER crosses the spread, MAKER rests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LiquiditySide {
    Maker,
    Taker,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimeInForce {
    /// Good till cancelled.
    Gtc,
    /// Good till date; requires `expire_time`.
    Gtd,
    /// Good for the trading day.
    Day,
}

/// Core order type taxonomy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum OrderType {
    /// Fill immediately at the current market.
    Market,
    /// Fill only at the limit price or better. Post-only limits must rest.
    Limit { price: Decimal, post_only: bool },
    /// Become a market order once the trigger price trades.
    StopMarket { trigger: Decimal },
}

/// Order lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderStatus {
    Initialized,
    Submitted,
    Accepted,
    Working,
    Filled,
    Cancelled,
    Rejected,
    Expired,
}

#[derive(Debug, Error)]
pub enum OrderError {
    #[error("invalid transition for order {id}: {from:?} -> {to:?}")]
    InvalidTransition {
        id: ClientOrderId,
        from: OrderStatus,
        to: OrderStatus,
    },
}

/// An order with full lifecycle tracking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub cl_ord_id: ClientOrderId,
    /// Venue id, assigned when the order is accepted.
    pub venue_order_id: Option<VenueOrderId>,
    pub symbol: Symbol,
    pub side: OrderSide,
    pub order_type: OrderType,
    pub quantity: Decimal,
    pub time_in_force: TimeInForce,
    pub expire_time: Option<DateTime<Utc>>,
    pub status: OrderStatus,
}

impl Order {
    pub fn market(
        cl_ord_id: ClientOrderId,
        symbol: Symbol,
        side: OrderSide,
        quantity: Decimal,
    ) -> Self {
        Self::new(cl_ord_id, symbol, side, OrderType::Market, quantity)
    }

    pub fn limit(
        cl_ord_id: ClientOrderId,
        symbol: Symbol,
        side: OrderSide,
        quantity: Decimal,
        price: Decimal,
        post_only: bool,
    ) -> Self {
        Self::new(
            cl_ord_id,
            symbol,
            side,
            OrderType::Limit { price, post_only },
            quantity,
        )
    }

    pub fn stop_market(
        cl_ord_id: ClientOrderId,
        symbol: Symbol,
        side: OrderSide,
        quantity: Decimal,
        trigger: Decimal,
    ) -> Self {
        Self::new(
            cl_ord_id,
            symbol,
            side,
            OrderType::StopMarket { trigger },
            quantity,
        )
    }

    fn new(
        cl_ord_id: ClientOrderId,
        symbol: Symbol,
        side: OrderSide,
        order_type: OrderType,
        quantity: Decimal,
    ) -> Self {
        Self {
            cl_ord_id,
            venue_order_id: None,
            symbol,
            side,
            order_type,
            quantity,
            time_in_force: TimeInForce::Gtc,
            expire_time: None,
            status: OrderStatus::Initialized,
        }
    }

    /// Make this a good-till-date order expiring at `expire_time`.
    pub fn with_expire_time(mut self, expire_time: DateTime<Utc>) -> Self {
        self.time_in_force = TimeInForce::Gtd;
        self.expire_time = Some(expire_time);
        self
    }

    /// Limit or trigger price; `None` for market orders.
    pub fn price(&self) -> Option<Decimal> {
        match &self.order_type {
            OrderType::Market => None,
            OrderType::Limit { price, .. } => Some(*price),
            OrderType::StopMarket { trigger } => Some(*trigger),
        }
    }

    pub fn is_post_only(&self) -> bool {
        matches!(self.order_type, OrderType::Limit { post_only: true, .. })
    }

    /// Replace the limit/trigger price. No-op for market orders.
    pub fn set_price(&mut self, new_price: Decimal) {
        match &mut self.order_type {
            OrderType::Market => {}
            OrderType::Limit { price, .. } => *price = new_price,
            OrderType::StopMarket { trigger } => *trigger = new_price,
        }
    }

    pub fn is_working(&self) -> bool {
        self.status == OrderStatus::Working
    }

    /// Terminal states: nothing further can happen to the order.
    pub fn is_completed(&self) -> bool {
        matches!(
            self.status,
            OrderStatus::Filled | OrderStatus::Cancelled | OrderStatus::Rejected | OrderStatus::Expired
        )
    }

    // ── Guarded transitions ────────────────────────────────────────────

    pub fn submit(&mut self) -> Result<(), OrderError> {
        self.transition(OrderStatus::Initialized, OrderStatus::Submitted)
    }

    pub fn accept(&mut self, venue_order_id: VenueOrderId) -> Result<(), OrderError> {
        self.transition(OrderStatus::Submitted, OrderStatus::Accepted)?;
        self.venue_order_id = Some(venue_order_id);
        Ok(())
    }

    pub fn work(&mut self) -> Result<(), OrderError> {
        self.transition(OrderStatus::Accepted, OrderStatus::Working)
    }

    /// Fill from Accepted (marketable at accept time) or Working.
    pub fn fill(&mut self) -> Result<(), OrderError> {
        match self.status {
            OrderStatus::Accepted | OrderStatus::Working => {
                self.status = OrderStatus::Filled;
                Ok(())
            }
            from => Err(OrderError::InvalidTransition {
                id: self.cl_ord_id.clone(),
                from,
                to: OrderStatus::Filled,
            }),
        }
    }

    pub fn cancel(&mut self) -> Result<(), OrderError> {
        match self.status {
            OrderStatus::Accepted | OrderStatus::Working => {
                self.status = OrderStatus::Cancelled;
                Ok(())
            }
            from => Err(OrderError::InvalidTransition {
                id: self.cl_ord_id.clone(),
                from,
                to: OrderStatus::Cancelled,
            }),
        }
    }

    pub fn reject(&mut self) -> Result<(), OrderError> {
        self.transition(OrderStatus::Submitted, OrderStatus::Rejected)
    }

    pub fn expire(&mut self) -> Result<(), OrderError> {
        self.transition(OrderStatus::Working, OrderStatus::Expired)
    }

    fn transition(&mut self, from: OrderStatus, to: OrderStatus) -> Result<(), OrderError> {
        if self.status != from {
            return Err(OrderError::InvalidTransition {
                id: self.cl_ord_id.clone(),
                from: self.status,
                to,
            });
        }
        self.status = to;
        Ok(())
    }
}
