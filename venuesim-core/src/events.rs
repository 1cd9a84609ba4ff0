//! Order lifecycle and account events.
//!
//! Events are the exchange's only output: every user-visible outcome, including
//! rule violations, is an event so the run produces one linear, replayable log.
//! Each event carries a fresh `EventId` and two timestamps (event time and
//! init time) which are both equal to the simulated clock in this engine.

use crate::domain::ids::{
    AccountId, ClientOrderId, ExecutionId, PositionId, StrategyId, Symbol, VenueOrderId,
};
use crate::domain::money::{Currency, Money};
use crate::domain::order::{LiquiditySide, OrderSide};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique event identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EventId(pub Uuid);

/// Source of event ids. The default draws random v4 UUIDs; deterministic
/// replays substitute a sequential source.
pub trait EventIdSource {
    fn next(&mut self) -> EventId;
}

#[derive(Debug, Default)]
pub struct RandomEventIds;

impl EventIdSource for RandomEventIds {
    fn next(&mut self) -> EventId {
        EventId(Uuid::new_v4())
    }
}

/// Sequential event ids for reproducible logs.
#[derive(Debug, Default)]
pub struct SequentialEventIds {
    count: u128,
}

impl EventIdSource for SequentialEventIds {
    fn next(&mut self) -> EventId {
        self.count += 1;
        EventId(Uuid::from_u128(self.count))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderSubmitted {
    pub account_id: AccountId,
    pub cl_ord_id: ClientOrderId,
    pub event_id: EventId,
    pub ts_event: DateTime<Utc>,
    pub ts_init: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderAccepted {
    pub account_id: AccountId,
    pub cl_ord_id: ClientOrderId,
    pub venue_order_id: VenueOrderId,
    pub event_id: EventId,
    pub ts_event: DateTime<Utc>,
    pub ts_init: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderRejected {
    pub account_id: AccountId,
    pub cl_ord_id: ClientOrderId,
    pub reason: String,
    pub event_id: EventId,
    pub ts_event: DateTime<Utc>,
    pub ts_init: DateTime<Utc>,
}

/// The order is resting on the simulated book.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderWorking {
    pub account_id: AccountId,
    pub cl_ord_id: ClientOrderId,
    pub venue_order_id: VenueOrderId,
    pub symbol: Symbol,
    pub side: OrderSide,
    pub quantity: Decimal,
    pub price: Decimal,
    pub expire_time: Option<DateTime<Utc>>,
    pub event_id: EventId,
    pub ts_event: DateTime<Utc>,
    pub ts_init: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderModified {
    pub account_id: AccountId,
    pub cl_ord_id: ClientOrderId,
    pub venue_order_id: VenueOrderId,
    pub quantity: Decimal,
    pub price: Decimal,
    pub event_id: EventId,
    pub ts_event: DateTime<Utc>,
    pub ts_init: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderCancelled {
    pub account_id: AccountId,
    pub cl_ord_id: ClientOrderId,
    pub venue_order_id: VenueOrderId,
    pub event_id: EventId,
    pub ts_event: DateTime<Utc>,
    pub ts_init: DateTime<Utc>,
}

/// A cancel or modify command could not be honored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderCancelReject {
    pub account_id: AccountId,
    pub cl_ord_id: ClientOrderId,
    /// Which command was rejected, e.g. `"cancel order"` or `"modify order"`.
    pub response: String,
    pub reason: String,
    pub event_id: EventId,
    pub ts_event: DateTime<Utc>,
    pub ts_init: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderExpired {
    pub account_id: AccountId,
    pub cl_ord_id: ClientOrderId,
    pub venue_order_id: VenueOrderId,
    pub event_id: EventId,
    pub ts_event: DateTime<Utc>,
    pub ts_init: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderFilled {
    pub account_id: AccountId,
    pub cl_ord_id: ClientOrderId,
    pub venue_order_id: VenueOrderId,
    pub execution_id: ExecutionId,
    pub position_id: PositionId,
    /// Routing placeholder; the exchange never assigns one.
    pub strategy_id: Option<StrategyId>,
    pub symbol: Symbol,
    pub side: OrderSide,
    pub filled_qty: Decimal,
    pub leaves_qty: Decimal,
    pub avg_price: Decimal,
    pub quote_currency: Currency,
    pub settlement_currency: Currency,
    pub is_inverse: bool,
    pub commission: Money,
    pub liquidity_side: LiquiditySide,
    pub event_id: EventId,
    pub ts_event: DateTime<Utc>,
    pub ts_init: DateTime<Utc>,
}

/// Snapshot of account balances after a fill (or at registration/reset).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountState {
    pub account_id: AccountId,
    pub currency: Currency,
    pub balance: Money,
    pub balance_start_day: Money,
    pub balance_activity_day: Money,
    pub total_commissions: Money,
    /// Margin placeholders: equal to balance in this simulation.
    pub margin_balance: Money,
    pub margin_available: Money,
    pub event_id: EventId,
    pub ts_event: DateTime<Utc>,
    pub ts_init: DateTime<Utc>,
}

/// Any order lifecycle event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum OrderEvent {
    Submitted(OrderSubmitted),
    Accepted(OrderAccepted),
    Rejected(OrderRejected),
    Working(OrderWorking),
    Modified(OrderModified),
    Cancelled(OrderCancelled),
    CancelReject(OrderCancelReject),
    Expired(OrderExpired),
    Filled(OrderFilled),
}

impl OrderEvent {
    /// The client order id the event refers to.
    pub fn cl_ord_id(&self) -> &ClientOrderId {
        match self {
            OrderEvent::Submitted(e) => &e.cl_ord_id,
            OrderEvent::Accepted(e) => &e.cl_ord_id,
            OrderEvent::Rejected(e) => &e.cl_ord_id,
            OrderEvent::Working(e) => &e.cl_ord_id,
            OrderEvent::Modified(e) => &e.cl_ord_id,
            OrderEvent::Cancelled(e) => &e.cl_ord_id,
            OrderEvent::CancelReject(e) => &e.cl_ord_id,
            OrderEvent::Expired(e) => &e.cl_ord_id,
            OrderEvent::Filled(e) => &e.cl_ord_id,
        }
    }

    pub fn ts_event(&self) -> DateTime<Utc> {
        match self {
            OrderEvent::Submitted(e) => e.ts_event,
            OrderEvent::Accepted(e) => e.ts_event,
            OrderEvent::Rejected(e) => e.ts_event,
            OrderEvent::Working(e) => e.ts_event,
            OrderEvent::Modified(e) => e.ts_event,
            OrderEvent::Cancelled(e) => e.ts_event,
            OrderEvent::CancelReject(e) => e.ts_event,
            OrderEvent::Expired(e) => e.ts_event,
            OrderEvent::Filled(e) => e.ts_event,
        }
    }
}
