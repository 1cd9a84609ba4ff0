//! Shared fixtures for the exchange integration tests.
//!
//! `RecordingClient` plays the downstream execution engine: it records every
//! event and maintains positions in the shared cache so the exchange's
//! position-closed check sees realistic state.

#![allow(dead_code)]

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::cell::RefCell;
use std::rc::Rc;
use venuesim_core::commands::{BracketOrder, CancelOrder, ModifyOrder, SubmitBracketOrder, SubmitOrder};
use venuesim_core::domain::{
    AccountId, ClientOrderId, Currency, Instrument, Money, Order, OrderSide, Position, QuoteTick,
    Symbol,
};
use venuesim_core::events::{AccountState, OrderEvent, OrderFilled};
use venuesim_core::exchange::{ExchangeConfig, SimulatedExchange};
use venuesim_core::execution::{ExecutionClient, FillModel, MemoryExecutionCache};

pub const ACCOUNT: &str = "SIM-001";

pub fn symbol() -> Symbol {
    Symbol::new("EURUSD")
}

/// EUR/USD with a 1-pip tick, 1 bp maker / 2 bp taker fees, USD settlement.
pub fn eurusd() -> Instrument {
    Instrument::new(
        symbol(),
        dec!(0.0001),
        Currency::usd(),
        Currency::usd(),
        dec!(0.0001),
        dec!(0.0002),
    )
}

pub fn t0() -> DateTime<Utc> {
    DateTime::UNIX_EPOCH
}

pub fn t0_plus(seconds: i64) -> DateTime<Utc> {
    t0() + Duration::seconds(seconds)
}

pub fn quote(bid: Decimal, ask: Decimal, at: DateTime<Utc>) -> QuoteTick {
    QuoteTick::new(symbol(), bid, ask, at)
}

pub fn market(id: &str, side: OrderSide, qty: Decimal) -> Order {
    Order::market(ClientOrderId::new(id), symbol(), side, qty)
}

pub fn limit(id: &str, side: OrderSide, qty: Decimal, price: Decimal) -> Order {
    Order::limit(ClientOrderId::new(id), symbol(), side, qty, price, false)
}

pub fn limit_post_only(id: &str, side: OrderSide, qty: Decimal, price: Decimal) -> Order {
    Order::limit(ClientOrderId::new(id), symbol(), side, qty, price, true)
}

pub fn stop(id: &str, side: OrderSide, qty: Decimal, trigger: Decimal) -> Order {
    Order::stop_market(ClientOrderId::new(id), symbol(), side, qty, trigger)
}

/// Records every event and nets fills into the shared execution cache.
pub struct RecordingClient {
    pub account_id: AccountId,
    pub order_events: Vec<OrderEvent>,
    pub account_events: Vec<AccountState>,
    pub cache: Rc<RefCell<MemoryExecutionCache>>,
}

impl RecordingClient {
    pub fn new(cache: Rc<RefCell<MemoryExecutionCache>>) -> Self {
        Self {
            account_id: AccountId::new(ACCOUNT),
            order_events: Vec::new(),
            account_events: Vec::new(),
            cache,
        }
    }
}

impl ExecutionClient for RecordingClient {
    fn account_id(&self) -> AccountId {
        self.account_id.clone()
    }

    fn handle_order_event(&mut self, event: OrderEvent) {
        if let OrderEvent::Filled(fill) = &event {
            let mut cache = self.cache.borrow_mut();
            match cache.position_mut(&fill.position_id) {
                Some(position) => position.apply_fill(fill.side, fill.filled_qty, fill.avg_price),
                None => cache.add_position(Position::open(
                    fill.position_id.clone(),
                    fill.symbol.clone(),
                    fill.side,
                    fill.filled_qty,
                    fill.avg_price,
                )),
            }
        }
        self.order_events.push(event);
    }

    fn handle_account_event(&mut self, event: AccountState) {
        self.account_events.push(event);
    }
}

pub struct Harness {
    pub exchange: SimulatedExchange,
    pub client: Rc<RefCell<RecordingClient>>,
    pub cache: Rc<RefCell<MemoryExecutionCache>>,
}

impl Harness {
    pub fn new(fill_model: impl FillModel + 'static) -> Self {
        Self::with_config(
            ExchangeConfig::new(Money::new(dec!(100000), Currency::usd())),
            vec![eurusd()],
            fill_model,
        )
    }

    pub fn with_config(
        config: ExchangeConfig,
        instruments: Vec<Instrument>,
        fill_model: impl FillModel + 'static,
    ) -> Self {
        let cache = Rc::new(RefCell::new(MemoryExecutionCache::new()));
        let mut exchange =
            SimulatedExchange::new(config, instruments, Box::new(fill_model), cache.clone());
        let client = Rc::new(RefCell::new(RecordingClient::new(cache.clone())));
        exchange.register_client(client.clone());
        Self {
            exchange,
            client,
            cache,
        }
    }

    pub fn tick(&mut self, bid: Decimal, ask: Decimal, at: DateTime<Utc>) {
        self.exchange.process_tick(&quote(bid, ask, at)).unwrap();
    }

    pub fn submit(&mut self, order: Order) {
        self.exchange
            .handle_submit_order(SubmitOrder {
                account_id: AccountId::new(ACCOUNT),
                order,
                position_id: None,
            })
            .unwrap();
    }

    pub fn submit_bracket(&mut self, entry: Order, stop_loss: Order, take_profit: Option<Order>) {
        self.exchange
            .handle_submit_bracket_order(SubmitBracketOrder {
                account_id: AccountId::new(ACCOUNT),
                bracket: BracketOrder::new(entry, stop_loss, take_profit),
            })
            .unwrap();
    }

    pub fn cancel(&mut self, id: &str) {
        self.exchange
            .handle_cancel_order(CancelOrder {
                account_id: AccountId::new(ACCOUNT),
                cl_ord_id: ClientOrderId::new(id),
            })
            .unwrap();
    }

    pub fn modify(&mut self, id: &str, new_quantity: Decimal, new_price: Decimal) {
        self.exchange
            .handle_modify_order(ModifyOrder {
                account_id: AccountId::new(ACCOUNT),
                cl_ord_id: ClientOrderId::new(id),
                new_quantity,
                new_price,
            })
            .unwrap();
    }

    pub fn events(&self) -> Vec<OrderEvent> {
        self.client.borrow().order_events.clone()
    }

    pub fn events_for(&self, id: &str) -> Vec<OrderEvent> {
        let id = ClientOrderId::new(id);
        self.client
            .borrow()
            .order_events
            .iter()
            .filter(|e| *e.cl_ord_id() == id)
            .cloned()
            .collect()
    }

    pub fn fills(&self) -> Vec<OrderFilled> {
        self.client
            .borrow()
            .order_events
            .iter()
            .filter_map(|e| match e {
                OrderEvent::Filled(fill) => Some(fill.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn account_events(&self) -> Vec<AccountState> {
        self.client.borrow().account_events.clone()
    }

    pub fn last_account(&self) -> AccountState {
        self.client
            .borrow()
            .account_events
            .last()
            .expect("at least the initial account state")
            .clone()
    }
}
