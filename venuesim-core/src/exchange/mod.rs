//! The simulated exchange.
//!
//! A single-threaded, tick-driven venue for backtesting:
//! - **Matching** (`matching.rs`) — quote ticks sweep the working orders
//! - **Command handling** (`handlers.rs`) — submit / bracket / modify / cancel
//! - **Fill pipeline** (`fills.rs`) — commission, P&L, account adjustment
//! - **Linked orders** (`linked.rs`) — OCO cascade and bracket bookkeeping
//!
//! Every public entry point runs to completion before returning, and all
//! event emission is a synchronous call into the registered execution client.

mod fills;
mod handlers;
mod linked;
mod matching;

use crate::clock::SimClock;
use crate::domain::account::Account;
use crate::domain::ids::{AccountId, ClientOrderId, IdAllocator, PositionId, Symbol};
use crate::domain::instrument::Instrument;
use crate::domain::money::{Currency, Money};
use crate::domain::order::Order;
use crate::domain::tick::QuoteTick;
use crate::events::{
    AccountState, EventId, EventIdSource, OrderEvent, RandomEventIds,
};
use crate::execution::{ExecutionCache, ExecutionClient, FillModel, SimulationModule};
use crate::rates::RateError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use thiserror::Error;
use tracing::warn;

/// Fatal errors: the backtest cannot meaningfully continue past these.
/// Order rule violations are *events*, never errors.
#[derive(Debug, Error)]
pub enum ExchangeError {
    #[error("no execution client registered")]
    NoClientRegistered,

    #[error("no instrument loaded for {0}")]
    MissingInstrument(Symbol),

    #[error("duplicate client order id {0}")]
    DuplicateClientOrderId(ClientOrderId),

    #[error(transparent)]
    Rate(#[from] RateError),
}

/// Order management system type. Retained for downstream consumers; the
/// exchange core does not interpret it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OmsType {
    Netting,
    Hedging,
}

#[derive(Debug, Clone)]
pub struct ExchangeConfig {
    pub starting_capital: Money,
    pub account_currency: Currency,
    /// A frozen account never mutates balances, regardless of fills.
    pub frozen_account: bool,
    pub oms_type: OmsType,
    /// Retained hook; the core always generates position ids on demand.
    pub generate_position_ids: bool,
}

impl ExchangeConfig {
    pub fn new(starting_capital: Money) -> Self {
        let account_currency = starting_capital.currency.clone();
        Self {
            starting_capital,
            account_currency,
            frozen_account: false,
            oms_type: OmsType::Netting,
            generate_position_ids: true,
        }
    }

    pub fn frozen(mut self) -> Self {
        self.frozen_account = true;
        self
    }
}

/// The simulated exchange core.
pub struct SimulatedExchange {
    pub(crate) config: ExchangeConfig,
    pub(crate) clock: SimClock,
    pub(crate) event_ids: Box<dyn EventIdSource>,
    pub(crate) fill_model: Box<dyn FillModel>,
    pub(crate) instruments: HashMap<Symbol, Instrument>,
    /// Latest quote per symbol.
    pub(crate) market: HashMap<Symbol, QuoteTick>,
    pub(crate) cache: Rc<RefCell<dyn ExecutionCache>>,
    pub(crate) client: Option<Rc<RefCell<dyn ExecutionClient>>>,
    pub(crate) modules: Vec<Box<dyn SimulationModule>>,
    pub(crate) account: Option<Account>,
    pub(crate) ids: IdAllocator,

    // Linked-order tables (see DESIGN.md for the invariants they carry).
    pub(crate) working_orders: HashMap<ClientOrderId, Order>,
    pub(crate) position_index: HashMap<ClientOrderId, PositionId>,
    pub(crate) child_orders: HashMap<ClientOrderId, Vec<Order>>,
    pub(crate) oco_orders: HashMap<ClientOrderId, ClientOrderId>,
    pub(crate) position_oco_orders: HashMap<PositionId, Vec<Order>>,
}

impl SimulatedExchange {
    pub fn new(
        config: ExchangeConfig,
        instruments: Vec<Instrument>,
        fill_model: Box<dyn FillModel>,
        cache: Rc<RefCell<dyn ExecutionCache>>,
    ) -> Self {
        let instruments = instruments
            .into_iter()
            .map(|i| (i.symbol.clone(), i))
            .collect();
        Self {
            config,
            clock: SimClock::new(),
            event_ids: Box::new(RandomEventIds),
            fill_model,
            instruments,
            market: HashMap::new(),
            cache,
            client: None,
            modules: Vec::new(),
            account: None,
            ids: IdAllocator::new(),
            working_orders: HashMap::new(),
            position_index: HashMap::new(),
            child_orders: HashMap::new(),
            oco_orders: HashMap::new(),
            position_oco_orders: HashMap::new(),
        }
    }

    /// Substitute a deterministic event id source (for reproducible logs).
    pub fn with_event_ids(mut self, source: Box<dyn EventIdSource>) -> Self {
        self.event_ids = source;
        self
    }

    /// Register the execution client. Must be called exactly once before any
    /// command is handled; opens the account and emits its initial state.
    pub fn register_client(&mut self, client: Rc<RefCell<dyn ExecutionClient>>) {
        let account_id = client.borrow().account_id();
        self.client = Some(client);
        self.open_account(account_id);
    }

    /// Register a simulation module; modules run in registration order on
    /// every tick, before matching.
    pub fn register_module(&mut self, module: Box<dyn SimulationModule>) {
        self.modules.push(module);
    }

    /// Restore the exchange to its just-constructed (and just-registered)
    /// state: clears every table, reissues the initial account state.
    pub fn reset(&mut self) {
        self.clock.reset();
        self.market.clear();
        self.ids.reset();
        self.working_orders.clear();
        self.position_index.clear();
        self.child_orders.clear();
        self.oco_orders.clear();
        self.position_oco_orders.clear();
        for module in &mut self.modules {
            module.reset();
        }
        if let Some(account) = self.account.take() {
            self.open_account(account.id);
        }
    }

    /// Log any state left over at the end of a run.
    pub fn check_residuals(&self) {
        for order in self.working_orders.values() {
            warn!(
                cl_ord_id = %order.cl_ord_id,
                symbol = %order.symbol,
                "residual working order"
            );
        }
        for (parent, children) in &self.child_orders {
            warn!(
                parent = %parent,
                children = children.len(),
                "residual bracket children"
            );
        }
        for (position_id, orders) in &self.position_oco_orders {
            warn!(
                position_id = %position_id,
                orders = orders.len(),
                "residual position OCO group"
            );
        }
    }

    // ── Queries ────────────────────────────────────────────────────────

    pub fn working_orders(&self) -> &HashMap<ClientOrderId, Order> {
        &self.working_orders
    }

    pub fn oco_orders(&self) -> &HashMap<ClientOrderId, ClientOrderId> {
        &self.oco_orders
    }

    pub fn child_orders(&self) -> &HashMap<ClientOrderId, Vec<Order>> {
        &self.child_orders
    }

    pub fn position_index(&self) -> &HashMap<ClientOrderId, PositionId> {
        &self.position_index
    }

    pub fn position_oco_orders(&self) -> &HashMap<PositionId, Vec<Order>> {
        &self.position_oco_orders
    }

    pub fn account(&self) -> Option<&Account> {
        self.account.as_ref()
    }

    pub fn market(&self, symbol: &Symbol) -> Option<&QuoteTick> {
        self.market.get(symbol)
    }

    pub fn instrument(&self, symbol: &Symbol) -> Option<&Instrument> {
        self.instruments.get(symbol)
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    // ── Internal plumbing ──────────────────────────────────────────────

    fn open_account(&mut self, account_id: AccountId) {
        self.account = Some(Account::new(
            account_id,
            self.config.starting_capital.clone(),
        ));
        let state = self.account_snapshot();
        self.apply_and_emit_account_state(state);
    }

    pub(crate) fn require_client(&self) -> Result<(), ExchangeError> {
        if self.client.is_none() {
            return Err(ExchangeError::NoClientRegistered);
        }
        Ok(())
    }

    /// Current account id. Only called on paths where a client is registered.
    pub(crate) fn account_id(&self) -> AccountId {
        self.account
            .as_ref()
            .expect("execution client registered")
            .id
            .clone()
    }

    pub(crate) fn next_event_id(&mut self) -> EventId {
        self.event_ids.next()
    }

    /// Snapshot the current account balances as a state event.
    pub(crate) fn account_snapshot(&mut self) -> AccountState {
        let now = self.clock.now();
        let event_id = self.next_event_id();
        let account = self.account.as_ref().expect("execution client registered");
        AccountState {
            account_id: account.id.clone(),
            currency: account.currency.clone(),
            balance: account.balance.clone(),
            balance_start_day: account.balance_start_day.clone(),
            balance_activity_day: account.balance_activity_day.clone(),
            total_commissions: account.total_commissions.clone(),
            margin_balance: account.balance.clone(),
            margin_available: account.balance.clone(),
            event_id,
            ts_event: now,
            ts_init: now,
        }
    }

    pub(crate) fn apply_and_emit_account_state(&mut self, event: AccountState) {
        if let Some(account) = self.account.as_mut() {
            account.apply(&event);
        }
        if let Some(client) = &self.client {
            client.borrow_mut().handle_account_event(event);
        }
    }

    pub(crate) fn emit_order_event(&self, event: OrderEvent) {
        if let Some(client) = &self.client {
            client.borrow_mut().handle_order_event(event);
        }
    }
}
