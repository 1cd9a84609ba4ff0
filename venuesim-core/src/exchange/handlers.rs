//! Command handling: submit, submit-bracket, modify, cancel.
//!
//! Rule violations (size bounds, no market, post-only crossing, wrong-side
//! stops) are rejection events. Commands against unknown or completed orders
//! get an `OrderCancelReject`. Only genuinely fatal conditions (no client,
//! missing instrument, duplicate id) surface as errors.

use super::{ExchangeError, SimulatedExchange};
use crate::commands::{CancelOrder, ModifyOrder, SubmitBracketOrder, SubmitOrder};
use crate::domain::instrument::Instrument;
use crate::domain::order::{LiquiditySide, Order, OrderSide, OrderType};
use crate::domain::tick::QuoteTick;
use crate::events::{
    OrderAccepted, OrderCancelReject, OrderCancelled, OrderEvent, OrderModified, OrderRejected,
    OrderSubmitted, OrderWorking,
};
use rust_decimal::Decimal;
use tracing::{debug, error};

impl SimulatedExchange {
    /// Submit a standalone order.
    pub fn handle_submit_order(&mut self, command: SubmitOrder) -> Result<(), ExchangeError> {
        self.require_client()?;
        let mut order = command.order;
        if self.working_orders.contains_key(&order.cl_ord_id) {
            return Err(ExchangeError::DuplicateClientOrderId(order.cl_ord_id));
        }
        if let Some(position_id) = command.position_id {
            self.position_index
                .insert(order.cl_ord_id.clone(), position_id);
        }
        if let Err(e) = order.submit() {
            error!(error = %e, "submit skipped");
            return Ok(());
        }
        self.emit_submitted(&order);
        self.process_order(order)
    }

    /// Submit a bracket: entry plus stop-loss and optional take-profit.
    ///
    /// A fresh position id is assigned to all legs; the protecting legs are
    /// OCO-linked to each other and indexed under the position so they can be
    /// flattened when it closes. Only the entry is processed now — children
    /// stay dormant until the entry fills.
    pub fn handle_submit_bracket_order(
        &mut self,
        command: SubmitBracketOrder,
    ) -> Result<(), ExchangeError> {
        self.require_client()?;
        let mut entry = command.bracket.entry;
        let mut stop_loss = command.bracket.stop_loss;
        let mut take_profit = command.bracket.take_profit;

        if self.working_orders.contains_key(&entry.cl_ord_id) {
            return Err(ExchangeError::DuplicateClientOrderId(entry.cl_ord_id));
        }

        let position_id = self.ids.position_id(&entry.symbol);
        self.position_index
            .insert(entry.cl_ord_id.clone(), position_id.clone());
        self.position_index
            .insert(stop_loss.cl_ord_id.clone(), position_id.clone());
        if let Some(tp) = &take_profit {
            self.position_index
                .insert(tp.cl_ord_id.clone(), position_id.clone());
        }

        if let Err(e) = entry.submit() {
            error!(error = %e, "bracket submit skipped");
            return Ok(());
        }
        if let Err(e) = stop_loss.submit() {
            error!(error = %e, "bracket submit skipped");
            return Ok(());
        }
        if let Some(tp) = take_profit.as_mut() {
            if let Err(e) = tp.submit() {
                error!(error = %e, "bracket submit skipped");
                return Ok(());
            }
        }

        if let Some(tp) = &take_profit {
            self.oco_orders
                .insert(tp.cl_ord_id.clone(), stop_loss.cl_ord_id.clone());
            self.oco_orders
                .insert(stop_loss.cl_ord_id.clone(), tp.cl_ord_id.clone());
        }

        let mut protecting = vec![stop_loss.clone()];
        if let Some(tp) = &take_profit {
            protecting.push(tp.clone());
        }
        self.position_oco_orders.insert(position_id, protecting);

        let mut children = vec![stop_loss.clone()];
        if let Some(tp) = take_profit.clone() {
            children.push(tp);
        }
        self.child_orders.insert(entry.cl_ord_id.clone(), children);

        self.emit_submitted(&entry);
        self.emit_submitted(&stop_loss);
        if let Some(tp) = &take_profit {
            self.emit_submitted(tp);
        }

        self.process_order(entry)
    }

    /// Cancel a working order.
    pub fn handle_cancel_order(&mut self, command: CancelOrder) -> Result<(), ExchangeError> {
        self.require_client()?;
        let Some(mut order) = self.working_orders.remove(&command.cl_ord_id) else {
            self.emit_cancel_reject(&command.cl_ord_id, "cancel order", "order not found");
            return Ok(());
        };

        if let Err(e) = order.cancel() {
            error!(error = %e, "cancel skipped");
            return Ok(());
        }
        let venue_order_id = order
            .venue_order_id
            .clone()
            .unwrap_or_else(|| self.ids.order_id(&order.symbol));
        let now = self.clock.now();
        let event_id = self.next_event_id();
        self.emit_order_event(OrderEvent::Cancelled(OrderCancelled {
            account_id: self.account_id(),
            cl_ord_id: order.cl_ord_id.clone(),
            venue_order_id,
            event_id,
            ts_event: now,
            ts_init: now,
        }));
        self.check_oco_order(&command.cl_ord_id);
        self.clean_up_child_orders(&command.cl_ord_id);
        Ok(())
    }

    /// Modify a working order's quantity and price.
    ///
    /// The new price is re-validated against the current market exactly like
    /// a fresh submission: a crossing non-post-only limit fills immediately
    /// as TAKER; a crossing post-only limit or a wrong-side stop is refused
    /// with an `OrderCancelReject`, leaving the order untouched.
    pub fn handle_modify_order(&mut self, command: ModifyOrder) -> Result<(), ExchangeError> {
        self.require_client()?;
        let Some(order) = self.working_orders.get(&command.cl_ord_id) else {
            self.emit_cancel_reject(&command.cl_ord_id, "modify order", "order not found");
            return Ok(());
        };

        if command.new_quantity <= Decimal::ZERO {
            let reason = format!("order quantity of {} is invalid", command.new_quantity);
            self.emit_cancel_reject(&command.cl_ord_id, "modify order", &reason);
            return Ok(());
        }

        let Some(market) = self.market.get(&order.symbol).cloned() else {
            let reason = format!("no market for {}", order.symbol);
            self.emit_cancel_reject(&command.cl_ord_id, "modify order", &reason);
            return Ok(());
        };

        let side = order.side;
        match order.order_type.clone() {
            OrderType::Limit { post_only, .. } => {
                let crosses = match side {
                    OrderSide::Buy => command.new_price >= market.ask,
                    OrderSide::Sell => command.new_price <= market.bid,
                };
                if crosses {
                    if post_only {
                        let reason = match side {
                            OrderSide::Buy => format!(
                                "BUY LIMIT order price of {} is too far from the market, ask={}",
                                command.new_price, market.ask
                            ),
                            OrderSide::Sell => format!(
                                "SELL LIMIT order price of {} is too far from the market, bid={}",
                                command.new_price, market.bid
                            ),
                        };
                        self.emit_cancel_reject(&command.cl_ord_id, "modify order", &reason);
                        return Ok(());
                    }
                    // Marketable after the modify: fill straight away, no
                    // re-accept (the order already holds a venue id).
                    let mut order = self
                        .working_orders
                        .remove(&command.cl_ord_id)
                        .expect("order present");
                    order.quantity = command.new_quantity;
                    order.set_price(command.new_price);
                    let fill_price = match side {
                        OrderSide::Buy => market.ask,
                        OrderSide::Sell => market.bid,
                    };
                    return self.fill_order(order, fill_price, LiquiditySide::Taker);
                }
            }
            OrderType::StopMarket { .. } => {
                let wrong_side = match side {
                    OrderSide::Buy => command.new_price < market.ask,
                    OrderSide::Sell => command.new_price > market.bid,
                };
                if wrong_side {
                    let reason = match side {
                        OrderSide::Buy => format!(
                            "BUY STOP order price of {} is below the ask {}",
                            command.new_price, market.ask
                        ),
                        OrderSide::Sell => format!(
                            "SELL STOP order price of {} is above the bid {}",
                            command.new_price, market.bid
                        ),
                    };
                    self.emit_cancel_reject(&command.cl_ord_id, "modify order", &reason);
                    return Ok(());
                }
            }
            OrderType::Market => {
                error!(cl_ord_id = %command.cl_ord_id, "market order in working set; modify skipped");
                return Ok(());
            }
        }

        let order = self
            .working_orders
            .get_mut(&command.cl_ord_id)
            .expect("order present");
        order.quantity = command.new_quantity;
        order.set_price(command.new_price);
        let venue_order_id = order
            .venue_order_id
            .clone()
            .expect("working order has a venue id");
        let now = self.clock.now();
        let event_id = self.next_event_id();
        self.emit_order_event(OrderEvent::Modified(OrderModified {
            account_id: self.account_id(),
            cl_ord_id: command.cl_ord_id,
            venue_order_id,
            quantity: command.new_quantity,
            price: command.new_price,
            event_id,
            ts_event: now,
            ts_init: now,
        }));
        Ok(())
    }

    // ── Order routing ──────────────────────────────────────────────────

    /// Route a submitted order: validate, then accept into the book or fill
    /// immediately, by order type.
    pub(crate) fn process_order(&mut self, order: Order) -> Result<(), ExchangeError> {
        debug_assert!(
            !self.working_orders.contains_key(&order.cl_ord_id),
            "order already working"
        );
        let instrument = self
            .instruments
            .get(&order.symbol)
            .ok_or_else(|| ExchangeError::MissingInstrument(order.symbol.clone()))?
            .clone();

        if let Some(max) = instrument.max_quantity {
            if order.quantity > max {
                let reason = format!(
                    "order quantity of {} exceeds the maximum {}",
                    order.quantity, max
                );
                return self.reject_order(order, &reason);
            }
        }
        if let Some(min) = instrument.min_quantity {
            if order.quantity < min {
                let reason = format!(
                    "order quantity of {} is less than the minimum {}",
                    order.quantity, min
                );
                return self.reject_order(order, &reason);
            }
        }

        let Some(market) = self.market.get(&order.symbol).cloned() else {
            let reason = format!("no market for {}", order.symbol);
            return self.reject_order(order, &reason);
        };

        match order.order_type.clone() {
            OrderType::Market => self.process_market_order(order, &instrument, &market),
            OrderType::Limit { price, post_only } => {
                self.process_limit_order(order, price, post_only, &market)
            }
            OrderType::StopMarket { trigger } => self.process_stop_order(order, trigger, &market),
        }
    }

    fn process_market_order(
        &mut self,
        mut order: Order,
        instrument: &Instrument,
        market: &QuoteTick,
    ) -> Result<(), ExchangeError> {
        if !self.accept_order(&mut order) {
            return Ok(());
        }
        let base = match order.side {
            OrderSide::Buy => market.ask,
            OrderSide::Sell => market.bid,
        };
        let fill_price = if self.fill_model.is_slipped() {
            match order.side {
                OrderSide::Buy => base + instrument.tick_size,
                OrderSide::Sell => base - instrument.tick_size,
            }
        } else {
            base
        };
        self.fill_order(order, fill_price, LiquiditySide::Taker)
    }

    fn process_limit_order(
        &mut self,
        mut order: Order,
        price: Decimal,
        post_only: bool,
        market: &QuoteTick,
    ) -> Result<(), ExchangeError> {
        let crosses = match order.side {
            OrderSide::Buy => price >= market.ask,
            OrderSide::Sell => price <= market.bid,
        };
        if crosses {
            if post_only {
                let reason = match order.side {
                    OrderSide::Buy => format!(
                        "BUY LIMIT order price of {} is too far from the market, ask={}",
                        price, market.ask
                    ),
                    OrderSide::Sell => format!(
                        "SELL LIMIT order price of {} is too far from the market, bid={}",
                        price, market.bid
                    ),
                };
                return self.reject_order(order, &reason);
            }
            if !self.accept_order(&mut order) {
                return Ok(());
            }
            let fill_price = match order.side {
                OrderSide::Buy => market.ask,
                OrderSide::Sell => market.bid,
            };
            return self.fill_order(order, fill_price, LiquiditySide::Taker);
        }

        if !self.accept_order(&mut order) {
            return Ok(());
        }
        self.work_order(order);
        Ok(())
    }

    fn process_stop_order(
        &mut self,
        mut order: Order,
        trigger: Decimal,
        market: &QuoteTick,
    ) -> Result<(), ExchangeError> {
        let wrong_side = match order.side {
            OrderSide::Buy => trigger < market.ask,
            OrderSide::Sell => trigger > market.bid,
        };
        if wrong_side {
            let reason = match order.side {
                OrderSide::Buy => format!(
                    "BUY STOP order price of {} is below the ask {}",
                    trigger, market.ask
                ),
                OrderSide::Sell => format!(
                    "SELL STOP order price of {} is above the bid {}",
                    trigger, market.bid
                ),
            };
            return self.reject_order(order, &reason);
        }
        if !self.accept_order(&mut order) {
            return Ok(());
        }
        self.work_order(order);
        Ok(())
    }

    // ── Lifecycle helpers ──────────────────────────────────────────────

    /// Mint a venue id and accept the order. Returns false (logging the
    /// violation) if the order was not in a submittable state.
    fn accept_order(&mut self, order: &mut Order) -> bool {
        let venue_order_id = self.ids.order_id(&order.symbol);
        if let Err(e) = order.accept(venue_order_id.clone()) {
            error!(error = %e, "accept skipped");
            return false;
        }
        let now = self.clock.now();
        let event_id = self.next_event_id();
        self.emit_order_event(OrderEvent::Accepted(OrderAccepted {
            account_id: self.account_id(),
            cl_ord_id: order.cl_ord_id.clone(),
            venue_order_id,
            event_id,
            ts_event: now,
            ts_init: now,
        }));
        true
    }

    /// Transition an accepted order to working and rest it on the book.
    fn work_order(&mut self, mut order: Order) {
        if let Err(e) = order.work() {
            error!(error = %e, "work skipped");
            return;
        }
        let venue_order_id = order
            .venue_order_id
            .clone()
            .expect("accepted order has a venue id");
        let price = order.price().unwrap_or(Decimal::ZERO);
        let now = self.clock.now();
        let event_id = self.next_event_id();
        self.emit_order_event(OrderEvent::Working(OrderWorking {
            account_id: self.account_id(),
            cl_ord_id: order.cl_ord_id.clone(),
            venue_order_id,
            symbol: order.symbol.clone(),
            side: order.side,
            quantity: order.quantity,
            price,
            expire_time: order.expire_time,
            event_id,
            ts_event: now,
            ts_init: now,
        }));
        debug!(cl_ord_id = %order.cl_ord_id, "order working");
        self.working_orders.insert(order.cl_ord_id.clone(), order);
    }

    /// Reject an order with a reason, cascading to any linked orders.
    pub(crate) fn reject_order(
        &mut self,
        mut order: Order,
        reason: &str,
    ) -> Result<(), ExchangeError> {
        if let Err(e) = order.reject() {
            error!(error = %e, "reject skipped");
            return Ok(());
        }
        let now = self.clock.now();
        let event_id = self.next_event_id();
        self.emit_order_event(OrderEvent::Rejected(OrderRejected {
            account_id: self.account_id(),
            cl_ord_id: order.cl_ord_id.clone(),
            reason: reason.to_string(),
            event_id,
            ts_event: now,
            ts_init: now,
        }));
        self.check_oco_order(&order.cl_ord_id);
        self.reject_pending_children(&order.cl_ord_id);
        Ok(())
    }

    fn emit_submitted(&mut self, order: &Order) {
        let now = self.clock.now();
        let event_id = self.next_event_id();
        self.emit_order_event(OrderEvent::Submitted(OrderSubmitted {
            account_id: self.account_id(),
            cl_ord_id: order.cl_ord_id.clone(),
            event_id,
            ts_event: now,
            ts_init: now,
        }));
    }

    pub(crate) fn emit_cancel_reject(
        &mut self,
        cl_ord_id: &crate::domain::ids::ClientOrderId,
        response: &str,
        reason: &str,
    ) {
        let now = self.clock.now();
        let event_id = self.next_event_id();
        self.emit_order_event(OrderEvent::CancelReject(OrderCancelReject {
            account_id: self.account_id(),
            cl_ord_id: cl_ord_id.clone(),
            response: response.to_string(),
            reason: reason.to_string(),
            event_id,
            ts_event: now,
            ts_init: now,
        }));
    }
}
