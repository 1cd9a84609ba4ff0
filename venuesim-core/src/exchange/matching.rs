//! Tick-driven matching: the working-order sweep.
//!
//! Fill decisions are symmetric in side and order type. A strict price
//! inequality fills outright; a quote sitting exactly at the order price
//! consults the fill model. Stops fire as TAKER at the trigger price (plus
//! one tick of slippage when the model says so); limits fill as MAKER at
//! their own price.

use super::{ExchangeError, SimulatedExchange};
use crate::domain::order::{LiquiditySide, OrderSide, OrderType};
use crate::domain::tick::QuoteTick;
use crate::events::{OrderEvent, OrderExpired};
use rust_decimal::Decimal;
use tracing::{debug, error};

impl SimulatedExchange {
    /// Advance the clock, refresh the market snapshot, run the registered
    /// simulation modules, then sweep the working orders for this symbol.
    pub fn process_tick(&mut self, tick: &QuoteTick) -> Result<(), ExchangeError> {
        self.clock.set_time(tick.timestamp);
        self.market.insert(tick.symbol.clone(), tick.clone());

        let now = self.clock.now();
        for module in &mut self.modules {
            module.process(tick, now);
        }

        // Sweep a snapshot of the working set so fills and cascades can
        // remove entries mid-loop. Orders that enter the working set during
        // this sweep (bracket children) wait for the next tick.
        let snapshot: Vec<_> = self
            .working_orders
            .values()
            .filter(|o| o.symbol == tick.symbol)
            .map(|o| o.cl_ord_id.clone())
            .collect();

        for cl_ord_id in snapshot {
            // An earlier fill in this sweep may have cancelled this order.
            let Some(order) = self.working_orders.get(&cl_ord_id) else {
                continue;
            };
            let side = order.side;
            let order_type = order.order_type.clone();
            let expire_time = order.expire_time;

            if let Some((fill_price, liquidity_side)) =
                self.tick_fill(side, &order_type, tick)?
            {
                let order = self
                    .working_orders
                    .remove(&cl_ord_id)
                    .expect("order present in sweep");
                debug!(cl_ord_id = %cl_ord_id, price = %fill_price, "order matched on tick");
                self.fill_order(order, fill_price, liquidity_side)?;
            }

            // Expiry is evaluated after the fill attempt; a filled order has
            // already left the working set.
            if let Some(expire_time) = expire_time {
                if now >= expire_time && self.working_orders.contains_key(&cl_ord_id) {
                    self.expire_order(&cl_ord_id);
                }
            }
        }

        Ok(())
    }

    /// Decide whether this tick fills a working order, and at what price.
    fn tick_fill(
        &mut self,
        side: OrderSide,
        order_type: &OrderType,
        tick: &QuoteTick,
    ) -> Result<Option<(Decimal, LiquiditySide)>, ExchangeError> {
        match order_type {
            OrderType::StopMarket { trigger } => {
                let fires = match side {
                    OrderSide::Buy => {
                        tick.ask > *trigger
                            || (tick.ask == *trigger && self.fill_model.is_stop_filled())
                    }
                    OrderSide::Sell => {
                        tick.bid < *trigger
                            || (tick.bid == *trigger && self.fill_model.is_stop_filled())
                    }
                };
                if !fires {
                    return Ok(None);
                }
                let tick_size = self
                    .instruments
                    .get(&tick.symbol)
                    .ok_or_else(|| ExchangeError::MissingInstrument(tick.symbol.clone()))?
                    .tick_size;
                let price = if self.fill_model.is_slipped() {
                    match side {
                        OrderSide::Buy => *trigger + tick_size,
                        OrderSide::Sell => *trigger - tick_size,
                    }
                } else {
                    *trigger
                };
                Ok(Some((price, LiquiditySide::Taker)))
            }
            OrderType::Limit { price, .. } => {
                let matched = match side {
                    OrderSide::Buy => {
                        tick.ask < *price
                            || (tick.ask == *price && self.fill_model.is_limit_filled())
                    }
                    OrderSide::Sell => {
                        tick.bid > *price
                            || (tick.bid == *price && self.fill_model.is_limit_filled())
                    }
                };
                // Resting limits always execute at their own price.
                Ok(matched.then_some((*price, LiquiditySide::Maker)))
            }
            OrderType::Market => {
                // Market orders never rest; one in the working set is a bug.
                error!("market order found in working set; skipping");
                Ok(None)
            }
        }
    }

    fn expire_order(&mut self, cl_ord_id: &crate::domain::ids::ClientOrderId) {
        let Some(mut order) = self.working_orders.remove(cl_ord_id) else {
            return;
        };
        if let Err(e) = order.expire() {
            error!(error = %e, "expire skipped");
            return;
        }
        let venue_order_id = order
            .venue_order_id
            .clone()
            .unwrap_or_else(|| self.ids.order_id(&order.symbol));
        let now = self.clock.now();
        let event_id = self.next_event_id();
        self.emit_order_event(OrderEvent::Expired(OrderExpired {
            account_id: self.account_id(),
            cl_ord_id: order.cl_ord_id.clone(),
            venue_order_id,
            event_id,
            ts_event: now,
            ts_init: now,
        }));
        // Expired bracket legs run the normal OCO cascade; an expired parent
        // drops its never-activated children.
        self.check_oco_order(cl_ord_id);
        self.clean_up_child_orders(cl_ord_id);
    }
}
