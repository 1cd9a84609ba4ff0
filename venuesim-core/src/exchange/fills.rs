//! The fill pipeline and account adjustment.
//!
//! Per fill: resolve the position, compute commission, emit `OrderFilled`,
//! adjust the account (converting through cross-rates when the commission
//! currency differs from the account currency), run the OCO cascade, release
//! bracket children, and flatten protecting orders once the position closes.

use super::{ExchangeError, SimulatedExchange};
use crate::domain::money::Money;
use crate::domain::order::{LiquiditySide, Order, OrderSide};
use crate::domain::position::Position;
use crate::domain::tick::PriceType;
use crate::events::{OrderEvent, OrderFilled};
use crate::rates;
use rust_decimal::Decimal;
use std::collections::HashMap;
use tracing::error;

impl SimulatedExchange {
    /// Fill an order at `fill_price`. The order must already be off the
    /// working set; this consumes it.
    pub(crate) fn fill_order(
        &mut self,
        mut order: Order,
        fill_price: Decimal,
        liquidity_side: LiquiditySide,
    ) -> Result<(), ExchangeError> {
        let instrument = self
            .instruments
            .get(&order.symbol)
            .ok_or_else(|| ExchangeError::MissingInstrument(order.symbol.clone()))?
            .clone();

        // Resolve the position: pre-assigned (bracket legs, explicit submit)
        // or freshly allocated from the per-symbol counter.
        let (position_id, position) = match self.position_index.get(&order.cl_ord_id) {
            Some(position_id) => {
                let position = self.cache.borrow().position(position_id);
                (position_id.clone(), position)
            }
            None => {
                let position_id = self.ids.position_id(&order.symbol);
                self.position_index
                    .insert(order.cl_ord_id.clone(), position_id.clone());
                (position_id, None)
            }
        };

        // Quanto settlement is a reserved hook; the core passes xrate = 1.
        let commission = instrument.calculate_commission(
            order.quantity,
            fill_price,
            liquidity_side,
            Decimal::ONE,
        );

        if let Err(e) = order.fill() {
            error!(error = %e, "fill skipped");
            return Ok(());
        }
        let venue_order_id = order
            .venue_order_id
            .clone()
            .unwrap_or_else(|| self.ids.order_id(&order.symbol));

        let now = self.clock.now();
        let event_id = self.next_event_id();
        let execution_id = self.ids.execution_id();
        let fill = OrderFilled {
            account_id: self.account_id(),
            cl_ord_id: order.cl_ord_id.clone(),
            venue_order_id,
            execution_id,
            position_id: position_id.clone(),
            strategy_id: None,
            symbol: order.symbol.clone(),
            side: order.side,
            filled_qty: order.quantity,
            leaves_qty: Decimal::ZERO,
            avg_price: fill_price,
            quote_currency: instrument.quote_currency.clone(),
            settlement_currency: instrument.settlement_currency.clone(),
            is_inverse: instrument.is_inverse,
            commission,
            liquidity_side,
            event_id,
            ts_event: now,
            ts_init: now,
        };
        self.emit_order_event(OrderEvent::Filled(fill.clone()));

        self.adjust_account(&fill, position.as_ref())?;

        self.check_oco_order(&order.cl_ord_id);

        // A filled bracket parent releases its children into the book.
        if let Some(children) = self.child_orders.remove(&order.cl_ord_id) {
            for child in children {
                if !child.is_completed() {
                    self.process_order(child)?;
                }
            }
        }

        // The event sink may have updated the cache; if the position is now
        // flat, its protecting orders come off the book.
        let closed = self
            .cache
            .borrow()
            .position(&position_id)
            .map(|p| p.is_closed())
            .unwrap_or(false);
        if closed {
            self.cancel_position_oco_orders(&position_id);
        }

        Ok(())
    }

    /// Apply commission and realized P&L to the account, then emit and apply
    /// the resulting `AccountState`. A frozen account emits an unchanged
    /// snapshot.
    fn adjust_account(
        &mut self,
        fill: &OrderFilled,
        position: Option<&Position>,
    ) -> Result<(), ExchangeError> {
        if self.account.is_none() {
            return Ok(());
        }

        if !self.config.frozen_account {
            let mut commission = fill.commission.clone();
            let mut pnl = Money::zero(commission.currency.clone());

            if let Some(position) = position {
                if fill.side != position.entry {
                    let points = position.calculate_pnl(
                        position.avg_open_price,
                        fill.avg_price,
                        fill.filled_qty,
                    );
                    pnl = Money::new(points, commission.currency.clone());
                }
            }

            let account_currency = self.config.account_currency.clone();
            if commission.currency != account_currency {
                let price_type = match fill.side {
                    OrderSide::Sell => PriceType::Bid,
                    OrderSide::Buy => PriceType::Ask,
                };
                let (bid_quotes, ask_quotes) = self.build_quote_maps();
                let xrate = rates::get_rate(
                    &commission.currency,
                    &account_currency,
                    price_type,
                    &bid_quotes,
                    &ask_quotes,
                )?;
                commission = Money::new(commission.amount * xrate, account_currency.clone());
                pnl = Money::new(pnl.amount * xrate, account_currency.clone());
            }

            pnl -= commission.clone();

            let account = self.account.as_mut().expect("account opened");
            account.total_commissions += commission;
            account.balance += pnl.clone();
            account.balance_activity_day += pnl;
        }

        let state = self.account_snapshot();
        self.apply_and_emit_account_state(state);
        Ok(())
    }

    /// Per-currency-pair top-of-book maps for the cross-rate calculator.
    fn build_quote_maps(&self) -> (HashMap<String, Decimal>, HashMap<String, Decimal>) {
        let mut bid_quotes = HashMap::with_capacity(self.market.len());
        let mut ask_quotes = HashMap::with_capacity(self.market.len());
        for (symbol, tick) in &self.market {
            bid_quotes.insert(symbol.code().to_string(), tick.bid);
            ask_quotes.insert(symbol.code().to_string(), tick.ask);
        }
        (bid_quotes, ask_quotes)
    }
}
