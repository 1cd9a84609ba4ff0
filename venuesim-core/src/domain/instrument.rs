//! Instrument metadata: tick size, quantity bounds, currencies, and fees.

use crate::domain::ids::Symbol;
use crate::domain::money::{Currency, Money};
use crate::domain::order::LiquiditySide;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum InstrumentError {
    #[error("price {price} does not respect tick_size {tick_size}")]
    InvalidTickSize { price: Decimal, tick_size: Decimal },
}

/// Catalog entry for a tradeable instrument.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instrument {
    pub symbol: Symbol,
    /// Minimum price increment; also the stop-order slippage step.
    pub tick_size: Decimal,
    pub min_quantity: Option<Decimal>,
    pub max_quantity: Option<Decimal>,
    pub quote_currency: Currency,
    pub settlement_currency: Currency,
    /// Inverse contracts quote notional in the base asset.
    pub is_inverse: bool,
    /// Fee rates as fractions of notional (e.g. `0.0002` = 2 bps).
    pub maker_fee: Decimal,
    pub taker_fee: Decimal,
}

impl Instrument {
    pub fn new(
        symbol: Symbol,
        tick_size: Decimal,
        quote_currency: Currency,
        settlement_currency: Currency,
        maker_fee: Decimal,
        taker_fee: Decimal,
    ) -> Self {
        Self {
            symbol,
            tick_size,
            min_quantity: None,
            max_quantity: None,
            quote_currency,
            settlement_currency,
            is_inverse: false,
            maker_fee,
            taker_fee,
        }
    }

    pub fn with_quantity_bounds(mut self, min: Option<Decimal>, max: Option<Decimal>) -> Self {
        self.min_quantity = min;
        self.max_quantity = max;
        self
    }

    pub fn inverse(mut self) -> Self {
        self.is_inverse = true;
        self
    }

    /// Commission for a fill, in the settlement currency.
    ///
    /// `xrate` is the quanto settlement hook; the exchange core always
    /// passes 1.
    pub fn calculate_commission(
        &self,
        quantity: Decimal,
        avg_price: Decimal,
        liquidity_side: LiquiditySide,
        xrate: Decimal,
    ) -> Money {
        let notional = if self.is_inverse {
            quantity / avg_price
        } else {
            quantity * avg_price
        };
        let rate = match liquidity_side {
            LiquiditySide::Maker => self.maker_fee,
            LiquiditySide::Taker => self.taker_fee,
        };
        Money::new(notional * rate * xrate, self.settlement_currency.clone())
    }

    /// Validate a price against the tick size.
    pub fn validate_price(&self, price: Decimal) -> Result<(), InstrumentError> {
        if (price % self.tick_size) != Decimal::ZERO {
            return Err(InstrumentError::InvalidTickSize {
                price,
                tick_size: self.tick_size,
            });
        }
        Ok(())
    }
}
