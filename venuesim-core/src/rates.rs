//! Currency cross-rate lookup.
//!
//! The exchange builds `{symbol code -> bid}` and `{symbol code -> ask}`
//! maps from its market snapshot (one tick per symbol) and asks this
//! calculator for a conversion rate. Direct pairs (`USDJPY` for USD->JPY)
//! and inverse pairs (1 / `EURUSD` for USD->EUR) are supported; anything
//! requiring a synthetic cross through a third currency is out of scope for
//! the core and surfaces as an error.

use crate::domain::money::Currency;
use crate::domain::tick::PriceType;
use rust_decimal::Decimal;
use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RateError {
    #[error("no quote available to convert {from} to {to}")]
    NoQuote { from: String, to: String },
}

/// Conversion rate from `from` to `to` using the supplied quote maps.
pub fn get_rate(
    from: &Currency,
    to: &Currency,
    price_type: PriceType,
    bid_quotes: &HashMap<String, Decimal>,
    ask_quotes: &HashMap<String, Decimal>,
) -> Result<Decimal, RateError> {
    if from == to {
        return Ok(Decimal::ONE);
    }

    let quotes = match price_type {
        PriceType::Bid => bid_quotes,
        PriceType::Ask => ask_quotes,
        PriceType::Mid => {
            // Mid is derived pairwise from both sides.
            let direct = format!("{}{}", from.code, to.code);
            if let (Some(bid), Some(ask)) = (bid_quotes.get(&direct), ask_quotes.get(&direct)) {
                return Ok((bid + ask) / Decimal::TWO);
            }
            let inverse = format!("{}{}", to.code, from.code);
            if let (Some(bid), Some(ask)) = (bid_quotes.get(&inverse), ask_quotes.get(&inverse)) {
                return Ok(Decimal::TWO / (bid + ask));
            }
            return Err(RateError::NoQuote {
                from: from.code.clone(),
                to: to.code.clone(),
            });
        }
    };

    let direct = format!("{}{}", from.code, to.code);
    if let Some(rate) = quotes.get(&direct) {
        return Ok(*rate);
    }

    let inverse = format!("{}{}", to.code, from.code);
    if let Some(rate) = quotes.get(&inverse) {
        if !rate.is_zero() {
            return Ok(Decimal::ONE / rate);
        }
    }

    Err(RateError::NoQuote {
        from: from.code.clone(),
        to: to.code.clone(),
    })
}
