//! Currencies and money.
//!
//! Amounts are `rust_decimal::Decimal` rounded to the currency's precision on
//! construction, so account identities hold exactly across long event logs.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Neg, Sub, SubAssign};

/// An ISO-style currency with a display/rounding precision.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Currency {
    pub code: String,
    pub precision: u32,
}

impl Currency {
    pub fn new(code: impl Into<String>, precision: u32) -> Self {
        Self {
            code: code.into(),
            precision,
        }
    }

    pub fn usd() -> Self {
        Self::new("USD", 2)
    }

    pub fn jpy() -> Self {
        Self::new("JPY", 0)
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code)
    }
}

/// A decimal amount in a specific currency.
///
/// Arithmetic between two `Money` values requires matching currencies; mixing
/// currencies is a programming error and panics in debug builds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Money {
    pub amount: Decimal,
    pub currency: Currency,
}

impl Money {
    /// Create money rounded to the currency precision (half away from zero).
    pub fn new(amount: Decimal, currency: Currency) -> Self {
        let amount =
            amount.round_dp_with_strategy(currency.precision, RoundingStrategy::MidpointAwayFromZero);
        Self { amount, currency }
    }

    pub fn zero(currency: Currency) -> Self {
        Self {
            amount: Decimal::ZERO,
            currency,
        }
    }

    pub fn is_zero(&self) -> bool {
        self.amount.is_zero()
    }
}

impl Add for Money {
    type Output = Money;

    fn add(self, rhs: Money) -> Money {
        debug_assert_eq!(self.currency, rhs.currency, "currency mismatch");
        Money::new(self.amount + rhs.amount, self.currency)
    }
}

impl Sub for Money {
    type Output = Money;

    fn sub(self, rhs: Money) -> Money {
        debug_assert_eq!(self.currency, rhs.currency, "currency mismatch");
        Money::new(self.amount - rhs.amount, self.currency)
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, rhs: Money) {
        debug_assert_eq!(self.currency, rhs.currency, "currency mismatch");
        self.amount += rhs.amount;
    }
}

impl SubAssign for Money {
    fn sub_assign(&mut self, rhs: Money) {
        debug_assert_eq!(self.currency, rhs.currency, "currency mismatch");
        self.amount -= rhs.amount;
    }
}

impl Neg for Money {
    type Output = Money;

    fn neg(self) -> Money {
        Money {
            amount: -self.amount,
            currency: self.currency,
        }
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.amount, self.currency)
    }
}
