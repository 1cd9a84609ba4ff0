//! The in-memory trading account.
//!
//! All mutation flows through `AccountState` events: the exchange computes
//! the post-fill balances, emits the event, and the account applies it. A
//! frozen account still receives events but their balances never move.

use crate::domain::ids::AccountId;
use crate::domain::money::{Currency, Money};
use crate::events::AccountState;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub id: AccountId,
    pub currency: Currency,
    pub balance: Money,
    pub balance_start_day: Money,
    pub balance_activity_day: Money,
    pub total_commissions: Money,
}

impl Account {
    pub fn new(id: AccountId, starting_capital: Money) -> Self {
        let currency = starting_capital.currency.clone();
        Self {
            id,
            currency: currency.clone(),
            balance: starting_capital.clone(),
            balance_start_day: starting_capital,
            balance_activity_day: Money::zero(currency.clone()),
            total_commissions: Money::zero(currency),
        }
    }

    /// Apply a state event emitted by the exchange.
    pub fn apply(&mut self, event: &AccountState) {
        debug_assert_eq!(self.id, event.account_id, "account id mismatch");
        self.balance = event.balance.clone();
        self.balance_start_day = event.balance_start_day.clone();
        self.balance_activity_day = event.balance_activity_day.clone();
        self.total_commissions = event.total_commissions.clone();
    }
}
