//! Trading commands accepted by the exchange.

use crate::domain::ids::{AccountId, ClientOrderId, PositionId};
use crate::domain::order::Order;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmitOrder {
    pub account_id: AccountId,
    pub order: Order,
    /// Pre-assigned position the fill should attach to, if any.
    pub position_id: Option<PositionId>,
}

/// A compound order: entry plus protective stop-loss and optional take-profit.
/// Children become working only after the entry fills.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BracketOrder {
    pub entry: Order,
    pub stop_loss: Order,
    pub take_profit: Option<Order>,
}

impl BracketOrder {
    pub fn new(entry: Order, stop_loss: Order, take_profit: Option<Order>) -> Self {
        debug_assert_eq!(entry.symbol, stop_loss.symbol, "bracket legs must share a symbol");
        Self {
            entry,
            stop_loss,
            take_profit,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmitBracketOrder {
    pub account_id: AccountId,
    pub bracket: BracketOrder,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModifyOrder {
    pub account_id: AccountId,
    pub cl_ord_id: ClientOrderId,
    pub new_quantity: Decimal,
    pub new_price: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CancelOrder {
    pub account_id: AccountId,
    pub cl_ord_id: ClientOrderId,
}
