//! The execution client: event sink and account id provider.

use crate::domain::ids::AccountId;
use crate::events::{AccountState, OrderEvent};

/// Consumes the exchange's event stream.
///
/// Emission is synchronous on the exchange's thread. The client must not call
/// back into the exchange during a handler (reentrancy is undefined); it may
/// update the external execution cache, which is how positions become visible
/// to the fill pipeline's position-closed check.
pub trait ExecutionClient {
    /// The account this client trades for.
    fn account_id(&self) -> AccountId;

    fn handle_order_event(&mut self, event: OrderEvent);

    fn handle_account_event(&mut self, event: AccountState);
}
