//! Domain types — the vocabulary of VenueSim.
//!
//! Every module in the system builds on these types. They define symbols,
//! currencies and money, instruments, quote ticks, orders, positions,
//! accounts, and the deterministic identifier allocator.

pub mod account;
pub mod ids;
pub mod instrument;
pub mod money;
pub mod order;
pub mod position;
pub mod tick;

// Re-export the most commonly used types at the domain level.
pub use account::Account;
pub use ids::{
    AccountId, ClientOrderId, ExecutionId, IdAllocator, PositionId, StrategyId, Symbol,
    VenueOrderId,
};
pub use instrument::{Instrument, InstrumentError};
pub use money::{Currency, Money};
pub use order::{
    LiquiditySide, Order, OrderError, OrderSide, OrderStatus, OrderType, TimeInForce,
};
pub use position::Position;
pub use tick::{PriceType, QuoteTick};
