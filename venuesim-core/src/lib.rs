//! VenueSim Core Engine
//!
//! A tick-driven simulated exchange for backtesting: order matching and
//! lifecycle, bracket/OCO bookkeeping, slippage simulation, and account
//! adjustment. The exchange is strictly single-threaded; time advances only
//! through incoming quote ticks.

pub mod clock;
pub mod commands;
pub mod domain;
pub mod events;
pub mod exchange;
pub mod execution;
pub mod rates;
