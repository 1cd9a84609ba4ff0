//! Execution capabilities injected into the exchange.
//!
//! - **FillModel** — the stochastic oracles behind equal-price fills and
//!   stop slippage
//! - **ExecutionClient** — the event sink (plus account id provider)
//! - **ExecutionCache** — read-only order/position lookup
//! - **SimulationModule** — per-tick plugins run before matching

pub mod cache;
pub mod client;
pub mod fill_model;
pub mod module;

pub use cache::{ExecutionCache, MemoryExecutionCache};
pub use client::ExecutionClient;
pub use fill_model::{FillModel, StaticFillModel, StochasticFillModel};
pub use module::SimulationModule;
