//! Fill models: the probabilistic component of order matching.
//!
//! Matching is deterministic on strict price inequalities; the fill model is
//! consulted only at the margins — a quote exactly at the order price, or the
//! slippage decision when a stop fires. Backtests that need reproducibility
//! seed the stochastic model; tests substitute the static one.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Three boolean oracles consulted by the matching engine.
pub trait FillModel {
    /// Does a firing stop-market order slip one tick?
    fn is_slipped(&mut self) -> bool;
    /// Does a stop fill when the quote sits exactly at the trigger?
    fn is_stop_filled(&mut self) -> bool;
    /// Does a limit fill when the quote sits exactly at the limit?
    fn is_limit_filled(&mut self) -> bool;
}

/// Seeded stochastic fill model.
///
/// The same seed produces the same oracle sequence regardless of platform,
/// so a backtest run is reproducible end to end.
#[derive(Debug, Clone)]
pub struct StochasticFillModel {
    prob_slippage: f64,
    prob_fill_at_stop: f64,
    prob_fill_at_limit: f64,
    rng: ChaCha8Rng,
}

impl StochasticFillModel {
    pub fn new(
        prob_slippage: f64,
        prob_fill_at_stop: f64,
        prob_fill_at_limit: f64,
        seed: u64,
    ) -> Self {
        debug_assert!((0.0..=1.0).contains(&prob_slippage));
        debug_assert!((0.0..=1.0).contains(&prob_fill_at_stop));
        debug_assert!((0.0..=1.0).contains(&prob_fill_at_limit));
        Self {
            prob_slippage,
            prob_fill_at_stop,
            prob_fill_at_limit,
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    fn sample(&mut self, probability: f64) -> bool {
        if probability <= 0.0 {
            return false;
        }
        if probability >= 1.0 {
            return true;
        }
        self.rng.gen_bool(probability)
    }
}

impl FillModel for StochasticFillModel {
    fn is_slipped(&mut self) -> bool {
        self.sample(self.prob_slippage)
    }

    fn is_stop_filled(&mut self) -> bool {
        self.sample(self.prob_fill_at_stop)
    }

    fn is_limit_filled(&mut self) -> bool {
        self.sample(self.prob_fill_at_limit)
    }
}

/// Fixed-answer fill model for tests and worst/best-case runs.
#[derive(Debug, Clone, Copy)]
pub struct StaticFillModel {
    pub slipped: bool,
    pub stop_filled: bool,
    pub limit_filled: bool,
}

impl StaticFillModel {
    /// No slippage, every at-price quote fills.
    pub fn optimistic() -> Self {
        Self {
            slipped: false,
            stop_filled: true,
            limit_filled: true,
        }
    }

    /// Every stop slips, no at-price quote ever fills.
    pub fn hostile() -> Self {
        Self {
            slipped: true,
            stop_filled: false,
            limit_filled: false,
        }
    }
}

impl FillModel for StaticFillModel {
    fn is_slipped(&mut self) -> bool {
        self.slipped
    }

    fn is_stop_filled(&mut self) -> bool {
        self.stop_filled
    }

    fn is_limit_filled(&mut self) -> bool {
        self.limit_filled
    }
}
