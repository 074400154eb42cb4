//! Trading strategy implementations.
//!
//! This crate provides the single-position strategies the engine ships with:
//! - Close vs. simple moving average
//! - Harami (inside bar) entry with a fixed-move exit
//! - MACD crossover entry with a KDJ exit

mod harami;
mod kdj_macd;
mod registry;
mod sma_cross;

pub use harami::{HaramiConfig, HaramiStrategy};
pub use kdj_macd::{ExitRule, KdjMacdConfig, KdjMacdStrategy};
pub use registry::{StrategyInfo, StrategyRegistry};
pub use sma_cross::{SmaCrossConfig, SmaCrossStrategy};
