//! Core traits for the backtesting engine.

mod indicator;
mod strategy;

pub use indicator::{Indicator, MultiOutputIndicator, OhlcvIndicator};
pub use strategy::{Strategy, StrategyConfig, StrategyState};
