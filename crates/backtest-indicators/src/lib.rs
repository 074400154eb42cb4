//! Technical indicators aligned with price series.
//!
//! This crate provides the indicators the bundled strategies rely on:
//! - Moving averages (SMA, EMA)
//! - Momentum indicators (MACD, stochastic RSV/K/D/J)
//! - Rolling extremes (highest high, lowest low)
//!
//! Every function returns one value per input point with NaN during
//! warm-up. [`IndicatorEngine`] computes lines for a [`PriceSeries`] once and
//! hands out shared copies.
//!
//! [`PriceSeries`]: backtest_core::types::PriceSeries

pub mod engine;
pub mod momentum;
pub mod moving_average;

pub use engine::{IndicatorEngine, IndicatorKey, KdjLines, MacdLines};
pub use momentum::{highest, lowest, rsv, Kdj, KdjOutput, Macd, MacdOutput};
pub use moving_average::{ema, sma, Ema, Sma};
