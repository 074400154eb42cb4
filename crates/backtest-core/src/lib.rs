//! Core types and traits for the backtesting engine.
//!
//! This crate provides the foundational building blocks including:
//! - Market data types (Bar, PriceSeries, BarView)
//! - Indicator lines aligned with the price series
//! - Order, trade and position types
//! - Core traits for strategies and indicators

pub mod types;
pub mod traits;
pub mod error;

pub use error::{BacktestError, BacktestResult};
pub use types::*;
pub use traits::*;
