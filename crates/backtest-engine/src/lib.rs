//! Backtesting engine.
//!
//! [`BacktestEngine`] drives one strategy over one price series bar by bar,
//! routes its orders through a simulated broker and collects the run into a
//! [`BacktestReport`].

mod engine;
mod journal;
mod report;
mod statistics;

pub use engine::{BacktestConfig, BacktestEngine};
pub use journal::{Journal, JournalEntry, RunEvent};
pub use report::BacktestReport;
pub use statistics::{BacktestStats, EquityPoint};
