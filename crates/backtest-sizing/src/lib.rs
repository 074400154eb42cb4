//! Position sizing for backtests.
//!
//! Resolves how many units a buy intent without an explicit size should
//! trade, from the account state at the decision bar.

pub mod position_sizer;

pub use position_sizer::{PositionSizer, PositionSizingMethod};
