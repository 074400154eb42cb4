//! Strategy trait definitions.

use crate::error::StrategyError;
use crate::types::{BarView, Order, OrderIntent, PriceSeries, Trade};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Configuration trait for strategies.
pub trait StrategyConfig: Send + Sync + Clone + 'static {
    /// Validate the configuration.
    fn validate(&self) -> Result<(), StrategyError>;
}

/// State of a strategy for reporting and serialization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyState {
    /// Strategy name
    pub name: String,
    /// Whether the strategy has seen enough bars to decide
    pub is_warmed_up: bool,
    /// Number of bars the strategy was asked to decide on
    pub bars_processed: usize,
    /// Number of order intents emitted
    pub orders_requested: usize,
    /// Indicator values at the last decided bar
    pub indicators: HashMap<String, f64>,
    /// Custom strategy-specific state
    pub custom: serde_json::Value,
}

impl Default for StrategyState {
    fn default() -> Self {
        Self {
            name: String::new(),
            is_warmed_up: false,
            bars_processed: 0,
            orders_requested: 0,
            indicators: HashMap::new(),
            custom: serde_json::Value::Null,
        }
    }
}

/// Core strategy trait.
///
/// A strategy is driven bar by bar by the runner. It sees the market only
/// through a [`BarView`], emits at most one [`OrderIntent`] per bar and is
/// told about every order status change and trade update.
pub trait Strategy: Send + Sync {
    /// Get the unique name of this strategy.
    fn name(&self) -> &str;

    /// Get a description of the strategy.
    fn description(&self) -> &str {
        ""
    }

    /// Prepare indicator lines for `series`.
    ///
    /// Called once per run, after [`reset`](Strategy::reset) and before the
    /// first bar.
    fn init(&mut self, series: &PriceSeries) -> Result<(), StrategyError>;

    /// Decide on the current bar of `view`.
    ///
    /// Not called while an order is pending.
    ///
    /// # Returns
    /// * `Some(OrderIntent)` if an order should be placed
    /// * `None` if no action is needed
    fn decide(&mut self, view: &BarView<'_>) -> Option<OrderIntent>;

    /// Called on every order status change.
    ///
    /// `view` is positioned on the bar where the change happened, with the
    /// account snapshot taken after it.
    fn on_order(&mut self, _order: &Order, _view: &BarView<'_>) {}

    /// Called when a trade opens, changes size or closes.
    fn on_trade(&mut self, _trade: &Trade) {}

    /// Called once after the last bar with the ending portfolio value.
    fn finalize(&mut self, _final_value: Decimal) {}

    /// Reset all per-run state.
    fn reset(&mut self);

    /// Get the current strategy state for reporting.
    fn state(&self) -> StrategyState;

    /// Get the warmup period (number of bars needed before deciding).
    fn warmup_period(&self) -> usize;

    /// Check if the strategy is warmed up (has enough data).
    fn is_warmed_up(&self, bars_available: usize) -> bool {
        bars_available >= self.warmup_period()
    }
}
