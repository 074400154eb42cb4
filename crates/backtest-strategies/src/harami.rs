//! Harami (inside bar) strategy.
//!
//! Enters when the current bar trades strictly inside the body of the bar
//! before it and exits once the close has moved far enough from the close
//! of the bar the entry filled on.

use backtest_core::{
    error::StrategyError,
    traits::{Strategy, StrategyConfig, StrategyState},
    types::{Bar, BarView, Order, OrderIntent, OrderStatus, PriceSeries},
};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Configuration for the harami strategy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HaramiConfig {
    /// Relative move from the entry close that closes the position
    pub exit_threshold: f64,
}

impl Default for HaramiConfig {
    fn default() -> Self {
        Self {
            exit_threshold: 0.10,
        }
    }
}

impl StrategyConfig for HaramiConfig {
    fn validate(&self) -> Result<(), StrategyError> {
        if !self.exit_threshold.is_finite() || self.exit_threshold <= 0.0 {
            return Err(StrategyError::InvalidConfig(
                "Exit threshold must be a positive number".into(),
            ));
        }
        Ok(())
    }
}

/// True when `current` lies strictly inside the body of `prior`.
pub(crate) fn is_harami(prior: &Bar, current: &Bar) -> bool {
    if prior.close < prior.open {
        current.high < prior.open && current.low > prior.close
    } else {
        current.high < prior.close && current.low > prior.open
    }
}

/// Harami strategy.
pub struct HaramiStrategy {
    config: HaramiConfig,
    /// Close of the bar the last buy filled on
    entry_close: Option<f64>,
    /// Fill price of the last buy
    entry_price: Option<Decimal>,
    profit_rates: Vec<f64>,
    last_move: Option<f64>,
    bars_processed: usize,
    orders_requested: usize,
}

impl HaramiStrategy {
    /// Create a new harami strategy.
    pub fn new(config: HaramiConfig) -> Self {
        Self {
            config,
            entry_close: None,
            entry_price: None,
            profit_rates: Vec::new(),
            last_move: None,
            bars_processed: 0,
            orders_requested: 0,
        }
    }

    /// Profit rate of every completed sell in this run.
    pub fn profit_rates(&self) -> &[f64] {
        &self.profit_rates
    }
}

impl Default for HaramiStrategy {
    fn default() -> Self {
        Self::new(HaramiConfig::default())
    }
}

impl Strategy for HaramiStrategy {
    fn name(&self) -> &str {
        "harami"
    }

    fn description(&self) -> &str {
        "Buys an inside bar and sells after a fixed relative move"
    }

    fn init(&mut self, _series: &PriceSeries) -> Result<(), StrategyError> {
        self.config.validate()
    }

    fn decide(&mut self, view: &BarView<'_>) -> Option<OrderIntent> {
        self.bars_processed += 1;
        let current = view.current();

        let intent = if view.is_flat() {
            let prior = view.ago(1)?;
            is_harami(prior, current).then(OrderIntent::buy)
        } else {
            let entry_close = self.entry_close?;
            let change = (current.close - entry_close) / current.close;
            self.last_move = Some(change);
            (change.abs() > self.config.exit_threshold).then(OrderIntent::sell)
        };

        if let Some(intent) = &intent {
            self.orders_requested += 1;
            debug!(bar = view.index(), side = %intent.side, close = current.close, "Harami signal");
        }
        intent
    }

    fn on_order(&mut self, order: &Order, view: &BarView<'_>) {
        if order.status != OrderStatus::Completed {
            return;
        }
        let Some(execution) = &order.executed else {
            return;
        };

        if order.is_buy() {
            self.entry_close = Some(view.current().close);
            self.entry_price = Some(execution.price);
        } else if let Some(entry) = self.entry_price.filter(|p| !p.is_zero()) {
            if let Some(rate) = ((execution.price - entry) / entry).to_f64() {
                self.profit_rates.push(rate);
            }
        }
    }

    fn reset(&mut self) {
        self.entry_close = None;
        self.entry_price = None;
        self.profit_rates.clear();
        self.last_move = None;
        self.bars_processed = 0;
        self.orders_requested = 0;
    }

    fn state(&self) -> StrategyState {
        let mut indicators = std::collections::HashMap::new();
        if let Some(change) = self.last_move {
            indicators.insert("move_from_entry".to_string(), change);
        }

        StrategyState {
            name: self.name().to_string(),
            is_warmed_up: self.bars_processed >= self.warmup_period(),
            bars_processed: self.bars_processed,
            orders_requested: self.orders_requested,
            indicators,
            custom: serde_json::json!({
                "exit_threshold": self.config.exit_threshold,
                "entry_close": self.entry_close,
                "profit_rates": self.profit_rates,
            }),
        }
    }

    fn warmup_period(&self) -> usize {
        2
    }
}
