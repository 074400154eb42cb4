//! MACD entry / KDJ exit strategy.
//!
//! Buys when the MACD line crosses above its signal line and sells on the
//! KDJ exit rule.

use backtest_core::{
    error::StrategyError,
    traits::{Strategy, StrategyConfig, StrategyState},
    types::{BarView, Line, Order, OrderIntent, OrderStatus, PriceSeries},
};
use backtest_indicators::{IndicatorEngine, KdjLines, MacdLines};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// How the J and D lines close a position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExitRule {
    /// Exit if J was above D on the previous bar or is below D now
    #[default]
    Either,
    /// Exit only when J crosses below D
    Crossover,
}

impl ExitRule {
    fn should_exit(&self, prev_spread: f64, spread: f64) -> bool {
        match self {
            ExitRule::Either => prev_spread > 0.0 || spread < 0.0,
            ExitRule::Crossover => prev_spread > 0.0 && spread < 0.0,
        }
    }
}

/// Configuration for the KDJ/MACD strategy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KdjMacdConfig {
    pub fast_period: usize,
    pub slow_period: usize,
    pub signal_period: usize,
    /// Highest/lowest lookback of the RSV
    pub kdj_period: usize,
    pub k_period: usize,
    pub d_period: usize,
    pub exit_rule: ExitRule,
}

impl Default for KdjMacdConfig {
    fn default() -> Self {
        Self {
            fast_period: 12,
            slow_period: 26,
            signal_period: 9,
            kdj_period: 9,
            k_period: 3,
            d_period: 3,
            exit_rule: ExitRule::Either,
        }
    }
}

impl StrategyConfig for KdjMacdConfig {
    fn validate(&self) -> Result<(), StrategyError> {
        let periods = [
            self.fast_period,
            self.slow_period,
            self.signal_period,
            self.kdj_period,
            self.k_period,
            self.d_period,
        ];
        if periods.contains(&0) {
            return Err(StrategyError::InvalidConfig(
                "Periods must be greater than 0".into(),
            ));
        }
        if self.fast_period >= self.slow_period {
            return Err(StrategyError::InvalidConfig(
                "Fast period must be less than slow period".into(),
            ));
        }
        Ok(())
    }
}

struct Lines {
    macd: Line,
    signal: Line,
    j: Line,
    d: Line,
}

/// KDJ/MACD strategy.
pub struct KdjMacdStrategy {
    config: KdjMacdConfig,
    lines: Option<Lines>,
    entry_price: Option<Decimal>,
    profit_rates: Vec<f64>,
    last_macd_spread: Option<f64>,
    last_kdj_spread: Option<f64>,
    bars_processed: usize,
    orders_requested: usize,
}

impl KdjMacdStrategy {
    /// Create a new KDJ/MACD strategy.
    pub fn new(config: KdjMacdConfig) -> Self {
        Self {
            config,
            lines: None,
            entry_price: None,
            profit_rates: Vec::new(),
            last_macd_spread: None,
            last_kdj_spread: None,
            bars_processed: 0,
            orders_requested: 0,
        }
    }

    /// Profit rate of every completed sell in this run.
    pub fn profit_rates(&self) -> &[f64] {
        &self.profit_rates
    }

    fn spread(a: &Line, b: &Line, view: &BarView<'_>, ago: usize) -> Option<f64> {
        Some(a.at(view, ago)? - b.at(view, ago)?)
    }
}

impl Default for KdjMacdStrategy {
    fn default() -> Self {
        Self::new(KdjMacdConfig::default())
    }
}

impl Strategy for KdjMacdStrategy {
    fn name(&self) -> &str {
        "kdj_macd"
    }

    fn description(&self) -> &str {
        "Buys on a MACD golden cross and sells on the KDJ exit rule"
    }

    fn init(&mut self, series: &PriceSeries) -> Result<(), StrategyError> {
        self.config.validate()?;
        let mut engine = IndicatorEngine::new(series);
        let MacdLines { macd, signal, .. } = engine.macd(
            self.config.fast_period,
            self.config.slow_period,
            self.config.signal_period,
        )?;
        let KdjLines { d, j, .. } = engine.kdj(
            self.config.kdj_period,
            self.config.k_period,
            self.config.d_period,
        )?;
        self.lines = Some(Lines { macd, signal, j, d });
        Ok(())
    }

    fn decide(&mut self, view: &BarView<'_>) -> Option<OrderIntent> {
        self.bars_processed += 1;
        let lines = self.lines.as_ref()?;

        let intent = if view.is_flat() {
            let spread = Self::spread(&lines.macd, &lines.signal, view, 0)?;
            self.last_macd_spread = Some(spread);
            let prev = Self::spread(&lines.macd, &lines.signal, view, 1)?;
            (prev < 0.0 && spread > 0.0).then(OrderIntent::buy)
        } else {
            let spread = Self::spread(&lines.j, &lines.d, view, 0)?;
            self.last_kdj_spread = Some(spread);
            let prev = Self::spread(&lines.j, &lines.d, view, 1)?;
            self.config
                .exit_rule
                .should_exit(prev, spread)
                .then(OrderIntent::sell)
        };

        if let Some(intent) = &intent {
            self.orders_requested += 1;
            debug!(bar = view.index(), side = %intent.side, "KDJ/MACD signal");
        }
        intent
    }

    fn on_order(&mut self, order: &Order, _view: &BarView<'_>) {
        if order.status != OrderStatus::Completed {
            return;
        }
        let Some(execution) = &order.executed else {
            return;
        };

        if order.is_buy() {
            self.entry_price = Some(execution.price);
        } else if let Some(entry) = self.entry_price.filter(|p| !p.is_zero()) {
            if let Some(rate) = ((execution.price - entry) / entry).to_f64() {
                self.profit_rates.push(rate);
            }
        }
    }

    fn reset(&mut self) {
        self.lines = None;
        self.entry_price = None;
        self.profit_rates.clear();
        self.last_macd_spread = None;
        self.last_kdj_spread = None;
        self.bars_processed = 0;
        self.orders_requested = 0;
    }

    fn state(&self) -> StrategyState {
        let mut indicators = std::collections::HashMap::new();
        if let Some(spread) = self.last_macd_spread {
            indicators.insert("macd_minus_signal".to_string(), spread);
        }
        if let Some(spread) = self.last_kdj_spread {
            indicators.insert("j_minus_d".to_string(), spread);
        }

        StrategyState {
            name: self.name().to_string(),
            is_warmed_up: self.bars_processed >= self.warmup_period(),
            bars_processed: self.bars_processed,
            orders_requested: self.orders_requested,
            indicators,
            custom: serde_json::json!({
                "config": self.config,
                "profit_rates": self.profit_rates,
            }),
        }
    }

    fn warmup_period(&self) -> usize {
        // Both lines need a previous defined value
        let macd = self.config.slow_period + self.config.signal_period - 1;
        let kdj = self.config.kdj_period + self.config.k_period + self.config.d_period - 2;
        macd.max(kdj) + 1
    }
}
