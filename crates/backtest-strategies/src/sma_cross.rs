//! Close vs. Simple Moving Average Strategy.
//!
//! Buys a fixed lot when the close is above its moving average and sells
//! the lot when the close drops below it.

use backtest_core::{
    error::StrategyError,
    traits::{Strategy, StrategyConfig, StrategyState},
    types::{BarView, Line, OrderIntent, PriceSeries},
};
use backtest_indicators::IndicatorEngine;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Configuration for the SMA strategy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SmaCrossConfig {
    /// Moving average period
    pub period: usize,
    /// Units bought on entry and sold on exit
    pub lot: Decimal,
}

impl Default for SmaCrossConfig {
    fn default() -> Self {
        Self {
            period: 20,
            lot: dec!(100),
        }
    }
}

impl StrategyConfig for SmaCrossConfig {
    fn validate(&self) -> Result<(), StrategyError> {
        if self.period == 0 {
            return Err(StrategyError::InvalidConfig(
                "Period must be greater than 0".into(),
            ));
        }
        if self.lot <= Decimal::ZERO {
            return Err(StrategyError::InvalidConfig(
                "Lot size must be positive".into(),
            ));
        }
        Ok(())
    }
}

/// Close vs. SMA strategy.
pub struct SmaCrossStrategy {
    config: SmaCrossConfig,
    sma: Option<Line>,
    last_close: Option<f64>,
    last_sma: Option<f64>,
    bars_processed: usize,
    orders_requested: usize,
}

impl SmaCrossStrategy {
    /// Create a new SMA strategy.
    pub fn new(config: SmaCrossConfig) -> Self {
        Self {
            config,
            sma: None,
            last_close: None,
            last_sma: None,
            bars_processed: 0,
            orders_requested: 0,
        }
    }

    /// Strategy configuration.
    pub fn config(&self) -> &SmaCrossConfig {
        &self.config
    }
}

impl Default for SmaCrossStrategy {
    fn default() -> Self {
        Self::new(SmaCrossConfig::default())
    }
}

impl Strategy for SmaCrossStrategy {
    fn name(&self) -> &str {
        "sma"
    }

    fn description(&self) -> &str {
        "Holds a fixed lot while the close is above its simple moving average"
    }

    fn init(&mut self, series: &PriceSeries) -> Result<(), StrategyError> {
        self.config.validate()?;
        let mut engine = IndicatorEngine::new(series);
        self.sma = Some(engine.sma(self.config.period)?);
        Ok(())
    }

    fn decide(&mut self, view: &BarView<'_>) -> Option<OrderIntent> {
        self.bars_processed += 1;

        let close = view.current().close;
        self.last_close = Some(close);
        let sma = self.sma.as_ref()?.at(view, 0)?;
        self.last_sma = Some(sma);

        let intent = if view.is_flat() {
            (close > sma).then(|| OrderIntent::buy_size(self.config.lot))
        } else {
            (close < sma).then(|| OrderIntent::sell_size(self.config.lot))
        };

        if let Some(intent) = &intent {
            self.orders_requested += 1;
            debug!(bar = view.index(), side = %intent.side, close, sma, "SMA signal");
        }
        intent
    }

    fn reset(&mut self) {
        self.sma = None;
        self.last_close = None;
        self.last_sma = None;
        self.bars_processed = 0;
        self.orders_requested = 0;
    }

    fn state(&self) -> StrategyState {
        let mut indicators = std::collections::HashMap::new();
        if let Some(sma) = self.last_sma {
            indicators.insert("sma".to_string(), sma);
        }
        if let Some(close) = self.last_close {
            indicators.insert("close".to_string(), close);
        }

        StrategyState {
            name: self.name().to_string(),
            is_warmed_up: self.bars_processed >= self.warmup_period(),
            bars_processed: self.bars_processed,
            orders_requested: self.orders_requested,
            indicators,
            custom: serde_json::json!({
                "period": self.config.period,
                "lot": self.config.lot,
            }),
        }
    }

    fn warmup_period(&self) -> usize {
        self.config.period
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use backtest_core::types::{Bar, Position, Side, Timeframe};

    fn create_test_series(prices: &[f64]) -> PriceSeries {
        let bars = prices
            .iter()
            .enumerate()
            .map(|(i, &p)| Bar::new(i as i64 * 86400000, p, p + 1.0, p - 1.0, p, 1000.0))
            .collect();
        PriceSeries::new("TEST", Timeframe::Daily, bars).unwrap()
    }

    #[test]
    fn test_config_validation() {
        let mut config = SmaCrossConfig::default();
        assert!(config.validate().is_ok());

        config.period = 0;
        assert!(config.validate().is_err());

        let config = SmaCrossConfig {
            lot: Decimal::ZERO,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_buy_above_sma() {
        let mut prices = vec![100.0; 30];
        prices.extend([120.0; 10]);
        let series = create_test_series(&prices);
        let mut strategy = SmaCrossStrategy::default();
        strategy.init(&series).unwrap();

        // Warm-up: no average yet
        let view = series.view(10, Position::default(), dec!(1000000)).unwrap();
        assert!(strategy.decide(&view).is_none());

        // Flat at 100: close equals the average
        let view = series.view(29, Position::default(), dec!(1000000)).unwrap();
        assert!(strategy.decide(&view).is_none());

        let view = series.view(30, Position::default(), dec!(1000000)).unwrap();
        assert_eq!(strategy.decide(&view), Some(OrderIntent::buy_size(dec!(100))));
    }

    #[test]
    fn test_sell_below_sma() {
        let mut prices = vec![100.0; 25];
        prices.push(90.0);
        let series = create_test_series(&prices);
        let mut strategy = SmaCrossStrategy::default();
        strategy.init(&series).unwrap();

        let long = Position::new(dec!(100), dec!(100));
        let view = series.view(25, long, dec!(0)).unwrap();
        let intent = strategy.decide(&view).unwrap();
        assert_eq!(intent.side, Side::Sell);
        assert_eq!(intent.size, Some(dec!(100)));

        // Holding and above average: keep
        let view = series.view(24, long, dec!(0)).unwrap();
        assert!(strategy.decide(&view).is_none());
    }

    #[test]
    fn test_reset() {
        let series = create_test_series(&[100.0; 25]);
        let mut strategy = SmaCrossStrategy::default();
        strategy.init(&series).unwrap();

        let view = series.view(24, Position::default(), dec!(0)).unwrap();
        strategy.decide(&view);
        assert_eq!(strategy.state().bars_processed, 1);
        assert!(strategy.state().indicators.contains_key("sma"));

        strategy.reset();
        let state = strategy.state();
        assert_eq!(state.bars_processed, 0);
        assert!(state.indicators.is_empty());
        assert!(strategy.decide(&view).is_none());
    }
}
