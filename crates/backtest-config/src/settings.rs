//! Configuration structures.

use backtest_broker::ExecutionTiming;
use backtest_core::types::Timeframe;
use backtest_data::{ColumnMap, CsvOptions};
use backtest_engine::BacktestConfig;
use backtest_sizing::PositionSizingMethod;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main application configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub app: AppSettings,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub backtest: BacktestSettings,
    #[serde(default)]
    pub data: DataSettings,
    #[serde(default)]
    pub strategy: StrategySettings,
}

impl AppConfig {
    /// Parse a TOML document, without environment overrides.
    pub fn from_toml_str(s: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(s)
    }

    /// Render as TOML.
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}

/// General app settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    pub name: String,
    pub environment: String,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            name: "backtest".to_string(),
            environment: "development".to_string(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    /// `pretty` or `json`
    pub format: String,
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
            file: None,
        }
    }
}

impl LoggingConfig {
    pub fn is_json(&self) -> bool {
        self.format.eq_ignore_ascii_case("json")
    }
}

/// Account and execution settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BacktestSettings {
    pub initial_cash: Decimal,
    pub commission_rate: Decimal,
    pub execution: ExecutionTiming,
    pub sizing: PositionSizingMethod,
}

impl Default for BacktestSettings {
    fn default() -> Self {
        Self {
            initial_cash: dec!(1000000),
            commission_rate: dec!(0.002),
            execution: ExecutionTiming::default(),
            sizing: PositionSizingMethod::default(),
        }
    }
}

impl From<&BacktestSettings> for BacktestConfig {
    fn from(settings: &BacktestSettings) -> Self {
        BacktestConfig {
            initial_cash: settings.initial_cash,
            commission_rate: settings.commission_rate,
            sizing: settings.sizing.clone(),
            execution: settings.execution,
        }
    }
}

/// Price data source settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataSettings {
    pub path: Option<PathBuf>,
    pub symbol: String,
    pub timeframe: Timeframe,
    pub date_format: Option<String>,
    pub has_headers: bool,
    pub columns: ColumnMap,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub reverse: bool,
    pub max_gap_days: Option<u32>,
}

impl Default for DataSettings {
    fn default() -> Self {
        let csv = CsvOptions::default();
        Self {
            path: None,
            symbol: "DATA".to_string(),
            timeframe: Timeframe::Daily,
            date_format: csv.date_format,
            has_headers: csv.has_headers,
            columns: csv.columns,
            from: csv.from,
            to: csv.to,
            reverse: csv.reverse,
            max_gap_days: csv.max_gap_days,
        }
    }
}

impl DataSettings {
    /// CSV reader options described by these settings.
    pub fn csv_options(&self) -> CsvOptions {
        CsvOptions {
            columns: self.columns,
            date_format: self.date_format.clone(),
            has_headers: self.has_headers,
            from: self.from,
            to: self.to,
            reverse: self.reverse,
            max_gap_days: self.max_gap_days,
        }
    }
}

/// Strategy selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StrategySettings {
    /// Registry name
    pub name: String,
    /// Strategy parameters; missing fields take their defaults
    pub params: serde_json::Value,
}

impl Default for StrategySettings {
    fn default() -> Self {
        Self {
            name: "sma".to_string(),
            params: serde_json::Value::Object(Default::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use backtest_data::ColumnIndices;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.backtest.initial_cash, dec!(1000000));
        assert_eq!(config.backtest.execution, ExecutionTiming::NextBarOpen);
        assert_eq!(config.strategy.name, "sma");
        assert!(!config.logging.is_json());

        let engine = BacktestConfig::from(&config.backtest);
        assert_eq!(engine, BacktestConfig::default());
    }

    #[test]
    fn test_partial_toml() {
        let config = AppConfig::from_toml_str(
            r#"
            [backtest]
            initial_cash = "7000"
            commission_rate = "0.003"
            execution = "next_bar_close"

            [data]
            path = "data/600519.csv"
            date_format = "%Y%m%d"
            reverse = true
            from = "2010-01-01"
            columns = { mode = "indices", date = 2, open = 3, high = 4, low = 5, close = 6, volume = 10 }

            [strategy]
            name = "harami"
            params = { exit_threshold = 0.05 }
            "#,
        )
        .unwrap();

        assert_eq!(config.backtest.initial_cash, dec!(7000));
        assert_eq!(config.backtest.execution, ExecutionTiming::NextBarClose);
        assert_eq!(config.backtest.sizing, PositionSizingMethod::default());
        assert_eq!(config.logging, LoggingConfig::default());

        let csv = config.data.csv_options();
        assert!(csv.reverse);
        assert_eq!(csv.columns, ColumnMap::Indices(ColumnIndices::default()));
        assert_eq!(csv.from, NaiveDate::from_ymd_opt(2010, 1, 1));

        assert_eq!(config.strategy.name, "harami");
        assert_eq!(config.strategy.params["exit_threshold"], 0.05);
    }

    #[test]
    fn test_sizing_table() {
        let config = AppConfig::from_toml_str(
            r#"
            [backtest.sizing.percent_equity]
            percent = "100"
            "#,
        )
        .unwrap();
        assert_eq!(
            config.backtest.sizing,
            PositionSizingMethod::PercentEquity { percent: dec!(100) }
        );
    }

    #[test]
    fn test_toml_round_trip() {
        let config = AppConfig::default();
        let text = config.to_toml().unwrap();
        assert_eq!(AppConfig::from_toml_str(&text).unwrap(), config);
    }
}
