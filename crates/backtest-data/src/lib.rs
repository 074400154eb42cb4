//! Historical bar loading for backtests.

mod csv_source;

pub use csv_source::{read_bars, ColumnIndices, ColumnMap, CsvDataSource, CsvOptions};

use backtest_core::error::DataError;
use backtest_core::types::{PriceSeries, Timeframe};
use std::path::Path;

/// Load a validated price series from a CSV file.
pub fn load_csv(
    path: impl AsRef<Path>,
    symbol: &str,
    timeframe: Timeframe,
    options: CsvOptions,
) -> Result<PriceSeries, DataError> {
    CsvDataSource::new(path)?
        .with_options(options)
        .load(symbol, timeframe)
}
