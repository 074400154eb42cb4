//! OHLCV (Open, High, Low, Close, Volume) data types.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{BarView, Position, Timeframe};
use crate::error::DataError;

/// Compact OHLCV bar.
/// Uses f64 for fast indicator calculations.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[repr(C)]
pub struct Bar {
    /// Unix timestamp in milliseconds
    pub timestamp: i64,
    /// Opening price
    pub open: f64,
    /// Highest price
    pub high: f64,
    /// Lowest price
    pub low: f64,
    /// Closing price
    pub close: f64,
    /// Trading volume
    pub volume: f64,
}

impl Bar {
    /// Create a new bar.
    pub fn new(timestamp: i64, open: f64, high: f64, low: f64, close: f64, volume: f64) -> Self {
        Self {
            timestamp,
            open,
            high,
            low,
            close,
            volume,
        }
    }

    /// Calculate the bar's range (high - low).
    #[inline]
    pub fn range(&self) -> f64 {
        self.high - self.low
    }

    /// Calculate the bar's body size (absolute difference between open and close).
    #[inline]
    pub fn body(&self) -> f64 {
        (self.close - self.open).abs()
    }

    /// Check if the bar is bullish (close > open).
    #[inline]
    pub fn is_bullish(&self) -> bool {
        self.close > self.open
    }

    /// Check if the bar is bearish (close < open).
    #[inline]
    pub fn is_bearish(&self) -> bool {
        self.close < self.open
    }

    /// Get the timestamp as a DateTime.
    pub fn datetime(&self) -> DateTime<Utc> {
        DateTime::from_timestamp_millis(self.timestamp).unwrap_or(DateTime::UNIX_EPOCH)
    }

    /// Calendar date of the bar, used for log lines.
    pub fn date(&self) -> NaiveDate {
        self.datetime().date_naive()
    }

    fn validate(&self, index: usize) -> Result<(), DataError> {
        let values = [self.open, self.high, self.low, self.close, self.volume];
        if values.iter().any(|v| !v.is_finite()) {
            return Err(DataError::InvalidBar {
                index,
                reason: "non-finite value".into(),
            });
        }
        if self.high < self.low {
            return Err(DataError::InvalidBar {
                index,
                reason: format!("high {} below low {}", self.high, self.low),
            });
        }
        Ok(())
    }
}

impl Default for Bar {
    fn default() -> Self {
        Self {
            timestamp: 0,
            open: 0.0,
            high: 0.0,
            low: 0.0,
            close: 0.0,
            volume: 0.0,
        }
    }
}

/// Immutable, validated sequence of bars for one instrument.
///
/// Timestamps are strictly ascending: duplicates and out-of-order bars are
/// rejected when the series is built, never repaired.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceSeries {
    symbol: String,
    timeframe: Timeframe,
    bars: Vec<Bar>,
}

impl PriceSeries {
    /// Build a series, validating every bar and the ordering of timestamps.
    pub fn new(
        symbol: impl Into<String>,
        timeframe: Timeframe,
        bars: Vec<Bar>,
    ) -> Result<Self, DataError> {
        for (index, bar) in bars.iter().enumerate() {
            bar.validate(index)?;
            if index == 0 {
                continue;
            }
            let previous = bars[index - 1].timestamp;
            if bar.timestamp == previous {
                return Err(DataError::DuplicateTimestamp {
                    index,
                    timestamp: bar.timestamp,
                });
            }
            if bar.timestamp < previous {
                return Err(DataError::OutOfOrder {
                    index,
                    previous,
                    timestamp: bar.timestamp,
                });
            }
        }

        Ok(Self {
            symbol: symbol.into(),
            timeframe,
            bars,
        })
    }

    /// Fail on the first pair of consecutive bars further apart than `max_gap_ms`.
    pub fn check_gaps(&self, max_gap_ms: i64) -> Result<(), DataError> {
        for (index, pair) in self.bars.windows(2).enumerate() {
            if pair[1].timestamp - pair[0].timestamp > max_gap_ms {
                return Err(DataError::DataGap {
                    index: index + 1,
                    previous: pair[0].timestamp,
                    current: pair[1].timestamp,
                    max_gap_ms,
                });
            }
        }
        Ok(())
    }

    /// Symbol identifier.
    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// Timeframe of the bars.
    pub fn timeframe(&self) -> Timeframe {
        self.timeframe
    }

    /// Get the number of bars.
    #[inline]
    pub fn len(&self) -> usize {
        self.bars.len()
    }

    /// Check if the series is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    /// Get all bars as a slice.
    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    /// Get a bar by index (0 = oldest).
    pub fn get(&self, index: usize) -> Option<&Bar> {
        self.bars.get(index)
    }

    /// Get the last bar.
    pub fn last(&self) -> Option<&Bar> {
        self.bars.last()
    }

    /// The look-ahead-free window ending at `index`.
    pub fn view(&self, index: usize, position: Position, cash: Decimal) -> Option<BarView<'_>> {
        let history = self.bars.get(..=index)?;
        BarView::new(history, position, cash)
    }

    /// Extract close prices as a vector.
    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close).collect()
    }

    /// Extract open prices as a vector.
    pub fn opens(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.open).collect()
    }

    /// Extract high prices as a vector.
    pub fn highs(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.high).collect()
    }

    /// Extract low prices as a vector.
    pub fn lows(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.low).collect()
    }

    /// Extract volumes as a vector.
    pub fn volumes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.volume).collect()
    }

    /// Get an iterator over the bars.
    pub fn iter(&self) -> impl Iterator<Item = &Bar> {
        self.bars.iter()
    }
}
