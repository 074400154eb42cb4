//! Cached indicator computation over one price series.

use std::collections::HashMap;

use backtest_core::error::IndicatorError;
use backtest_core::types::{Line, PriceSeries};
use tracing::trace;

use crate::momentum::{highest, j_line, lowest, macd_line, rsv};
use crate::moving_average::{ema, sma};

/// Identity of a computed line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndicatorKey {
    Sma(usize),
    Ema(usize),
    Highest(usize),
    Lowest(usize),
    Rsv(usize),
    MacdLine { fast: usize, slow: usize },
    MacdSignal { fast: usize, slow: usize, signal: usize },
    KdjK { period: usize, k: usize },
    KdjD { period: usize, k: usize, d: usize },
    KdjJ { period: usize, k: usize, d: usize },
}

/// MACD lines for a series.
#[derive(Debug, Clone)]
pub struct MacdLines {
    pub macd: Line,
    pub signal: Line,
    pub histogram: Line,
}

/// KDJ lines for a series.
#[derive(Debug, Clone)]
pub struct KdjLines {
    pub k: Line,
    pub d: Line,
    pub j: Line,
}

/// Computes indicator lines over a series, each at most once.
///
/// Requests for a line that was already computed (directly or as part of a
/// composite such as MACD) return a shared copy of the cached line.
pub struct IndicatorEngine<'a> {
    series: &'a PriceSeries,
    closes: Vec<f64>,
    cache: HashMap<IndicatorKey, Line>,
}

impl<'a> IndicatorEngine<'a> {
    /// Create an engine over `series`.
    pub fn new(series: &'a PriceSeries) -> Self {
        Self {
            series,
            closes: series.closes(),
            cache: HashMap::new(),
        }
    }

    /// Number of bars in the underlying series.
    pub fn len(&self) -> usize {
        self.closes.len()
    }

    /// True when the underlying series has no bars.
    pub fn is_empty(&self) -> bool {
        self.closes.is_empty()
    }

    /// Number of lines computed so far.
    pub fn cached(&self) -> usize {
        self.cache.len()
    }

    /// Simple moving average of closes.
    pub fn sma(&mut self, period: usize) -> Result<Line, IndicatorError> {
        check_period("sma period", period)?;
        Ok(cached(&mut self.cache, IndicatorKey::Sma(period), || {
            sma(&self.closes, period)
        }))
    }

    /// Exponential moving average of closes.
    pub fn ema(&mut self, period: usize) -> Result<Line, IndicatorError> {
        check_period("ema period", period)?;
        Ok(cached(&mut self.cache, IndicatorKey::Ema(period), || {
            ema(&self.closes, period)
        }))
    }

    /// Highest high over `period` bars.
    pub fn highest(&mut self, period: usize) -> Result<Line, IndicatorError> {
        check_period("highest period", period)?;
        let series = self.series;
        Ok(cached(&mut self.cache, IndicatorKey::Highest(period), || {
            highest(&series.highs(), period)
        }))
    }

    /// Lowest low over `period` bars.
    pub fn lowest(&mut self, period: usize) -> Result<Line, IndicatorError> {
        check_period("lowest period", period)?;
        let series = self.series;
        Ok(cached(&mut self.cache, IndicatorKey::Lowest(period), || {
            lowest(&series.lows(), period)
        }))
    }

    /// MACD, signal and histogram lines.
    pub fn macd(
        &mut self,
        fast: usize,
        slow: usize,
        signal: usize,
    ) -> Result<MacdLines, IndicatorError> {
        check_period("macd fast period", fast)?;
        check_period("macd slow period", slow)?;
        check_period("macd signal period", signal)?;
        if fast >= slow {
            return Err(IndicatorError::InvalidParameter(format!(
                "macd fast period {} must be less than slow period {}",
                fast, slow
            )));
        }

        let fast_line = self.ema(fast)?;
        let slow_line = self.ema(slow)?;
        let macd = cached(&mut self.cache, IndicatorKey::MacdLine { fast, slow }, || {
            macd_line(fast_line.values(), slow_line.values())
        });
        let signal_line = cached(
            &mut self.cache,
            IndicatorKey::MacdSignal { fast, slow, signal },
            || ema(macd.values(), signal),
        );
        let histogram = macd_line(macd.values(), signal_line.values());

        Ok(MacdLines {
            macd,
            signal: signal_line,
            histogram: Line::new(histogram),
        })
    }

    /// KDJ lines over `period` bars with `k` and `d` smoothing.
    pub fn kdj(&mut self, period: usize, k: usize, d: usize) -> Result<KdjLines, IndicatorError> {
        check_period("kdj period", period)?;
        check_period("kdj k period", k)?;
        check_period("kdj d period", d)?;

        let series = self.series;
        let raw = cached(&mut self.cache, IndicatorKey::Rsv(period), || {
            rsv(&series.highs(), &series.lows(), &series.closes(), period)
        });
        let k_line = cached(&mut self.cache, IndicatorKey::KdjK { period, k }, || {
            ema(raw.values(), k)
        });
        let d_line = cached(&mut self.cache, IndicatorKey::KdjD { period, k, d }, || {
            ema(k_line.values(), d)
        });
        let j = cached(&mut self.cache, IndicatorKey::KdjJ { period, k, d }, || {
            j_line(k_line.values(), d_line.values())
        });

        Ok(KdjLines {
            k: k_line,
            d: d_line,
            j,
        })
    }
}

fn cached(
    cache: &mut HashMap<IndicatorKey, Line>,
    key: IndicatorKey,
    compute: impl FnOnce() -> Vec<f64>,
) -> Line {
    if let Some(line) = cache.get(&key) {
        return line.clone();
    }
    trace!(?key, "Computing indicator line");
    let line = Line::new(compute());
    cache.insert(key, line.clone());
    line
}

fn check_period(name: &str, period: usize) -> Result<(), IndicatorError> {
    if period == 0 {
        return Err(IndicatorError::InvalidParameter(format!(
            "{} must be greater than 0",
            name
        )));
    }
    Ok(())
}
