//! Momentum indicators.

use backtest_core::traits::{MultiOutputIndicator, OhlcvIndicator};
use serde::{Deserialize, Serialize};

use crate::moving_average::ema;

/// Highest value over the last `period` points, aligned with the input.
pub fn highest(data: &[f64], period: usize) -> Vec<f64> {
    rolling(data, period, f64::max)
}

/// Lowest value over the last `period` points, aligned with the input.
pub fn lowest(data: &[f64], period: usize) -> Vec<f64> {
    rolling(data, period, f64::min)
}

fn rolling(data: &[f64], period: usize, pick: fn(f64, f64) -> f64) -> Vec<f64> {
    let mut result = vec![f64::NAN; data.len()];
    if period == 0 || data.len() < period {
        return result;
    }
    for (offset, window) in data.windows(period).enumerate() {
        let mut acc = window[0];
        for &v in &window[1..] {
            acc = pick(acc, v);
        }
        result[offset + period - 1] = acc;
    }
    result
}

/// Raw stochastic value: `100 * (close - lowest_low) / (highest_high - lowest_low)`.
///
/// Zero when the window has no range.
pub fn rsv(high: &[f64], low: &[f64], close: &[f64], period: usize) -> Vec<f64> {
    let highs = highest(high, period);
    let lows = lowest(low, period);

    close
        .iter()
        .zip(highs.iter().zip(lows.iter()))
        .map(|(&c, (&hh, &ll))| {
            if hh.is_nan() || ll.is_nan() {
                f64::NAN
            } else {
                let range = hh - ll;
                if range == 0.0 {
                    0.0
                } else {
                    100.0 * (c - ll) / range
                }
            }
        })
        .collect()
}

/// MACD output values.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MacdOutput {
    /// MACD line (fast EMA - slow EMA)
    pub macd: f64,
    /// Signal line (EMA of MACD)
    pub signal: f64,
    /// Histogram (MACD - Signal)
    pub histogram: f64,
}

/// Moving Average Convergence Divergence (MACD).
#[derive(Debug, Clone)]
pub struct Macd {
    fast_period: usize,
    slow_period: usize,
    signal_period: usize,
}

impl Macd {
    /// Create MACD with default periods (12, 26, 9).
    pub fn new() -> Self {
        Self::with_periods(12, 26, 9)
    }

    /// Create MACD with custom periods.
    pub fn with_periods(fast: usize, slow: usize, signal: usize) -> Self {
        assert!(fast > 0 && slow > 0 && signal > 0, "Periods must be greater than 0");
        assert!(fast < slow, "Fast period must be less than slow period");
        Self {
            fast_period: fast,
            slow_period: slow,
            signal_period: signal,
        }
    }

    /// MACD and signal lines computed separately, for callers that cache them.
    pub fn lines(&self, data: &[f64]) -> (Vec<f64>, Vec<f64>) {
        let fast = ema(data, self.fast_period);
        let slow = ema(data, self.slow_period);
        let macd = macd_line(&fast, &slow);
        let signal = ema(&macd, self.signal_period);
        (macd, signal)
    }
}

impl Default for Macd {
    fn default() -> Self {
        Self::new()
    }
}

/// Difference of two aligned EMA lines.
pub(crate) fn macd_line(fast: &[f64], slow: &[f64]) -> Vec<f64> {
    fast.iter().zip(slow.iter()).map(|(f, s)| f - s).collect()
}

impl MultiOutputIndicator for Macd {
    type Outputs = MacdOutput;

    fn calculate(&self, data: &[f64]) -> Vec<MacdOutput> {
        let (macd, signal) = self.lines(data);
        macd.iter()
            .zip(signal.iter())
            .map(|(&m, &s)| MacdOutput {
                macd: m,
                signal: s,
                histogram: m - s,
            })
            .collect()
    }

    fn period(&self) -> usize {
        self.slow_period + self.signal_period - 1
    }

    fn name(&self) -> &str {
        "MACD"
    }
}

/// KDJ output values.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KdjOutput {
    /// Smoothed RSV
    pub k: f64,
    /// Smoothed K
    pub d: f64,
    /// 3K - 2D
    pub j: f64,
}

/// Stochastic KDJ oscillator.
///
/// K is an EMA of the raw stochastic value over `period` bars, D an EMA of
/// K, and J = 3K - 2D.
#[derive(Debug, Clone)]
pub struct Kdj {
    period: usize,
    k_period: usize,
    d_period: usize,
}

impl Kdj {
    /// Create KDJ with default periods (9, 3, 3).
    pub fn new() -> Self {
        Self::with_periods(9, 3, 3)
    }

    /// Create KDJ with custom periods.
    pub fn with_periods(period: usize, k_period: usize, d_period: usize) -> Self {
        assert!(
            period > 0 && k_period > 0 && d_period > 0,
            "Periods must be greater than 0"
        );
        Self {
            period,
            k_period,
            d_period,
        }
    }

    /// K, D and J lines computed separately, for callers that cache them.
    pub fn lines(&self, high: &[f64], low: &[f64], close: &[f64]) -> (Vec<f64>, Vec<f64>, Vec<f64>) {
        let raw = rsv(high, low, close, self.period);
        let k = ema(&raw, self.k_period);
        let d = ema(&k, self.d_period);
        let j = j_line(&k, &d);
        (k, d, j)
    }
}

impl Default for Kdj {
    fn default() -> Self {
        Self::new()
    }
}

pub(crate) fn j_line(k: &[f64], d: &[f64]) -> Vec<f64> {
    k.iter().zip(d.iter()).map(|(k, d)| 3.0 * k - 2.0 * d).collect()
}

impl OhlcvIndicator for Kdj {
    type Output = KdjOutput;

    fn calculate(&self, high: &[f64], low: &[f64], close: &[f64]) -> Vec<KdjOutput> {
        let (k, d, j) = self.lines(high, low, close);
        k.into_iter()
            .zip(d)
            .zip(j)
            .map(|((k, d), j)| KdjOutput { k, d, j })
            .collect()
    }

    fn period(&self) -> usize {
        self.period + self.k_period + self.d_period - 2
    }

    fn name(&self) -> &str {
        "KDJ"
    }
}
