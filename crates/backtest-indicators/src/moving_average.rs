//! Moving average indicators.
//!
//! Leading NaN values in the input are skipped: the window starts at the
//! first defined point, so averages can be stacked on top of other lines
//! that have their own warm-up.

use backtest_core::traits::Indicator;

fn first_valid(data: &[f64]) -> Option<usize> {
    data.iter().position(|v| !v.is_nan())
}

/// Simple moving average of `data`, aligned with the input.
pub fn sma(data: &[f64], period: usize) -> Vec<f64> {
    let mut result = vec![f64::NAN; data.len()];
    if period == 0 {
        return result;
    }
    let Some(start) = first_valid(data) else {
        return result;
    };
    if data.len() - start < period {
        return result;
    }

    let period_f64 = period as f64;

    // Initial sum
    let mut sum: f64 = data[start..start + period].iter().sum();
    result[start + period - 1] = sum / period_f64;

    // Sliding window
    for i in start + period..data.len() {
        sum = sum - data[i - period] + data[i];
        result[i] = sum / period_f64;
    }

    result
}

/// Exponential moving average of `data`, aligned with the input.
///
/// Seeded with the simple average of the first `period` defined values,
/// then `ema += alpha * (x - ema)` with `alpha = 2 / (period + 1)`.
pub fn ema(data: &[f64], period: usize) -> Vec<f64> {
    let mut result = vec![f64::NAN; data.len()];
    if period == 0 {
        return result;
    }
    let Some(start) = first_valid(data) else {
        return result;
    };
    if data.len() - start < period {
        return result;
    }

    let alpha = 2.0 / (period as f64 + 1.0);
    let seed_end = start + period;
    let mut ema = data[start..seed_end].iter().sum::<f64>() / period as f64;
    result[seed_end - 1] = ema;

    for i in seed_end..data.len() {
        ema += alpha * (data[i] - ema);
        result[i] = ema;
    }

    result
}

/// Simple Moving Average (SMA).
///
/// Calculates the arithmetic mean of the last N values.
#[derive(Debug, Clone)]
pub struct Sma {
    period: usize,
}

impl Sma {
    /// Create a new SMA with the specified period.
    pub fn new(period: usize) -> Self {
        assert!(period > 0, "Period must be greater than 0");
        Self { period }
    }
}

impl Indicator for Sma {
    type Output = f64;

    fn calculate(&self, data: &[f64]) -> Vec<f64> {
        sma(data, self.period)
    }

    fn period(&self) -> usize {
        self.period
    }

    fn name(&self) -> &str {
        "SMA"
    }
}

/// Exponential Moving Average (EMA).
///
/// Gives more weight to recent prices using an exponential decay.
#[derive(Debug, Clone)]
pub struct Ema {
    period: usize,
}

impl Ema {
    /// Create a new EMA with the specified period.
    pub fn new(period: usize) -> Self {
        assert!(period > 0, "Period must be greater than 0");
        Self { period }
    }

    /// Smoothing factor `2 / (period + 1)`.
    pub fn alpha(&self) -> f64 {
        2.0 / (self.period as f64 + 1.0)
    }
}

impl Indicator for Ema {
    type Output = f64;

    fn calculate(&self, data: &[f64]) -> Vec<f64> {
        ema(data, self.period)
    }

    fn period(&self) -> usize {
        self.period
    }

    fn name(&self) -> &str {
        "EMA"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_sma() {
        let sma = Sma::new(3);
        let data = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        let result = sma.calculate(&data);

        assert_eq!(result.len(), 5);
        assert!(result[0].is_nan() && result[1].is_nan());
        assert!((result[2] - 2.0).abs() < 1e-10); // (1+2+3)/3
        assert!((result[3] - 3.0).abs() < 1e-10); // (2+3+4)/3
        assert!((result[4] - 4.0).abs() < 1e-10); // (3+4+5)/3
    }

    #[test]
    fn test_sma_insufficient_data() {
        let sma = Sma::new(5);
        let result = sma.calculate(&[1.0, 2.0, 3.0]);

        assert_eq!(result.len(), 3);
        assert!(result.iter().all(|v| v.is_nan()));
    }

    #[test]
    fn test_sma_skips_leading_nan() {
        let data = vec![f64::NAN, f64::NAN, 2.0, 4.0, 6.0];
        let result = sma(&data, 2);

        assert!(result[2].is_nan());
        assert!((result[3] - 3.0).abs() < 1e-10);
        assert!((result[4] - 5.0).abs() < 1e-10);
    }

    #[test]
    fn test_ema() {
        let ema = Ema::new(3);
        let data = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        let result = ema.calculate(&data);

        assert_eq!(result.len(), 5);
        assert!(result[1].is_nan());
        assert!((result[2] - 2.0).abs() < 1e-10); // Initial SMA
        // alpha = 2/(3+1) = 0.5
        // result[3] = 2 + 0.5 * (4 - 2) = 3.0
        assert!((result[3] - 3.0).abs() < 1e-10);
        assert!((result[4] - 4.0).abs() < 1e-10);
        assert!((ema.alpha() - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_zero_period_is_undefined() {
        assert!(sma(&[1.0, 2.0], 0).iter().all(|v| v.is_nan()));
        assert!(ema(&[1.0, 2.0], 0).iter().all(|v| v.is_nan()));
    }

    #[test]
    #[should_panic(expected = "Period must be greater than 0")]
    fn test_sma_zero_period_panics() {
        Sma::new(0);
    }

    proptest! {
        #[test]
        fn sma_of_constant_is_constant(c in 1.0f64..1000.0, period in 1usize..30, len in 30usize..80) {
            let data = vec![c; len];
            let result = sma(&data, period);
            prop_assert_eq!(result.len(), len);
            for (i, v) in result.iter().enumerate() {
                if i + 1 < period {
                    prop_assert!(v.is_nan());
                } else {
                    prop_assert!((v - c).abs() <= c * 1e-9);
                }
            }
        }

        #[test]
        fn ema_of_constant_is_constant(c in 1.0f64..1000.0, period in 1usize..30, len in 30usize..80) {
            let result = ema(&vec![c; len], period);
            for v in result.iter().skip(period - 1) {
                prop_assert!((v - c).abs() <= c * 1e-9);
            }
        }

        #[test]
        fn sma_stays_within_window_bounds(data in prop::collection::vec(1.0f64..500.0, 10..60), period in 1usize..10) {
            let result = sma(&data, period);
            for i in period - 1..data.len() {
                let window = &data[i + 1 - period..=i];
                let lo = window.iter().cloned().fold(f64::INFINITY, f64::min);
                let hi = window.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
                prop_assert!(result[i] >= lo - 1e-9 && result[i] <= hi + 1e-9);
            }
        }
    }
}
