//! Indicator trait definitions.
//!
//! Every indicator returns one output per input point. Outputs before the
//! indicator has enough data are NaN (or carry NaN fields), so results stay
//! index-aligned with the bars they were computed from.

use crate::error::IndicatorError;

/// Trait for single-output technical indicators.
pub trait Indicator: Send + Sync {
    /// The output type of the indicator.
    type Output;

    /// Calculate indicator values for the given data.
    ///
    /// # Arguments
    /// * `data` - Input data (typically closes)
    ///
    /// # Returns
    /// A vector of the same length as `data`
    fn calculate(&self, data: &[f64]) -> Vec<Self::Output>;

    /// Get the number of points needed for the first defined value.
    fn period(&self) -> usize;

    /// Get the name of the indicator.
    fn name(&self) -> &str;

    /// Validate that there's enough data.
    fn validate_data(&self, data: &[f64]) -> Result<(), IndicatorError> {
        if data.len() < self.period() {
            return Err(IndicatorError::InsufficientData {
                required: self.period(),
                available: data.len(),
            });
        }
        Ok(())
    }
}

/// Multi-output indicator (e.g. MACD with its signal line).
pub trait MultiOutputIndicator: Send + Sync {
    /// The output type containing multiple values.
    type Outputs;

    /// Calculate indicator values for the given data.
    fn calculate(&self, data: &[f64]) -> Vec<Self::Outputs>;

    /// Get the number of points needed for the first fully defined output.
    fn period(&self) -> usize;

    /// Get the name of the indicator.
    fn name(&self) -> &str;
}

/// Indicator computed from highs, lows and closes rather than a single series.
pub trait OhlcvIndicator: Send + Sync {
    /// The output type of the indicator.
    type Output;

    /// Calculate indicator values from bar data.
    ///
    /// All slices must have the same length; the output matches it.
    fn calculate(&self, high: &[f64], low: &[f64], close: &[f64]) -> Vec<Self::Output>;

    /// Get the number of bars needed for the first fully defined output.
    fn period(&self) -> usize;

    /// Get the name of the indicator.
    fn name(&self) -> &str;
}
