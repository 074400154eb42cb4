//! Indicator output aligned with a price series.

use std::sync::Arc;

use super::BarView;

/// A derived series with one value per bar; NaN marks "not yet defined".
///
/// Cloning is cheap, so the same computed line can be shared between an
/// indicator cache and the strategies reading it.
#[derive(Debug, Clone, PartialEq)]
pub struct Line {
    values: Arc<[f64]>,
}

impl Line {
    /// Wrap already aligned values.
    pub fn new(values: Vec<f64>) -> Self {
        Self {
            values: values.into(),
        }
    }

    /// Value `ago` bars before the view's current bar.
    ///
    /// Returns `None` during warm-up or before the start of the series.
    pub fn at(&self, view: &BarView<'_>, ago: usize) -> Option<f64> {
        let index = view.index().checked_sub(ago)?;
        self.values
            .get(index)
            .copied()
            .filter(|v| !v.is_nan())
    }

    /// Number of values (equal to the number of bars).
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// True for a line over an empty series.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Index of the first defined value.
    pub fn first_valid(&self) -> Option<usize> {
        self.values.iter().position(|v| !v.is_nan())
    }

    /// Raw values, NaN included.
    pub fn values(&self) -> &[f64] {
        &self.values
    }
}

impl From<Vec<f64>> for Line {
    fn from(values: Vec<f64>) -> Self {
        Self::new(values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Bar, Position};
    use rust_decimal::Decimal;

    #[test]
    fn test_line_reads_through_view() {
        let bars: Vec<Bar> = (0..4)
            .map(|i| Bar::new(i, 1.0, 1.0, 1.0, 1.0, 1.0))
            .collect();
        let line = Line::new(vec![f64::NAN, 2.0, 3.0, 4.0]);

        let view = BarView::new(&bars[..3], Position::default(), Decimal::ZERO).unwrap();
        assert_eq!(line.at(&view, 0), Some(3.0));
        assert_eq!(line.at(&view, 1), Some(2.0));
        assert_eq!(line.at(&view, 2), None);
        assert_eq!(line.at(&view, 3), None);
        assert_eq!(line.first_valid(), Some(1));
    }
}
