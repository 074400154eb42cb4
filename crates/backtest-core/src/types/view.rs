//! The window of market and account state a strategy sees on each bar.

use rust_decimal::Decimal;

use super::{Bar, Position};

/// Bars `0..=i` of a series plus the account snapshot at bar `i`.
///
/// Built by [`PriceSeries::view`](super::PriceSeries::view); there is no way
/// to reach a bar past the current one through it.
#[derive(Debug, Clone, Copy)]
pub struct BarView<'a> {
    history: &'a [Bar],
    current: &'a Bar,
    position: Position,
    cash: Decimal,
}

impl<'a> BarView<'a> {
    /// Build a view over `history`, whose last bar is the current one.
    /// Returns `None` for an empty history.
    pub fn new(history: &'a [Bar], position: Position, cash: Decimal) -> Option<Self> {
        let current = history.last()?;
        Some(Self {
            history,
            current,
            position,
            cash,
        })
    }

    /// Index of the current bar in the series.
    #[inline]
    pub fn index(&self) -> usize {
        self.history.len() - 1
    }

    /// The current bar.
    #[inline]
    pub fn current(&self) -> &'a Bar {
        self.current
    }

    /// The bar `n` bars back (0 = current).
    pub fn ago(&self, n: usize) -> Option<&'a Bar> {
        self.index()
            .checked_sub(n)
            .and_then(|i| self.history.get(i))
    }

    /// All bars up to and including the current one.
    pub fn history(&self) -> &'a [Bar] {
        self.history
    }

    /// Position held at this bar.
    pub fn position(&self) -> Position {
        self.position
    }

    /// Cash available at this bar.
    pub fn cash(&self) -> Decimal {
        self.cash
    }

    /// True when no position is open.
    pub fn is_flat(&self) -> bool {
        self.position.is_flat()
    }
}
