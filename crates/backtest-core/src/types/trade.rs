//! Round-trip trade records.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A position from its first buy fill until it is flat again.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    /// Sequential trade id, unique within a run
    pub id: u64,
    /// Order that opened the trade
    pub entry_order: u64,
    /// Order that closed the trade
    pub exit_order: Option<u64>,
    /// Largest size held during the trade
    pub size: Decimal,
    /// Average entry price
    pub entry_price: Decimal,
    /// Price of the closing fill
    pub exit_price: Option<Decimal>,
    /// Bar of the opening fill
    pub entry_bar: usize,
    /// Bar of the closing fill
    pub exit_bar: Option<usize>,
    /// Timestamp of the opening fill
    pub opened_at: i64,
    /// Timestamp of the closing fill
    pub closed_at: Option<i64>,
    /// Commission paid on every fill of the trade
    pub commission: Decimal,
    /// Realized P&L before commission
    pub gross_pnl: Decimal,
    /// Realized P&L after commission
    pub net_pnl: Decimal,
    /// Whether the position has been fully offset
    pub closed: bool,
}

impl Trade {
    /// Open a trade from its first fill.
    pub fn open(
        id: u64,
        entry_order: u64,
        size: Decimal,
        price: Decimal,
        commission: Decimal,
        bar_index: usize,
        timestamp: i64,
    ) -> Self {
        Self {
            id,
            entry_order,
            exit_order: None,
            size,
            entry_price: price,
            exit_price: None,
            entry_bar: bar_index,
            exit_bar: None,
            opened_at: timestamp,
            closed_at: None,
            commission,
            gross_pnl: Decimal::ZERO,
            net_pnl: -commission,
            closed: false,
        }
    }

    /// Return on the entry price: (exit - entry) / entry.
    pub fn profit_rate(&self) -> Option<Decimal> {
        let exit = self.exit_price?;
        if self.entry_price == Decimal::ZERO {
            return None;
        }
        Some((exit - self.entry_price) / self.entry_price)
    }

    /// Number of bars between entry and exit fills.
    pub fn bars_held(&self) -> Option<usize> {
        self.exit_bar.map(|exit| exit.saturating_sub(self.entry_bar))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_open_trade() {
        let trade = Trade::open(1, 4, dec!(100), dec!(120), dec!(24), 31, 0);
        assert!(!trade.closed);
        assert_eq!(trade.net_pnl, dec!(-24));
        assert!(trade.profit_rate().is_none());
    }

    #[test]
    fn test_profit_rate() {
        let mut trade = Trade::open(1, 1, dec!(1), dec!(100), Decimal::ZERO, 3, 0);
        trade.exit_price = Some(dec!(110));
        trade.exit_bar = Some(8);

        assert_eq!(trade.profit_rate(), Some(dec!(0.1)));
        assert_eq!(trade.bars_held(), Some(5));
    }
}
