//! Backtest statistics.

use backtest_core::types::Trade;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;

/// Account snapshot at a bar's close.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EquityPoint {
    pub timestamp: i64,
    pub cash: Decimal,
    pub value: Decimal,
    /// Open position marked at the close, less its cost basis
    pub unrealized_pnl: Decimal,
}

/// Backtest statistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktestStats {
    /// Initial cash
    pub initial_cash: Decimal,
    /// Portfolio value after the last bar
    pub final_value: Decimal,
    /// Total return percentage
    pub total_return_pct: Decimal,
    /// Annualized return percentage
    pub annualized_return_pct: Decimal,
    /// Maximum drawdown percentage
    pub max_drawdown_pct: Decimal,
    /// Sharpe ratio of per-bar returns (risk-free rate of 0), annualized
    pub sharpe_ratio: f64,
    /// Sortino ratio
    pub sortino_ratio: f64,
    /// Number of closed trades
    pub total_trades: usize,
    /// Number of closed trades with positive net P&L
    pub winning_trades: usize,
    /// Number of closed trades with negative net P&L
    pub losing_trades: usize,
    /// Win rate percentage
    pub win_rate_pct: Decimal,
    /// Average net profit per winning trade
    pub avg_win: Decimal,
    /// Average net loss per losing trade
    pub avg_loss: Decimal,
    /// Profit factor (gross profit / gross loss)
    pub profit_factor: Decimal,
    /// (exit - entry) / entry of each closed trade
    pub profit_rates: Vec<f64>,
    /// Mean of `profit_rates`, if any trade closed
    pub mean_profit_rate: Option<f64>,
    /// Commission paid over the run
    pub total_commission: Decimal,
    /// Orders handed to the broker
    pub orders_submitted: usize,
    /// Orders that filled
    pub orders_completed: usize,
    /// Orders that ended canceled, margin or rejected
    pub orders_failed: usize,
    /// Intents refused before reaching the broker
    pub orders_invalid: usize,
    /// Number of bars processed
    pub bars_processed: usize,
    /// Equity curve
    pub equity_curve: Vec<EquityPoint>,
    /// Peak value (for drawdown)
    #[serde(skip)]
    peak_value: Decimal,
    /// Per-bar returns for Sharpe calculation
    #[serde(skip)]
    returns: Vec<f64>,
    /// Net P&L of closed trades
    #[serde(skip)]
    trade_pnls: Vec<Decimal>,
}

impl BacktestStats {
    /// Create new stats tracker.
    pub fn new(initial_cash: Decimal) -> Self {
        Self {
            initial_cash,
            final_value: initial_cash,
            total_return_pct: Decimal::ZERO,
            annualized_return_pct: Decimal::ZERO,
            max_drawdown_pct: Decimal::ZERO,
            sharpe_ratio: 0.0,
            sortino_ratio: 0.0,
            total_trades: 0,
            winning_trades: 0,
            losing_trades: 0,
            win_rate_pct: Decimal::ZERO,
            avg_win: Decimal::ZERO,
            avg_loss: Decimal::ZERO,
            profit_factor: Decimal::ZERO,
            profit_rates: Vec::new(),
            mean_profit_rate: None,
            total_commission: Decimal::ZERO,
            orders_submitted: 0,
            orders_completed: 0,
            orders_failed: 0,
            orders_invalid: 0,
            bars_processed: 0,
            equity_curve: Vec::new(),
            peak_value: initial_cash,
            returns: Vec::new(),
            trade_pnls: Vec::new(),
        }
    }

    /// Record the account at a bar's close.
    pub fn record_equity(
        &mut self,
        timestamp: i64,
        cash: Decimal,
        value: Decimal,
        unrealized_pnl: Decimal,
    ) {
        let previous = self
            .equity_curve
            .last()
            .map(|p| p.value)
            .unwrap_or(self.initial_cash);
        if previous > Decimal::ZERO {
            let ret = ((value - previous) / previous).to_f64().unwrap_or(0.0);
            self.returns.push(ret);
        }

        self.equity_curve.push(EquityPoint {
            timestamp,
            cash,
            value,
            unrealized_pnl,
        });

        if value > self.peak_value {
            self.peak_value = value;
        }
        if self.peak_value > Decimal::ZERO {
            let drawdown = (self.peak_value - value) / self.peak_value * dec!(100);
            if drawdown > self.max_drawdown_pct {
                self.max_drawdown_pct = drawdown;
            }
        }

        self.bars_processed += 1;
    }

    /// Add a closed trade.
    pub fn add_trade(&mut self, trade: &Trade) {
        if !trade.closed {
            return;
        }
        self.total_trades += 1;
        self.trade_pnls.push(trade.net_pnl);
        if let Some(rate) = trade.profit_rate().and_then(|r| r.to_f64()) {
            self.profit_rates.push(rate);
        }
    }

    /// Calculate final statistics.
    pub fn finalize(&mut self, final_value: Decimal, total_commission: Decimal, bars_per_year: f64) {
        self.final_value = final_value;
        self.total_commission = total_commission;

        if self.initial_cash > Decimal::ZERO {
            self.total_return_pct =
                (self.final_value - self.initial_cash) / self.initial_cash * dec!(100);
        }

        if !self.equity_curve.is_empty() {
            let bars = self.equity_curve.len() as f64;
            let total_return = self.total_return_pct.to_f64().unwrap_or(0.0) / 100.0;
            let annualized = ((1.0 + total_return).powf(bars_per_year / bars) - 1.0) * 100.0;
            self.annualized_return_pct = Decimal::try_from(annualized).unwrap_or(Decimal::ZERO);
        }

        let mut total_profit = Decimal::ZERO;
        let mut total_loss = Decimal::ZERO;
        for pnl in &self.trade_pnls {
            if *pnl > Decimal::ZERO {
                self.winning_trades += 1;
                total_profit += pnl;
            } else if *pnl < Decimal::ZERO {
                self.losing_trades += 1;
                total_loss += pnl.abs();
            }
        }

        if self.total_trades > 0 {
            self.win_rate_pct =
                Decimal::from(self.winning_trades * 100) / Decimal::from(self.total_trades);
        }
        if self.winning_trades > 0 {
            self.avg_win = total_profit / Decimal::from(self.winning_trades);
        }
        if self.losing_trades > 0 {
            self.avg_loss = total_loss / Decimal::from(self.losing_trades);
        }
        if total_loss > Decimal::ZERO {
            self.profit_factor = total_profit / total_loss;
        }

        if !self.profit_rates.is_empty() {
            self.mean_profit_rate = Some(self.profit_rates.iter().copied().mean());
        }

        self.sharpe_ratio = sharpe_ratio(&self.returns, bars_per_year);
        self.sortino_ratio = sortino_ratio(&self.returns, bars_per_year);
    }
}

fn sharpe_ratio(returns: &[f64], periods_per_year: f64) -> f64 {
    if returns.len() < 2 {
        return 0.0;
    }
    let mean = returns.iter().copied().mean();
    let std_dev = returns.iter().copied().std_dev();
    if std_dev == 0.0 || std_dev.is_nan() {
        return 0.0;
    }
    mean / std_dev * periods_per_year.sqrt()
}

fn sortino_ratio(returns: &[f64], periods_per_year: f64) -> f64 {
    if returns.is_empty() {
        return 0.0;
    }
    let mean = returns.iter().copied().mean();
    let downside = returns
        .iter()
        .filter(|r| **r < 0.0)
        .map(|r| r.powi(2))
        .sum::<f64>()
        / returns.len() as f64;
    let downside_dev = downside.sqrt();
    if downside_dev == 0.0 {
        return 0.0;
    }
    mean / downside_dev * periods_per_year.sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn closed_trade(entry: Decimal, exit: Decimal, net: Decimal) -> Trade {
        let mut trade = Trade::open(1, 1, Decimal::ONE, entry, Decimal::ZERO, 0, 0);
        trade.exit_price = Some(exit);
        trade.net_pnl = net;
        trade.closed = true;
        trade
    }

    #[test]
    fn test_drawdown_and_return() {
        let mut stats = BacktestStats::new(dec!(1000));
        stats.record_equity(0, dec!(1000), dec!(1000), Decimal::ZERO);
        stats.record_equity(1, dec!(1000), dec!(1200), Decimal::ZERO);
        stats.record_equity(2, dec!(1000), dec!(900), Decimal::ZERO);
        stats.record_equity(3, dec!(1000), dec!(1100), Decimal::ZERO);
        stats.finalize(dec!(1100), Decimal::ZERO, 252.0);

        assert_eq!(stats.max_drawdown_pct, dec!(25));
        assert_eq!(stats.total_return_pct, dec!(10));
        assert_eq!(stats.bars_processed, 4);
        assert!(stats.sharpe_ratio != 0.0);
    }

    #[test]
    fn test_trade_statistics() {
        let mut stats = BacktestStats::new(dec!(1000));
        stats.add_trade(&closed_trade(dec!(100), dec!(110), dec!(10)));
        stats.add_trade(&closed_trade(dec!(100), dec!(95), dec!(-5)));
        stats.add_trade(&closed_trade(dec!(100), dec!(120), dec!(20)));
        stats.finalize(dec!(1025), dec!(3), 252.0);

        assert_eq!(stats.total_trades, 3);
        assert_eq!(stats.winning_trades, 2);
        assert_eq!(stats.losing_trades, 1);
        assert_eq!(stats.profit_factor, dec!(6));
        assert_eq!(stats.avg_win, dec!(15));
        assert_eq!(stats.total_commission, dec!(3));
        let mean = stats.mean_profit_rate.unwrap();
        assert!((mean - 0.25 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_open_trade_is_ignored() {
        let mut stats = BacktestStats::new(dec!(1000));
        let open = Trade::open(1, 1, Decimal::ONE, dec!(10), Decimal::ZERO, 0, 0);
        stats.add_trade(&open);
        stats.finalize(dec!(1000), Decimal::ZERO, 252.0);

        assert_eq!(stats.total_trades, 0);
        assert!(stats.mean_profit_rate.is_none());
        assert_eq!(stats.sharpe_ratio, 0.0);
    }

    #[test]
    fn test_flat_equity_has_no_sharpe() {
        let mut stats = BacktestStats::new(dec!(1000));
        for ts in 0..10 {
            stats.record_equity(ts, dec!(1000), dec!(1000), Decimal::ZERO);
        }
        stats.finalize(dec!(1000), Decimal::ZERO, 252.0);

        assert_eq!(stats.sharpe_ratio, 0.0);
        assert_eq!(stats.max_drawdown_pct, Decimal::ZERO);
    }
}
