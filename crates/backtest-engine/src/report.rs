//! Backtest report generation.

use backtest_core::traits::StrategyState;
use backtest_core::types::{Order, Position, Trade};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::journal::{cents, JournalEntry};
use crate::{BacktestConfig, BacktestStats};

/// Complete backtest report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktestReport {
    /// Configuration used
    pub config: BacktestConfig,
    /// Instrument traded
    pub symbol: String,
    /// Strategy state after the last bar
    pub strategy: StrategyState,
    /// Statistics
    pub stats: BacktestStats,
    /// Orders that reached a terminal status
    pub orders: Vec<Order>,
    /// Closed trades, followed by the open one if any
    pub trades: Vec<Trade>,
    /// Cash after the last bar
    pub final_cash: Decimal,
    /// Position after the last bar
    pub final_position: Position,
    /// Dated run events
    pub journal: Vec<JournalEntry>,
}

impl BacktestReport {
    /// Journal entries formatted as `YYYY-MM-DD, text`.
    pub fn journal_lines(&self) -> Vec<String> {
        self.journal.iter().map(ToString::to_string).collect()
    }

    /// Generate a text summary.
    pub fn summary(&self) -> String {
        let mut s = String::new();

        s.push_str("═══════════════════════════════════════════════════════════\n");
        s.push_str("                     BACKTEST REPORT                        \n");
        s.push_str("═══════════════════════════════════════════════════════════\n\n");

        s.push_str(&format!("  Strategy:            {}\n", self.strategy.name));
        s.push_str(&format!("  Symbol:              {}\n", self.symbol));
        s.push_str(&format!("  Execution:           {:?}\n", self.config.execution));
        s.push('\n');

        s.push_str("PERFORMANCE\n");
        s.push_str("───────────────────────────────────────────────────────────\n");
        s.push_str(&format!(
            "  Starting Value:      {:.2}\n",
            cents(self.stats.initial_cash)
        ));
        s.push_str(&format!(
            "  Ending Value:        {:.2}\n",
            cents(self.stats.final_value)
        ));
        s.push_str(&format!(
            "  Total Return:        {:.2}%\n",
            cents(self.stats.total_return_pct)
        ));
        s.push_str(&format!(
            "  Annualized Return:   {:.2}%\n",
            cents(self.stats.annualized_return_pct)
        ));
        s.push_str(&format!(
            "  Max Drawdown:        {:.2}%\n",
            cents(self.stats.max_drawdown_pct)
        ));
        s.push_str(&format!(
            "  Total Commission:    {:.2}\n",
            cents(self.stats.total_commission)
        ));
        s.push('\n');

        s.push_str("RISK METRICS\n");
        s.push_str("───────────────────────────────────────────────────────────\n");
        s.push_str(&format!(
            "  Sharpe Ratio:        {:.2}\n",
            self.stats.sharpe_ratio
        ));
        s.push_str(&format!(
            "  Sortino Ratio:       {:.2}\n",
            self.stats.sortino_ratio
        ));
        s.push_str(&format!(
            "  Profit Factor:       {:.2}\n",
            cents(self.stats.profit_factor)
        ));
        s.push('\n');

        s.push_str("TRADE STATISTICS\n");
        s.push_str("───────────────────────────────────────────────────────────\n");
        s.push_str(&format!(
            "  Closed Trades:       {}\n",
            self.stats.total_trades
        ));
        s.push_str(&format!(
            "  Winning Trades:      {}\n",
            self.stats.winning_trades
        ));
        s.push_str(&format!(
            "  Losing Trades:       {}\n",
            self.stats.losing_trades
        ));
        s.push_str(&format!(
            "  Win Rate:            {:.2}%\n",
            cents(self.stats.win_rate_pct)
        ));
        s.push_str(&format!(
            "  Avg Win:             {:.2}\n",
            cents(self.stats.avg_win)
        ));
        s.push_str(&format!(
            "  Avg Loss:            {:.2}\n",
            cents(self.stats.avg_loss)
        ));
        match self.stats.mean_profit_rate {
            Some(rate) => s.push_str(&format!("  Mean Profit Rate:    {:.4}\n", rate)),
            None => s.push_str("  Mean Profit Rate:    n/a\n"),
        }
        s.push('\n');

        s.push_str("EXECUTION\n");
        s.push_str("───────────────────────────────────────────────────────────\n");
        s.push_str(&format!(
            "  Bars Processed:      {}\n",
            self.stats.bars_processed
        ));
        s.push_str(&format!(
            "  Orders Submitted:    {}\n",
            self.stats.orders_submitted
        ));
        s.push_str(&format!(
            "  Orders Completed:    {}\n",
            self.stats.orders_completed
        ));
        s.push_str(&format!(
            "  Orders Failed:       {}\n",
            self.stats.orders_failed
        ));
        s.push_str(&format!(
            "  Orders Invalid:      {}\n",
            self.stats.orders_invalid
        ));
        s.push_str(&format!(
            "  Final Position:      {}\n",
            self.final_position.size
        ));
        s.push('\n');

        s.push_str("═══════════════════════════════════════════════════════════\n");

        s
    }

    /// Export to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Export to CSV (equity curve only).
    pub fn equity_to_csv(&self) -> String {
        let mut csv = String::from("timestamp,cash,value,unrealized_pnl\n");
        for point in &self.stats.equity_curve {
            csv.push_str(&format!(
                "{},{},{},{}\n",
                point.timestamp, point.cash, point.value, point.unrealized_pnl
            ));
        }
        csv
    }
}
