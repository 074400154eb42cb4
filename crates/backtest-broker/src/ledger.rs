//! Cash, position and trade bookkeeping.

use backtest_core::error::LedgerError;
use backtest_core::types::{Execution, Order, Position, Side, Trade};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::info;

/// Effect of a fill on the open trade.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "trade", rename_all = "snake_case")]
pub enum TradeUpdate {
    /// First fill from a flat position
    Opened(Trade),
    /// Fill that changed the size of the open trade
    Updated(Trade),
    /// Fill that brought the position back to zero
    Closed(Trade),
}

impl TradeUpdate {
    /// The trade after the update.
    pub fn trade(&self) -> &Trade {
        match self {
            TradeUpdate::Opened(t) | TradeUpdate::Updated(t) | TradeUpdate::Closed(t) => t,
        }
    }

    /// Check if the update closed the trade.
    pub fn is_closed(&self) -> bool {
        matches!(self, TradeUpdate::Closed(_))
    }
}

/// Single-instrument account: cash, a long position and its trades.
#[derive(Debug, Clone)]
pub struct PortfolioLedger {
    initial_cash: Decimal,
    cash: Decimal,
    position: Position,
    open_trade: Option<Trade>,
    closed_trades: Vec<Trade>,
    next_trade_id: u64,
    total_commission: Decimal,
    realized_pnl: Decimal,
}

impl PortfolioLedger {
    /// Create a ledger holding `initial_cash` and no position.
    pub fn new(initial_cash: Decimal) -> Self {
        Self {
            initial_cash,
            cash: initial_cash,
            position: Position::default(),
            open_trade: None,
            closed_trades: Vec::new(),
            next_trade_id: 1,
            total_commission: Decimal::ZERO,
            realized_pnl: Decimal::ZERO,
        }
    }

    /// Book the execution of a completed order.
    ///
    /// Nothing is changed when the fill is refused.
    pub fn apply_fill(&mut self, order: &Order) -> Result<TradeUpdate, LedgerError> {
        let execution = order
            .executed
            .as_ref()
            .ok_or(LedgerError::NotExecuted(order.id))?;

        match order.side {
            Side::Buy => Ok(self.apply_buy(order.id, execution)),
            Side::Sell => self.apply_sell(order.id, execution),
        }
    }

    fn apply_buy(&mut self, order_id: u64, execution: &Execution) -> TradeUpdate {
        self.cash -= execution.value + execution.commission;
        self.total_commission += execution.commission;
        self.position.increase(execution.size, execution.price);

        match self.open_trade.as_mut() {
            Some(trade) => {
                trade.size = trade.size.max(self.position.size);
                trade.entry_price = self.position.average_price;
                trade.commission += execution.commission;
                trade.net_pnl = trade.gross_pnl - trade.commission;
                TradeUpdate::Updated(trade.clone())
            }
            None => {
                let trade = Trade::open(
                    self.next_trade_id,
                    order_id,
                    execution.size,
                    execution.price,
                    execution.commission,
                    execution.bar_index,
                    execution.timestamp,
                );
                self.next_trade_id += 1;
                info!(trade_id = trade.id, size = %trade.size, price = %trade.entry_price, "Trade opened");
                self.open_trade = Some(trade.clone());
                TradeUpdate::Opened(trade)
            }
        }
    }

    fn apply_sell(&mut self, order_id: u64, execution: &Execution) -> Result<TradeUpdate, LedgerError> {
        let Some(mut trade) = self.open_trade.take() else {
            return Err(LedgerError::InsufficientPosition {
                requested: execution.size,
                held: self.position.size,
            });
        };
        let realized = match self.position.reduce(execution.size, execution.price) {
            Ok(realized) => realized,
            Err(e) => {
                self.open_trade = Some(trade);
                return Err(e);
            }
        };

        self.cash += execution.value - execution.commission;
        self.total_commission += execution.commission;
        self.realized_pnl += realized;

        trade.gross_pnl += realized;
        trade.commission += execution.commission;
        trade.net_pnl = trade.gross_pnl - trade.commission;

        if self.position.is_flat() {
            trade.closed = true;
            trade.exit_order = Some(order_id);
            trade.exit_price = Some(execution.price);
            trade.exit_bar = Some(execution.bar_index);
            trade.closed_at = Some(execution.timestamp);
            info!(
                trade_id = trade.id,
                gross = %trade.gross_pnl,
                net = %trade.net_pnl,
                "Trade closed"
            );
            self.closed_trades.push(trade.clone());
            Ok(TradeUpdate::Closed(trade))
        } else {
            self.open_trade = Some(trade.clone());
            Ok(TradeUpdate::Updated(trade))
        }
    }

    /// Cash plus the position marked at `mark`.
    pub fn value(&self, mark: Decimal) -> Decimal {
        self.cash + self.position.market_value(mark)
    }

    /// Starting cash.
    pub fn initial_cash(&self) -> Decimal {
        self.initial_cash
    }

    /// Available cash.
    pub fn cash(&self) -> Decimal {
        self.cash
    }

    /// Current position.
    pub fn position(&self) -> Position {
        self.position
    }

    /// Trade currently open, if any.
    pub fn open_trade(&self) -> Option<&Trade> {
        self.open_trade.as_ref()
    }

    /// Trades closed so far, in closing order.
    pub fn closed_trades(&self) -> &[Trade] {
        &self.closed_trades
    }

    /// Closed trades followed by the open one.
    pub fn trades(&self) -> Vec<Trade> {
        self.closed_trades
            .iter()
            .chain(self.open_trade.iter())
            .cloned()
            .collect()
    }

    /// Commission paid on every fill.
    pub fn total_commission(&self) -> Decimal {
        self.total_commission
    }

    /// Realized P&L before commission.
    pub fn realized_pnl(&self) -> Decimal {
        self.realized_pnl
    }

    /// P&L of the open position marked at `mark`, before commission.
    pub fn unrealized_pnl(&self, mark: Decimal) -> Decimal {
        self.position.unrealized_pnl(mark)
    }
}
