//! Backtesting engine.

use backtest_broker::{BrokerEvent, ExecutionTiming, FillPhase, SimulatedBroker, TradeUpdate};
use backtest_core::error::{BacktestError, DataError};
use backtest_core::traits::Strategy;
use backtest_core::types::{BarView, Order, OrderIntent, OrderRequest, OrderStatus, PriceSeries, Side};
use backtest_sizing::{PositionSizer, PositionSizingMethod};
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::journal::{Journal, RunEvent};
use crate::report::BacktestReport;
use crate::statistics::BacktestStats;

/// Backtest configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestConfig {
    /// Initial cash
    pub initial_cash: Decimal,
    /// Commission as a fraction of traded value
    pub commission_rate: Decimal,
    /// Sizing for intents without an explicit size
    pub sizing: PositionSizingMethod,
    /// When market orders fill
    pub execution: ExecutionTiming,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        Self {
            initial_cash: dec!(1000000),
            commission_rate: dec!(0.002),
            sizing: PositionSizingMethod::default(),
            execution: ExecutionTiming::default(),
        }
    }
}

impl BacktestConfig {
    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), BacktestError> {
        if self.initial_cash <= Decimal::ZERO {
            return Err(BacktestError::Config(format!(
                "initial cash must be positive, got {}",
                self.initial_cash
            )));
        }
        if self.commission_rate < Decimal::ZERO || self.commission_rate >= Decimal::ONE {
            return Err(BacktestError::Config(format!(
                "commission rate must be in [0, 1), got {}",
                self.commission_rate
            )));
        }
        match &self.sizing {
            PositionSizingMethod::Fixed { shares } if *shares <= Decimal::ZERO => Err(
                BacktestError::Config(format!("fixed size must be positive, got {}", shares)),
            ),
            PositionSizingMethod::PercentEquity { percent }
                if *percent <= Decimal::ZERO || *percent > dec!(100) =>
            {
                Err(BacktestError::Config(format!(
                    "percent of equity must be in (0, 100], got {}",
                    percent
                )))
            }
            _ => Ok(()),
        }
    }
}

/// Backtesting engine.
///
/// Runs are independent: every call to [`run`](Self::run) starts from a fresh
/// broker and resets the strategy, so one engine and one strategy instance
/// can be reused.
pub struct BacktestEngine {
    config: BacktestConfig,
}

impl BacktestEngine {
    /// Create a new backtest engine.
    pub fn new(config: BacktestConfig) -> Self {
        Self { config }
    }

    /// Engine configuration.
    pub fn config(&self) -> &BacktestConfig {
        &self.config
    }

    /// Run `strategy` over every bar of `series`.
    ///
    /// Per bar: fills due at the open are processed and notified, the
    /// strategy decides unless an order is pending, fills due at the close are
    /// processed, and the account is marked to the close. An order still
    /// pending after the last bar is canceled.
    pub fn run(
        &self,
        series: &PriceSeries,
        strategy: &mut dyn Strategy,
    ) -> Result<BacktestReport, BacktestError> {
        self.config.validate()?;
        let last_bar = *series.last().ok_or(DataError::NoDataAvailable)?;

        strategy.reset();
        strategy.init(series)?;

        info!(
            strategy = strategy.name(),
            symbol = series.symbol(),
            bars = series.len(),
            cash = %self.config.initial_cash,
            "Starting backtest"
        );

        let mut run = Run::new(&self.config, series);

        for (index, bar) in series.iter().enumerate() {
            let events = run.broker.process(bar, index, FillPhase::Open);
            run.dispatch(strategy, index, events)?;

            if run.broker.has_pending() {
                debug!(bar = index, "Order pending, skipping decision");
            } else {
                let view = run.view(index)?;
                if let Some(intent) = strategy.decide(&view) {
                    run.place(strategy, &view, intent)?;
                }
            }

            let events = run.broker.process(bar, index, FillPhase::Close);
            run.dispatch(strategy, index, events)?;

            debug!(bar = index, close = bar.close, "Close");
            let mark = to_price(bar.close);
            run.stats.record_equity(
                bar.timestamp,
                run.broker.cash(),
                run.broker.value(mark),
                run.broker.ledger().unrealized_pnl(mark),
            );
        }

        let last_index = series.len() - 1;
        if let Some(order) = run.broker.cancel_pending() {
            run.notify_order(strategy, last_index, &order)?;
        }

        let final_value = run.broker.value(to_price(last_bar.close));
        strategy.finalize(final_value);
        run.journal.record(
            last_index,
            last_bar.timestamp,
            RunEvent::EndingValue { value: final_value },
        );

        let Run {
            broker,
            journal,
            mut stats,
            ..
        } = run;
        stats.finalize(
            final_value,
            broker.ledger().total_commission(),
            series.timeframe().bars_per_year(),
        );

        info!(
            strategy = strategy.name(),
            final_value = %final_value,
            trades = stats.total_trades,
            "Backtest complete"
        );

        Ok(BacktestReport {
            config: self.config.clone(),
            symbol: series.symbol().to_string(),
            strategy: strategy.state(),
            stats,
            orders: broker.orders().to_vec(),
            trades: broker.ledger().trades(),
            final_cash: broker.cash(),
            final_position: broker.position(),
            journal: journal.into_entries(),
        })
    }
}

/// State of one run.
struct Run<'s> {
    series: &'s PriceSeries,
    broker: SimulatedBroker,
    sizer: PositionSizer,
    journal: Journal,
    stats: BacktestStats,
}

impl<'s> Run<'s> {
    fn new(config: &BacktestConfig, series: &'s PriceSeries) -> Self {
        Self {
            series,
            broker: SimulatedBroker::new(config.initial_cash)
                .with_commission(config.commission_rate)
                .with_execution(config.execution),
            sizer: PositionSizer::new(config.sizing.clone()),
            journal: Journal::new(),
            stats: BacktestStats::new(config.initial_cash),
        }
    }

    /// Look-ahead-free view of bar `index` with the current account.
    fn view(&self, index: usize) -> Result<BarView<'s>, BacktestError> {
        self.series
            .view(index, self.broker.position(), self.broker.cash())
            .ok_or_else(|| BacktestError::Validation(format!("bar {} is out of range", index)))
    }

    fn timestamp(&self, index: usize) -> i64 {
        self.series.get(index).map(|b| b.timestamp).unwrap_or_default()
    }

    /// Size an intent and hand it to the broker.
    fn place(
        &mut self,
        strategy: &mut dyn Strategy,
        view: &BarView<'s>,
        intent: OrderIntent,
    ) -> Result<(), BacktestError> {
        let index = view.index();
        let bar = view.current();
        let close = to_price(bar.close);

        let size = match (intent.size, intent.side) {
            (Some(size), _) => size,
            (None, Side::Buy) => self.sizer.calculate(
                self.broker.value(close),
                self.broker.cash(),
                close,
                self.broker.commission_rate(),
            ),
            (None, Side::Sell) => self.broker.position().size,
        };

        self.journal.record(
            index,
            bar.timestamp,
            RunEvent::OrderCreated {
                side: intent.side,
                price: close,
            },
        );

        let request = OrderRequest::market(intent.side, size, index, bar.timestamp);
        match self.broker.submit(request) {
            Ok(order) => {
                self.stats.orders_submitted += 1;
                self.notify_order(strategy, index, &order)
            }
            Err(e) => {
                warn!(bar = index, side = %intent.side, %size, error = %e, "Invalid order");
                self.stats.orders_invalid += 1;
                self.journal.record(
                    index,
                    bar.timestamp,
                    RunEvent::OrderInvalid {
                        side: intent.side,
                        reason: e.to_string(),
                    },
                );
                Ok(())
            }
        }
    }

    /// Route broker events to the journal, statistics and strategy.
    fn dispatch(
        &mut self,
        strategy: &mut dyn Strategy,
        index: usize,
        events: Vec<BrokerEvent>,
    ) -> Result<(), BacktestError> {
        for event in events {
            match event {
                BrokerEvent::Order(order) => self.notify_order(strategy, index, &order)?,
                BrokerEvent::Trade(update) => {
                    if let TradeUpdate::Closed(trade) = &update {
                        let timestamp = self.timestamp(index);
                        self.stats.add_trade(trade);
                        self.journal.record(
                            index,
                            timestamp,
                            RunEvent::TradeClosed {
                                gross: trade.gross_pnl,
                                net: trade.net_pnl,
                            },
                        );
                    }
                    strategy.on_trade(update.trade());
                }
            }
        }
        Ok(())
    }

    fn notify_order(
        &mut self,
        strategy: &mut dyn Strategy,
        index: usize,
        order: &Order,
    ) -> Result<(), BacktestError> {
        let timestamp = self.timestamp(index);
        match order.status {
            OrderStatus::Submitted | OrderStatus::Accepted => {
                debug!(order_id = order.id, status = %order.status, "Order update");
            }
            OrderStatus::Completed => {
                self.stats.orders_completed += 1;
                if let Some(execution) = &order.executed {
                    self.journal.record(
                        index,
                        timestamp,
                        RunEvent::OrderExecuted {
                            side: order.side,
                            price: execution.price,
                            cost: execution.value,
                            commission: execution.commission,
                        },
                    );
                }
            }
            OrderStatus::Canceled | OrderStatus::Margin | OrderStatus::Rejected => {
                self.stats.orders_failed += 1;
                self.journal.record(
                    index,
                    timestamp,
                    RunEvent::OrderFailed {
                        side: order.side,
                        status: order.status,
                    },
                );
            }
        }

        let view = self.view(index)?;
        strategy.on_order(order, &view);
        Ok(())
    }
}

fn to_price(value: f64) -> Decimal {
    Decimal::from_f64(value).unwrap_or(Decimal::ZERO)
}
