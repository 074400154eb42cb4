//! Simulated broker for bar-driven backtests.

use backtest_core::error::{BrokerError, LedgerError};
use backtest_core::types::{Bar, Execution, Order, OrderRequest, OrderStatus, Position, Side};
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::ledger::{PortfolioLedger, TradeUpdate};

/// When a market order is filled relative to the bar it was placed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionTiming {
    /// Open of the next bar
    #[default]
    NextBarOpen,
    /// Close of the next bar
    NextBarClose,
    /// Close of the bar the order was placed on
    CurrentBarClose,
}

impl std::str::FromStr for ExecutionTiming {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "next_bar_open" | "open" => Ok(ExecutionTiming::NextBarOpen),
            "next_bar_close" => Ok(ExecutionTiming::NextBarClose),
            "current_bar_close" | "close" => Ok(ExecutionTiming::CurrentBarClose),
            _ => Err(format!("Invalid execution timing: {}", s)),
        }
    }
}

/// Point within a bar at which the broker looks for fills.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FillPhase {
    /// Before the strategy decides on the bar
    Open,
    /// After the strategy decided on the bar
    Close,
}

/// Notification produced by the broker.
#[derive(Debug, Clone, PartialEq)]
pub enum BrokerEvent {
    /// An order changed status
    Order(Order),
    /// A fill opened, changed or closed the trade
    Trade(TradeUpdate),
}

/// Single-instrument broker holding at most one pending market order.
pub struct SimulatedBroker {
    ledger: PortfolioLedger,
    commission_rate: Decimal,
    execution: ExecutionTiming,
    pending: Option<Order>,
    orders: Vec<Order>,
    next_order_id: u64,
}

impl SimulatedBroker {
    /// Create a broker with initial cash and no commission.
    pub fn new(initial_cash: Decimal) -> Self {
        Self {
            ledger: PortfolioLedger::new(initial_cash),
            commission_rate: Decimal::ZERO,
            execution: ExecutionTiming::default(),
            pending: None,
            orders: Vec::new(),
            next_order_id: 1,
        }
    }

    /// Set the commission rate charged on traded value.
    pub fn with_commission(mut self, rate: Decimal) -> Self {
        self.commission_rate = rate;
        self
    }

    /// Set the execution timing.
    pub fn with_execution(mut self, execution: ExecutionTiming) -> Self {
        self.execution = execution;
        self
    }

    /// Commission rate.
    pub fn commission_rate(&self) -> Decimal {
        self.commission_rate
    }

    /// Execution timing.
    pub fn execution(&self) -> ExecutionTiming {
        self.execution
    }

    /// Submit a market order.
    ///
    /// Returns the order in `Submitted` status. It is accepted on the next
    /// call to [`process`](Self::process).
    pub fn submit(&mut self, request: OrderRequest) -> Result<Order, BrokerError> {
        if let Some(pending) = &self.pending {
            return Err(BrokerError::InvalidOrder(format!(
                "order {} is still pending",
                pending.id
            )));
        }
        if request.size <= Decimal::ZERO {
            return Err(BrokerError::InvalidOrder(format!(
                "size must be positive, got {}",
                request.size
            )));
        }
        if request.side == Side::Sell && request.size > self.ledger.position().size {
            return Err(BrokerError::Ledger(LedgerError::InsufficientPosition {
                requested: request.size,
                held: self.ledger.position().size,
            }));
        }

        let order = Order::from_request(self.next_order_id, &request);
        self.next_order_id += 1;
        debug!(order_id = order.id, side = %order.side, size = %order.size, "Order submitted");

        self.pending = Some(order.clone());
        Ok(order)
    }

    /// Advance the pending order on bar `index` for the given phase.
    ///
    /// A submitted order is accepted first; it is then filled when the
    /// execution timing matches this bar and phase.
    pub fn process(&mut self, bar: &Bar, index: usize, phase: FillPhase) -> Vec<BrokerEvent> {
        let mut events = Vec::new();
        let Some(mut order) = self.pending.take() else {
            return events;
        };

        if order.status == OrderStatus::Submitted {
            order.status = OrderStatus::Accepted;
            events.push(BrokerEvent::Order(order.clone()));
        }

        let fill_price = match (self.execution, phase) {
            (ExecutionTiming::NextBarOpen, FillPhase::Open) if index > order.requested_bar_index => {
                Some(bar.open)
            }
            (ExecutionTiming::NextBarClose, FillPhase::Close)
                if index > order.requested_bar_index =>
            {
                Some(bar.close)
            }
            (ExecutionTiming::CurrentBarClose, FillPhase::Close)
                if index >= order.requested_bar_index =>
            {
                Some(bar.close)
            }
            _ => None,
        };

        match fill_price {
            Some(price) => self.fill(order, bar, index, price, &mut events),
            None => self.pending = Some(order),
        }
        events
    }

    fn fill(
        &mut self,
        mut order: Order,
        bar: &Bar,
        index: usize,
        raw_price: f64,
        events: &mut Vec<BrokerEvent>,
    ) {
        let price = match Decimal::from_f64(raw_price).filter(|p| *p > Decimal::ZERO) {
            Some(price) => price,
            None => {
                warn!(order_id = order.id, error = %BrokerError::InvalidPrice(raw_price), "Order rejected");
                self.finish(order, OrderStatus::Rejected, events);
                return;
            }
        };

        let value = price * order.size;
        let commission = value * self.commission_rate;

        if order.side == Side::Buy && value + commission > self.ledger.cash() {
            let error = BrokerError::OrderRejected {
                required: value + commission,
                available: self.ledger.cash(),
            };
            warn!(order_id = order.id, %error, "Order margin");
            self.finish(order, OrderStatus::Margin, events);
            return;
        }

        order.complete(Execution {
            bar_index: index,
            timestamp: bar.timestamp,
            price,
            size: order.size,
            value,
            commission,
        });

        match self.ledger.apply_fill(&order) {
            Ok(update) => {
                info!(
                    order_id = order.id,
                    side = %order.side,
                    %price,
                    size = %order.size,
                    %commission,
                    "Order executed"
                );
                self.orders.push(order.clone());
                events.push(BrokerEvent::Order(order));
                events.push(BrokerEvent::Trade(update));
            }
            Err(e) => {
                warn!(order_id = order.id, error = %e, "Order rejected");
                order.executed = None;
                self.finish(order, OrderStatus::Rejected, events);
            }
        }
    }

    fn finish(&mut self, mut order: Order, status: OrderStatus, events: &mut Vec<BrokerEvent>) {
        order.status = status;
        self.orders.push(order.clone());
        events.push(BrokerEvent::Order(order));
    }

    /// Cancel the pending order, if any.
    pub fn cancel_pending(&mut self) -> Option<Order> {
        let mut order = self.pending.take()?;
        order.status = OrderStatus::Canceled;
        debug!(order_id = order.id, "Order canceled");
        self.orders.push(order.clone());
        Some(order)
    }

    /// The order waiting for execution.
    pub fn pending(&self) -> Option<&Order> {
        self.pending.as_ref()
    }

    /// Check if an order is waiting for execution.
    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Orders that reached a terminal status, in the order they finished.
    pub fn orders(&self) -> &[Order] {
        &self.orders
    }

    /// Look up an order by id.
    pub fn order(&self, id: u64) -> Result<&Order, BrokerError> {
        self.pending
            .iter()
            .chain(self.orders.iter())
            .find(|o| o.id == id)
            .ok_or(BrokerError::OrderNotFound(id))
    }

    /// Account ledger.
    pub fn ledger(&self) -> &PortfolioLedger {
        &self.ledger
    }

    /// Available cash.
    pub fn cash(&self) -> Decimal {
        self.ledger.cash()
    }

    /// Current position.
    pub fn position(&self) -> Position {
        self.ledger.position()
    }

    /// Portfolio value marked at `mark`.
    pub fn value(&self, mark: Decimal) -> Decimal {
        self.ledger.value(mark)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn bar(timestamp: i64, open: f64, close: f64) -> Bar {
        Bar::new(timestamp, open, open.max(close), open.min(close), close, 1000.0)
    }

    fn statuses(events: &[BrokerEvent]) -> Vec<OrderStatus> {
        events
            .iter()
            .filter_map(|e| match e {
                BrokerEvent::Order(o) => Some(o.status),
                BrokerEvent::Trade(_) => None,
            })
            .collect()
    }

    #[test]
    fn test_next_bar_open_fill() {
        let mut broker = SimulatedBroker::new(dec!(1000000)).with_commission(dec!(0.002));
        let decision = bar(0, 100.0, 120.0);

        let order = broker
            .submit(OrderRequest::market(Side::Buy, dec!(100), 30, decision.timestamp))
            .unwrap();
        assert_eq!(order.status, OrderStatus::Submitted);

        // Same bar: accepted, not filled
        let events = broker.process(&decision, 30, FillPhase::Close);
        assert_eq!(statuses(&events), vec![OrderStatus::Accepted]);
        assert!(broker.has_pending());

        let next = bar(1, 120.0, 125.0);
        let events = broker.process(&next, 31, FillPhase::Open);
        assert_eq!(statuses(&events), vec![OrderStatus::Completed]);
        assert!(matches!(events[1], BrokerEvent::Trade(TradeUpdate::Opened(_))));

        let BrokerEvent::Order(filled) = &events[0] else {
            panic!("expected order event");
        };
        let execution = filled.executed.as_ref().unwrap();
        assert_eq!(execution.price, dec!(120));
        assert_eq!(execution.value, dec!(12000));
        assert_eq!(execution.commission, dec!(24));
        assert_eq!(execution.bar_index, 31);

        assert_eq!(broker.cash(), dec!(987976));
        assert_eq!(broker.value(dec!(120)), dec!(999976));
        assert!(!broker.has_pending());
    }

    #[test]
    fn test_current_bar_close_fill() {
        let mut broker =
            SimulatedBroker::new(dec!(1000)).with_execution(ExecutionTiming::CurrentBarClose);
        let b = bar(0, 10.0, 12.0);

        broker.submit(OrderRequest::market(Side::Buy, dec!(1), 0, 0)).unwrap();
        assert!(broker.process(&b, 0, FillPhase::Open).len() == 1);
        let events = broker.process(&b, 0, FillPhase::Close);

        assert_eq!(statuses(&events), vec![OrderStatus::Completed]);
        assert_eq!(broker.cash(), dec!(988));
    }

    #[test]
    fn test_next_bar_close_fill() {
        let mut broker =
            SimulatedBroker::new(dec!(1000)).with_execution(ExecutionTiming::NextBarClose);

        broker.submit(OrderRequest::market(Side::Buy, dec!(1), 0, 0)).unwrap();
        broker.process(&bar(0, 10.0, 11.0), 0, FillPhase::Close);
        assert!(broker.process(&bar(1, 12.0, 13.0), 1, FillPhase::Open).is_empty());
        let events = broker.process(&bar(1, 12.0, 13.0), 1, FillPhase::Close);

        assert_eq!(statuses(&events), vec![OrderStatus::Completed]);
        assert_eq!(broker.cash(), dec!(987));
    }

    #[test]
    fn test_margin() {
        let mut broker = SimulatedBroker::new(dec!(1000)).with_commission(dec!(0.01));

        broker.submit(OrderRequest::market(Side::Buy, dec!(10), 0, 0)).unwrap();
        broker.process(&bar(0, 100.0, 100.0), 0, FillPhase::Close);
        // 10 * 100 * 1.01 = 1010 > 1000
        let events = broker.process(&bar(1, 100.0, 100.0), 1, FillPhase::Open);

        assert_eq!(statuses(&events), vec![OrderStatus::Margin]);
        assert_eq!(broker.cash(), dec!(1000));
        assert!(broker.position().is_flat());
        assert!(!broker.has_pending());
        assert_eq!(broker.order(1).unwrap().status, OrderStatus::Margin);
    }

    #[test]
    fn test_single_pending_order() {
        let mut broker = SimulatedBroker::new(dec!(1000));

        broker.submit(OrderRequest::market(Side::Buy, dec!(1), 0, 0)).unwrap();
        let err = broker
            .submit(OrderRequest::market(Side::Buy, dec!(1), 0, 0))
            .unwrap_err();
        assert!(matches!(err, BrokerError::InvalidOrder(_)));
    }

    #[test]
    fn test_invalid_submissions() {
        let mut broker = SimulatedBroker::new(dec!(1000));

        let err = broker
            .submit(OrderRequest::market(Side::Sell, dec!(1), 0, 0))
            .unwrap_err();
        assert_eq!(
            err,
            BrokerError::Ledger(LedgerError::InsufficientPosition {
                requested: dec!(1),
                held: Decimal::ZERO
            })
        );

        let err = broker
            .submit(OrderRequest::market(Side::Buy, Decimal::ZERO, 0, 0))
            .unwrap_err();
        assert!(matches!(err, BrokerError::InvalidOrder(_)));
        assert!(!broker.has_pending());
    }

    #[test]
    fn test_round_trip_closes_trade() {
        let mut broker = SimulatedBroker::new(dec!(1000));

        broker.submit(OrderRequest::market(Side::Buy, dec!(2), 0, 0)).unwrap();
        broker.process(&bar(0, 10.0, 10.0), 0, FillPhase::Close);
        broker.process(&bar(1, 10.0, 10.0), 1, FillPhase::Open);

        broker.submit(OrderRequest::market(Side::Sell, dec!(2), 1, 1)).unwrap();
        broker.process(&bar(1, 10.0, 10.0), 1, FillPhase::Close);
        let events = broker.process(&bar(2, 15.0, 15.0), 2, FillPhase::Open);

        let closed = events.iter().find_map(|e| match e {
            BrokerEvent::Trade(TradeUpdate::Closed(t)) => Some(t.clone()),
            _ => None,
        });
        let trade = closed.unwrap();
        assert_eq!(trade.gross_pnl, dec!(10));
        assert_eq!(broker.cash(), dec!(1010));
        assert_eq!(broker.orders().len(), 2);
    }

    #[test]
    fn test_cancel_pending() {
        let mut broker = SimulatedBroker::new(dec!(1000));

        assert!(broker.cancel_pending().is_none());
        broker.submit(OrderRequest::market(Side::Buy, dec!(1), 5, 0)).unwrap();
        let canceled = broker.cancel_pending().unwrap();

        assert_eq!(canceled.status, OrderStatus::Canceled);
        assert!(!broker.has_pending());
        assert_eq!(broker.orders().len(), 1);
        assert!(matches!(broker.order(9), Err(BrokerError::OrderNotFound(9))));
    }

    #[test]
    fn test_execution_timing_parse() {
        assert_eq!(
            "next-bar-open".parse::<ExecutionTiming>().unwrap(),
            ExecutionTiming::NextBarOpen
        );
        assert_eq!(
            "current_bar_close".parse::<ExecutionTiming>().unwrap(),
            ExecutionTiming::CurrentBarClose
        );
        assert!("tomorrow".parse::<ExecutionTiming>().is_err());
    }
}
