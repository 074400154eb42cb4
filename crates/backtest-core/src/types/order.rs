//! Order types and structures.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Order side (buy or sell).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    /// Get the opposite side.
    pub fn opposite(&self) -> Self {
        match self {
            Side::Buy => Side::Sell,
            Side::Sell => Side::Buy,
        }
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Side::Buy => write!(f, "BUY"),
            Side::Sell => write!(f, "SELL"),
        }
    }
}

/// Order status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Order handed to the broker
    Submitted,
    /// Order accepted and waiting for its fill bar
    Accepted,
    /// Order executed in full
    Completed,
    /// Order canceled before it could execute
    Canceled,
    /// Not enough cash to cover cost plus commission
    Margin,
    /// Order refused at execution time
    Rejected,
}

impl OrderStatus {
    /// Check if the order is in a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            OrderStatus::Completed
                | OrderStatus::Canceled
                | OrderStatus::Margin
                | OrderStatus::Rejected
        )
    }

    /// Check if the order is active (can still be filled).
    pub fn is_active(&self) -> bool {
        matches!(self, OrderStatus::Submitted | OrderStatus::Accepted)
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            OrderStatus::Submitted => "SUBMITTED",
            OrderStatus::Accepted => "ACCEPTED",
            OrderStatus::Completed => "COMPLETED",
            OrderStatus::Canceled => "CANCELED",
            OrderStatus::Margin => "MARGIN",
            OrderStatus::Rejected => "REJECTED",
        };
        write!(f, "{}", s)
    }
}

/// What a strategy asks for on a bar.
///
/// A missing size is resolved by the runner: the position sizer for buys,
/// the whole open position for sells.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OrderIntent {
    pub side: Side,
    pub size: Option<Decimal>,
}

impl OrderIntent {
    /// Buy, sized by the configured sizer.
    pub fn buy() -> Self {
        Self {
            side: Side::Buy,
            size: None,
        }
    }

    /// Buy a fixed number of units.
    pub fn buy_size(size: Decimal) -> Self {
        Self {
            side: Side::Buy,
            size: Some(size),
        }
    }

    /// Sell the whole position.
    pub fn sell() -> Self {
        Self {
            side: Side::Sell,
            size: None,
        }
    }

    /// Sell a fixed number of units.
    pub fn sell_size(size: Decimal) -> Self {
        Self {
            side: Side::Sell,
            size: Some(size),
        }
    }
}

/// Sized order request handed to the broker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderRequest {
    /// Buy or sell
    pub side: Side,
    /// Quantity to trade
    pub size: Decimal,
    /// Bar on which the strategy decided
    pub bar_index: usize,
    /// Timestamp of that bar
    pub timestamp: i64,
}

impl OrderRequest {
    /// Create a market order request for the given bar.
    pub fn market(side: Side, size: Decimal, bar_index: usize, timestamp: i64) -> Self {
        Self {
            side,
            size,
            bar_index,
            timestamp,
        }
    }
}

/// Simulated execution details of a completed order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Execution {
    /// Bar the fill happened on
    pub bar_index: usize,
    /// Timestamp of the fill bar
    pub timestamp: i64,
    /// Fill price
    pub price: Decimal,
    /// Filled quantity
    pub size: Decimal,
    /// price * size
    pub value: Decimal,
    /// Commission charged
    pub commission: Decimal,
}

/// Order with status and execution information.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    /// Sequential order id, unique within a run
    pub id: u64,
    /// Buy or sell
    pub side: Side,
    /// Requested quantity
    pub size: Decimal,
    /// Current status
    pub status: OrderStatus,
    /// Bar on which the order was requested
    pub requested_bar_index: usize,
    /// Timestamp of the requesting bar
    pub created_at: i64,
    /// Fill details once completed
    pub executed: Option<Execution>,
}

impl Order {
    /// Create a submitted order from a request.
    pub fn from_request(id: u64, request: &OrderRequest) -> Self {
        Self {
            id,
            side: request.side,
            size: request.size,
            status: OrderStatus::Submitted,
            requested_bar_index: request.bar_index,
            created_at: request.timestamp,
            executed: None,
        }
    }

    /// Check if this is a buy order.
    pub fn is_buy(&self) -> bool {
        self.side == Side::Buy
    }

    /// Check if the order executed.
    pub fn is_completed(&self) -> bool {
        self.status == OrderStatus::Completed
    }

    /// Record the execution and complete the order.
    pub fn complete(&mut self, execution: Execution) {
        self.executed = Some(execution);
        self.status = OrderStatus::Completed;
    }
}
