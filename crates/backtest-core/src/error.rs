//! Error types for the backtesting engine.

use rust_decimal::Decimal;
use thiserror::Error;

/// Top-level backtesting error.
#[derive(Error, Debug)]
pub enum BacktestError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Strategy error: {0}")]
    Strategy(#[from] StrategyError),

    #[error("Broker error: {0}")]
    Broker(#[from] BrokerError),

    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),

    #[error("Data error: {0}")]
    Data(#[from] DataError),

    #[error("Indicator error: {0}")]
    Indicator(#[from] IndicatorError),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Strategy-specific errors.
#[derive(Error, Debug)]
pub enum StrategyError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Insufficient data: need {required} bars, have {available}")]
    InsufficientData { required: usize, available: usize },

    #[error("Strategy not found: {0}")]
    NotFound(String),

    #[error("Indicator setup failed: {0}")]
    Indicator(#[from] IndicatorError),
}

/// Order-level errors raised by the simulated broker.
///
/// None of these abort a run: the runner reports them to the strategy and
/// moves on to the next bar.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BrokerError {
    #[error("Order rejected (margin): required {required}, available {available}")]
    OrderRejected { required: Decimal, available: Decimal },

    #[error("Invalid order: {0}")]
    InvalidOrder(String),

    #[error("Order not found: {0}")]
    OrderNotFound(u64),

    #[error("Invalid fill price: {0}")]
    InvalidPrice(f64),

    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

/// Portfolio ledger errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LedgerError {
    #[error("Insufficient position: requested {requested}, held {held}")]
    InsufficientPosition { requested: Decimal, held: Decimal },

    #[error("Order {0} has no execution to apply")]
    NotExecuted(u64),
}

/// Data integrity and ingestion errors. These are fatal for a run.
#[derive(Error, Debug)]
pub enum DataError {
    #[error("No data available for the requested range")]
    NoDataAvailable,

    #[error("Data gap at bar {index}: {previous} -> {current} exceeds {max_gap_ms} ms")]
    DataGap {
        index: usize,
        previous: i64,
        current: i64,
        max_gap_ms: i64,
    },

    #[error("Duplicate timestamp {timestamp} at bar {index}")]
    DuplicateTimestamp { index: usize, timestamp: i64 },

    #[error("Bar {index} is out of order: {timestamp} follows {previous}")]
    OutOfOrder {
        index: usize,
        previous: i64,
        timestamp: i64,
    },

    #[error("Invalid bar at index {index}: {reason}")]
    InvalidBar { index: usize, reason: String },

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Indicator calculation errors.
#[derive(Error, Debug)]
pub enum IndicatorError {
    #[error("Insufficient data: need {required} points, have {available}")]
    InsufficientData { required: usize, available: usize },

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
}

/// Result type alias for backtesting operations.
pub type BacktestResult<T> = Result<T, BacktestError>;

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_error_conversion() {
        let err: BacktestError = DataError::NoDataAvailable.into();
        assert!(matches!(err, BacktestError::Data(DataError::NoDataAvailable)));

        let err: BrokerError = LedgerError::InsufficientPosition {
            requested: dec!(2),
            held: dec!(1),
        }
        .into();
        assert!(err.to_string().contains("requested 2"));
    }

    #[test]
    fn test_margin_message() {
        let err = BrokerError::OrderRejected {
            required: dec!(12024),
            available: dec!(100),
        };
        assert_eq!(
            err.to_string(),
            "Order rejected (margin): required 12024, available 100"
        );
    }
}
