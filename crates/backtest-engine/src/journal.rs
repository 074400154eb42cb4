//! Dated record of what happened during a run.

use std::fmt;

use backtest_core::types::{OrderStatus, Side};
use chrono::DateTime;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Something worth reporting during a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RunEvent {
    /// Strategy asked for an order at the bar's close
    OrderCreated { side: Side, price: Decimal },
    /// Order filled
    OrderExecuted {
        side: Side,
        price: Decimal,
        cost: Decimal,
        commission: Decimal,
    },
    /// Order ended without a fill
    OrderFailed { side: Side, status: OrderStatus },
    /// Order refused before reaching the broker's book
    OrderInvalid { side: Side, reason: String },
    /// Trade closed
    TradeClosed { gross: Decimal, net: Decimal },
    /// Portfolio value after the last bar
    EndingValue { value: Decimal },
}

/// Round to cents, halves away from zero, so `{:.2}` prints the rounded amount.
pub(crate) fn cents(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

impl fmt::Display for RunEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunEvent::OrderCreated { side, price } => write!(f, "{} CREATE, {:.2}", side, cents(*price)),
            RunEvent::OrderExecuted {
                side,
                price,
                cost,
                commission,
            } => write!(
                f,
                "{} EXECUTED, Price: {:.2}, Cost: {:.2}, Comm {:.2}",
                side,
                cents(*price),
                cents(*cost),
                cents(*commission)
            ),
            RunEvent::OrderFailed { side, status } => write!(f, "{} ORDER {}", side, status),
            RunEvent::OrderInvalid { side, reason } => {
                write!(f, "{} ORDER INVALID, {}", side, reason)
            }
            RunEvent::TradeClosed { gross, net } => {
                write!(
                    f,
                    "OPERATION PROFIT, GROSS {:.2}, NET {:.2}",
                    cents(*gross),
                    cents(*net)
                )
            }
            RunEvent::EndingValue { value } => write!(f, "Ending Value {:.2}", cents(*value)),
        }
    }
}

/// Event stamped with the bar it happened on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JournalEntry {
    pub bar_index: usize,
    pub timestamp: i64,
    pub event: RunEvent,
}

impl fmt::Display for JournalEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match DateTime::from_timestamp_millis(self.timestamp) {
            Some(dt) => write!(f, "{}, {}", dt.date_naive(), self.event),
            None => write!(f, "{}, {}", self.timestamp, self.event),
        }
    }
}

/// Append-only list of run events, mirrored to the log.
#[derive(Debug, Clone, Default)]
pub struct Journal {
    entries: Vec<JournalEntry>,
}

impl Journal {
    /// Create an empty journal.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an event on bar `bar_index`.
    pub fn record(&mut self, bar_index: usize, timestamp: i64, event: RunEvent) {
        let entry = JournalEntry {
            bar_index,
            timestamp,
            event,
        };
        info!(bar = bar_index, "{}", entry);
        self.entries.push(entry);
    }

    /// Entries in recording order.
    pub fn entries(&self) -> &[JournalEntry] {
        &self.entries
    }

    /// Entries formatted as `YYYY-MM-DD, text`.
    pub fn lines(&self) -> Vec<String> {
        self.entries.iter().map(ToString::to_string).collect()
    }

    /// Take the entries out of the journal.
    pub fn into_entries(self) -> Vec<JournalEntry> {
        self.entries
    }
}
