//! Position type.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::LedgerError;

/// Long-only position in the traded instrument.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    /// Units held
    pub size: Decimal,
    /// Volume-weighted average entry price
    pub average_price: Decimal,
}

impl Position {
    /// Create a new position.
    pub fn new(size: Decimal, average_price: Decimal) -> Self {
        Self {
            size,
            average_price,
        }
    }

    /// Check if the position is flat (no units).
    pub fn is_flat(&self) -> bool {
        self.size == Decimal::ZERO
    }

    /// Check if this is a long position.
    pub fn is_long(&self) -> bool {
        self.size > Decimal::ZERO
    }

    /// Cost basis (size * average_price).
    pub fn cost_basis(&self) -> Decimal {
        self.size * self.average_price
    }

    /// Market value at `price`.
    pub fn market_value(&self, price: Decimal) -> Decimal {
        self.size * price
    }

    /// Unrealized profit/loss at `price`.
    pub fn unrealized_pnl(&self, price: Decimal) -> Decimal {
        self.market_value(price) - self.cost_basis()
    }

    /// Add units bought at `price`, re-weighting the average price.
    pub fn increase(&mut self, size: Decimal, price: Decimal) {
        let new_size = self.size + size;
        if new_size != Decimal::ZERO {
            self.average_price = (self.cost_basis() + size * price) / new_size;
        }
        self.size = new_size;
    }

    /// Remove units sold at `price`; returns the realized P&L on them.
    pub fn reduce(&mut self, size: Decimal, price: Decimal) -> Result<Decimal, LedgerError> {
        if size > self.size {
            return Err(LedgerError::InsufficientPosition {
                requested: size,
                held: self.size,
            });
        }

        let realized = (price - self.average_price) * size;
        self.size -= size;
        if self.is_flat() {
            self.average_price = Decimal::ZERO;
        }
        Ok(realized)
    }
}
