//! Position sizing algorithms.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Position sizing method.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PositionSizingMethod {
    /// Fixed number of units
    Fixed { shares: Decimal },
    /// Percentage of equity, commission included (100 = full size)
    PercentEquity { percent: Decimal },
}

impl Default for PositionSizingMethod {
    fn default() -> Self {
        PositionSizingMethod::Fixed { shares: dec!(1) }
    }
}

/// Position sizer calculates the number of units for a buy.
#[derive(Debug, Clone, Default)]
pub struct PositionSizer {
    method: PositionSizingMethod,
}

impl PositionSizer {
    /// Create a new position sizer.
    pub fn new(method: PositionSizingMethod) -> Self {
        Self { method }
    }

    /// Configured method.
    pub fn method(&self) -> &PositionSizingMethod {
        &self.method
    }

    /// Calculate the buy size at `price`.
    ///
    /// A fixed lot is returned as configured, even when it cannot be afforded;
    /// the broker then refuses the fill with a margin status. Percent-of-equity
    /// sizes are whole units whose cost plus commission fits in both the
    /// equity share and the available cash.
    pub fn calculate(
        &self,
        equity: Decimal,
        cash: Decimal,
        price: Decimal,
        commission_rate: Decimal,
    ) -> Decimal {
        if price <= Decimal::ZERO {
            return Decimal::ZERO;
        }

        let unit_cost = price * (Decimal::ONE + commission_rate);

        let size = match &self.method {
            PositionSizingMethod::Fixed { shares } => *shares,

            PositionSizingMethod::PercentEquity { percent } => {
                let budget = equity * (*percent / dec!(100));
                let by_budget = (budget / unit_cost).floor();
                let affordable = (cash.max(Decimal::ZERO) / unit_cost).floor();
                by_budget.min(affordable)
            }
        }
        .max(Decimal::ZERO);

        debug!(
            method = ?self.method,
            %equity,
            %cash,
            %price,
            %size,
            "Sized order"
        );
        size
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_shares() {
        let sizer = PositionSizer::new(PositionSizingMethod::Fixed { shares: dec!(100) });

        let size = sizer.calculate(dec!(100000), dec!(100000), dec!(50), dec!(0.002));
        assert_eq!(size, dec!(100));
    }

    #[test]
    fn test_fixed_shares_not_capped_by_cash() {
        let sizer = PositionSizer::new(PositionSizingMethod::Fixed { shares: dec!(1000) });

        let size = sizer.calculate(dec!(5000), dec!(5000), dec!(100), Decimal::ZERO);
        assert_eq!(size, dec!(1000));
    }

    #[test]
    fn test_default_is_one_unit() {
        let sizer = PositionSizer::default();
        assert_eq!(
            sizer.calculate(dec!(1000), dec!(1000), dec!(10), Decimal::ZERO),
            dec!(1)
        );
    }

    #[test]
    fn test_percent_equity() {
        let sizer = PositionSizer::new(PositionSizingMethod::PercentEquity { percent: dec!(5) });

        let size = sizer.calculate(dec!(100000), dec!(100000), dec!(100), Decimal::ZERO);
        // 5% of 100000 = 5000, at $100/unit = 50 units
        assert_eq!(size, dec!(50));
    }

    #[test]
    fn test_full_size_leaves_room_for_commission() {
        let sizer = PositionSizer::new(PositionSizingMethod::PercentEquity { percent: dec!(100) });

        // 1000000 / (120 * 1.002) = 8316.03...
        let size = sizer.calculate(dec!(1000000), dec!(1000000), dec!(120), dec!(0.002));
        assert_eq!(size, dec!(8316));
        assert!(size * dec!(120) * dec!(1.002) <= dec!(1000000));
    }

    #[test]
    fn test_percent_equity_capped_by_cash() {
        let sizer = PositionSizer::new(PositionSizingMethod::PercentEquity { percent: dec!(100) });

        let size = sizer.calculate(dec!(100000), dec!(5000), dec!(100), Decimal::ZERO);
        assert_eq!(size, dec!(50));
    }

    #[test]
    fn test_fixed_size_is_taken_as_configured() {
        let sizer = PositionSizer::new(PositionSizingMethod::Fixed { shares: dec!(1000) });
        assert_eq!(
            sizer.calculate(dec!(1000000), dec!(1000000), dec!(50), Decimal::ZERO),
            dec!(1000)
        );

        let sizer = PositionSizer::new(PositionSizingMethod::Fixed { shares: dec!(-5) });
        assert_eq!(
            sizer.calculate(dec!(1000), dec!(1000), dec!(10), Decimal::ZERO),
            Decimal::ZERO
        );
    }

    #[test]
    fn test_invalid_price() {
        let sizer = PositionSizer::default();
        assert_eq!(
            sizer.calculate(dec!(1000), dec!(1000), Decimal::ZERO, Decimal::ZERO),
            Decimal::ZERO
        );
    }

    #[test]
    fn test_method_deserializes_from_config() {
        let method: PositionSizingMethod =
            serde_json::from_str(r#"{"percent_equity":{"percent":"100"}}"#).unwrap();
        assert_eq!(
            method,
            PositionSizingMethod::PercentEquity { percent: dec!(100) }
        );
    }
}
