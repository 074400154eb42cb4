//! Simulated order execution for backtests.
//!
//! [`SimulatedBroker`] owns the order lifecycle: it accepts at most one
//! pending market order, fills it on the bar and price selected by the
//! [`ExecutionTiming`], charges commission and refuses fills the account
//! cannot cover. Every fill is booked in a [`PortfolioLedger`].

mod broker;
mod ledger;

pub use broker::{BrokerEvent, ExecutionTiming, FillPhase, SimulatedBroker};
pub use ledger::{PortfolioLedger, TradeUpdate};
