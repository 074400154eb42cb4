//! Core data types for the backtesting engine.

mod line;
mod ohlcv;
mod order;
mod position;
mod timeframe;
mod trade;
mod view;

pub use line::Line;
pub use ohlcv::{Bar, PriceSeries};
pub use order::{Execution, Order, OrderIntent, OrderRequest, OrderStatus, Side};
pub use position::Position;
pub use timeframe::Timeframe;
pub use trade::Trade;
pub use view::BarView;
