//! Logging setup for backtest runs.

mod logging;

pub use logging::{env_filter, setup_logging};
pub use tracing_appender::non_blocking::WorkerGuard;
