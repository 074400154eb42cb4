//! CLI definitions.

pub mod commands;

use anyhow::{Context, Result};
use backtest_broker::ExecutionTiming;
use backtest_config::{load_config, load_from_env, AppConfig};
use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use rust_decimal::Decimal;
use std::path::{Path, PathBuf};

/// Configuration read when `--config` is not given, if present.
const DEFAULT_CONFIG: &str = "config/default.toml";

#[derive(Parser)]
#[command(name = "backtest")]
#[command(author, version, about = "Bar-driven strategy backtester")]
pub struct Cli {
    /// Configuration file path
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Log level (overrides the configuration)
    #[arg(short, long)]
    pub log_level: Option<LogLevel>,

    /// Enable JSON log format
    #[arg(long)]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run a backtest over a CSV file
    Run(RunArgs),
    /// List available strategies
    Strategies,
    /// Validate configuration
    ValidateConfig,
}

#[derive(Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(clap::Args)]
pub struct RunArgs {
    /// Strategy to backtest
    #[arg(short, long)]
    pub strategy: Option<String>,

    /// Strategy parameters as JSON, e.g. '{"period": 60}'
    #[arg(long)]
    pub params: Option<String>,

    /// Data file (CSV)
    #[arg(short, long)]
    pub data: Option<PathBuf>,

    /// Instrument name used in the report
    #[arg(long)]
    pub symbol: Option<String>,

    /// Initial cash
    #[arg(long)]
    pub cash: Option<Decimal>,

    /// Commission rate, e.g. 0.002
    #[arg(long)]
    pub commission: Option<Decimal>,

    /// Fixed units per buy
    #[arg(long, conflicts_with = "percent")]
    pub stake: Option<Decimal>,

    /// Percent of equity per buy (100 = full size)
    #[arg(long)]
    pub percent: Option<Decimal>,

    /// Fill timing: next-bar-open, next-bar-close or current-bar-close
    #[arg(long)]
    pub execution: Option<ExecutionTiming>,

    /// First date (YYYY-MM-DD)
    #[arg(long)]
    pub from: Option<NaiveDate>,

    /// Last date (YYYY-MM-DD)
    #[arg(long)]
    pub to: Option<NaiveDate>,

    /// Rows are newest first
    #[arg(long)]
    pub reverse: bool,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub output: OutputFormat,

    /// Save the JSON report to a file
    #[arg(long)]
    pub save: Option<PathBuf>,

    /// Save the equity curve as CSV
    #[arg(long)]
    pub equity_csv: Option<PathBuf>,
}

/// Load the configuration named on the command line, or the default file.
pub fn load_app_config(path: Option<&Path>) -> Result<AppConfig> {
    match path {
        Some(path) => load_config(path)
            .with_context(|| format!("Failed to load configuration {}", path.display())),
        None if Path::new(DEFAULT_CONFIG).is_file() => load_config(Path::new(DEFAULT_CONFIG))
            .with_context(|| format!("Failed to load configuration {}", DEFAULT_CONFIG)),
        None => load_from_env().context("Failed to load configuration from environment"),
    }
}
