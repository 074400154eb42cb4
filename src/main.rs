//! Backtesting CLI application.

mod cli;

use anyhow::Result;
use backtest_monitor::setup_logging;
use clap::Parser;
use cli::{Cli, Commands};

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = cli::load_app_config(cli.config.as_deref())?;

    // Setup logging
    let log_level = cli
        .log_level
        .map(|level| level.as_str().to_string())
        .unwrap_or_else(|| config.logging.level.clone());
    let json = cli.json_logs || config.logging.is_json();
    let _guard = setup_logging(&log_level, json, config.logging.file.as_deref());

    // Execute command
    match cli.command {
        Commands::Run(args) => cli::commands::run::run(args, config),
        Commands::Strategies => cli::commands::strategies::run(),
        Commands::ValidateConfig => cli::commands::validate::run(&config),
    }
}
