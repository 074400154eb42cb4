//! Validate configuration command.

use anyhow::{Context, Result};
use backtest_config::AppConfig;
use backtest_engine::BacktestConfig;
use backtest_strategies::StrategyRegistry;

pub fn run(config: &AppConfig) -> Result<()> {
    println!("Validating configuration");

    BacktestConfig::from(&config.backtest)
        .validate()
        .context("Invalid [backtest] section")?;

    let registry = StrategyRegistry::new();
    let strategy = registry
        .create(&config.strategy.name, config.strategy.params.clone())
        .with_context(|| format!("Invalid [strategy] section ({})", config.strategy.name))?;

    if let Some(path) = &config.data.path {
        if !path.is_file() {
            anyhow::bail!("Data file '{}' does not exist", path.display());
        }
    }

    println!("Configuration is valid!");
    println!();
    println!("App: {}", config.app.name);
    println!("Environment: {}", config.app.environment);
    println!("Log level: {}", config.logging.level);
    println!("Initial cash: {}", config.backtest.initial_cash);
    println!("Commission rate: {}", config.backtest.commission_rate);
    println!("Execution: {:?}", config.backtest.execution);
    println!("Sizing: {:?}", config.backtest.sizing);
    println!("Strategy: {} (warm-up {} bars)", strategy.name(), strategy.warmup_period());
    match &config.data.path {
        Some(path) => println!("Data: {} [{}]", path.display(), config.data.symbol),
        None => println!("Data: not set"),
    }

    Ok(())
}
