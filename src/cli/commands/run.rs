//! Run command implementation.

use anyhow::{bail, Context, Result};
use backtest_config::AppConfig;
use backtest_data::CsvDataSource;
use backtest_engine::{BacktestConfig, BacktestEngine};
use backtest_sizing::PositionSizingMethod;
use backtest_strategies::StrategyRegistry;
use tracing::info;

use crate::cli::{OutputFormat, RunArgs};

pub fn run(args: RunArgs, mut config: AppConfig) -> Result<()> {
    apply_overrides(&args, &mut config)?;

    let strategy_name = config.strategy.name.clone();
    info!("Starting backtest for strategy: {}", strategy_name);

    // Create strategy
    let registry = StrategyRegistry::new();
    let mut strategy = registry
        .create(&strategy_name, config.strategy.params.clone())
        .with_context(|| format!("Failed to create strategy '{}'", strategy_name))?;

    // Load data
    let Some(data_path) = config.data.path.clone() else {
        bail!("Please provide a data file with --data or [data].path (e.g. --data data/600519.csv)");
    };
    let series = CsvDataSource::new(&data_path)
        .with_context(|| format!("Data file '{}' is not readable", data_path.display()))?
        .with_options(config.data.csv_options())
        .load(&config.data.symbol, config.data.timeframe)
        .with_context(|| format!("Failed to load {}", data_path.display()))?;

    // Run backtest
    let engine = BacktestEngine::new(BacktestConfig::from(&config.backtest));
    let report = engine
        .run(&series, strategy.as_mut())
        .context("Backtest failed")?;

    // Output results
    match args.output {
        OutputFormat::Json => println!("{}", report.to_json()?),
        OutputFormat::Text => {
            for line in report.journal_lines() {
                println!("{}", line);
            }
            println!();
            println!("{}", report.summary());
        }
    }

    // Save if requested
    if let Some(save_path) = &args.save {
        std::fs::write(save_path, report.to_json()?)
            .with_context(|| format!("Failed to write {}", save_path.display()))?;
        info!("Results saved to {:?}", save_path);
    }
    if let Some(csv_path) = &args.equity_csv {
        std::fs::write(csv_path, report.equity_to_csv())
            .with_context(|| format!("Failed to write {}", csv_path.display()))?;
        info!("Equity curve saved to {:?}", csv_path);
    }

    Ok(())
}

/// Command-line flags take precedence over file and environment values.
fn apply_overrides(args: &RunArgs, config: &mut AppConfig) -> Result<()> {
    if let Some(strategy) = &args.strategy {
        if *strategy != config.strategy.name {
            config.strategy.params = serde_json::Value::Null;
        }
        config.strategy.name = strategy.clone();
    }
    if let Some(params) = &args.params {
        config.strategy.params =
            serde_json::from_str(params).context("--params must be a JSON object")?;
    }

    let data = &mut config.data;
    if let Some(path) = &args.data {
        data.path = Some(path.clone());
    }
    if let Some(symbol) = &args.symbol {
        data.symbol = symbol.clone();
    }
    if args.from.is_some() {
        data.from = args.from;
    }
    if args.to.is_some() {
        data.to = args.to;
    }
    if args.reverse {
        data.reverse = true;
    }

    let backtest = &mut config.backtest;
    if let Some(cash) = args.cash {
        backtest.initial_cash = cash;
    }
    if let Some(commission) = args.commission {
        backtest.commission_rate = commission;
    }
    if let Some(execution) = args.execution {
        backtest.execution = execution;
    }
    if let Some(shares) = args.stake {
        backtest.sizing = PositionSizingMethod::Fixed { shares };
    }
    if let Some(percent) = args.percent {
        backtest.sizing = PositionSizingMethod::PercentEquity { percent };
    }

    Ok(())
}
