//! List strategies command.

use anyhow::Result;
use backtest_strategies::StrategyRegistry;

pub fn run() -> Result<()> {
    let registry = StrategyRegistry::new();

    println!("Available Strategies");
    println!("═══════════════════════════════════════════════════════════");
    println!();

    for info in registry.list() {
        println!("  {} ", info.name);
        println!("  ───────────────────────────────────────────────────────");
        println!("  {}", info.description);
        println!("  Defaults: {}", info.default_config);
        println!();
    }

    println!("Use --strategy <name> and --params '<json>' to select and tune a strategy.");

    Ok(())
}
