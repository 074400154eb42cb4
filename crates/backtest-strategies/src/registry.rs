//! Strategy registry for building strategies by name.

use crate::{
    HaramiConfig, HaramiStrategy, KdjMacdConfig, KdjMacdStrategy, SmaCrossConfig,
    SmaCrossStrategy,
};
use backtest_core::{error::StrategyError, traits::Strategy, traits::StrategyConfig};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Information about a registered strategy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrategyInfo {
    /// Registry key
    pub name: String,
    /// Strategy description
    pub description: String,
    /// Default configuration as JSON
    pub default_config: serde_json::Value,
}

/// Registry for available strategies.
pub struct StrategyRegistry {
    strategies: BTreeMap<String, StrategyInfo>,
}

impl StrategyRegistry {
    /// Create a new strategy registry with all built-in strategies.
    pub fn new() -> Self {
        let mut strategies = BTreeMap::new();

        strategies.insert(
            "sma".to_string(),
            StrategyInfo {
                name: "sma".to_string(),
                description: "Holds a fixed lot while the close is above its simple moving average"
                    .to_string(),
                default_config: to_json(&SmaCrossConfig::default()),
            },
        );

        strategies.insert(
            "harami".to_string(),
            StrategyInfo {
                name: "harami".to_string(),
                description: "Buys an inside bar and sells after a fixed relative move"
                    .to_string(),
                default_config: to_json(&HaramiConfig::default()),
            },
        );

        strategies.insert(
            "kdj_macd".to_string(),
            StrategyInfo {
                name: "kdj_macd".to_string(),
                description: "Buys on a MACD golden cross and sells on the KDJ exit rule"
                    .to_string(),
                default_config: to_json(&KdjMacdConfig::default()),
            },
        );

        Self { strategies }
    }

    /// List all available strategies, sorted by name.
    pub fn list(&self) -> Vec<&StrategyInfo> {
        self.strategies.values().collect()
    }

    /// Get strategy info by name.
    pub fn get(&self, name: &str) -> Option<&StrategyInfo> {
        self.strategies.get(name)
    }

    /// Check if a strategy exists.
    pub fn exists(&self, name: &str) -> bool {
        self.strategies.contains_key(name)
    }

    /// Get all strategy names.
    pub fn names(&self) -> Vec<&String> {
        self.strategies.keys().collect()
    }

    /// Create a strategy instance from configuration.
    ///
    /// Missing fields take their defaults; `null` means all defaults.
    pub fn create(
        &self,
        name: &str,
        config: serde_json::Value,
    ) -> Result<Box<dyn Strategy>, StrategyError> {
        match name {
            "sma" => Ok(Box::new(SmaCrossStrategy::new(parse::<SmaCrossConfig>(config)?))),
            "harami" => Ok(Box::new(HaramiStrategy::new(parse::<HaramiConfig>(config)?))),
            "kdj_macd" => Ok(Box::new(KdjMacdStrategy::new(parse::<KdjMacdConfig>(config)?))),
            _ => Err(StrategyError::NotFound(name.to_string())),
        }
    }

    /// Create a strategy with default configuration.
    pub fn create_default(&self, name: &str) -> Result<Box<dyn Strategy>, StrategyError> {
        let info = self
            .get(name)
            .ok_or_else(|| StrategyError::NotFound(name.to_string()))?;
        self.create(name, info.default_config.clone())
    }
}

impl Default for StrategyRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn parse<C>(config: serde_json::Value) -> Result<C, StrategyError>
where
    C: StrategyConfig + DeserializeOwned,
{
    let config = if config.is_null() {
        serde_json::Value::Object(Default::default())
    } else {
        config
    };
    let config: C =
        serde_json::from_value(config).map_err(|e| StrategyError::InvalidConfig(e.to_string()))?;
    config.validate()?;
    Ok(config)
}

fn to_json<T: Serialize>(config: &T) -> serde_json::Value {
    serde_json::to_value(config).unwrap_or(serde_json::Value::Null)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_list() {
        let registry = StrategyRegistry::new();
        let names: Vec<&str> = registry.list().iter().map(|s| s.name.as_str()).collect();

        assert_eq!(names, vec!["harami", "kdj_macd", "sma"]);
    }

    #[test]
    fn test_registry_get() {
        let registry = StrategyRegistry::new();

        assert!(registry.get("sma").is_some());
        assert!(registry.exists("kdj_macd"));
        assert!(registry.get("unknown").is_none());
    }

    #[test]
    fn test_create_default() {
        let registry = StrategyRegistry::new();

        for name in ["sma", "harami", "kdj_macd"] {
            let strategy = registry.create_default(name).unwrap();
            assert_eq!(strategy.name(), name);
        }
    }

    #[test]
    fn test_create_with_config() {
        let registry = StrategyRegistry::new();

        let strategy = registry
            .create("sma", serde_json::json!({ "period": 60 }))
            .unwrap();
        assert_eq!(strategy.warmup_period(), 60);

        let strategy = registry.create("harami", serde_json::Value::Null).unwrap();
        assert_eq!(strategy.name(), "harami");
    }

    #[test]
    fn test_create_rejects_bad_config() {
        let registry = StrategyRegistry::new();

        let result = registry.create("sma", serde_json::json!({ "period": 0 }));
        assert!(matches!(result, Err(StrategyError::InvalidConfig(_))));

        let result = registry.create("kdj_macd", serde_json::json!({ "exit_rule": "sometimes" }));
        assert!(matches!(result, Err(StrategyError::InvalidConfig(_))));
    }

    #[test]
    fn test_create_unknown_strategy() {
        let registry = StrategyRegistry::new();

        let result = registry.create_default("unknown");
        assert!(matches!(result, Err(StrategyError::NotFound(_))));
    }
}
