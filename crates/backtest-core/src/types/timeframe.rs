//! Bar interval of a price series.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Interval covered by one bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Timeframe {
    #[serde(rename = "1m")]
    Minute1,
    #[serde(rename = "5m")]
    Minute5,
    #[serde(rename = "15m")]
    Minute15,
    #[serde(rename = "1h")]
    Hour1,
    #[serde(rename = "1d")]
    #[default]
    Daily,
    #[serde(rename = "1w")]
    Weekly,
}

impl Timeframe {
    /// Nominal bar duration in milliseconds.
    pub fn as_millis(&self) -> i64 {
        let secs = match self {
            Timeframe::Minute1 => 60,
            Timeframe::Minute5 => 300,
            Timeframe::Minute15 => 900,
            Timeframe::Hour1 => 3_600,
            Timeframe::Daily => 86_400,
            Timeframe::Weekly => 604_800,
        };
        secs * 1000
    }

    /// Trading bars in a year, for annualising per-bar returns.
    pub fn bars_per_year(&self) -> f64 {
        match self {
            // 6.5 trading hours a day, 252 sessions
            Timeframe::Minute1 => 252.0 * 390.0,
            Timeframe::Minute5 => 252.0 * 78.0,
            Timeframe::Minute15 => 252.0 * 26.0,
            Timeframe::Hour1 => 252.0 * 6.5,
            Timeframe::Daily => 252.0,
            Timeframe::Weekly => 52.0,
        }
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Timeframe::Minute1 => "1m",
            Timeframe::Minute5 => "5m",
            Timeframe::Minute15 => "15m",
            Timeframe::Hour1 => "1h",
            Timeframe::Daily => "1d",
            Timeframe::Weekly => "1w",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for Timeframe {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "1m" | "1min" => Ok(Timeframe::Minute1),
            "5m" | "5min" => Ok(Timeframe::Minute5),
            "15m" | "15min" => Ok(Timeframe::Minute15),
            "1h" | "hour" => Ok(Timeframe::Hour1),
            "1d" | "day" | "daily" => Ok(Timeframe::Daily),
            "1w" | "week" | "weekly" => Ok(Timeframe::Weekly),
            _ => Err(format!("Invalid timeframe: {}", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeframe_millis() {
        assert_eq!(Timeframe::Minute1.as_millis(), 60_000);
        assert_eq!(Timeframe::Daily.as_millis(), 86_400_000);
    }

    #[test]
    fn test_timeframe_parse_roundtrip() {
        assert_eq!(Timeframe::from_str("daily").unwrap(), Timeframe::Daily);
        assert_eq!(Timeframe::from_str("1D").unwrap(), Timeframe::Daily);
        assert_eq!(Timeframe::Weekly.to_string(), "1w");
        assert!(Timeframe::from_str("3d").is_err());
    }
}
