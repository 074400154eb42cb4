//! CSV data source.

use backtest_core::error::DataError;
use backtest_core::types::{Bar, PriceSeries, Timeframe};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use csv::{ReaderBuilder, StringRecord};
use serde::{Deserialize, Serialize};
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const DATE_ALIASES: &[&str] = &["date", "datetime", "timestamp", "trade_date"];
const OPEN_ALIASES: &[&str] = &["open"];
const HIGH_ALIASES: &[&str] = &["high"];
const LOW_ALIASES: &[&str] = &["low"];
const CLOSE_ALIASES: &[&str] = &["close", "adj close", "adj_close"];
const VOLUME_ALIASES: &[&str] = &["volume", "vol"];

const DAY_MS: i64 = 86_400_000;

/// Zero-based column positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnIndices {
    pub date: usize,
    pub open: usize,
    pub high: usize,
    pub low: usize,
    pub close: usize,
    /// Volume is read as 0 when absent
    pub volume: Option<usize>,
}

impl Default for ColumnIndices {
    /// Exchange export layout: code, name, then date and prices.
    fn default() -> Self {
        Self {
            date: 2,
            open: 3,
            high: 4,
            low: 5,
            close: 6,
            volume: Some(10),
        }
    }
}

/// How CSV columns map to bar fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum ColumnMap {
    /// Find columns by header name (case-insensitive aliases)
    #[default]
    Headers,
    /// Fixed positions; a header row is still skipped if present
    Indices(ColumnIndices),
}

/// Options for reading a CSV file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CsvOptions {
    pub columns: ColumnMap,
    /// chrono format of the date column; common formats are tried when unset
    pub date_format: Option<String>,
    pub has_headers: bool,
    /// First date kept (inclusive)
    pub from: Option<NaiveDate>,
    /// Last date kept (inclusive)
    pub to: Option<NaiveDate>,
    /// Rows are newest first
    pub reverse: bool,
    /// Reject the file if two consecutive bars are further apart
    pub max_gap_days: Option<u32>,
}

impl Default for CsvOptions {
    fn default() -> Self {
        Self {
            columns: ColumnMap::Headers,
            date_format: None,
            has_headers: true,
            from: None,
            to: None,
            reverse: false,
            max_gap_days: None,
        }
    }
}

/// CSV data source for historical bars.
pub struct CsvDataSource {
    path: PathBuf,
    options: CsvOptions,
}

impl CsvDataSource {
    /// Create a new CSV data source.
    pub fn new(path: impl AsRef<Path>) -> Result<Self, DataError> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(DataError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("{} not found", path.display()),
            )));
        }
        Ok(Self {
            path: path.to_path_buf(),
            options: CsvOptions::default(),
        })
    }

    /// Replace the read options.
    pub fn with_options(mut self, options: CsvOptions) -> Self {
        self.options = options;
        self
    }

    /// Read options.
    pub fn options(&self) -> &CsvOptions {
        &self.options
    }

    /// Load the file into a validated series.
    pub fn load(&self, symbol: &str, timeframe: Timeframe) -> Result<PriceSeries, DataError> {
        let file = std::fs::File::open(&self.path)?;
        let bars = read_bars(file, &self.options)?;
        let series = PriceSeries::new(symbol, timeframe, bars)?;

        if let Some(days) = self.options.max_gap_days {
            series.check_gaps(i64::from(days) * DAY_MS)?;
        }

        info!(
            path = %self.path.display(),
            symbol,
            bars = series.len(),
            "Loaded price data"
        );
        Ok(series)
    }
}

/// Read bars from any CSV reader, applying ordering and date filters.
///
/// Fails with [`DataError::NoDataAvailable`] when no bar is left.
pub fn read_bars<R: Read>(reader: R, options: &CsvOptions) -> Result<Vec<Bar>, DataError> {
    let mut reader = ReaderBuilder::new()
        .has_headers(options.has_headers)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let columns = match options.columns {
        ColumnMap::Indices(indices) => indices,
        ColumnMap::Headers => {
            let headers = reader
                .headers()
                .map_err(|e| DataError::ParseError(e.to_string()))?;
            resolve_headers(headers)?
        }
    };

    let mut bars = Vec::new();
    for (row, result) in reader.records().enumerate() {
        let record = result.map_err(|e| DataError::ParseError(e.to_string()))?;
        if record.iter().all(str::is_empty) {
            continue;
        }

        let date = field(&record, columns.date, row)?;
        let timestamp = parse_timestamp(date, options.date_format.as_deref())?;
        let volume = match columns.volume {
            Some(index) => parse_number(&record, index, row)?,
            None => 0.0,
        };
        bars.push(Bar::new(
            timestamp,
            parse_number(&record, columns.open, row)?,
            parse_number(&record, columns.high, row)?,
            parse_number(&record, columns.low, row)?,
            parse_number(&record, columns.close, row)?,
            volume,
        ));
    }

    if options.reverse {
        bars.reverse();
    }

    let read = bars.len();
    bars.retain(|bar| in_range(bar.timestamp, options.from, options.to));
    debug!(read, kept = bars.len(), "Filtered bars by date");

    if bars.is_empty() {
        return Err(DataError::NoDataAvailable);
    }
    Ok(bars)
}

fn resolve_headers(headers: &StringRecord) -> Result<ColumnIndices, DataError> {
    let find = |aliases: &[&str]| {
        headers
            .iter()
            .position(|h| aliases.iter().any(|a| h.eq_ignore_ascii_case(a)))
    };
    let require = |name: &str, aliases: &[&str]| {
        find(aliases).ok_or_else(|| DataError::ParseError(format!("missing '{}' column", name)))
    };

    Ok(ColumnIndices {
        date: require("date", DATE_ALIASES)?,
        open: require("open", OPEN_ALIASES)?,
        high: require("high", HIGH_ALIASES)?,
        low: require("low", LOW_ALIASES)?,
        close: require("close", CLOSE_ALIASES)?,
        volume: find(VOLUME_ALIASES),
    })
}

fn field(record: &StringRecord, index: usize, row: usize) -> Result<&str, DataError> {
    record.get(index).ok_or_else(|| {
        DataError::ParseError(format!("row {}: no column {}", row + 1, index))
    })
}

fn parse_number(record: &StringRecord, index: usize, row: usize) -> Result<f64, DataError> {
    let raw = field(record, index, row)?;
    raw.parse::<f64>().map_err(|_| {
        DataError::ParseError(format!(
            "row {}: invalid number '{}' in column {}",
            row + 1,
            raw,
            index
        ))
    })
}

fn in_range(timestamp: i64, from: Option<NaiveDate>, to: Option<NaiveDate>) -> bool {
    let Some(date) = DateTime::from_timestamp_millis(timestamp).map(|dt| dt.date_naive()) else {
        return false;
    };
    from.map_or(true, |from| date >= from) && to.map_or(true, |to| date <= to)
}

/// Parse a date column into milliseconds since the epoch (UTC).
fn parse_timestamp(date_str: &str, format: Option<&str>) -> Result<i64, DataError> {
    if let Some(format) = format {
        return parse_with(date_str, format).ok_or_else(|| {
            DataError::ParseError(format!("could not parse date '{}' as {}", date_str, format))
        });
    }

    let formats = [
        "%Y-%m-%d",
        "%Y-%m-%d %H:%M:%S",
        "%Y%m%d",
        "%Y/%m/%d",
        "%m/%d/%Y",
        "%d-%m-%Y",
    ];
    for format in formats {
        if let Some(ts) = parse_with(date_str, format) {
            return Ok(ts);
        }
    }

    // Unix timestamp, milliseconds if > 10 digits
    if let Ok(ts) = date_str.parse::<i64>() {
        return Ok(if ts > 10_000_000_000 { ts } else { ts * 1000 });
    }

    Err(DataError::ParseError(format!(
        "could not parse date: {}",
        date_str
    )))
}

fn parse_with(date_str: &str, format: &str) -> Option<i64> {
    if let Ok(dt) = NaiveDateTime::parse_from_str(date_str, format) {
        return Some(dt.and_utc().timestamp_millis());
    }
    NaiveDate::parse_from_str(date_str, format)
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc().timestamp_millis())
}
