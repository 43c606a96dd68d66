//! Bar loading for the runner.
//!
//! Reads OHLCV CSV files into time-ascending bars:
//! 1. Skip any banner lines before the header (cryptodatadownload files start
//!    with a URL line)
//! 2. Resolve columns case-insensitively: `timestamp|date|datetime|time`,
//!    `open`, `high`, `low`, `close`, and the first `volume*` column (asset
//!    volume precedes quote volume)
//! 3. Skip malformed or insane rows with a warning
//! 4. Apply the year filter, sort, drop duplicate timestamps
//!
//! An empty result is an error; the pipeline has nothing to work on.

use crate::config::DataConfig;
use chrono::{Datelike, NaiveDate, NaiveDateTime};
use extremalab_core::domain::Bar;
use extremalab_core::fingerprint::dataset_hash;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Errors from the data loading layer.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("no header row with open/high/low/close columns found")]
    MissingHeader,

    #[error("required column '{0}' not found in header")]
    MissingColumn(&'static str),

    #[error("no usable bars after filtering ({skipped} malformed rows skipped)")]
    Empty { skipped: usize },

    #[error("line {line}: '{value}' is not an extremum label (-1, 0 or 1)")]
    InvalidLabel { line: usize, value: String },
}

/// Where the bars came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum DataSource {
    Csv(PathBuf),
    Synthetic(String),
}

/// Result of loading bars, including provenance.
#[derive(Debug, Clone)]
pub struct LoadedBars {
    /// Time-ascending, unique timestamps.
    pub bars: Vec<Bar>,
    pub source: DataSource,
    /// BLAKE3 over every bar, for fingerprinting.
    pub dataset_hash: String,
    pub skipped_rows: usize,
    pub duplicate_rows: usize,
}

impl LoadedBars {
    pub fn is_synthetic(&self) -> bool {
        matches!(self.source, DataSource::Synthetic(_))
    }
}

/// Load bars from a CSV file.
pub fn load_bars_csv(path: &Path, config: &DataConfig) -> Result<LoadedBars, LoadError> {
    let content = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let loaded = parse_bars_csv(&content, config, DataSource::Csv(path.to_path_buf()))?;
    info!(
        path = %path.display(),
        bars = loaded.bars.len(),
        skipped = loaded.skipped_rows,
        duplicates = loaded.duplicate_rows,
        "bars loaded"
    );
    Ok(loaded)
}

struct ColumnMap {
    timestamp: usize,
    open: usize,
    high: usize,
    low: usize,
    close: usize,
    volume: usize,
}

impl ColumnMap {
    fn resolve(headers: &csv::StringRecord) -> Result<Self, LoadError> {
        let names: Vec<String> = headers.iter().map(|h| h.trim().to_ascii_lowercase()).collect();
        let exact = |wanted: &'static str| {
            names
                .iter()
                .position(|n| n == wanted)
                .ok_or(LoadError::MissingColumn(wanted))
        };
        let timestamp = names
            .iter()
            .position(|n| matches!(n.as_str(), "timestamp" | "date" | "datetime" | "time"))
            .ok_or(LoadError::MissingColumn("timestamp"))?;
        let volume = names
            .iter()
            .position(|n| n.starts_with("volume"))
            .ok_or(LoadError::MissingColumn("volume"))?;
        Ok(Self {
            timestamp,
            open: exact("open")?,
            high: exact("high")?,
            low: exact("low")?,
            close: exact("close")?,
            volume,
        })
    }

    fn parse(&self, record: &csv::StringRecord) -> Result<Bar, String> {
        let field = |i: usize| record.get(i).map(str::trim).ok_or_else(|| format!("missing field {i}"));
        let number = |i: usize| -> Result<f64, String> {
            let raw = field(i)?;
            raw.parse::<f64>().map_err(|e| format!("'{raw}': {e}"))
        };
        let raw_ts = field(self.timestamp)?;
        let timestamp =
            parse_timestamp(raw_ts).ok_or_else(|| format!("unrecognised timestamp '{raw_ts}'"))?;
        Ok(Bar {
            timestamp,
            open: number(self.open)?,
            high: number(self.high)?,
            low: number(self.low)?,
            close: number(self.close)?,
            volume: number(self.volume)?,
        })
    }
}

fn is_header_line(line: &str) -> bool {
    let lower = line.to_ascii_lowercase();
    lower.contains("open") && lower.contains("close") && lower.contains(',')
}

/// Parse CSV text into bars. See the module docs for the rules applied.
pub fn parse_bars_csv(
    content: &str,
    config: &DataConfig,
    source: DataSource,
) -> Result<LoadedBars, LoadError> {
    let header_offset = content
        .lines()
        .position(is_header_line)
        .ok_or(LoadError::MissingHeader)?;
    let body: String = content
        .lines()
        .skip(header_offset)
        .collect::<Vec<_>>()
        .join("\n");

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(body.as_bytes());
    let columns = ColumnMap::resolve(reader.headers()?)?;

    let mut bars = Vec::new();
    let mut skipped = 0usize;
    for (row, record) in reader.records().enumerate() {
        let line = header_offset + row + 2;
        let record = match record {
            Ok(r) => r,
            Err(e) => {
                warn!(line, error = %e, "skipping unreadable row");
                skipped += 1;
                continue;
            }
        };
        match columns.parse(&record) {
            Ok(bar) if bar.is_sane() => bars.push(bar),
            Ok(bar) => {
                warn!(line, timestamp = %bar.timestamp, "skipping bar with inconsistent or non-positive OHLCV");
                skipped += 1;
            }
            Err(reason) => {
                warn!(line, %reason, "skipping malformed row");
                skipped += 1;
            }
        }
    }

    if !config.years.is_empty() {
        bars.retain(|b| config.years.contains(&b.timestamp.year()));
    }
    let duplicates = sort_and_dedup(&mut bars);
    if duplicates > 0 {
        warn!(duplicates, "dropped bars with duplicate timestamps");
    }
    if bars.is_empty() {
        return Err(LoadError::Empty { skipped });
    }
    debug!(bars = bars.len(), years = ?config.years, "bars filtered");

    Ok(LoadedBars {
        dataset_hash: dataset_hash(&bars).0,
        bars,
        source,
        skipped_rows: skipped,
        duplicate_rows: duplicates,
    })
}

/// Sort ascending by timestamp and keep the first bar of each timestamp.
/// Returns the number of bars dropped.
pub fn sort_and_dedup(bars: &mut Vec<Bar>) -> usize {
    bars.sort_by_key(|b| b.timestamp);
    let before = bars.len();
    bars.dedup_by_key(|b| b.timestamp);
    before - bars.len()
}

/// Accepts `%Y-%m-%d %H:%M:%S`, `%Y-%m-%d %H:%M`, the 12-hour
/// `%Y-%m-%d %I-%p` used by cryptodatadownload, and bare dates (midnight).
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    const FORMATS: [&str; 3] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M", "%Y-%m-%dT%H:%M:%S"];
    if let Some(ts) = FORMATS
        .iter()
        .find_map(|f| NaiveDateTime::parse_from_str(raw, f).ok())
    {
        return Some(ts);
    }
    if let Some(ts) = parse_twelve_hour(raw) {
        return Some(ts);
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// `2019-01-01 11-PM`: date, space, hour 1..=12, dash, AM/PM.
fn parse_twelve_hour(raw: &str) -> Option<NaiveDateTime> {
    let (date, clock) = raw.split_once(' ')?;
    let (hour, meridiem) = clock.split_once('-')?;
    let hour: u32 = hour.parse().ok()?;
    if !(1..=12).contains(&hour) {
        return None;
    }
    let hour = match meridiem.to_ascii_uppercase().as_str() {
        "AM" => hour % 12,
        "PM" => hour % 12 + 12,
        _ => return None,
    };
    let date = NaiveDate::parse_from_str(date, "%Y-%m-%d").ok()?;
    date.and_hms_opt(hour, 0, 0)
}
