//! CSV file data adapter.
//!
//! One file per ticker, `<base>/<TICKER>.csv`, with a header row naming
//! `timestamp,open,high,low,close,volume` (any column order). Rows are
//! returned in file order; ordering is validated by `PriceSeries`.

use crate::domain::error::{DataError, LadderError};
use crate::domain::ohlcv::Bar;
use crate::ports::data_port::DataPort;
use chrono::{NaiveDate, NaiveDateTime};
use std::fs;
use std::path::PathBuf;
use std::str::FromStr;

const COLUMNS: [&str; 6] = ["timestamp", "open", "high", "low", "close", "volume"];

pub struct CsvAdapter {
    base_path: PathBuf,
}

impl CsvAdapter {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    fn csv_path(&self, ticker: &str) -> PathBuf {
        self.base_path.join(format!("{}.csv", ticker))
    }
}

/// Accepts `YYYY-MM-DD HH:MM:SS`, `YYYY-MM-DDTHH:MM:SS` or a bare date
/// (midnight).
pub fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(value, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

fn parse_field<T: FromStr>(
    record: &csv::StringRecord,
    index: usize,
    line: usize,
    field: &'static str,
) -> Result<T, DataError> {
    let raw = record
        .get(index)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or(DataError::MissingField { line, field })?;
    raw.parse().map_err(|_| DataError::InvalidField {
        line,
        field,
        value: raw.to_string(),
    })
}

impl DataPort for CsvAdapter {
    fn fetch_bars(
        &self,
        ticker: &str,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> Result<Vec<Bar>, LadderError> {
        let path = self.csv_path(ticker);
        let content = fs::read_to_string(&path).map_err(|e| LadderError::DataSource {
            reason: format!("failed to read {}: {}", path.display(), e),
        })?;

        let mut rdr = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(content.as_bytes());

        let headers = rdr
            .headers()
            .map_err(|e| LadderError::DataSource {
                reason: format!("CSV header error in {}: {}", path.display(), e),
            })?
            .clone();
        let mut index = [0usize; 6];
        for (slot, name) in index.iter_mut().zip(COLUMNS) {
            *slot = headers
                .iter()
                .position(|h| h.eq_ignore_ascii_case(name))
                .ok_or(DataError::MissingField {
                    line: 1,
                    field: name,
                })?;
        }
        let [ts_idx, open_idx, high_idx, low_idx, close_idx, volume_idx] = index;

        let mut bars = Vec::new();
        for result in rdr.records() {
            let record = result.map_err(|e| LadderError::DataSource {
                reason: format!("CSV parse error in {}: {}", path.display(), e),
            })?;
            let line = record.position().map_or(0, |p| p.line() as usize);

            let raw_ts: String = parse_field(&record, ts_idx, line, "timestamp")?;
            let timestamp = parse_timestamp(&raw_ts).ok_or(DataError::InvalidField {
                line,
                field: "timestamp",
                value: raw_ts.clone(),
            })?;

            let date = timestamp.date();
            if start_date.is_some_and(|s| date < s) || end_date.is_some_and(|e| date > e) {
                continue;
            }

            bars.push(Bar {
                timestamp,
                open: parse_field(&record, open_idx, line, "open")?,
                high: parse_field(&record, high_idx, line, "high")?,
                low: parse_field(&record, low_idx, line, "low")?,
                close: parse_field(&record, close_idx, line, "close")?,
                volume: parse_field(&record, volume_idx, line, "volume")?,
            });
        }

        tracing::debug!(ticker, bars = bars.len(), path = %path.display(), "loaded bars");
        Ok(bars)
    }

    fn list_tickers(&self) -> Result<Vec<String>, LadderError> {
        let entries = fs::read_dir(&self.base_path).map_err(|e| LadderError::DataSource {
            reason: format!(
                "failed to read directory {}: {}",
                self.base_path.display(),
                e
            ),
        })?;

        let mut tickers = Vec::new();
        for entry in entries {
            let entry = entry?;
            let name = entry.file_name();
            let name_str = name.to_string_lossy();
            if let Some(ticker) = name_str.strip_suffix(".csv") {
                tickers.push(ticker.to_string());
            }
        }

        tickers.sort();
        Ok(tickers)
    }
}
