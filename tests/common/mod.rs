#![allow(dead_code)]

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use laddertrader::domain::config::{BarInterval, DcaConfig};
use laddertrader::domain::error::LadderError;
pub use laddertrader::domain::ohlcv::Bar;
use laddertrader::domain::price_series::{DailyClose, PriceSeries};
use laddertrader::ports::data_port::DataPort;
use std::collections::HashMap;

pub struct MockDataPort {
    pub data: HashMap<String, Vec<Bar>>,
    pub errors: HashMap<String, String>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    pub fn with_bars(mut self, ticker: &str, bars: Vec<Bar>) -> Self {
        self.data.insert(ticker.to_string(), bars);
        self
    }

    pub fn with_error(mut self, ticker: &str, reason: &str) -> Self {
        self.errors.insert(ticker.to_string(), reason.to_string());
        self
    }
}

impl DataPort for MockDataPort {
    fn fetch_bars(
        &self,
        ticker: &str,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> Result<Vec<Bar>, LadderError> {
        if let Some(reason) = self.errors.get(ticker) {
            return Err(LadderError::DataSource {
                reason: reason.clone(),
            });
        }
        Ok(self
            .data
            .get(ticker)
            .map(|bars| {
                bars.iter()
                    .filter(|b| start_date.is_none_or(|s| b.date() >= s))
                    .filter(|b| end_date.is_none_or(|e| b.date() <= e))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    fn list_tickers(&self) -> Result<Vec<String>, LadderError> {
        let mut tickers: Vec<String> = self.data.keys().cloned().collect();
        tickers.sort();
        Ok(tickers)
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn at(day: NaiveDate, hour: u32, minute: u32) -> NaiveDateTime {
    day.and_time(NaiveTime::from_hms_opt(hour, minute, 0).unwrap())
}

/// A bar whose open, low and close are `close` and whose high is `high`.
pub fn make_bar(timestamp: NaiveDateTime, close: f64, high: f64) -> Bar {
    Bar {
        timestamp,
        open: close,
        high,
        low: close,
        close,
        volume: 10_000,
    }
}

pub fn flat_bar(timestamp: NaiveDateTime, close: f64) -> Bar {
    make_bar(timestamp, close, close)
}

pub fn series(bars: Vec<Bar>) -> PriceSeries {
    PriceSeries::new("TQQQ", bars).unwrap()
}

/// One close per calendar day starting at `start`.
pub fn daily_closes(start: NaiveDate, closes: &[f64]) -> Vec<DailyClose> {
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| DailyClose {
            date: start + chrono::Days::new(i as u64),
            close,
        })
        .collect()
}

/// Five-minute ladder config without the market filter.
pub fn ladder_config(initial_capital: f64, daily_investment: f64) -> DcaConfig {
    DcaConfig {
        initial_capital,
        daily_investment,
        buy_time: NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
        price_increment: 1.0,
        interval: BarInterval::FiveMinute,
        use_filter: false,
        ..DcaConfig::default()
    }
}

/// Trend bars from a close path: open is the previous close, and the range
/// extends one point beyond the body.
pub fn path_bars(closes: &[f64]) -> Vec<Bar> {
    let start = date(2024, 1, 1);
    let mut prev = closes.first().copied().unwrap_or(100.0);
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let open = prev;
            prev = close;
            Bar {
                timestamp: at(start + chrono::Days::new(i as u64), 16, 0),
                open,
                high: open.max(close) + 1.0,
                low: open.min(close) - 1.0,
                close,
                volume: 1_000,
            }
        })
        .collect()
}
