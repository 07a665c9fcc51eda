//! Validated bar series for one ticker and its trading-day boundaries.
//!
//! A `PriceSeries` is immutable once built. Engines never infer day changes
//! from wall-clock comparisons themselves: they consume [`SessionBar`]s whose
//! `first_of_day` / `last_of_day` flags come from here.

use chrono::NaiveDate;

use super::error::DataError;
use super::ohlcv::Bar;

#[derive(Debug, Clone, PartialEq)]
pub struct DailyClose {
    pub date: NaiveDate,
    pub close: f64,
}

#[derive(Debug, Clone)]
pub struct PriceSeries {
    ticker: String,
    bars: Vec<Bar>,
}

/// One bar plus the trading-day boundary signal for it.
#[derive(Debug, Clone, Copy)]
pub struct SessionBar<'a> {
    pub index: usize,
    pub bar: &'a Bar,
    pub first_of_day: bool,
    pub last_of_day: bool,
}

impl PriceSeries {
    /// Validates every bar and the non-decreasing timestamp order.
    pub fn new(ticker: impl Into<String>, bars: Vec<Bar>) -> Result<Self, DataError> {
        for bar in &bars {
            bar.validate()?;
        }
        for pair in bars.windows(2) {
            if pair[1].timestamp < pair[0].timestamp {
                return Err(DataError::OutOfOrder {
                    previous: pair[0].timestamp,
                    timestamp: pair[1].timestamp,
                });
            }
        }
        Ok(Self {
            ticker: ticker.into(),
            bars,
        })
    }

    pub fn ticker(&self) -> &str {
        &self.ticker
    }

    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn first(&self) -> Option<&Bar> {
        self.bars.first()
    }

    pub fn last(&self) -> Option<&Bar> {
        self.bars.last()
    }

    /// A copy holding only bars whose date falls in `[start, end]`.
    /// `None` leaves that side open.
    pub fn restrict(&self, start: Option<NaiveDate>, end: Option<NaiveDate>) -> PriceSeries {
        let bars = self
            .bars
            .iter()
            .filter(|b| start.is_none_or(|s| b.date() >= s))
            .filter(|b| end.is_none_or(|e| b.date() <= e))
            .cloned()
            .collect();
        PriceSeries {
            ticker: self.ticker.clone(),
            bars,
        }
    }

    /// Number of distinct trading days.
    pub fn trading_days(&self) -> usize {
        self.sessions().filter(|s| s.first_of_day).count()
    }

    pub fn sessions(&self) -> impl Iterator<Item = SessionBar<'_>> + '_ {
        self.bars.iter().enumerate().map(move |(index, bar)| {
            let first_of_day = index == 0 || self.bars[index - 1].date() != bar.date();
            let last_of_day = self
                .bars
                .get(index + 1)
                .is_none_or(|next| next.date() != bar.date());
            SessionBar {
                index,
                bar,
                first_of_day,
                last_of_day,
            }
        })
    }

    /// The last close of every trading day, in date order.
    pub fn daily_closes(&self) -> Vec<DailyClose> {
        self.sessions()
            .filter(|s| s.last_of_day)
            .map(|s| DailyClose {
                date: s.bar.date(),
                close: s.bar.close,
            })
            .collect()
    }
}
