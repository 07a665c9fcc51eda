//! Market regime filter on a second ticker.
//!
//! A buy on day D is allowed when the filter ticker's latest daily close
//! before D is above its simple moving average ending on that same day. When
//! there is no earlier close, or the average is still warming up, the filter
//! has no opinion and the buy is allowed.

use chrono::NaiveDate;

use crate::domain::error::LadderError;
use crate::domain::indicator::IndicatorSeries;
use crate::domain::indicator::sma::calculate_sma;
use crate::domain::price_series::{DailyClose, PriceSeries};

pub const DEFAULT_FILTER_PERIOD: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FilterReading {
    Bullish { date: NaiveDate, close: f64, average: f64 },
    Bearish { date: NaiveDate, close: f64, average: f64 },
    Unavailable,
}

impl FilterReading {
    pub fn allows_buy(&self) -> bool {
        !matches!(self, FilterReading::Bearish { .. })
    }
}

#[derive(Debug, Clone)]
pub struct MarketFilter {
    period: usize,
    closes: Vec<DailyClose>,
    sma: IndicatorSeries,
}

impl MarketFilter {
    /// `closes` must be one close per date in ascending date order.
    pub fn from_closes(closes: Vec<DailyClose>, period: usize) -> Result<Self, LadderError> {
        if period == 0 {
            return Err(LadderError::invalid(
                "dca",
                "filter_period",
                "filter_period must be at least 1",
            ));
        }
        if let Some(pair) = closes.windows(2).find(|p| p[1].date <= p[0].date) {
            return Err(LadderError::DataSource {
                reason: format!(
                    "filter closes not in ascending date order at {}",
                    pair[1].date
                ),
            });
        }
        let sma = calculate_sma(&closes, period);
        Ok(Self {
            period,
            closes,
            sma,
        })
    }

    /// Builds the filter from any bar interval; intraday bars collapse to the
    /// last close of each date.
    pub fn from_series(series: &PriceSeries, period: usize) -> Result<Self, LadderError> {
        Self::from_closes(series.daily_closes(), period)
    }

    pub fn period(&self) -> usize {
        self.period
    }

    pub fn len(&self) -> usize {
        self.closes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.closes.is_empty()
    }

    pub fn reading_before(&self, date: NaiveDate) -> FilterReading {
        let Some(point) = self.sma.latest_before(date).filter(|p| p.valid) else {
            return FilterReading::Unavailable;
        };
        let idx = self.closes.partition_point(|c| c.date < point.date);
        let Some(close) = self.closes.get(idx) else {
            return FilterReading::Unavailable;
        };
        if close.close > point.value {
            FilterReading::Bullish {
                date: close.date,
                close: close.close,
                average: point.value,
            }
        } else {
            FilterReading::Bearish {
                date: close.date,
                close: close.close,
                average: point.value,
            }
        }
    }
}
