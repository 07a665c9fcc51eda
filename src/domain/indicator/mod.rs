//! Technical indicators.
//!
//! - `IndicatorPoint` / `IndicatorSeries`: a dated indicator time series with
//!   warmup validity flags (used by the market filter's moving average)
//! - `IndicatorType`: indicator identity + parameters, for logs and labels
//! - [`sma`]: rolling simple moving average
//! - [`pulse`]: the incremental directional-pulse state machine

pub mod pulse;
pub mod sma;

use chrono::NaiveDate;
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorPoint {
    pub date: NaiveDate,
    pub valid: bool,
    pub value: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndicatorType {
    Sma(usize),
    Pulse {
        adx_length: usize,
        smoothing_factor: usize,
    },
}

#[derive(Debug, Clone)]
pub struct IndicatorSeries {
    pub indicator_type: IndicatorType,
    pub values: Vec<IndicatorPoint>,
}

impl IndicatorSeries {
    /// The latest point dated strictly before `date`, which may still be
    /// inside the warmup (`valid == false`). Values must be in date order.
    pub fn latest_before(&self, date: NaiveDate) -> Option<&IndicatorPoint> {
        let idx = self.values.partition_point(|p| p.date < date);
        idx.checked_sub(1).map(|i| &self.values[i])
    }
}

impl fmt::Display for IndicatorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndicatorType::Sma(period) => write!(f, "SMA({})", period),
            IndicatorType::Pulse {
                adx_length,
                smoothing_factor,
            } => write!(f, "PULSE({},{})", adx_length, smoothing_factor),
        }
    }
}
