//! OHLCV bar representation.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

use super::error::DataError;

#[derive(Debug, Clone, PartialEq)]
pub struct Bar {
    pub timestamp: NaiveDateTime,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: i64,
}

impl Bar {
    pub fn date(&self) -> NaiveDate {
        self.timestamp.date()
    }

    pub fn time(&self) -> NaiveTime {
        self.timestamp.time()
    }

    /// max(high - low, |high - prev_close|, |low - prev_close|)
    pub fn true_range(&self, prev_close: f64) -> f64 {
        let hl = self.high - self.low;
        let hc = (self.high - prev_close).abs();
        let lc = (self.low - prev_close).abs();
        hl.max(hc).max(lc)
    }

    /// Checks the bar in isolation: finite positive prices, high >= low,
    /// open and close within [low, high], non-negative volume.
    pub fn validate(&self) -> Result<(), DataError> {
        for (field, value) in [
            ("open", self.open),
            ("high", self.high),
            ("low", self.low),
            ("close", self.close),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(DataError::InvalidPrice {
                    timestamp: self.timestamp,
                    field,
                    value,
                });
            }
        }
        if self.high < self.low {
            return Err(DataError::HighBelowLow {
                timestamp: self.timestamp,
                high: self.high,
                low: self.low,
            });
        }
        for (field, value) in [("open", self.open), ("close", self.close)] {
            if value < self.low || value > self.high {
                return Err(DataError::BodyOutsideRange {
                    timestamp: self.timestamp,
                    field,
                    value,
                    low: self.low,
                    high: self.high,
                });
            }
        }
        if self.volume < 0 {
            return Err(DataError::NegativeVolume {
                timestamp: self.timestamp,
                volume: self.volume,
            });
        }
        Ok(())
    }
}
