//! Simple Moving Average.
//!
//! SMA(n)[i] = mean(C[i-n+1..=i]). Warmup: first (n-1) points are invalid.

use std::collections::VecDeque;

use crate::domain::indicator::{IndicatorPoint, IndicatorSeries, IndicatorType};
use crate::domain::price_series::DailyClose;

/// Fixed-length window mean, fed one value at a time.
///
/// The mean is taken afresh from the window on every push, offset from the
/// newest value, so a window of equal values averages to exactly that value
/// no matter how long the history before it.
#[derive(Debug, Clone)]
pub struct RollingMean {
    period: usize,
    window: VecDeque<f64>,
}

impl RollingMean {
    pub fn new(period: usize) -> Self {
        Self {
            period: period.max(1),
            window: VecDeque::with_capacity(period.max(1)),
        }
    }

    /// Pushes a value and returns the mean once the window is full.
    pub fn push(&mut self, value: f64) -> Option<f64> {
        self.window.push_back(value);
        if self.window.len() > self.period {
            self.window.pop_front();
        }
        self.mean()
    }

    pub fn mean(&self) -> Option<f64> {
        if self.window.len() != self.period {
            return None;
        }
        let anchor = *self.window.back()?;
        let offset: f64 = self.window.iter().map(|v| v - anchor).sum();
        Some(anchor + offset / self.period as f64)
    }
}

pub fn calculate_sma(closes: &[DailyClose], period: usize) -> IndicatorSeries {
    if period == 0 {
        return IndicatorSeries {
            indicator_type: IndicatorType::Sma(period),
            values: Vec::new(),
        };
    }

    let mut mean = RollingMean::new(period);
    let values = closes
        .iter()
        .map(|c| match mean.push(c.close) {
            Some(value) => IndicatorPoint {
                date: c.date,
                valid: true,
                value,
            },
            None => IndicatorPoint {
                date: c.date,
                valid: false,
                value: 0.0,
            },
        })
        .collect();

    IndicatorSeries {
        indicator_type: IndicatorType::Sma(period),
        values,
    }
}
