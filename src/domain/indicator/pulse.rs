//! Directional pulse: an incremental DI+/DI- count state machine.
//!
//! Per bar, strictly in order:
//! 1. pre-smooth OHLC with an n-bar SMA (`smoothing_factor`, 1 = raw bars)
//! 2. TR = max(H-L, |H-prevC|, |L-prevC|)
//! 3. +DM / -DM from consecutive highs and lows
//! 4. Wilder smoothing: s = s_prev - s_prev/adx_length + raw, seeded with raw
//! 5. +DI = 100 * s(+DM) / s(TR), -DI likewise (0 when s(TR) is 0)
//! 6. positive/negative run counts
//! 7. bullish = positive_count >= negative_count
//! 8. edge-triggered entry/exit events on bullish flips
//!
//! The counts are cumulative over the whole run. A machine must see every bar
//! of a series exactly once, in order; rebuilding it over a trailing window
//! produces different counts and different signal timing.

use chrono::NaiveDateTime;

use crate::domain::error::LadderError;
use crate::domain::indicator::IndicatorType;
use crate::domain::indicator::sma::RollingMean;
use crate::domain::ohlcv::Bar;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PulseParams {
    pub adx_length: usize,
    pub smoothing_factor: usize,
}

impl Default for PulseParams {
    fn default() -> Self {
        PulseParams {
            adx_length: 9,
            smoothing_factor: 1,
        }
    }
}

impl PulseParams {
    pub fn validate(&self) -> Result<(), LadderError> {
        if self.adx_length == 0 {
            return Err(LadderError::invalid(
                "trend",
                "adx_length",
                "adx_length must be at least 1",
            ));
        }
        if self.smoothing_factor == 0 {
            return Err(LadderError::invalid(
                "trend",
                "smoothing_factor",
                "smoothing_factor must be at least 1",
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PulseEvent {
    Entry,
    Exit,
}

/// Run-lifetime state. Starts flat (not bullish) with zeroed smoothing.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TrendState {
    pub smoothed_true_range: f64,
    pub smoothed_dm_plus: f64,
    pub smoothed_dm_minus: f64,
    pub prev_di_plus: f64,
    pub prev_di_minus: f64,
    pub positive_count: u32,
    pub negative_count: u32,
    pub is_bullish: bool,
}

/// What one processed bar produced.
#[derive(Debug, Clone, PartialEq)]
pub struct PulseReading {
    pub timestamp: NaiveDateTime,
    pub di_plus: f64,
    pub di_minus: f64,
    pub positive_count: u32,
    pub negative_count: u32,
    pub is_bullish: bool,
    pub event: Option<PulseEvent>,
}

#[derive(Debug, Clone)]
struct OhlcSmoother {
    open: RollingMean,
    high: RollingMean,
    low: RollingMean,
    close: RollingMean,
}

impl OhlcSmoother {
    fn new(period: usize) -> Self {
        Self {
            open: RollingMean::new(period),
            high: RollingMean::new(period),
            low: RollingMean::new(period),
            close: RollingMean::new(period),
        }
    }

    fn push(&mut self, bar: &Bar) -> Option<Bar> {
        let open = self.open.push(bar.open);
        let high = self.high.push(bar.high);
        let low = self.low.push(bar.low);
        let close = self.close.push(bar.close);
        Some(Bar {
            timestamp: bar.timestamp,
            open: open?,
            high: high?,
            low: low?,
            close: close?,
            volume: bar.volume,
        })
    }
}

#[derive(Debug, Clone)]
pub struct TrendStateMachine {
    params: PulseParams,
    smoother: OhlcSmoother,
    prev: Option<Bar>,
    state: TrendState,
    bars_processed: usize,
}

impl TrendStateMachine {
    pub fn new(params: PulseParams) -> Result<Self, LadderError> {
        params.validate()?;
        Ok(Self {
            params,
            smoother: OhlcSmoother::new(params.smoothing_factor),
            prev: None,
            state: TrendState::default(),
            bars_processed: 0,
        })
    }

    pub fn params(&self) -> PulseParams {
        self.params
    }

    pub fn indicator_type(&self) -> IndicatorType {
        IndicatorType::Pulse {
            adx_length: self.params.adx_length,
            smoothing_factor: self.params.smoothing_factor,
        }
    }

    pub fn state(&self) -> &TrendState {
        &self.state
    }

    /// Bars that advanced the state (excludes smoother warmup bars).
    pub fn bars_processed(&self) -> usize {
        self.bars_processed
    }

    /// Advances the machine by one bar. Returns `None` while the OHLC
    /// smoother is still warming up; the state is untouched in that case.
    pub fn update(&mut self, bar: &Bar) -> Option<PulseReading> {
        let smoothed = self.smoother.push(bar)?;

        let (true_range, dm_plus, dm_minus) = match &self.prev {
            None => (smoothed.high - smoothed.low, 0.0, 0.0),
            Some(prev) => {
                let up_move = smoothed.high - prev.high;
                let down_move = prev.low - smoothed.low;
                let dm_plus = if up_move > down_move && up_move > 0.0 {
                    up_move
                } else {
                    0.0
                };
                let dm_minus = if down_move > up_move && down_move > 0.0 {
                    down_move
                } else {
                    0.0
                };
                (smoothed.true_range(prev.close), dm_plus, dm_minus)
            }
        };

        let length = self.params.adx_length as f64;
        let s = &mut self.state;
        if self.bars_processed == 0 {
            s.smoothed_true_range = true_range;
            s.smoothed_dm_plus = dm_plus;
            s.smoothed_dm_minus = dm_minus;
        } else {
            s.smoothed_true_range = wilder(s.smoothed_true_range, true_range, length);
            s.smoothed_dm_plus = wilder(s.smoothed_dm_plus, dm_plus, length);
            s.smoothed_dm_minus = wilder(s.smoothed_dm_minus, dm_minus, length);
        }

        let (di_plus, di_minus) = if s.smoothed_true_range > 0.0 {
            (
                100.0 * s.smoothed_dm_plus / s.smoothed_true_range,
                100.0 * s.smoothed_dm_minus / s.smoothed_true_range,
            )
        } else {
            (0.0, 0.0)
        };

        if di_plus > s.prev_di_plus && di_plus > di_minus {
            s.positive_count += 1;
            s.negative_count = 0;
        } else if di_minus > s.prev_di_minus && di_minus > di_plus {
            s.negative_count += 1;
            s.positive_count = 0;
        }
        // Neither condition: both counts hold their values.

        s.prev_di_plus = di_plus;
        s.prev_di_minus = di_minus;

        let was_bullish = s.is_bullish;
        s.is_bullish = s.positive_count >= s.negative_count;
        let event = match (was_bullish, s.is_bullish) {
            (false, true) => Some(PulseEvent::Entry),
            (true, false) => Some(PulseEvent::Exit),
            _ => None,
        };

        let reading = PulseReading {
            timestamp: bar.timestamp,
            di_plus,
            di_minus,
            positive_count: s.positive_count,
            negative_count: s.negative_count,
            is_bullish: s.is_bullish,
            event,
        };

        self.prev = Some(smoothed);
        self.bars_processed += 1;

        tracing::trace!(
            timestamp = %reading.timestamp,
            di_plus = reading.di_plus,
            di_minus = reading.di_minus,
            positive = reading.positive_count,
            negative = reading.negative_count,
            "pulse update"
        );

        Some(reading)
    }
}

fn wilder(prior: f64, raw: f64, length: f64) -> f64 {
    prior - prior / length + raw
}

/// Runs a fresh machine over `bars` once, front to back, and returns every
/// emitted event with its bar timestamp.
pub fn signal_timeline(
    bars: &[Bar],
    params: PulseParams,
) -> Result<Vec<(NaiveDateTime, PulseEvent)>, LadderError> {
    let mut machine = TrendStateMachine::new(params)?;
    Ok(bars
        .iter()
        .filter_map(|bar| machine.update(bar))
        .filter_map(|r| r.event.map(|e| (r.timestamp, e)))
        .collect())
}
