//! Directional-pulse state machine properties and trend engine runs.

mod common;

use common::*;
use laddertrader::domain::config::TrendConfig;
use laddertrader::domain::execution::ExecutionConfig;
use laddertrader::domain::indicator::pulse::{
    PulseEvent, PulseParams, PulseReading, TrendStateMachine, signal_timeline,
};
use laddertrader::domain::price_series::PriceSeries;
use laddertrader::domain::trend_engine::TrendEngine;
use proptest::prelude::*;

fn readings(bars: &[Bar], params: PulseParams) -> Vec<PulseReading> {
    let mut machine = TrendStateMachine::new(params).unwrap();
    bars.iter().filter_map(|b| machine.update(b)).collect()
}

/// One point per bar, half a point of range either side of the close.
fn rising(n: usize) -> Vec<Bar> {
    let start = date(2024, 1, 1);
    (0..n)
        .map(|i| {
            let close = 100.0 + i as f64;
            Bar {
                timestamp: at(start + chrono::Days::new(i as u64), 16, 0),
                open: close,
                high: close + 0.5,
                low: close - 0.5,
                close,
                volume: 1_000,
            }
        })
        .collect()
}

fn sine_closes(n: usize) -> Vec<f64> {
    (0..n)
        .map(|i| 100.0 + 10.0 * (i as f64 / 4.0).sin())
        .collect()
}

mod rising_series {
    use super::*;

    #[test]
    fn positive_count_climbs_every_bar() {
        let out = readings(&rising(40), PulseParams::default());
        assert_eq!(out.len(), 40);
        assert_eq!(out[0].positive_count, 0);
        for pair in out.windows(2) {
            assert!(pair[1].positive_count > pair[0].positive_count);
        }
        assert!(out.iter().all(|r| r.negative_count == 0));
    }

    #[test]
    fn exactly_one_entry_edge() {
        let out = readings(&rising(40), PulseParams::default());
        let events: Vec<PulseEvent> = out.iter().filter_map(|r| r.event).collect();
        assert_eq!(events, vec![PulseEvent::Entry]);
        assert!(out.iter().all(|r| r.is_bullish));
    }

    #[test]
    fn smoothing_delays_the_first_reading() {
        let params = PulseParams {
            adx_length: 9,
            smoothing_factor: 3,
        };
        let out = readings(&rising(10), params);
        assert_eq!(out.len(), 8);
        assert_eq!(out[0].event, Some(PulseEvent::Entry));
    }
}

mod determinism {
    use super::*;

    #[test]
    fn identical_series_reproduce_signal_timestamps() {
        let bars = path_bars(&sine_closes(120));
        let first = signal_timeline(&bars, PulseParams::default()).unwrap();
        let second = signal_timeline(&bars, PulseParams::default()).unwrap();
        assert!(first.len() > 2);
        assert_eq!(first, second);
    }

    #[test]
    fn signals_alternate_starting_with_entry() {
        let bars = path_bars(&sine_closes(120));
        let timeline = signal_timeline(&bars, PulseParams::default()).unwrap();
        for (i, (_, event)) in timeline.iter().enumerate() {
            let expected = if i % 2 == 0 {
                PulseEvent::Entry
            } else {
                PulseEvent::Exit
            };
            assert_eq!(*event, expected);
        }
    }

    #[test]
    fn state_is_carried_not_recomputed() {
        // Feeding the tail alone must not reproduce the full-history state.
        let bars = path_bars(&sine_closes(80));
        let full = readings(&bars, PulseParams::default());
        let tail = readings(&bars[40..], PulseParams::default());
        let last_full = full.last().unwrap();
        let last_tail = tail.last().unwrap();
        assert!((last_full.di_plus - last_tail.di_plus).abs() > 1e-12);
    }
}

mod engine_runs {
    use super::*;

    fn frictionless() -> TrendConfig {
        TrendConfig {
            execution: ExecutionConfig {
                commission_rate: 0.0,
                slippage_pct: 0.0,
            },
            ..TrendConfig::default()
        }
    }

    #[test]
    fn round_trips_follow_the_signals() {
        let series = PriceSeries::new("TQQQ", path_bars(&sine_closes(120))).unwrap();
        let result = TrendEngine::new(frictionless())
            .unwrap()
            .run(&series)
            .unwrap();

        let trades = &result.outcome.portfolio.closed_trades;
        assert!(!trades.is_empty());
        for trade in trades {
            assert!(trade.exit_time > trade.entry_time);
        }
        for pair in trades.windows(2) {
            assert!(pair[1].entry_time >= pair[0].exit_time);
        }
        assert!(result.outcome.portfolio.cash >= 0.0);
    }

    #[test]
    fn engine_and_timeline_agree() {
        let bars = path_bars(&sine_closes(120));
        let series = PriceSeries::new("TQQQ", bars.clone()).unwrap();
        let result = TrendEngine::new(frictionless())
            .unwrap()
            .run(&series)
            .unwrap();
        let timeline = signal_timeline(&bars, PulseParams::default()).unwrap();
        let engine_view: Vec<_> = result
            .signals
            .iter()
            .map(|s| (s.timestamp, s.event))
            .collect();
        assert_eq!(engine_view, timeline);
    }
}

fn random_walk(steps: &[f64]) -> Vec<Bar> {
    let mut close = 100.0_f64;
    let closes: Vec<f64> = steps
        .iter()
        .map(|step| {
            close = (close + step).max(10.0);
            close
        })
        .collect();
    path_bars(&closes)
}

proptest! {
    /// The two counts are never positive together.
    #[test]
    fn counts_are_exclusive(
        steps in prop::collection::vec(-3.0..3.0_f64, 1..150),
        adx_length in 1usize..20,
    ) {
        let params = PulseParams { adx_length, smoothing_factor: 1 };
        for reading in readings(&random_walk(&steps), params) {
            prop_assert!(!(reading.positive_count > 0 && reading.negative_count > 0));
        }
    }

    /// An event fires exactly on the bars where `is_bullish` flips, starting
    /// from flat.
    #[test]
    fn edges_fire_once_per_flip(
        steps in prop::collection::vec(-3.0..3.0_f64, 1..150),
        smoothing_factor in 1usize..4,
    ) {
        let params = PulseParams { adx_length: 9, smoothing_factor };
        let mut was_bullish = false;
        for reading in readings(&random_walk(&steps), params) {
            let expected = match (was_bullish, reading.is_bullish) {
                (false, true) => Some(PulseEvent::Entry),
                (true, false) => Some(PulseEvent::Exit),
                _ => None,
            };
            prop_assert_eq!(reading.event, expected);
            prop_assert_eq!(reading.is_bullish, reading.positive_count >= reading.negative_count);
            was_bullish = reading.is_bullish;
        }
    }
}
