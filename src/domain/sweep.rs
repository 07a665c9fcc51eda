//! Buy-time sweep for the ladder engine.
//!
//! Every grid point gets its own engine over the same series and filter, so
//! runs share nothing mutable and go through rayon's pool.

use chrono::{NaiveTime, Timelike};
use rayon::prelude::*;

use super::config::DcaConfig;
use super::engine::DcaEngine;
use super::error::LadderError;
use super::market_filter::MarketFilter;
use super::metrics::Metrics;
use super::price_series::PriceSeries;

const GRID_START: (u32, u32) = (9, 30);
const GRID_END: (u32, u32) = (15, 30);
const GRID_STEP_MINUTES: u32 = 30;

#[derive(Debug, Clone)]
pub struct SweepResult {
    pub buy_time: NaiveTime,
    pub metrics: Metrics,
}

/// 09:30 through 15:30 every 30 minutes.
pub fn buy_time_grid() -> Vec<NaiveTime> {
    let start = GRID_START.0 * 60 + GRID_START.1;
    let end = GRID_END.0 * 60 + GRID_END.1;
    (start..=end)
        .step_by(GRID_STEP_MINUTES as usize)
        .filter_map(|m| NaiveTime::from_hms_opt(m / 60, m % 60, 0))
        .collect()
}

/// Runs `base` once per buy time and ranks by final value, best first.
/// Equal final values keep the earlier buy time first.
pub fn sweep_buy_times(
    series: &PriceSeries,
    filter: Option<&MarketFilter>,
    base: &DcaConfig,
    times: &[NaiveTime],
) -> Result<Vec<SweepResult>, LadderError> {
    let mut results = times
        .par_iter()
        .map(|&buy_time| {
            let config = base.with_buy_time(buy_time);
            let risk_free_rate = config.risk_free_rate;
            let outcome = DcaEngine::new(config, filter)?.run(series)?;
            Ok(SweepResult {
                buy_time,
                metrics: Metrics::compute(&outcome, risk_free_rate),
            })
        })
        .collect::<Result<Vec<_>, LadderError>>()?;

    results.sort_by(|a, b| {
        b.metrics
            .final_value
            .total_cmp(&a.metrics.final_value)
            .then(a.buy_time.cmp(&b.buy_time))
    });

    tracing::info!(
        runs = results.len(),
        best = ?results.first().map(|r| r.buy_time),
        "buy-time sweep finished"
    );
    Ok(results)
}

/// Best/worst spread and the morning versus afternoon average return.
#[derive(Debug, Clone, PartialEq)]
pub struct SweepSummary {
    pub best: NaiveTime,
    pub worst: NaiveTime,
    /// Best minus worst total return, in percentage points.
    pub spread_pct: f64,
    pub morning_average_pct: Option<f64>,
    pub afternoon_average_pct: Option<f64>,
}

impl SweepSummary {
    /// Expects `results` ranked as returned by [`sweep_buy_times`].
    pub fn from_ranked(results: &[SweepResult]) -> Option<Self> {
        let best = results.first()?;
        let worst = results.last()?;
        let (morning, afternoon): (Vec<&SweepResult>, Vec<&SweepResult>) =
            results.iter().partition(|r| r.buy_time.hour() < 12);
        Some(Self {
            best: best.buy_time,
            worst: worst.buy_time,
            spread_pct: best.metrics.total_return_pct - worst.metrics.total_return_pct,
            morning_average_pct: average_return(&morning),
            afternoon_average_pct: average_return(&afternoon),
        })
    }
}

fn average_return(results: &[&SweepResult]) -> Option<f64> {
    if results.is_empty() {
        return None;
    }
    let total: f64 = results.iter().map(|r| r.metrics.total_return_pct).sum();
    Some(total / results.len() as f64)
}
