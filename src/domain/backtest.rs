//! Backtest pipelines: load bars through a [`DataPort`], run one engine,
//! summarize.
//!
//! Market data is loaded in full before the first bar is processed.

use chrono::{NaiveDate, NaiveTime};

use super::config::{DcaConfig, TrendConfig};
use super::engine::{DcaEngine, RunOutcome};
use super::error::LadderError;
use super::market_filter::MarketFilter;
use super::metrics::Metrics;
use super::price_series::PriceSeries;
use super::sweep::{SweepResult, sweep_buy_times};
use super::trend_engine::{TrendEngine, TrendOutcome};
use crate::ports::data_port::DataPort;

#[derive(Debug, Clone)]
pub struct DcaReport {
    pub outcome: RunOutcome,
    pub metrics: Metrics,
}

#[derive(Debug, Clone)]
pub struct TrendReport {
    pub outcome: TrendOutcome,
    pub metrics: Metrics,
}

pub fn load_series(
    data: &dyn DataPort,
    ticker: &str,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
) -> Result<PriceSeries, LadderError> {
    let bars = data.fetch_bars(ticker, start, end)?;
    if bars.is_empty() {
        return Err(LadderError::NoData {
            ticker: ticker.to_string(),
        });
    }
    Ok(PriceSeries::new(ticker, bars)?)
}

/// The filter reads history before `end` without a lower bound, so the
/// average is warm on the first traded day when data allows.
pub fn load_filter(
    data: &dyn DataPort,
    filter_ticker: &str,
    period: usize,
    end: Option<NaiveDate>,
) -> Result<MarketFilter, LadderError> {
    let series = load_series(data, filter_ticker, None, end)?;
    let filter = MarketFilter::from_series(&series, period)?;
    tracing::debug!(
        ticker = filter_ticker,
        days = filter.len(),
        period,
        "market filter loaded"
    );
    Ok(filter)
}

fn filter_for(
    data: &dyn DataPort,
    config: &DcaConfig,
    filter_ticker: &str,
) -> Result<Option<MarketFilter>, LadderError> {
    if !config.use_filter {
        return Ok(None);
    }
    load_filter(data, filter_ticker, config.filter_period, config.end_date).map(Some)
}

pub fn run_dca(
    data: &dyn DataPort,
    config: &DcaConfig,
    ticker: &str,
    filter_ticker: &str,
) -> Result<DcaReport, LadderError> {
    config.validate()?;
    let series = load_series(data, ticker, config.start_date, config.end_date)?;
    let filter = filter_for(data, config, filter_ticker)?;
    let outcome = DcaEngine::new(config.clone(), filter.as_ref())?.run(&series)?;
    let metrics = Metrics::compute(&outcome, config.risk_free_rate);
    Ok(DcaReport { outcome, metrics })
}

pub fn run_trend(
    data: &dyn DataPort,
    config: &TrendConfig,
    ticker: &str,
) -> Result<TrendReport, LadderError> {
    config.validate()?;
    let series = load_series(data, ticker, config.start_date, config.end_date)?;
    let outcome = TrendEngine::new(config.clone())?.run(&series)?;
    let metrics = Metrics::compute(&outcome.outcome, config.risk_free_rate);
    Ok(TrendReport { outcome, metrics })
}

pub fn run_sweep(
    data: &dyn DataPort,
    config: &DcaConfig,
    ticker: &str,
    filter_ticker: &str,
    times: &[NaiveTime],
) -> Result<Vec<SweepResult>, LadderError> {
    config.validate()?;
    let series = load_series(data, ticker, config.start_date, config.end_date)?;
    let filter = filter_for(data, config, filter_ticker)?;
    sweep_buy_times(&series, filter.as_ref(), config, times)
}
