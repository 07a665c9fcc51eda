//! Ladder DCA execution engine.
//!
//! Per bar, in this order:
//! 1. fill every active sell rung the bar's high reaches, at the rung's target
//! 2. on the day's trigger bar, decide the buy: cash, then market filter,
//!    then the ten-share minimum; a skip is final for the day
//! 3. on a buy, place the ten-rung ladder above the buy price
//! 4. on the day's last bar, record end-of-day equity
//!
//! Rungs placed on a bar are first eligible to fill on the next bar.

use chrono::{NaiveDateTime, NaiveTime, TimeDelta};
use std::fmt;

use super::config::{BarInterval, DcaConfig};
use super::error::{DataError, LadderError};
use super::execution::shares_for_amount;
use super::market_filter::{FilterReading, MarketFilter};
use super::ohlcv::Bar;
use super::order::{MIN_SHARES, Order};
use super::order_book::OrderBook;
use super::portfolio::Portfolio;
use super::price_series::{PriceSeries, SessionBar};
use super::trade::{ClosedTrade, Side};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SkipReason {
    InsufficientCash,
    FilterBearish,
    MinShares,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::InsufficientCash => write!(f, "INSUFFICIENT_CASH"),
            SkipReason::FilterBearish => write!(f, "FILTER_BEARISH"),
            SkipReason::MinShares => write!(f, "MIN_SHARES"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SkipRecord {
    pub timestamp: NaiveDateTime,
    pub reason: SkipReason,
}

/// Where the current trading day stands.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DayState {
    Idle,
    Bought { shares: i64, price: f64 },
    Skipped(SkipReason),
}

#[derive(Debug, Clone, PartialEq)]
pub struct RunSnapshot {
    pub final_cash: f64,
    pub final_shares: i64,
    /// Ascending target price.
    pub pending_orders: Vec<Order>,
    pub realized_pnl: f64,
}

/// Everything a finished run hands to reporting.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub ticker: String,
    pub portfolio: Portfolio,
    pub skips: Vec<SkipRecord>,
    pub snapshot: RunSnapshot,
    pub first_close: Option<f64>,
    pub last_close: Option<f64>,
    pub bars_processed: usize,
}

impl RunOutcome {
    /// Portfolio value at the last close.
    pub fn final_value(&self) -> f64 {
        let price = self.last_close.unwrap_or(0.0);
        self.portfolio.current_value(price)
    }

    pub fn skip_count(&self, reason: SkipReason) -> usize {
        self.skips.iter().filter(|s| s.reason == reason).count()
    }
}

/// Refuses bars that are malformed or older than the last one processed.
#[derive(Debug, Clone, Default)]
pub(crate) struct BarGuard {
    last: Option<NaiveDateTime>,
}

impl BarGuard {
    pub(crate) fn admit(&mut self, bar: &Bar) -> Result<(), DataError> {
        bar.validate()?;
        if let Some(previous) = self.last {
            if bar.timestamp < previous {
                return Err(DataError::OutOfOrder {
                    previous,
                    timestamp: bar.timestamp,
                });
            }
        }
        self.last = Some(bar.timestamp);
        Ok(())
    }
}

pub struct DcaEngine<'a> {
    config: DcaConfig,
    filter: Option<&'a MarketFilter>,
    portfolio: Portfolio,
    book: OrderBook,
    skips: Vec<SkipRecord>,
    day_state: DayState,
    guard: BarGuard,
    bars_processed: usize,
}

impl<'a> DcaEngine<'a> {
    /// `filter` is consulted only when `config.use_filter` is set, and must
    /// then be present.
    pub fn new(config: DcaConfig, filter: Option<&'a MarketFilter>) -> Result<Self, LadderError> {
        config.validate()?;
        if config.use_filter && filter.is_none() {
            return Err(LadderError::invalid(
                "dca",
                "use_filter",
                "filter enabled but no filter series supplied",
            ));
        }
        Ok(Self {
            portfolio: Portfolio::new(config.initial_capital),
            config,
            filter,
            book: OrderBook::new(),
            skips: Vec::new(),
            day_state: DayState::Idle,
            guard: BarGuard::default(),
            bars_processed: 0,
        })
    }

    pub fn config(&self) -> &DcaConfig {
        &self.config
    }

    pub fn portfolio(&self) -> &Portfolio {
        &self.portfolio
    }

    pub fn order_book(&self) -> &OrderBook {
        &self.book
    }

    pub fn skips(&self) -> &[SkipRecord] {
        &self.skips
    }

    pub fn day_state(&self) -> DayState {
        self.day_state
    }

    pub fn snapshot(&self) -> RunSnapshot {
        RunSnapshot {
            final_cash: self.portfolio.cash,
            final_shares: self.portfolio.shares,
            pending_orders: self.book.pending(),
            realized_pnl: self.portfolio.realized_pnl(),
        }
    }

    fn is_trigger(&self, session: &SessionBar<'_>) -> bool {
        if self.config.interval == BarInterval::Daily {
            return session.first_of_day;
        }
        let time = session.bar.time();
        let buy_time = self.config.buy_time;
        match self.config.buy_window_minutes {
            0 => time == buy_time,
            window => within_window(time, buy_time, window),
        }
    }

    /// Advances the engine by one bar. A bar that fails validation halts
    /// processing before it touches any state.
    pub fn process_bar(&mut self, session: SessionBar<'_>) -> Result<(), LadderError> {
        let bar = session.bar;
        self.guard.admit(bar)?;

        if session.first_of_day {
            self.day_state = DayState::Idle;
        }

        self.match_sells(bar);

        if self.day_state == DayState::Idle && self.is_trigger(&session) {
            self.day_state = self.decide_buy(bar);
        }

        if session.last_of_day {
            let equity = self.portfolio.current_value(bar.close);
            self.portfolio.record_equity(bar.date(), equity);
        }

        self.bars_processed += 1;
        Ok(())
    }

    fn match_sells(&mut self, bar: &Bar) {
        for order in self.book.match_bar(bar) {
            self.portfolio
                .record_sell(bar.timestamp, order.shares, order.target_price, 0.0);
            self.portfolio.record_trade(ClosedTrade {
                entry_time: order.created_at,
                exit_time: bar.timestamp,
                shares: order.shares,
                entry_price: order.buy_price,
                exit_price: order.target_price,
                pnl: order.profit(),
            });
            tracing::debug!(
                timestamp = %bar.timestamp,
                order = %order.id,
                shares = order.shares,
                price = order.target_price,
                "SELL filled"
            );
        }
    }

    fn skip(&mut self, timestamp: NaiveDateTime, reason: SkipReason) -> DayState {
        tracing::info!(%timestamp, %reason, cash = self.portfolio.cash, "SKIP");
        self.skips.push(SkipRecord { timestamp, reason });
        DayState::Skipped(reason)
    }

    fn decide_buy(&mut self, bar: &Bar) -> DayState {
        let daily = self.config.daily_investment;
        if self.portfolio.cash < daily {
            return self.skip(bar.timestamp, SkipReason::InsufficientCash);
        }

        if self.config.use_filter {
            let reading = self
                .filter
                .map_or(FilterReading::Unavailable, |f| f.reading_before(bar.date()));
            match reading {
                FilterReading::Bearish { date, close, average } => {
                    tracing::debug!(%date, close, average, "filter bearish");
                    return self.skip(bar.timestamp, SkipReason::FilterBearish);
                }
                FilterReading::Unavailable => {
                    tracing::warn!(date = %bar.date(), "no filter reading, buy allowed");
                }
                FilterReading::Bullish { .. } => {}
            }
        }

        let price = bar.close;
        let shares = shares_for_amount(daily, price);
        if shares < MIN_SHARES {
            return self.skip(bar.timestamp, SkipReason::MinShares);
        }

        self.portfolio.record_buy(bar.timestamp, shares, price, 0.0);
        let ids = self
            .book
            .place_ladder(shares, price, self.config.price_increment, bar.timestamp);
        tracing::info!(
            timestamp = %bar.timestamp,
            shares,
            price,
            orders = ids.len(),
            cash = self.portfolio.cash,
            "BUY"
        );
        DayState::Bought { shares, price }
    }

    /// Processes the configured date range of `series` once, front to back.
    pub fn run(mut self, series: &PriceSeries) -> Result<RunOutcome, LadderError> {
        let series = series.restrict(self.config.start_date, self.config.end_date);
        if series.is_empty() {
            return Err(LadderError::NoData {
                ticker: series.ticker().to_string(),
            });
        }
        for session in series.sessions() {
            self.process_bar(session)?;
        }

        let snapshot = self.snapshot();
        tracing::info!(
            ticker = series.ticker(),
            buy_time = %self.config.buy_time,
            bars = self.bars_processed,
            buys = self.portfolio.count(Side::Buy),
            sells = self.portfolio.count(Side::Sell),
            skips = self.skips.len(),
            final_cash = snapshot.final_cash,
            final_shares = snapshot.final_shares,
            pending = snapshot.pending_orders.len(),
            "ladder run finished"
        );

        Ok(RunOutcome {
            ticker: series.ticker().to_string(),
            first_close: series.first().map(|b| b.close),
            last_close: series.last().map(|b| b.close),
            bars_processed: self.bars_processed,
            portfolio: self.portfolio,
            skips: self.skips,
            snapshot,
        })
    }
}

/// `time` lies in `[start, start + window_minutes)`.
fn within_window(time: NaiveTime, start: NaiveTime, window_minutes: u32) -> bool {
    time >= start
        && time.signed_duration_since(start) < TimeDelta::minutes(i64::from(window_minutes))
}
