//! Directional-pulse execution: long only, one position, whole shares.
//!
//! An entry edge arms a buy; it is sent once the positive count reaches the
//! threshold while still bullish. An exit edge arms a sell; it is sent once
//! the position has been held for the minimum number of bars. Orders fill at
//! the next bar's open with slippage and a flat commission. The state machine
//! sees every bar, including bars on which an order is pending.

use chrono::NaiveDateTime;

use super::config::TrendConfig;
use super::engine::{BarGuard, RunOutcome, RunSnapshot, SkipReason, SkipRecord};
use super::error::LadderError;
use super::execution::{
    all_in_shares, apply_slippage_long_entry, apply_slippage_long_exit, calculate_commission,
};
use super::indicator::pulse::{PulseEvent, PulseReading, TrendStateMachine};
use super::ohlcv::Bar;
use super::portfolio::Portfolio;
use super::price_series::{PriceSeries, SessionBar};
use super::trade::{ClosedTrade, Side};

/// An edge the machine emitted, with the counts at that bar.
#[derive(Debug, Clone, PartialEq)]
pub struct PulseSignal {
    pub timestamp: NaiveDateTime,
    pub event: PulseEvent,
    pub positive_count: u32,
    pub negative_count: u32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OpenLot {
    pub entry_time: NaiveDateTime,
    pub shares: i64,
    pub entry_price: f64,
    pub entry_commission: f64,
}

#[derive(Debug, Clone)]
pub struct TrendOutcome {
    pub outcome: RunOutcome,
    pub signals: Vec<PulseSignal>,
    pub open_lot: Option<OpenLot>,
    /// Order sent on the last bar that had no next bar to fill on.
    pub unfilled: Option<Side>,
}

pub struct TrendEngine {
    config: TrendConfig,
    machine: TrendStateMachine,
    portfolio: Portfolio,
    armed: Option<PulseEvent>,
    pending: Option<Side>,
    lot: Option<OpenLot>,
    bars_held: usize,
    skips: Vec<SkipRecord>,
    signals: Vec<PulseSignal>,
    guard: BarGuard,
    bars_processed: usize,
}

impl TrendEngine {
    pub fn new(config: TrendConfig) -> Result<Self, LadderError> {
        config.validate()?;
        Ok(Self {
            machine: TrendStateMachine::new(config.pulse)?,
            portfolio: Portfolio::new(config.initial_capital),
            config,
            armed: None,
            pending: None,
            lot: None,
            bars_held: 0,
            skips: Vec::new(),
            signals: Vec::new(),
            guard: BarGuard::default(),
            bars_processed: 0,
        })
    }

    pub fn portfolio(&self) -> &Portfolio {
        &self.portfolio
    }

    pub fn machine(&self) -> &TrendStateMachine {
        &self.machine
    }

    pub fn open_lot(&self) -> Option<&OpenLot> {
        self.lot.as_ref()
    }

    pub fn pending(&self) -> Option<Side> {
        self.pending
    }

    pub fn signals(&self) -> &[PulseSignal] {
        &self.signals
    }

    pub fn process_bar(&mut self, session: SessionBar<'_>) -> Result<(), LadderError> {
        let bar = session.bar;
        self.guard.admit(bar)?;

        match self.pending.take() {
            Some(Side::Buy) => self.fill_entry(bar),
            Some(Side::Sell) => self.fill_exit(bar),
            None => {}
        }

        if self.lot.is_some() {
            self.bars_held += 1;
        }

        if let Some(reading) = self.machine.update(bar) {
            tracing::debug!(
                timestamp = %reading.timestamp,
                di_plus = reading.di_plus,
                di_minus = reading.di_minus,
                positive = reading.positive_count,
                negative = reading.negative_count,
                bullish = reading.is_bullish,
                "pulse"
            );
            self.on_reading(&reading);
        }

        if session.last_of_day {
            let equity = self.portfolio.current_value(bar.close);
            self.portfolio.record_equity(bar.date(), equity);
        }

        self.bars_processed += 1;
        Ok(())
    }

    fn on_reading(&mut self, reading: &PulseReading) {
        if let Some(event) = reading.event {
            self.signals.push(PulseSignal {
                timestamp: reading.timestamp,
                event,
                positive_count: reading.positive_count,
                negative_count: reading.negative_count,
            });
            self.armed = Some(event);
        }

        if self.pending.is_some() {
            return;
        }

        match (self.armed, self.lot.is_some()) {
            (Some(PulseEvent::Entry), false)
                if reading.is_bullish
                    && reading.positive_count >= self.config.min_count_threshold =>
            {
                tracing::info!(
                    timestamp = %reading.timestamp,
                    positive = reading.positive_count,
                    "entry signal, buying next open"
                );
                self.pending = Some(Side::Buy);
                self.armed = None;
            }
            (Some(PulseEvent::Exit), true)
                if !reading.is_bullish && self.bars_held >= self.config.min_holding_bars =>
            {
                tracing::info!(
                    timestamp = %reading.timestamp,
                    negative = reading.negative_count,
                    held = self.bars_held,
                    "exit signal, selling next open"
                );
                self.pending = Some(Side::Sell);
                self.armed = None;
            }
            _ => {}
        }
    }

    fn fill_entry(&mut self, bar: &Bar) {
        let exec = &self.config.execution;
        let price = apply_slippage_long_entry(bar.open, exec.slippage_pct);
        let shares = all_in_shares(self.portfolio.cash, price, exec);
        if shares == 0 {
            tracing::info!(
                timestamp = %bar.timestamp,
                cash = self.portfolio.cash,
                price,
                reason = %SkipReason::InsufficientCash,
                "SKIP"
            );
            self.skips.push(SkipRecord {
                timestamp: bar.timestamp,
                reason: SkipReason::InsufficientCash,
            });
            return;
        }
        let commission = calculate_commission(shares as f64 * price, exec);
        self.portfolio
            .record_buy(bar.timestamp, shares, price, commission);
        self.lot = Some(OpenLot {
            entry_time: bar.timestamp,
            shares,
            entry_price: price,
            entry_commission: commission,
        });
        self.bars_held = 0;
        tracing::info!(
            timestamp = %bar.timestamp,
            shares,
            price,
            commission,
            cash = self.portfolio.cash,
            "BUY"
        );
    }

    fn fill_exit(&mut self, bar: &Bar) {
        let Some(lot) = self.lot.take() else {
            return;
        };
        let exec = &self.config.execution;
        let price = apply_slippage_long_exit(bar.open, exec.slippage_pct);
        let commission = calculate_commission(lot.shares as f64 * price, exec);
        self.portfolio
            .record_sell(bar.timestamp, lot.shares, price, commission);
        let pnl = lot.shares as f64 * (price - lot.entry_price) - lot.entry_commission - commission;
        self.portfolio.record_trade(ClosedTrade {
            entry_time: lot.entry_time,
            exit_time: bar.timestamp,
            shares: lot.shares,
            entry_price: lot.entry_price,
            exit_price: price,
            pnl,
        });
        self.bars_held = 0;
        tracing::info!(
            timestamp = %bar.timestamp,
            shares = lot.shares,
            price,
            pnl,
            cash = self.portfolio.cash,
            "SELL"
        );
    }

    pub fn run(mut self, series: &PriceSeries) -> Result<TrendOutcome, LadderError> {
        let series = series.restrict(self.config.start_date, self.config.end_date);
        if series.is_empty() {
            return Err(LadderError::NoData {
                ticker: series.ticker().to_string(),
            });
        }
        for session in series.sessions() {
            self.process_bar(session)?;
        }

        let snapshot = RunSnapshot {
            final_cash: self.portfolio.cash,
            final_shares: self.portfolio.shares,
            pending_orders: Vec::new(),
            realized_pnl: self.portfolio.realized_pnl(),
        };
        tracing::info!(
            ticker = series.ticker(),
            indicator = %self.machine.indicator_type(),
            bars = self.bars_processed,
            signals = self.signals.len(),
            trades = self.portfolio.closed_trades.len(),
            final_cash = snapshot.final_cash,
            final_shares = snapshot.final_shares,
            "pulse run finished"
        );

        Ok(TrendOutcome {
            outcome: RunOutcome {
                ticker: series.ticker().to_string(),
                first_close: series.first().map(|b| b.close),
                last_close: series.last().map(|b| b.close),
                bars_processed: self.bars_processed,
                portfolio: self.portfolio,
                skips: self.skips,
                snapshot,
            },
            signals: self.signals,
            open_lot: self.lot,
            unfilled: self.pending,
        })
    }
}
