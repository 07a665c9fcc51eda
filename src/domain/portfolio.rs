//! Cash, shares and the trade ledger for one run.
//!
//! The portfolio records what it is told. Keeping cash non-negative is the
//! engines' job, through their buy preconditions.

use chrono::{NaiveDate, NaiveDateTime};

use super::trade::{ClosedTrade, Side, TradeRecord};

#[derive(Debug, Clone, PartialEq)]
pub struct EquityPoint {
    pub date: NaiveDate,
    pub equity: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Portfolio {
    pub cash: f64,
    pub initial_capital: f64,
    pub shares: i64,
    pub ledger: Vec<TradeRecord>,
    pub closed_trades: Vec<ClosedTrade>,
    pub equity_curve: Vec<EquityPoint>,
}

impl Portfolio {
    pub fn new(initial_capital: f64) -> Self {
        Portfolio {
            cash: initial_capital,
            initial_capital,
            shares: 0,
            ledger: Vec::new(),
            closed_trades: Vec::new(),
            equity_curve: Vec::new(),
        }
    }

    /// cash + shares * price
    pub fn current_value(&self, price: f64) -> f64 {
        self.cash + self.shares as f64 * price
    }

    fn apply(&mut self, record: TradeRecord) {
        self.cash += record.cash_delta();
        self.shares += record.share_delta();
        self.ledger.push(record);
    }

    pub fn record_buy(
        &mut self,
        timestamp: NaiveDateTime,
        shares: i64,
        price: f64,
        commission: f64,
    ) {
        self.apply(TradeRecord::new(
            timestamp,
            Side::Buy,
            shares,
            price,
            commission,
        ))
    }

    pub fn record_sell(
        &mut self,
        timestamp: NaiveDateTime,
        shares: i64,
        price: f64,
        commission: f64,
    ) {
        self.apply(TradeRecord::new(
            timestamp,
            Side::Sell,
            shares,
            price,
            commission,
        ))
    }

    pub fn record_trade(&mut self, trade: ClosedTrade) {
        self.closed_trades.push(trade);
    }

    pub fn record_equity(&mut self, date: NaiveDate, equity: f64) {
        self.equity_curve.push(EquityPoint { date, equity });
    }

    pub fn realized_pnl(&self) -> f64 {
        self.closed_trades.iter().map(|t| t.pnl).sum()
    }

    pub fn count(&self, side: Side) -> usize {
        self.ledger.iter().filter(|r| r.side == side).count()
    }

    pub fn shares_traded(&self, side: Side) -> i64 {
        self.ledger
            .iter()
            .filter(|r| r.side == side)
            .map(|r| r.shares)
            .sum()
    }
}
