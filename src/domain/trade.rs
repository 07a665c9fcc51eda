//! Trade ledger records and closed lots.

use chrono::NaiveDateTime;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Buy,
    Sell,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Buy => write!(f, "BUY"),
            Side::Sell => write!(f, "SELL"),
        }
    }
}

/// One executed fill. `amount` is `shares * price`; commission is kept
/// separately so the ledger still reconciles against the fill price.
#[derive(Debug, Clone, PartialEq)]
pub struct TradeRecord {
    pub timestamp: NaiveDateTime,
    pub side: Side,
    pub shares: i64,
    pub price: f64,
    pub amount: f64,
    pub commission: f64,
}

impl TradeRecord {
    pub fn new(
        timestamp: NaiveDateTime,
        side: Side,
        shares: i64,
        price: f64,
        commission: f64,
    ) -> Self {
        TradeRecord {
            timestamp,
            side,
            shares,
            price,
            amount: shares as f64 * price,
            commission,
        }
    }

    /// Signed effect on cash.
    pub fn cash_delta(&self) -> f64 {
        match self.side {
            Side::Buy => -(self.amount + self.commission),
            Side::Sell => self.amount - self.commission,
        }
    }

    /// Signed effect on the share count.
    pub fn share_delta(&self) -> i64 {
        match self.side {
            Side::Buy => self.shares,
            Side::Sell => -self.shares,
        }
    }
}

/// A lot that was bought and later sold in full.
#[derive(Debug, Clone, PartialEq)]
pub struct ClosedTrade {
    pub entry_time: NaiveDateTime,
    pub exit_time: NaiveDateTime,
    pub shares: i64,
    pub entry_price: f64,
    pub exit_price: f64,
    /// Net of commissions on both legs.
    pub pnl: f64,
}

impl ClosedTrade {
    pub fn is_win(&self) -> bool {
        self.pnl > 0.0
    }

    pub fn return_pct(&self) -> f64 {
        let cost = self.shares as f64 * self.entry_price;
        if cost == 0.0 {
            0.0
        } else {
            self.pnl / cost * 100.0
        }
    }

    pub fn holding_period(&self) -> chrono::Duration {
        self.exit_time - self.entry_time
    }
}
