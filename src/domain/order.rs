//! Limit-sell orders and the ten-rung ladder they are placed in.

use chrono::NaiveDateTime;
use std::fmt;

use super::ohlcv::Bar;

/// Orders created per successful buy.
pub const LADDER_RUNGS: usize = 10;

/// Smallest buy that can be split across the ladder (one share per rung).
pub const MIN_SHARES: i64 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct OrderId(pub u64);

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OrderStatus {
    Active,
    Filled { at: NaiveDateTime },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Order {
    pub id: OrderId,
    pub shares: i64,
    pub target_price: f64,
    /// Price of the buy that created this rung.
    pub buy_price: f64,
    pub created_at: NaiveDateTime,
    pub status: OrderStatus,
}

impl Order {
    pub fn is_active(&self) -> bool {
        self.status == OrderStatus::Active
    }

    /// A rung fills when the bar trades at or through its target.
    pub fn fills_on(&self, bar: &Bar) -> bool {
        self.is_active() && self.target_price <= bar.high
    }

    pub fn notional(&self) -> f64 {
        self.shares as f64 * self.target_price
    }

    pub fn profit(&self) -> f64 {
        self.shares as f64 * (self.target_price - self.buy_price)
    }
}

/// Splits `total` shares into ten rungs. The `total % 10` trailing rungs
/// (highest targets) carry one extra share. Always sums to `total`.
pub fn ladder_sizes(total: i64) -> [i64; LADDER_RUNGS] {
    let rungs = LADDER_RUNGS as i64;
    let base = total / rungs;
    let remainder = (total % rungs) as usize;
    let mut sizes = [base; LADDER_RUNGS];
    for size in sizes.iter_mut().skip(LADDER_RUNGS - remainder) {
        *size += 1;
    }
    sizes
}

/// Rung k (1-based) targets `buy_price + k * increment`.
pub fn ladder_targets(buy_price: f64, increment: f64) -> [f64; LADDER_RUNGS] {
    std::array::from_fn(|i| buy_price + (i + 1) as f64 * increment)
}
