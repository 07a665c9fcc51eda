//! End-of-run performance summary.

use super::engine::{RunOutcome, SkipReason};
use super::order::Order;
use super::portfolio::EquityPoint;
use super::trade::{ClosedTrade, Side};
use chrono::Datelike;
use std::fmt;

const TRADING_DAYS_PER_YEAR: f64 = 252.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SkipCounts {
    pub insufficient_cash: usize,
    pub filter_bearish: usize,
    pub min_shares: usize,
}

impl SkipCounts {
    pub fn total(&self) -> usize {
        self.insufficient_cash + self.filter_bearish + self.min_shares
    }
}

/// One calendar month of the equity curve.
///
/// `start_value` is the previous month's closing equity (initial capital for
/// the first month); `end_value` is the last equity point inside the month.
#[derive(Debug, Clone, PartialEq)]
pub struct MonthlyPerformance {
    pub year: i32,
    pub month: u32,
    pub start_value: f64,
    pub end_value: f64,
}

impl MonthlyPerformance {
    pub fn profit(&self) -> f64 {
        self.end_value - self.start_value
    }

    pub fn return_pct(&self) -> f64 {
        if self.start_value > 0.0 {
            self.profit() / self.start_value * 100.0
        } else {
            0.0
        }
    }
}

impl fmt::Display for MonthlyPerformance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PendingSummary {
    pub count: usize,
    pub shares: i64,
    pub average_target: f64,
}

impl PendingSummary {
    pub fn from_orders(orders: &[Order]) -> Self {
        if orders.is_empty() {
            return Self::default();
        }
        let total_target: f64 = orders.iter().map(|o| o.target_price).sum();
        Self {
            count: orders.len(),
            shares: orders.iter().map(|o| o.shares).sum(),
            average_target: total_target / orders.len() as f64,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Metrics {
    pub initial_capital: f64,
    pub final_value: f64,
    pub total_return: f64,
    pub total_return_pct: f64,
    pub annualized_return: f64,
    /// Initial capital spent on the first close, fractional shares allowed.
    pub buy_and_hold_value: f64,
    pub buy_and_hold_return_pct: f64,
    pub max_drawdown: f64,
    /// Equity points spent below the running peak, longest stretch.
    pub max_drawdown_duration: usize,
    pub sharpe_ratio: f64,
    pub sortino_ratio: f64,
    pub buys: usize,
    pub sells: usize,
    pub skips: SkipCounts,
    pub trades_won: usize,
    /// Includes break-even trades.
    pub trades_lost: usize,
    /// trades_won / closed trades, so won + lost always covers every trade.
    pub win_rate: f64,
    pub average_profit: f64,
    pub total_realized: f64,
    pub monthly: Vec<MonthlyPerformance>,
    pub pending: PendingSummary,
}

impl Metrics {
    pub fn compute(outcome: &RunOutcome, risk_free_rate: f64) -> Self {
        let portfolio = &outcome.portfolio;
        let initial_capital = portfolio.initial_capital;
        let final_value = outcome.final_value();

        let total_return = final_value - initial_capital;
        let total_return_pct = percent_of(total_return, initial_capital);

        let years = portfolio.equity_curve.len() as f64 / TRADING_DAYS_PER_YEAR;
        let growth = if initial_capital > 0.0 {
            final_value / initial_capital
        } else {
            0.0
        };
        let annualized_return = if years > 0.0 && growth > 0.0 {
            growth.powf(1.0 / years) - 1.0
        } else {
            0.0
        };

        let buy_and_hold_value = match (outcome.first_close, outcome.last_close) {
            (Some(first), Some(last)) if first > 0.0 => initial_capital / first * last,
            _ => initial_capital,
        };
        let buy_and_hold_return_pct =
            percent_of(buy_and_hold_value - initial_capital, initial_capital);

        let (max_drawdown, max_drawdown_duration) = compute_drawdown(&portfolio.equity_curve);
        let daily_rf = risk_free_rate / TRADING_DAYS_PER_YEAR;
        let (sharpe_ratio, sortino_ratio) =
            compute_risk_adjusted(&portfolio.equity_curve, daily_rf);

        let skips = SkipCounts {
            insufficient_cash: outcome.skip_count(SkipReason::InsufficientCash),
            filter_bearish: outcome.skip_count(SkipReason::FilterBearish),
            min_shares: outcome.skip_count(SkipReason::MinShares),
        };

        let (trades_won, trades_lost, total_realized) = tally(&portfolio.closed_trades);
        let closed = portfolio.closed_trades.len();
        let (win_rate, average_profit) = if closed > 0 {
            (
                trades_won as f64 / closed as f64,
                total_realized / closed as f64,
            )
        } else {
            (0.0, 0.0)
        };

        Metrics {
            initial_capital,
            final_value,
            total_return,
            total_return_pct,
            annualized_return,
            buy_and_hold_value,
            buy_and_hold_return_pct,
            max_drawdown,
            max_drawdown_duration,
            sharpe_ratio,
            sortino_ratio,
            buys: portfolio.count(Side::Buy),
            sells: portfolio.count(Side::Sell),
            skips,
            trades_won,
            trades_lost,
            win_rate,
            average_profit,
            total_realized,
            monthly: monthly_performance(&portfolio.equity_curve, initial_capital),
            pending: PendingSummary::from_orders(&outcome.snapshot.pending_orders),
        }
    }

    /// Strategy return minus buy-and-hold return, in percentage points.
    pub fn excess_return_pct(&self) -> f64 {
        self.total_return_pct - self.buy_and_hold_return_pct
    }
}

fn percent_of(amount: f64, base: f64) -> f64 {
    if base > 0.0 { amount / base * 100.0 } else { 0.0 }
}

/// Break-even trades count as lost.
fn tally(trades: &[ClosedTrade]) -> (usize, usize, f64) {
    trades.iter().fold((0, 0, 0.0), |(won, lost, total), t| {
        if t.is_win() {
            (won + 1, lost, total + t.pnl)
        } else {
            (won, lost + 1, total + t.pnl)
        }
    })
}

pub fn monthly_performance(
    equity_curve: &[EquityPoint],
    initial_capital: f64,
) -> Vec<MonthlyPerformance> {
    let mut months: Vec<MonthlyPerformance> = Vec::new();
    let mut start_value = initial_capital;
    for point in equity_curve {
        let (year, month) = (point.date.year(), point.date.month());
        if let Some(current) = months.last_mut() {
            if current.year == year && current.month == month {
                current.end_value = point.equity;
                continue;
            }
            start_value = current.end_value;
        }
        months.push(MonthlyPerformance {
            year,
            month,
            start_value,
            end_value: point.equity,
        });
    }
    months
}

fn compute_drawdown(equity_curve: &[EquityPoint]) -> (f64, usize) {
    let Some(first) = equity_curve.first() else {
        return (0.0, 0);
    };

    let mut peak = first.equity;
    let mut max_dd = 0.0_f64;
    let mut underwater = 0usize;
    let mut longest = 0usize;

    for point in equity_curve {
        if point.equity >= peak {
            peak = point.equity;
            underwater = 0;
        } else if peak > 0.0 {
            max_dd = max_dd.max((peak - point.equity) / peak);
            underwater += 1;
            longest = longest.max(underwater);
        }
    }

    (max_dd, longest)
}

fn compute_risk_adjusted(equity_curve: &[EquityPoint], daily_rf: f64) -> (f64, f64) {
    let returns: Vec<f64> = equity_curve
        .windows(2)
        .map(|w| {
            let prev = w[0].equity;
            if prev > 0.0 {
                (w[1].equity - prev) / prev
            } else {
                0.0
            }
        })
        .collect();

    if returns.is_empty() {
        return (0.0, 0.0);
    }

    let n = returns.len() as f64;
    let mean = returns.iter().sum::<f64>() / n;
    let stddev = (returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / n).sqrt();
    let excess = mean - daily_rf;

    let downside = (returns
        .iter()
        .filter(|&&r| r < daily_rf)
        .map(|&r| (r - daily_rf).powi(2))
        .sum::<f64>()
        / n)
        .sqrt();

    let annualize = |deviation: f64| {
        if deviation > 0.0 {
            excess / deviation * TRADING_DAYS_PER_YEAR.sqrt()
        } else {
            0.0
        }
    };

    (annualize(stddev), annualize(downside))
}
