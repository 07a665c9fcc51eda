//! Fill pricing and share sizing.
//!
//! Whole shares only. Sizing always truncates, and re-checks the truncated
//! quantity against the cash it came from so float error can never overdraw.

/// Flat-rate costs applied to market fills.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExecutionConfig {
    /// Fraction of notional, 0.01 = 1%.
    pub commission_rate: f64,
    /// Percent, 0.01 = 0.01%.
    pub slippage_pct: f64,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        ExecutionConfig {
            commission_rate: 0.01,
            slippage_pct: 0.01,
        }
    }
}

/// Commission: notional * rate.
pub fn calculate_commission(notional: f64, config: &ExecutionConfig) -> f64 {
    notional * config.commission_rate
}

/// Apply slippage to a price for a long entry.
/// Long entry (buy): execution_price = market_price * (1 + slippage_pct / 100)
pub fn apply_slippage_long_entry(market_price: f64, slippage_pct: f64) -> f64 {
    market_price * (1.0 + slippage_pct / 100.0)
}

/// Apply slippage to a price for a long exit (sell).
/// Long exit (sell): execution_price = market_price * (1 - slippage_pct / 100)
pub fn apply_slippage_long_exit(market_price: f64, slippage_pct: f64) -> f64 {
    market_price * (1.0 - slippage_pct / 100.0)
}

/// floor(amount / price), never costing more than `amount`.
pub fn shares_for_amount(amount: f64, price: f64) -> i64 {
    if !price.is_finite() || price <= 0.0 || amount <= 0.0 {
        return 0;
    }
    let mut shares = (amount / price).floor() as i64;
    while shares > 0 && shares as f64 * price > amount {
        shares -= 1;
    }
    shares
}

/// Largest whole-share buy whose cost plus commission fits in `cash`.
pub fn all_in_shares(cash: f64, price: f64, config: &ExecutionConfig) -> i64 {
    if !price.is_finite() || price <= 0.0 || cash <= 0.0 {
        return 0;
    }
    let mut shares = (cash / (price * (1.0 + config.commission_rate))).floor() as i64;
    while shares > 0 {
        let notional = shares as f64 * price;
        if notional + calculate_commission(notional, config) <= cash {
            break;
        }
        shares -= 1;
    }
    shares
}
