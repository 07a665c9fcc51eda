//! Typed, validated run configuration.
//!
//! `DcaConfig` and `TrendConfig` are built once, before any bar is seen.
//! Construction from a [`ConfigPort`] applies defaults for absent keys and
//! rejects values that are present but malformed; `validate` then checks
//! the cross-field and range rules.

use chrono::{NaiveDate, NaiveTime};
use std::fmt;
use std::str::FromStr;

use super::error::LadderError;
use super::execution::ExecutionConfig;
use super::indicator::pulse::PulseParams;
use super::market_filter::DEFAULT_FILTER_PERIOD;
use crate::ports::config_port::ConfigPort;

pub const DCA_SECTION: &str = "dca";
pub const TREND_SECTION: &str = "trend";

const MINUTES_PER_DAY: u32 = 24 * 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BarInterval {
    FiveMinute,
    Hourly,
    Daily,
}

impl FromStr for BarInterval {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "5m" | "5min" => Ok(BarInterval::FiveMinute),
            "1h" | "60m" | "hourly" => Ok(BarInterval::Hourly),
            "1d" | "daily" => Ok(BarInterval::Daily),
            other => Err(format!("unknown interval {:?}, expected 5m, 1h or 1d", other)),
        }
    }
}

impl fmt::Display for BarInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BarInterval::FiveMinute => write!(f, "5m"),
            BarInterval::Hourly => write!(f, "1h"),
            BarInterval::Daily => write!(f, "1d"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DcaConfig {
    pub initial_capital: f64,
    pub daily_investment: f64,
    pub buy_time: NaiveTime,
    /// 0 = the trigger bar must be stamped exactly at `buy_time`.
    pub buy_window_minutes: u32,
    pub price_increment: f64,
    pub interval: BarInterval,
    pub use_filter: bool,
    pub filter_period: usize,
    pub risk_free_rate: f64,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

impl Default for DcaConfig {
    fn default() -> Self {
        DcaConfig {
            initial_capital: 20_000.0,
            daily_investment: 2_000.0,
            buy_time: NaiveTime::from_hms_opt(10, 0, 0).unwrap_or(NaiveTime::MIN),
            buy_window_minutes: 0,
            price_increment: 1.0,
            interval: BarInterval::FiveMinute,
            use_filter: true,
            filter_period: DEFAULT_FILTER_PERIOD,
            risk_free_rate: 0.0,
            start_date: None,
            end_date: None,
        }
    }
}

impl DcaConfig {
    pub fn validate(&self) -> Result<(), LadderError> {
        positive(DCA_SECTION, "initial_capital", self.initial_capital)?;
        positive(DCA_SECTION, "daily_investment", self.daily_investment)?;
        positive(DCA_SECTION, "price_increment", self.price_increment)?;
        if self.buy_window_minutes >= MINUTES_PER_DAY {
            return Err(LadderError::invalid(
                DCA_SECTION,
                "buy_window_minutes",
                "buy_window_minutes must be shorter than a day",
            ));
        }
        if self.use_filter && self.filter_period == 0 {
            return Err(LadderError::invalid(
                DCA_SECTION,
                "filter_period",
                "filter_period must be at least 1",
            ));
        }
        risk_free(DCA_SECTION, self.risk_free_rate)?;
        date_order(DCA_SECTION, self.start_date, self.end_date)
    }

    pub fn with_buy_time(&self, buy_time: NaiveTime) -> Self {
        DcaConfig {
            buy_time,
            ..self.clone()
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrendConfig {
    pub initial_capital: f64,
    pub pulse: PulseParams,
    pub execution: ExecutionConfig,
    /// Entry needs at least this many consecutive rising-DI+ bars.
    pub min_count_threshold: u32,
    /// Exit needs the position held for at least this many bars.
    pub min_holding_bars: usize,
    pub risk_free_rate: f64,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

impl Default for TrendConfig {
    fn default() -> Self {
        TrendConfig {
            initial_capital: 10_000.0,
            pulse: PulseParams::default(),
            execution: ExecutionConfig::default(),
            min_count_threshold: 2,
            min_holding_bars: 2,
            risk_free_rate: 0.0,
            start_date: None,
            end_date: None,
        }
    }
}

impl TrendConfig {
    pub fn validate(&self) -> Result<(), LadderError> {
        positive(TREND_SECTION, "initial_capital", self.initial_capital)?;
        self.pulse.validate()?;
        let rate = self.execution.commission_rate;
        if !(0.0..1.0).contains(&rate) {
            return Err(LadderError::invalid(
                TREND_SECTION,
                "commission_rate",
                "commission_rate must be in [0, 1)",
            ));
        }
        let slippage = self.execution.slippage_pct;
        if !(0.0..100.0).contains(&slippage) {
            return Err(LadderError::invalid(
                TREND_SECTION,
                "slippage_pct",
                "slippage_pct must be in [0, 100)",
            ));
        }
        risk_free(TREND_SECTION, self.risk_free_rate)?;
        date_order(TREND_SECTION, self.start_date, self.end_date)
    }
}

fn positive(section: &str, key: &str, value: f64) -> Result<(), LadderError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(LadderError::invalid(
            section,
            key,
            format!("{} must be positive", key),
        ))
    }
}

fn risk_free(section: &str, value: f64) -> Result<(), LadderError> {
    if (0.0..1.0).contains(&value) {
        Ok(())
    } else {
        Err(LadderError::invalid(
            section,
            "risk_free_rate",
            "risk_free_rate must be between 0 and 1",
        ))
    }
}

fn date_order(
    section: &str,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
) -> Result<(), LadderError> {
    match (start, end) {
        (Some(s), Some(e)) if s > e => Err(LadderError::invalid(
            section,
            "start_date",
            "start_date must not be after end_date",
        )),
        _ => Ok(()),
    }
}

fn read<T>(port: &dyn ConfigPort, section: &str, key: &str, default: T) -> Result<T, LadderError>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    match port.get_string(section, key) {
        None => Ok(default),
        Some(raw) => raw
            .parse()
            .map_err(|e| LadderError::invalid(section, key, format!("{:?}: {}", raw, e))),
    }
}

fn read_bool(
    port: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: bool,
) -> Result<bool, LadderError> {
    match port.get_string(section, key) {
        None => Ok(default),
        Some(raw) => match raw.to_lowercase().as_str() {
            "true" | "yes" | "1" | "on" => Ok(true),
            "false" | "no" | "0" | "off" => Ok(false),
            _ => Err(LadderError::invalid(
                section,
                key,
                format!("{:?} is not a boolean", raw),
            )),
        },
    }
}

fn read_time(
    port: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: NaiveTime,
) -> Result<NaiveTime, LadderError> {
    match port.get_string(section, key) {
        None => Ok(default),
        Some(raw) => NaiveTime::parse_from_str(&raw, "%H:%M")
            .or_else(|_| NaiveTime::parse_from_str(&raw, "%H:%M:%S"))
            .map_err(|_| {
                LadderError::invalid(section, key, format!("{:?}: expected HH:MM", raw))
            }),
    }
}

fn read_date(
    port: &dyn ConfigPort,
    section: &str,
    key: &str,
) -> Result<Option<NaiveDate>, LadderError> {
    port.get_string(section, key)
        .map(|raw| {
            NaiveDate::parse_from_str(&raw, "%Y-%m-%d").map_err(|_| {
                LadderError::invalid(
                    section,
                    key,
                    format!("invalid {} format, expected YYYY-MM-DD", key),
                )
            })
        })
        .transpose()
}

fn require_section(port: &dyn ConfigPort, section: &str) -> Result<(), LadderError> {
    if port.has_section(section) {
        Ok(())
    } else {
        Err(LadderError::ConfigSectionMissing {
            section: section.to_string(),
        })
    }
}

/// Reads and validates the `[dca]` section.
pub fn dca_config_from_port(port: &dyn ConfigPort) -> Result<DcaConfig, LadderError> {
    require_section(port, DCA_SECTION)?;
    let d = DcaConfig::default();
    let s = DCA_SECTION;
    let config = DcaConfig {
        initial_capital: read(port, s, "initial_capital", d.initial_capital)?,
        daily_investment: read(port, s, "daily_investment", d.daily_investment)?,
        buy_time: read_time(port, s, "buy_time", d.buy_time)?,
        buy_window_minutes: read(port, s, "buy_window_minutes", d.buy_window_minutes)?,
        price_increment: read(port, s, "price_increment", d.price_increment)?,
        interval: read(port, s, "interval", d.interval)?,
        use_filter: read_bool(port, s, "use_filter", d.use_filter)?,
        filter_period: read(port, s, "filter_period", d.filter_period)?,
        risk_free_rate: read(port, s, "risk_free_rate", d.risk_free_rate)?,
        start_date: read_date(port, s, "start_date")?,
        end_date: read_date(port, s, "end_date")?,
    };
    config.validate()?;
    Ok(config)
}

/// Reads and validates the `[trend]` section.
pub fn trend_config_from_port(port: &dyn ConfigPort) -> Result<TrendConfig, LadderError> {
    require_section(port, TREND_SECTION)?;
    let d = TrendConfig::default();
    let s = TREND_SECTION;
    let config = TrendConfig {
        initial_capital: read(port, s, "initial_capital", d.initial_capital)?,
        pulse: PulseParams {
            adx_length: read(port, s, "adx_length", d.pulse.adx_length)?,
            smoothing_factor: read(port, s, "smoothing_factor", d.pulse.smoothing_factor)?,
        },
        execution: ExecutionConfig {
            commission_rate: read(port, s, "commission_rate", d.execution.commission_rate)?,
            slippage_pct: read(port, s, "slippage_pct", d.execution.slippage_pct)?,
        },
        min_count_threshold: read(port, s, "min_count_threshold", d.min_count_threshold)?,
        min_holding_bars: read(port, s, "min_holding_bars", d.min_holding_bars)?,
        risk_free_rate: read(port, s, "risk_free_rate", d.risk_free_rate)?,
        start_date: read_date(port, s, "start_date")?,
        end_date: read_date(port, s, "end_date")?,
    };
    config.validate()?;
    Ok(config)
}
