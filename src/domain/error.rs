//! Domain error types.

use chrono::NaiveDateTime;

/// A malformed or inconsistent bar. Any of these halts a run before the
/// offending bar touches cash or position state.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DataError {
    #[error("bar at {timestamp}: high {high} is below low {low}")]
    HighBelowLow {
        timestamp: NaiveDateTime,
        high: f64,
        low: f64,
    },

    #[error("bar at {timestamp}: {field} is not a finite positive price ({value})")]
    InvalidPrice {
        timestamp: NaiveDateTime,
        field: &'static str,
        value: f64,
    },

    #[error("bar at {timestamp}: {field} {value} is outside the range [{low}, {high}]")]
    BodyOutsideRange {
        timestamp: NaiveDateTime,
        field: &'static str,
        value: f64,
        low: f64,
        high: f64,
    },

    #[error("bar at {timestamp}: negative volume {volume}")]
    NegativeVolume {
        timestamp: NaiveDateTime,
        volume: i64,
    },

    #[error("bar at {timestamp} is earlier than the previous bar at {previous}")]
    OutOfOrder {
        previous: NaiveDateTime,
        timestamp: NaiveDateTime,
    },

    #[error("record {line}: missing {field} column")]
    MissingField { line: usize, field: &'static str },

    #[error("record {line}: invalid {field} value {value:?}")]
    InvalidField {
        line: usize,
        field: &'static str,
        value: String,
    },
}

/// Top-level error type for laddertrader.
#[derive(Debug, thiserror::Error)]
pub enum LadderError {
    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config section [{section}]")]
    ConfigSectionMissing { section: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error(transparent)]
    Data(#[from] DataError),

    #[error("data source error: {reason}")]
    DataSource { reason: String },

    #[error("no bars for {ticker}")]
    NoData { ticker: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl LadderError {
    pub(crate) fn invalid(section: &str, key: &str, reason: impl Into<String>) -> Self {
        LadderError::ConfigInvalid {
            section: section.to_string(),
            key: key.to_string(),
            reason: reason.into(),
        }
    }

    pub fn is_config(&self) -> bool {
        matches!(
            self,
            LadderError::ConfigParse { .. }
                | LadderError::ConfigSectionMissing { .. }
                | LadderError::ConfigInvalid { .. }
        )
    }
}
