//! Bar data access port.

use crate::domain::error::LadderError;
use crate::domain::ohlcv::Bar;
use chrono::NaiveDate;

pub trait DataPort {
    /// Bars for `ticker` in ascending timestamp order. `None` leaves that
    /// side of the date range open; both bounds are inclusive.
    fn fetch_bars(
        &self,
        ticker: &str,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> Result<Vec<Bar>, LadderError>;

    fn list_tickers(&self) -> Result<Vec<String>, LadderError>;
}
