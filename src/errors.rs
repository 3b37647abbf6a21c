// =============================================================================
// Error taxonomy
// =============================================================================
//
// Three scopes:
//   - RequestError : the whole request is malformed (HTTP 400).
//   - TickerError  : one ticker failed; the rest of the request continues.
//   - FetchError   : what the market-data client reports to the pipeline.
//
// Degenerate arithmetic inside the indicator engine is never an error; it is
// folded into missing values by the indicators themselves.
// =============================================================================

use chrono::NaiveDate;
use serde::Serialize;
use thiserror::Error;

/// Request-level validation failures. Nothing is fetched when one of these
/// is returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RequestError {
    #[error("no ticker symbols supplied")]
    NoTickers,

    #[error("too many tickers: {count} supplied, at most {max} allowed")]
    TooManyTickers { count: usize, max: usize },

    #[error("start date {start} must be before end date {end}")]
    InvalidDateRange { start: NaiveDate, end: NaiveDate },

    #[error("{indicator} period must be a positive integer, got {value}")]
    InvalidPeriod { indicator: &'static str, value: usize },

    #[error("{indicator} period {value} is outside the allowed range {min}..={max}")]
    PeriodOutOfRange {
        indicator: &'static str,
        value: usize,
        min: usize,
        max: usize,
    },

    #[error("unknown indicator: {0}")]
    UnknownIndicator(String),
}

/// Per-ticker failures. Reported next to the ticker, never fatal.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind", content = "ticker")]
pub enum TickerError {
    #[error("'{0}' is not a valid ticker symbol")]
    InvalidTicker(String),

    #[error("failed to fetch data for '{0}'. Please make sure the ticker symbol is correct.")]
    FetchFailure(String),

    #[error("no price data for '{0}' in the selected date range")]
    NoData(String),
}

/// Non-fatal conditions surfaced next to the data.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind")]
pub enum TickerWarning {
    #[error("end date {end_date} reaches the current session; the latest bar may be incomplete or stale")]
    IncompleteRecentData { end_date: NaiveDate },
}

/// Errors raised by a [`PriceSource`](crate::market_data::PriceSource).
#[derive(Debug, Error)]
pub enum FetchError {
    /// Transport-level failure (DNS, TLS, timeout, connection reset).
    #[error("market data request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The provider answered but reported an error.
    #[error("market data provider returned {status}: {message}")]
    Api { status: u16, message: String },

    /// The body could not be interpreted as a price series.
    #[error("malformed market data response: {0}")]
    Decode(String),

    /// The configured base URL cannot carry a chart path.
    #[error("invalid market data base URL '{0}'")]
    InvalidUrl(String),
}
