// =============================================================================
// Analysis Pipeline: one user action, many tickers
// =============================================================================
//
// For every ticker in the request:
//   1. probe the ticker (advisory; `false` => InvalidTicker),
//   2. fetch the daily series for [start, end),
//   3. run the indicator engine on the closes,
//   4. merge bars + derived columns into a table.
//
// Failures are scoped to their ticker; the report always carries one entry
// per requested ticker, in input order. An end date at or after today adds
// an IncompleteRecentData warning next to whatever the ticker produced.
// =============================================================================

use chrono::NaiveDate;
use futures_util::future::join_all;
use serde::Serialize;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::errors::{RequestError, TickerError, TickerWarning};
use crate::indicators;
use crate::market_data::PriceSource;
use crate::table::IndicatorTable;
use crate::types::IndicatorRequest;

// =============================================================================
// Request
// =============================================================================

/// A validated, immutable analysis request.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisRequest {
    pub tickers: Vec<String>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub indicators: IndicatorRequest,
}

impl AnalysisRequest {
    /// Validate the raw inputs.
    ///
    /// `raw_tickers` is the comma-separated list as typed by the user.
    pub fn new(
        raw_tickers: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
        indicators: IndicatorRequest,
        max_tickers: usize,
    ) -> Result<Self, RequestError> {
        let tickers = parse_tickers(raw_tickers);
        if tickers.is_empty() {
            return Err(RequestError::NoTickers);
        }
        if tickers.len() > max_tickers {
            return Err(RequestError::TooManyTickers {
                count: tickers.len(),
                max: max_tickers,
            });
        }
        if start_date >= end_date {
            return Err(RequestError::InvalidDateRange {
                start: start_date,
                end: end_date,
            });
        }
        Ok(Self {
            tickers,
            start_date,
            end_date,
            indicators,
        })
    }
}

/// Split a comma-separated ticker list: entries are trimmed, empty entries
/// dropped and repeats removed (first occurrence wins). Case is kept as typed.
pub fn parse_tickers(raw: &str) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for t in raw.split(',').map(str::trim).filter(|t| !t.is_empty()) {
        if !out.iter().any(|seen| seen == t) {
            out.push(t.to_string());
        }
    }
    out
}

// =============================================================================
// Report
// =============================================================================

/// An error or warning together with its user-facing message.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Notice<T> {
    #[serde(flatten)]
    pub detail: T,
    pub message: String,
}

impl<T: std::fmt::Display> From<T> for Notice<T> {
    fn from(detail: T) -> Self {
        let message = detail.to_string();
        Self { detail, message }
    }
}

/// What one ticker produced: a table, or an error. Warnings may accompany
/// either.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TickerReport {
    pub ticker: String,
    pub table: Option<IndicatorTable>,
    pub error: Option<Notice<TickerError>>,
    pub warnings: Vec<Notice<TickerWarning>>,
}

impl TickerReport {
    fn table(ticker: &str, table: IndicatorTable, warnings: Vec<Notice<TickerWarning>>) -> Self {
        Self {
            ticker: ticker.to_string(),
            table: Some(table),
            error: None,
            warnings,
        }
    }

    fn failed(ticker: &str, error: TickerError, warnings: Vec<Notice<TickerWarning>>) -> Self {
        Self {
            ticker: ticker.to_string(),
            table: None,
            error: Some(error.into()),
            warnings,
        }
    }

    pub fn is_ok(&self) -> bool {
        self.table.is_some()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub request_id: Uuid,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    /// Indicator column names, in the order they appear in every table.
    pub indicators: Vec<&'static str>,
    pub tickers: Vec<TickerReport>,
    pub succeeded: usize,
    pub failed: usize,
}

// =============================================================================
// Execution
// =============================================================================

/// Run `request` against `source`. `today` decides whether the range reaches
/// the current (possibly incomplete) session.
///
/// Tickers are processed concurrently; the report keeps input order.
pub async fn analyze(
    source: &dyn PriceSource,
    request: &AnalysisRequest,
    today: NaiveDate,
) -> AnalysisReport {
    let request_id = Uuid::new_v4();
    info!(
        %request_id,
        tickers = ?request.tickers,
        start = %request.start_date,
        end = %request.end_date,
        indicators = request.indicators.kinds().len(),
        "analysis started"
    );

    let tickers = join_all(
        request
            .tickers
            .iter()
            .map(|t| analyze_ticker(source, t, request, today)),
    )
    .await;

    let succeeded = tickers.iter().filter(|t| t.is_ok()).count();
    let failed = tickers.len() - succeeded;

    info!(%request_id, succeeded, failed, "analysis finished");

    AnalysisReport {
        request_id,
        start_date: request.start_date,
        end_date: request.end_date,
        indicators: request
            .indicators
            .kinds()
            .iter()
            .map(|k| k.column_name())
            .collect(),
        tickers,
        succeeded,
        failed,
    }
}

#[instrument(skip(source, request, today), name = "pipeline::analyze_ticker")]
async fn analyze_ticker(
    source: &dyn PriceSource,
    ticker: &str,
    request: &AnalysisRequest,
    today: NaiveDate,
) -> TickerReport {
    if !source.is_valid_ticker(ticker).await {
        warn!(ticker, "ticker probe returned no data");
        return TickerReport::failed(ticker, TickerError::InvalidTicker(ticker.to_string()), vec![]);
    }

    let mut warnings: Vec<Notice<TickerWarning>> = Vec::new();
    if request.end_date >= today {
        warnings.push(
            TickerWarning::IncompleteRecentData {
                end_date: request.end_date,
            }
            .into(),
        );
    }

    let series = match source
        .fetch_price_series(ticker, request.start_date, request.end_date)
        .await
    {
        Ok(series) => series,
        Err(e) => {
            warn!(ticker, error = %e, "price fetch failed");
            return TickerReport::failed(ticker, TickerError::FetchFailure(ticker.to_string()), warnings);
        }
    };

    if series.is_empty() {
        return TickerReport::failed(ticker, TickerError::NoData(ticker.to_string()), warnings);
    }

    let columns = indicators::compute(&series.closes(), &request.indicators);
    let table = IndicatorTable::build(&series, &columns);
    TickerReport::table(ticker, table, warnings)
}

// =============================================================================
// Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use std::collections::{HashMap, HashSet};

    use async_trait::async_trait;
    use chrono::Duration;

    use super::*;
    use crate::errors::FetchError;
    use crate::table::Cell;
    use crate::types::{Bar, IndicatorKind, PriceSeries};

    #[derive(Default)]
    struct StubSource {
        series: HashMap<String, Vec<f64>>,
        broken: HashSet<String>,
    }

    impl StubSource {
        fn with(mut self, ticker: &str, closes: &[f64]) -> Self {
            self.series.insert(ticker.to_string(), closes.to_vec());
            self
        }

        fn broken(mut self, ticker: &str) -> Self {
            self.series.insert(ticker.to_string(), vec![1.0]);
            self.broken.insert(ticker.to_string());
            self
        }
    }

    #[async_trait]
    impl PriceSource for StubSource {
        async fn is_valid_ticker(&self, symbol: &str) -> bool {
            self.series.contains_key(symbol)
        }

        async fn fetch_price_series(
            &self,
            symbol: &str,
            start: NaiveDate,
            _end: NaiveDate,
        ) -> Result<PriceSeries, FetchError> {
            if self.broken.contains(symbol) {
                return Err(FetchError::Api {
                    status: 500,
                    message: "boom".into(),
                });
            }
            let closes = self.series.get(symbol).cloned().unwrap_or_default();
            let bars = closes
                .iter()
                .enumerate()
                .map(|(i, &c)| Bar {
                    date: start + Duration::days(i as i64),
                    open: c,
                    high: c,
                    low: c,
                    close: c,
                    adj_close: None,
                    volume: 10,
                })
                .collect();
            Ok(PriceSeries::new(symbol, bars))
        }
    }

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn request(tickers: &str, kinds: &[IndicatorKind]) -> AnalysisRequest {
        AnalysisRequest::new(
            tickers,
            d(2024, 1, 1),
            d(2024, 2, 1),
            IndicatorRequest::new(kinds.iter().copied()).unwrap(),
            20,
        )
        .unwrap()
    }

    // ---- parse_tickers ----------------------------------------------------

    #[test]
    fn parse_tickers_trims_and_dedups() {
        assert_eq!(
            parse_tickers(" AAPL, msft ,,AAPL,  GOOG "),
            vec!["AAPL", "msft", "GOOG"]
        );
        assert!(parse_tickers(" , ,").is_empty());
    }

    // ---- AnalysisRequest --------------------------------------------------

    #[test]
    fn request_validation() {
        let ind = IndicatorRequest::default();
        assert_eq!(
            AnalysisRequest::new(" ", d(2024, 1, 1), d(2024, 1, 2), ind.clone(), 5).unwrap_err(),
            RequestError::NoTickers
        );
        assert!(matches!(
            AnalysisRequest::new("A", d(2024, 1, 2), d(2024, 1, 2), ind.clone(), 5),
            Err(RequestError::InvalidDateRange { .. })
        ));
        assert_eq!(
            AnalysisRequest::new("A,B,C", d(2024, 1, 1), d(2024, 1, 2), ind, 2).unwrap_err(),
            RequestError::TooManyTickers { count: 3, max: 2 }
        );
    }

    // ---- analyze ----------------------------------------------------------

    #[tokio::test]
    async fn invalid_ticker_does_not_abort_others() {
        let source = StubSource::default()
            .with("AAPL", &[10.0, 11.0, 12.0])
            .with("MSFT", &[20.0, 21.0]);
        let req = request("AAPL, NOPE, MSFT", &[IndicatorKind::DailyReturn]);
        let report = analyze(&source, &req, d(2030, 1, 1)).await;

        let order: Vec<_> = report.tickers.iter().map(|t| t.ticker.as_str()).collect();
        assert_eq!(order, vec!["AAPL", "NOPE", "MSFT"]);
        assert!(report.tickers[0].is_ok());
        assert_eq!(
            report.tickers[1].error.as_ref().unwrap().detail,
            TickerError::InvalidTicker("NOPE".into())
        );
        assert!(report.tickers[2].is_ok());
        assert_eq!((report.succeeded, report.failed), (2, 1));
        assert_eq!(report.indicators, vec!["Daily Return"]);
    }

    #[tokio::test]
    async fn fetch_failure_is_generic_and_scoped() {
        let source = StubSource::default().broken("BAD").with("OK", &[1.0, 2.0]);
        let req = request("BAD,OK", &[]);
        let report = analyze(&source, &req, d(2030, 1, 1)).await;
        let bad = &report.tickers[0];
        assert_eq!(bad.error.as_ref().unwrap().detail, TickerError::FetchFailure("BAD".into()));
        assert!(!bad.error.as_ref().unwrap().message.contains("boom"));
        assert!(report.tickers[1].is_ok());
    }

    #[tokio::test]
    async fn empty_series_reports_no_data() {
        let source = StubSource::default().with("EMPTY", &[]);
        // The stub probe only checks membership, so the empty series gets
        // through to the fetch step.
        let report = analyze(&source, &request("EMPTY", &[]), d(2030, 1, 1)).await;
        assert_eq!(
            report.tickers[0].error.as_ref().unwrap().detail,
            TickerError::NoData("EMPTY".into())
        );
    }

    #[tokio::test]
    async fn end_date_today_warns_but_keeps_data() {
        let source = StubSource::default().with("AAPL", &[1.0, 2.0]);
        let req = request("AAPL", &[]);
        let report = analyze(&source, &req, req.end_date).await;
        let t = &report.tickers[0];
        assert!(t.is_ok());
        assert_eq!(t.warnings.len(), 1);
        assert_eq!(
            t.warnings[0].detail,
            TickerWarning::IncompleteRecentData { end_date: req.end_date }
        );
    }

    #[tokio::test]
    async fn past_end_date_has_no_warning() {
        let source = StubSource::default().with("AAPL", &[1.0, 2.0]);
        let report = analyze(&source, &request("AAPL", &[]), d(2024, 2, 2)).await;
        assert!(report.tickers[0].warnings.is_empty());
    }

    #[tokio::test]
    async fn table_carries_requested_indicator_columns() {
        let source = StubSource::default().with("AAPL", &[10.0, 11.0, 12.0, 11.0, 10.0]);
        let req = request(
            "AAPL",
            &[
                IndicatorKind::MovingAverage { period: 3 },
                IndicatorKind::Rsi { period: 14 },
            ],
        );
        let report = analyze(&source, &req, d(2030, 1, 1)).await;
        let table = report.tickers[0].table.as_ref().unwrap();
        assert_eq!(table.len(), 5);
        assert_eq!(&table.columns[8..], ["Moving Average", "RSI"]);
        let ma: Vec<_> = table
            .column("Moving Average")
            .unwrap()
            .into_iter()
            .map(Cell::as_number)
            .collect();
        assert!(ma[..2].iter().all(Option::is_none));
        assert!((ma[3].unwrap() - 34.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn notice_carries_display_message() {
        let n: Notice<TickerError> = TickerError::NoData("X".into()).into();
        let json = serde_json::to_value(&n).unwrap();
        assert_eq!(json["kind"], "NoData");
        assert_eq!(json["ticker"], "X");
        assert!(json["message"].as_str().unwrap().contains("no price data"));
    }
}
