// =============================================================================
// Yahoo Finance chart client: daily OHLCV history over HTTP
// =============================================================================
//
// Endpoint: GET {base_url}/v8/finance/chart/{symbol}
//   ?period1=<unix secs>&period2=<unix secs>&interval=1d&includeAdjustedClose=true
//
// `period2` is exclusive, which gives the [start, end) semantics the pipeline
// expects. The response carries parallel arrays (timestamp / open / high /
// low / close / volume / adjclose) in which any entry may be null; days
// without a close are skipped rather than synthesized.
// =============================================================================

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate};
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use reqwest::Url;
use serde::Deserialize;
use tracing::{debug, instrument, warn};

use super::PriceSource;
use crate::errors::FetchError;
use crate::runtime_config::RuntimeConfig;
use crate::types::{Bar, PriceSeries};

/// Look-back used by the ticker probe.
const PROBE_RANGE: &str = "5d";

/// Yahoo Finance chart API client.
#[derive(Clone)]
pub struct YahooClient {
    base_url: Url,
    client: reqwest::Client,
}

impl YahooClient {
    // -------------------------------------------------------------------------
    // Construction
    // -------------------------------------------------------------------------

    /// Create a client against `base_url` (trailing slash optional). The
    /// URL may carry a path prefix, e.g. when running behind a proxy.
    pub fn new(
        base_url: impl Into<String>,
        timeout: Duration,
        user_agent: &str,
    ) -> Result<Self, FetchError> {
        let mut default_headers = HeaderMap::new();
        // Yahoo throttles requests without a browser-like agent.
        if let Ok(val) = HeaderValue::from_str(user_agent) {
            default_headers.insert(USER_AGENT, val);
        }

        let client = reqwest::Client::builder()
            .default_headers(default_headers)
            .timeout(timeout)
            .build()?;

        let raw = base_url.into();
        let base_url = Url::parse(&raw).map_err(|_| FetchError::InvalidUrl(raw.clone()))?;
        if base_url.cannot_be_a_base() {
            return Err(FetchError::InvalidUrl(raw));
        }
        debug!(base_url = %base_url, "YahooClient initialised");

        Ok(Self { base_url, client })
    }

    pub fn from_config(config: &RuntimeConfig) -> Result<Self, FetchError> {
        Self::new(
            config.data_base_url.clone(),
            Duration::from_secs(config.request_timeout_secs),
            &config.user_agent,
        )
    }

    // -------------------------------------------------------------------------
    // Requests
    // -------------------------------------------------------------------------

    /// Chart endpoint for `symbol`. The symbol is one percent-encoded path
    /// segment, so `/`, `?` and `#` in user input cannot reshape the request.
    fn chart_url(&self, symbol: &str) -> Result<Url, FetchError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| FetchError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(["v8", "finance", "chart", symbol]);
        Ok(url)
    }

    /// GET the chart endpoint with `query` and parse the body into a series.
    async fn get_chart(
        &self,
        symbol: &str,
        query: &[(&str, String)],
    ) -> Result<PriceSeries, FetchError> {
        let resp = self
            .client
            .get(self.chart_url(symbol)?)
            .query(query)
            .send()
            .await?;

        let status = resp.status();
        let body = resp.text().await?;

        // Yahoo reports unknown symbols as 404 with a JSON error body; prefer
        // that message over the bare status line when it parses.
        match parse_chart(symbol, &body) {
            Ok(series) if status.is_success() => Ok(series),
            Ok(_) => Err(FetchError::Api {
                status: status.as_u16(),
                message: truncate(&body, 200),
            }),
            Err(FetchError::Api { message, .. }) => Err(FetchError::Api {
                status: status.as_u16(),
                message,
            }),
            Err(e) if !status.is_success() => {
                debug!(error = %e, "unparseable error body");
                Err(FetchError::Api {
                    status: status.as_u16(),
                    message: truncate(&body, 200),
                })
            }
            Err(e) => Err(e),
        }
    }
}

#[async_trait]
impl PriceSource for YahooClient {
    #[instrument(skip(self), name = "yahoo::is_valid_ticker")]
    async fn is_valid_ticker(&self, symbol: &str) -> bool {
        if symbol.trim().is_empty() {
            return false;
        }
        let query = [
            ("range", PROBE_RANGE.to_string()),
            ("interval", "1d".to_string()),
        ];
        match self.get_chart(symbol, &query).await {
            Ok(series) => !series.is_empty(),
            Err(e) => {
                debug!(error = %e, "ticker probe failed");
                false
            }
        }
    }

    #[instrument(skip(self), name = "yahoo::fetch_price_series")]
    async fn fetch_price_series(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<PriceSeries, FetchError> {
        let query = [
            ("period1", unix_midnight(start).to_string()),
            ("period2", unix_midnight(end).to_string()),
            ("interval", "1d".to_string()),
            ("includeAdjustedClose", "true".to_string()),
        ];
        let series = self.get_chart(symbol, &query).await?;

        // period2 is exclusive on Yahoo's side, but trim anyway: the bar date
        // is derived from the exchange offset and can land on `end`.
        let bars = series
            .bars
            .into_iter()
            .filter(|b| b.date >= start && b.date < end)
            .collect();
        let series = PriceSeries::new(series.ticker, bars);

        debug!(symbol, count = series.len(), "price series fetched");
        Ok(series)
    }
}

impl std::fmt::Debug for YahooClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("YahooClient")
            .field("base_url", &self.base_url)
            .finish()
    }
}

// =============================================================================
// Response model
// =============================================================================

#[derive(Debug, Deserialize)]
struct ChartEnvelope {
    chart: Chart,
}

#[derive(Debug, Deserialize)]
struct Chart {
    #[serde(default)]
    result: Option<Vec<ChartResult>>,
    #[serde(default)]
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    #[serde(default)]
    code: String,
    #[serde(default)]
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    #[serde(default)]
    meta: ChartMeta,
    #[serde(default)]
    timestamp: Vec<i64>,
    #[serde(default)]
    indicators: ChartIndicators,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChartMeta {
    /// Exchange offset from UTC in seconds.
    #[serde(default)]
    gmtoffset: i64,
}

#[derive(Debug, Default, Deserialize)]
struct ChartIndicators {
    #[serde(default)]
    quote: Vec<Quote>,
    #[serde(default)]
    adjclose: Vec<AdjClose>,
}

#[derive(Debug, Default, Deserialize)]
struct Quote {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<f64>>,
}

#[derive(Debug, Default, Deserialize)]
struct AdjClose {
    #[serde(default)]
    adjclose: Vec<Option<f64>>,
}

// =============================================================================
// Parsing
// =============================================================================

/// Parse a chart response body into a [`PriceSeries`] for `symbol`.
///
/// The series is labeled with `symbol` as the caller typed it; the
/// provider's canonical spelling in `meta.symbol` is ignored.
///
/// A provider-side error object maps to [`FetchError::Api`]; a structurally
/// invalid body to [`FetchError::Decode`]. A result without timestamps is an
/// empty series, not an error.
pub fn parse_chart(symbol: &str, body: &str) -> Result<PriceSeries, FetchError> {
    let envelope: ChartEnvelope =
        serde_json::from_str(body).map_err(|e| FetchError::Decode(e.to_string()))?;

    if let Some(err) = envelope.chart.error {
        return Err(FetchError::Api {
            status: 200,
            message: format!("{}: {}", err.code, err.description),
        });
    }

    let Some(result) = envelope.chart.result.and_then(|r| r.into_iter().next()) else {
        return Ok(PriceSeries::new(symbol, Vec::new()));
    };

    let offset = result.meta.gmtoffset;
    let quote = result.indicators.quote.into_iter().next().unwrap_or_default();
    let adj = result
        .indicators
        .adjclose
        .into_iter()
        .next()
        .unwrap_or_default()
        .adjclose;

    let mut bars = Vec::with_capacity(result.timestamp.len());
    let mut skipped = 0usize;
    for (i, &ts) in result.timestamp.iter().enumerate() {
        let Some(close) = at(&quote.close, i) else {
            skipped += 1;
            continue;
        };
        let Some(date) = DateTime::from_timestamp(ts + offset, 0).map(|dt| dt.date_naive()) else {
            warn!(symbol, ts, "skipping bar with out-of-range timestamp");
            skipped += 1;
            continue;
        };
        bars.push(Bar {
            date,
            open: at(&quote.open, i).unwrap_or(close),
            high: at(&quote.high, i).unwrap_or(close),
            low: at(&quote.low, i).unwrap_or(close),
            close,
            adj_close: at(&adj, i),
            volume: at(&quote.volume, i).map(|v| v.max(0.0) as u64).unwrap_or(0),
        });
    }

    if skipped > 0 {
        debug!(symbol, skipped, "bars without a close were skipped");
    }

    Ok(PriceSeries::new(symbol, bars))
}

/// Finite value at `i`, if any.
fn at(v: &[Option<f64>], i: usize) -> Option<f64> {
    v.get(i).copied().flatten().filter(|x| x.is_finite())
}

fn unix_midnight(date: NaiveDate) -> i64 {
    date.and_hms_opt(0, 0, 0)
        .map(|dt| dt.and_utc().timestamp())
        .unwrap_or_default()
}

fn truncate(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((idx, _)) => format!("{}…", &s[..idx]),
        None => s.to_string(),
    }
}
