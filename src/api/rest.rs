// =============================================================================
// REST API Endpoints: Axum 0.7
// =============================================================================
//
// All JSON endpoints live under `/api/v1/`. The browser page is served from
// `/` and talks to `POST /api/v1/analyze`.
//
// CORS is configured permissively so the page can also be opened from a
// different origin during development.
// =============================================================================

use std::sync::Arc;

use axum::{
    extract::{Json, State},
    http::StatusCode,
    response::{Html, IntoResponse},
    routing::{get, post},
    Router,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};

use crate::app_state::AppState;
use crate::errors::RequestError;
use crate::pipeline::{self, AnalysisRequest};
use crate::runtime_config::RuntimeConfig;
use crate::types::{IndicatorKind, IndicatorRequest};

const INDEX_HTML: &str = include_str!("../../static/index.html");

/// Smallest Moving Average / Volatility period accepted from the page.
const PERIOD_MIN: usize = 1;

// =============================================================================
// Router construction
// =============================================================================

/// Build the full router with CORS middleware and shared state.
pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(index))
        .route("/api/v1/health", get(health))
        .route("/api/v1/indicators", get(indicator_catalogue))
        .route("/api/v1/analyze", post(analyze))
        .layer(cors)
        .with_state(state)
}

// =============================================================================
// Browser page
// =============================================================================

async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

// =============================================================================
// Health
// =============================================================================

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    requests_served: u64,
    uptime_secs: u64,
    server_time: i64,
}

async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok",
        requests_served: state.requests_served(),
        uptime_secs: state.uptime_secs(),
        server_time: chrono::Utc::now().timestamp_millis(),
    })
}

// =============================================================================
// Indicator catalogue
// =============================================================================

#[derive(Serialize)]
struct CatalogueEntry {
    name: &'static str,
    column: &'static str,
    defaults: IndicatorKind,
    /// Only the slider-driven indicators expose a tunable period.
    #[serde(skip_serializing_if = "Option::is_none")]
    period_range: Option<(usize, usize)>,
}

async fn indicator_catalogue(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let config = state.runtime_config.read();
    let entries: Vec<CatalogueEntry> = IndicatorKind::ALL
        .iter()
        .map(|&kind| {
            let defaults = match kind {
                IndicatorKind::MovingAverage { .. } => IndicatorKind::MovingAverage {
                    period: config.default_ma_period,
                },
                IndicatorKind::Volatility { .. } => IndicatorKind::Volatility {
                    period: config.default_volatility_period,
                },
                other => other,
            };
            let period_range = matches!(
                kind,
                IndicatorKind::MovingAverage { .. } | IndicatorKind::Volatility { .. }
            )
            .then_some((PERIOD_MIN, config.period_max));
            CatalogueEntry {
                name: kind.display_name(),
                column: kind.column_name(),
                defaults,
                period_range,
            }
        })
        .collect();
    Json(entries)
}

// =============================================================================
// Analyze
// =============================================================================

#[derive(Debug, Deserialize)]
struct AnalyzeBody {
    /// Comma-separated ticker list, as typed.
    tickers: String,
    start_date: NaiveDate,
    end_date: NaiveDate,
    #[serde(default)]
    indicators: Vec<String>,
    #[serde(default)]
    ma_period: Option<usize>,
    #[serde(default)]
    volatility_period: Option<usize>,
}

impl AnalyzeBody {
    fn into_request(self, config: &RuntimeConfig) -> Result<AnalysisRequest, RequestError> {
        let ma_period = checked_period(
            "Moving Average",
            self.ma_period.unwrap_or(config.default_ma_period),
            config.period_max,
        )?;
        let volatility_period = checked_period(
            "Volatility",
            self.volatility_period
                .unwrap_or(config.default_volatility_period),
            config.period_max,
        )?;

        let kinds = self
            .indicators
            .iter()
            .map(|name| IndicatorKind::from_name(name, ma_period, volatility_period))
            .collect::<Result<Vec<_>, _>>()?;

        AnalysisRequest::new(
            &self.tickers,
            self.start_date,
            self.end_date,
            IndicatorRequest::new(kinds)?,
            config.max_tickers_per_request,
        )
    }
}

fn checked_period(indicator: &'static str, value: usize, max: usize) -> Result<usize, RequestError> {
    if (PERIOD_MIN..=max).contains(&value) {
        Ok(value)
    } else {
        Err(RequestError::PeriodOutOfRange {
            indicator,
            value,
            min: PERIOD_MIN,
            max,
        })
    }
}

async fn analyze(
    State(state): State<Arc<AppState>>,
    Json(body): Json<AnalyzeBody>,
) -> Result<impl IntoResponse, (StatusCode, Json<serde_json::Value>)> {
    let request = {
        let config = state.runtime_config.read();
        body.into_request(&config)
    }
    .map_err(|e| {
        warn!(error = %e, "analyze request rejected");
        (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({ "error": e.to_string() })),
        )
    })?;

    let served = state.record_request();
    let today = chrono::Local::now().date_naive();
    let report = pipeline::analyze(state.price_source.as_ref(), &request, today).await;

    info!(
        request_id = %report.request_id,
        succeeded = report.succeeded,
        failed = report.failed,
        served,
        "analyze request served"
    );

    Ok(Json(report))
}
