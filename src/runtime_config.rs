// =============================================================================
// Runtime Configuration: service settings with atomic save
// =============================================================================
//
// Every tunable of the service lives here: where to listen, where to fetch
// prices from, request limits and the indicator slider bounds.
//
// Persistence uses an atomic tmp + rename pattern to prevent corruption on
// crash. All fields carry `#[serde(default)]` so that adding new fields
// never breaks loading an older config file.
//
// =============================================================================

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::types::{DEFAULT_MA_PERIOD, DEFAULT_VOLATILITY_PERIOD};

// =============================================================================
// Default-value helpers (required by serde `default = "..."` attribute)
// =============================================================================

fn default_bind_addr() -> String {
    "0.0.0.0:3001".to_string()
}

fn default_data_base_url() -> String {
    "https://query1.finance.yahoo.com".to_string()
}

fn default_request_timeout_secs() -> u64 {
    10
}

fn default_user_agent() -> String {
    concat!("Mozilla/5.0 (compatible; ticker-lens/", env!("CARGO_PKG_VERSION"), ")").to_string()
}

fn default_max_tickers_per_request() -> usize {
    20
}

fn default_ma_period() -> usize {
    DEFAULT_MA_PERIOD
}

fn default_volatility_period() -> usize {
    DEFAULT_VOLATILITY_PERIOD
}

fn default_period_max() -> usize {
    30
}

// =============================================================================
// RuntimeConfig
// =============================================================================

/// Top-level configuration for the service.
///
/// Every field has a serde default so that older JSON files missing new fields
/// will still deserialise correctly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuntimeConfig {
    // --- Server --------------------------------------------------------------

    /// Socket address the HTTP API binds to.
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    // --- Market data ---------------------------------------------------------

    /// Base URL of the chart API (no trailing slash needed).
    #[serde(default = "default_data_base_url")]
    pub data_base_url: String,

    /// Per-request timeout for the market data client.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    // --- Request limits ------------------------------------------------------

    /// Upper bound on tickers accepted in a single analyze request.
    #[serde(default = "default_max_tickers_per_request")]
    pub max_tickers_per_request: usize,

    // --- Indicator sliders ---------------------------------------------------

    /// Moving Average period used when the request does not specify one.
    #[serde(default = "default_ma_period")]
    pub default_ma_period: usize,

    /// Volatility period used when the request does not specify one.
    #[serde(default = "default_volatility_period")]
    pub default_volatility_period: usize,

    /// Largest accepted Moving Average / Volatility period. The smallest is 1.
    #[serde(default = "default_period_max")]
    pub period_max: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            data_base_url: default_data_base_url(),
            request_timeout_secs: default_request_timeout_secs(),
            user_agent: default_user_agent(),
            max_tickers_per_request: default_max_tickers_per_request(),
            default_ma_period: default_ma_period(),
            default_volatility_period: default_volatility_period(),
            period_max: default_period_max(),
        }
    }
}

impl RuntimeConfig {
    /// Load configuration from a JSON file at `path`.
    ///
    /// If the file does not exist, returns an error so the caller can fall
    /// back to defaults with a warning.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read runtime config from {}", path.display()))?;

        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse runtime config from {}", path.display()))?;

        info!(
            path = %path.display(),
            bind_addr = %config.bind_addr,
            data_base_url = %config.data_base_url,
            "runtime config loaded"
        );

        Ok(config)
    }

    /// Persist the current configuration to `path` using an atomic write
    /// (write to `.tmp`, then rename).
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        let content = serde_json::to_string_pretty(self)
            .context("failed to serialise runtime config to JSON")?;

        let tmp_path = path.with_extension("json.tmp");

        std::fs::write(&tmp_path, &content)
            .with_context(|| format!("failed to write tmp config to {}", tmp_path.display()))?;

        std::fs::rename(&tmp_path, path)
            .with_context(|| format!("failed to rename tmp config to {}", path.display()))?;

        info!(path = %path.display(), "runtime config saved (atomic)");
        Ok(())
    }

    /// Apply `TICKER_LENS_*` environment overrides.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(addr) = std::env::var("TICKER_LENS_BIND_ADDR") {
            if !addr.trim().is_empty() {
                self.bind_addr = addr.trim().to_string();
            }
        }
        if let Ok(url) = std::env::var("TICKER_LENS_DATA_URL") {
            if !url.trim().is_empty() {
                self.data_base_url = url.trim().to_string();
            }
        }
    }
}
