// =============================================================================
// Central Application State
// =============================================================================
//
// Shared by every HTTP handler via `Arc<AppState>`. Holds no per-request or
// per-user data: the configuration, the market data collaborator, and a few
// counters for the health endpoint.
//
// Thread safety:
//   - Atomic counter for requests served.
//   - parking_lot::RwLock around the configuration.
//   - The price source manages its own interior state (connection pool).
// =============================================================================

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;

use crate::market_data::PriceSource;
use crate::runtime_config::RuntimeConfig;

pub struct AppState {
    pub runtime_config: RwLock<RuntimeConfig>,

    /// Where price series come from.
    pub price_source: Arc<dyn PriceSource>,

    /// Analyze requests accepted since start-up.
    pub requests_served: AtomicU64,

    /// Instant when the service was started. Used for uptime calculations.
    pub start_time: std::time::Instant,
}

impl AppState {
    pub fn new(config: RuntimeConfig, price_source: Arc<dyn PriceSource>) -> Self {
        Self {
            runtime_config: RwLock::new(config),
            price_source,
            requests_served: AtomicU64::new(0),
            start_time: std::time::Instant::now(),
        }
    }

    /// Record one accepted analyze request; returns the new total.
    pub fn record_request(&self) -> u64 {
        self.requests_served.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub fn requests_served(&self) -> u64 {
        self.requests_served.load(Ordering::Relaxed)
    }

    pub fn uptime_secs(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}
