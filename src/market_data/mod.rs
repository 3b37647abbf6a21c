// =============================================================================
// Market data: the price-series collaborator
// =============================================================================
//
// The analysis pipeline only talks to a `PriceSource`. The production
// implementation is `YahooClient`; tests plug in in-memory sources.

pub mod yahoo;

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::errors::FetchError;
use crate::types::PriceSeries;

pub use yahoo::YahooClient;

#[async_trait]
pub trait PriceSource: Send + Sync {
    /// Best-effort probe. `false` on an empty or failed response; never errors.
    async fn is_valid_ticker(&self, symbol: &str) -> bool;

    /// Daily bars for `symbol` in `[start, end)`.
    async fn fetch_price_series(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<PriceSeries, FetchError>;
}
