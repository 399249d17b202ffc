pub mod yahoo;

use crate::chain::OptionChain;
use crate::errors::WheelResult;
use crate::types::PriceSeries;
use chrono::NaiveDate;

/// Source of historical prices and option chains.
///
/// Implementations do all blocking I/O; by the time the core runs every
/// value is in memory. Caching and retries belong to the implementation or
/// its caller, never to the core.
#[allow(async_fn_in_trait)]
pub trait MarketData {
    /// Daily closes for `ticker` over `lookback` (e.g. "5y").
    async fn price_history(&self, ticker: &str, lookback: &str) -> WheelResult<PriceSeries>;

    /// Listed expirations, in the order the source returns them.
    async fn expirations(&self, ticker: &str) -> WheelResult<Vec<NaiveDate>>;

    async fn option_chain(&self, ticker: &str, expiration: NaiveDate) -> WheelResult<OptionChain>;
}
