//! Exchange-rate lookup used to prefill a batch's foreign-to-local rate

use anyhow::Result;
use async_trait::async_trait;

#[async_trait]
pub trait CurrencyRateProvider: Send + Sync {
    /// Units of `to` per one unit of `from`.
    async fn get_rate(&self, from: &str, to: &str) -> Result<f64>;
}
