use anyhow::{Result, anyhow};
use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, instrument};

use crate::core::cache::Cache;
use crate::core::currency::CurrencyRateProvider;

/// Foreign exchange quotes from the Yahoo chart endpoint.
pub struct YahooRateProvider {
    base_url: String,
    cache: Arc<Cache<String, f64>>,
}

impl YahooRateProvider {
    pub fn new(base_url: &str, cache: Arc<Cache<String, f64>>) -> Self {
        YahooRateProvider {
            base_url: base_url.to_string(),
            cache,
        }
    }
}

#[derive(Debug, Deserialize)]
struct YahooCurrencyResponse {
    chart: CurrencyChartResult,
}

#[derive(Debug, Deserialize)]
struct CurrencyChartResult {
    result: Vec<CurrencyChartItem>,
}

#[derive(Debug, Deserialize)]
struct CurrencyChartItem {
    meta: CurrencyChartMeta,
}

#[derive(Debug, Deserialize)]
struct CurrencyChartMeta {
    #[serde(alias = "regularMarketPrice")]
    regular_market_price: f64,
}

#[async_trait]
impl CurrencyRateProvider for YahooRateProvider {
    #[instrument(name = "YahooRateFetch", skip(self))]
    async fn get_rate(&self, from: &str, to: &str) -> Result<f64> {
        if from.eq_ignore_ascii_case(to) {
            return Ok(1.0);
        }

        let symbol = format!("{}{}=X", from.to_uppercase(), to.to_uppercase());
        if let Some(cached) = self.cache.get(&symbol).await {
            return Ok(cached);
        }

        let url = format!("{}/v8/finance/chart/{symbol}", self.base_url);
        debug!("Requesting currency rate from {}", url);

        let client = reqwest::Client::builder()
            .user_agent("shopkeep/0.1")
            .build()?;

        let response = client
            .get(&url)
            .send()
            .await
            .map_err(|e| anyhow!("Request error: {} for currency pair: {}", e, symbol))?;

        if !response.status().is_success() {
            return Err(anyhow!(
                "HTTP error: {} for currency pair: {}",
                response.status(),
                symbol
            ));
        }

        let text = response.text().await?;

        let data: YahooCurrencyResponse = serde_json::from_str(&text)
            .map_err(|e| anyhow!("Failed to parse JSON response for {}: {}", symbol, e))?;

        let rate = data
            .chart
            .result
            .into_iter()
            .next()
            .map(|item| item.meta.regular_market_price)
            .ok_or_else(|| anyhow!("No rate data found for currency pair: {}", symbol))?;

        if !rate.is_finite() || rate <= 0.0 {
            return Err(anyhow!("Unusable rate {} for currency pair: {}", rate, symbol));
        }

        self.cache.put(symbol, rate).await;
        Ok(rate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const USD_PHP: &str = "/v8/finance/chart/USDPHP=X";

    async fn mount(server: &MockServer, status: u16, body: &str) {
        Mock::given(method("GET"))
            .and(path(USD_PHP))
            .respond_with(ResponseTemplate::new(status).set_body_string(body))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_successful_rate_fetch() {
        let mock_server = MockServer::start().await;
        mount(
            &mock_server,
            200,
            r#"{"chart": {"result": [{"meta": {"regularMarketPrice": 58.125}}]}}"#,
        )
        .await;
        let provider = YahooRateProvider::new(&mock_server.uri(), Arc::new(Cache::new()));

        let rate = provider.get_rate("usd", "php").await.expect("rate");
        assert_eq!(rate, 58.125);
    }

    #[tokio::test]
    async fn test_same_currency_needs_no_request() {
        let provider = YahooRateProvider::new("http://127.0.0.1:9", Arc::new(Cache::new()));
        assert_eq!(provider.get_rate("PHP", "php").await.unwrap(), 1.0);
    }

    #[tokio::test]
    async fn test_second_lookup_is_cached() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(USD_PHP))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"{"chart": {"result": [{"meta": {"regularMarketPrice": 57.5}}]}}"#,
            ))
            .expect(1)
            .mount(&mock_server)
            .await;
        let provider = YahooRateProvider::new(&mock_server.uri(), Arc::new(Cache::new()));

        provider.get_rate("USD", "PHP").await.unwrap();
        assert_eq!(provider.get_rate("USD", "PHP").await.unwrap(), 57.5);
    }

    #[tokio::test]
    async fn test_no_currency_rate_found() {
        let mock_server = MockServer::start().await;
        mount(&mock_server, 200, r#"{"chart": {"result": []}}"#).await;
        let provider = YahooRateProvider::new(&mock_server.uri(), Arc::new(Cache::new()));

        let result = provider.get_rate("USD", "PHP").await;
        assert_eq!(
            result.unwrap_err().to_string(),
            "No rate data found for currency pair: USDPHP=X"
        );
    }

    #[tokio::test]
    async fn test_api_error_response() {
        let mock_server = MockServer::start().await;
        mount(&mock_server, 500, "").await;
        let provider = YahooRateProvider::new(&mock_server.uri(), Arc::new(Cache::new()));

        let result = provider.get_rate("USD", "PHP").await;
        assert_eq!(
            result.unwrap_err().to_string(),
            "HTTP error: 500 Internal Server Error for currency pair: USDPHP=X"
        );
    }

    #[tokio::test]
    async fn test_malformed_response() {
        let mock_server = MockServer::start().await;
        mount(&mock_server, 200, r#"{"chart": {"results": []}}"#).await;
        let provider = YahooRateProvider::new(&mock_server.uri(), Arc::new(Cache::new()));

        let result = provider.get_rate("USD", "PHP").await;
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("Failed to parse JSON response for USDPHP=X")
        );
    }
}
