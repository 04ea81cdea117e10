use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tracing::{debug, instrument};

use crate::core::currency;
use crate::core::error::{Error, Result};
use crate::core::rates::{RateProvider, RateSnapshot};
use crate::providers::util;

pub const DEFAULT_BASE_URL: &str = "https://api.coingecko.com";

const SOURCE: &str = "coingecko";

/// Crypto-price source backed by the CoinGecko simple-price API.
///
/// The API quotes base units per coin (e.g. USD per BTC); the
/// snapshot stores coins per base unit, so every price is inverted
/// on the way in. The API key is optional; without one the public
/// endpoint and its rate limits apply.
#[derive(Debug)]
pub struct CoinGeckoProvider {
    base_url: String,
    base_currency: String,
    api_key: Option<String>,
    timeout: Duration,
}

impl CoinGeckoProvider {
    pub fn new(
        base_url: &str,
        base_currency: &str,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Self {
        CoinGeckoProvider {
            base_url: base_url.to_string(),
            base_currency: base_currency.to_string(),
            api_key,
            timeout,
        }
    }
}

#[async_trait]
impl RateProvider for CoinGeckoProvider {
    fn source_id(&self) -> &'static str {
        SOURCE
    }

    #[instrument(name = "CoinGeckoFetch", skip(self))]
    async fn fetch_rates(&self) -> Result<RateSnapshot> {
        let ids: Vec<&str> = currency::cryptos()
            .filter_map(|c| c.coingecko_id())
            .collect();
        let vs = self.base_currency.to_lowercase();
        let url = format!(
            "{}/api/v3/simple/price?ids={}&vs_currencies={}",
            self.base_url,
            ids.join(","),
            vs
        );
        debug!("Requesting crypto prices from {}", url);

        let client = util::http_client(self.timeout, SOURCE)?;
        let mut request = client.get(&url);
        if let Some(key) = &self.api_key {
            request = request.header("x-cg-pro-api-key", key);
        }
        let response = request
            .send()
            .await
            .map_err(|e| util::send_error(SOURCE, e))?;
        if let Some(err) = util::status_error(SOURCE, response.status()) {
            return Err(err);
        }

        let text = response
            .text()
            .await
            .map_err(|e| util::send_error(SOURCE, e))?;
        // Keys are dynamic coin ids, so the payload is a plain map.
        let prices: HashMap<String, HashMap<String, f64>> =
            serde_json::from_str(&text).map_err(|e| Error::ProviderMalformedResponse {
                provider: SOURCE.to_string(),
                reason: format!("undecodable payload: {e}"),
            })?;

        let mut rates = HashMap::new();
        for crypto in currency::cryptos() {
            let Some(id) = crypto.coingecko_id() else {
                continue;
            };
            let price = prices
                .get(id)
                .and_then(|quotes| quotes.get(&vs))
                .copied()
                .ok_or_else(|| Error::ProviderMalformedResponse {
                    provider: SOURCE.to_string(),
                    reason: format!("missing {vs} price for '{id}'"),
                })?;
            if price <= 0.0 {
                return Err(Error::ProviderMalformedResponse {
                    provider: SOURCE.to_string(),
                    reason: format!("non-positive price {price} for '{id}'"),
                });
            }
            rates.insert(crypto.code.to_string(), 1.0 / price);
        }

        Ok(RateSnapshot {
            base: self.base_currency.clone(),
            rates,
            fetched_at: Utc::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const PRICES: &str = r#"{
        "bitcoin": { "usd": 50000.0 },
        "ethereum": { "usd": 2500.0 },
        "solana": { "usd": 100.0 }
    }"#;

    fn provider(base_url: &str) -> CoinGeckoProvider {
        CoinGeckoProvider::new(base_url, "USD", None, Duration::from_secs(5))
    }

    async fn create_mock_server(response: ResponseTemplate) -> MockServer {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v3/simple/price"))
            .respond_with(response)
            .mount(&mock_server)
            .await;
        mock_server
    }

    #[tokio::test]
    async fn test_successful_fetch_inverts_prices() {
        let mock_server =
            create_mock_server(ResponseTemplate::new(200).set_body_string(PRICES)).await;

        let snapshot = provider(&mock_server.uri()).fetch_rates().await.unwrap();
        assert_eq!(snapshot.base, "USD");
        assert_eq!(snapshot.rates.len(), 3);
        assert!((snapshot.rates["BTC"] - 1.0 / 50000.0).abs() < 1e-12);
        assert!((snapshot.rates["ETH"] - 1.0 / 2500.0).abs() < 1e-12);
        assert!((snapshot.rates["SOL"] - 1.0 / 100.0).abs() < 1e-12);
    }

    #[tokio::test]
    async fn test_api_key_is_sent_as_a_header() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v3/simple/price"))
            .and(header("x-cg-pro-api-key", "test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_string(PRICES))
            .mount(&mock_server)
            .await;

        let provider = CoinGeckoProvider::new(
            &mock_server.uri(),
            "USD",
            Some("test-key".to_string()),
            Duration::from_secs(5),
        );
        assert!(provider.fetch_rates().await.is_ok());
    }

    #[tokio::test]
    async fn test_missing_coin_is_malformed() {
        let partial = r#"{ "bitcoin": { "usd": 50000.0 }, "ethereum": { "usd": 2500.0 } }"#;
        let mock_server =
            create_mock_server(ResponseTemplate::new(200).set_body_string(partial)).await;

        let err = provider(&mock_server.uri()).fetch_rates().await.unwrap_err();
        assert!(matches!(
            err,
            Error::ProviderMalformedResponse { ref reason, .. } if reason.contains("solana")
        ));
    }

    #[tokio::test]
    async fn test_non_positive_price_is_malformed() {
        let zeroed = r#"{
            "bitcoin": { "usd": 0.0 },
            "ethereum": { "usd": 2500.0 },
            "solana": { "usd": 100.0 }
        }"#;
        let mock_server =
            create_mock_server(ResponseTemplate::new(200).set_body_string(zeroed)).await;

        let err = provider(&mock_server.uri()).fetch_rates().await.unwrap_err();
        assert!(matches!(err, Error::ProviderMalformedResponse { .. }));
    }

    #[tokio::test]
    async fn test_undecodable_body_is_malformed() {
        let mock_server =
            create_mock_server(ResponseTemplate::new(200).set_body_string("not json")).await;

        let err = provider(&mock_server.uri()).fetch_rates().await.unwrap_err();
        assert!(matches!(err, Error::ProviderMalformedResponse { .. }));
    }

    #[tokio::test]
    async fn test_auth_statuses_map_to_auth_error() {
        let mock_server = create_mock_server(ResponseTemplate::new(401)).await;

        let err = provider(&mock_server.uri()).fetch_rates().await.unwrap_err();
        assert!(matches!(err, Error::ProviderAuthError { .. }));
    }

    #[tokio::test]
    async fn test_server_errors_map_to_unavailable() {
        let mock_server = create_mock_server(ResponseTemplate::new(503)).await;

        let err = provider(&mock_server.uri()).fetch_rates().await.unwrap_err();
        assert!(matches!(err, Error::ProviderUnavailable { .. }));
    }

    #[tokio::test]
    async fn test_timeout_maps_to_unavailable() {
        let slow = ResponseTemplate::new(200)
            .set_body_string(PRICES)
            .set_delay(Duration::from_millis(500));
        let mock_server = create_mock_server(slow).await;

        let provider = CoinGeckoProvider::new(
            &mock_server.uri(),
            "USD",
            None,
            Duration::from_millis(50),
        );
        let err = provider.fetch_rates().await.unwrap_err();
        assert!(matches!(err, Error::ProviderUnavailable { .. }));
    }
}
