use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use serde::Deserialize;
use tracing::{debug, instrument};

use crate::core::currency;
use crate::core::error::{Error, Result};
use crate::core::rates::{RateProvider, RateSnapshot};
use crate::providers::util;

pub const DEFAULT_BASE_URL: &str = "https://v6.exchangerate-api.com";

const SOURCE: &str = "exchangerate";

/// Fiat-rate source backed by ExchangeRate-API v6.
///
/// The API already quotes units-per-base, so conversion rates are
/// taken as-is. An API key is required; a missing one fails before
/// any request is made.
#[derive(Debug)]
pub struct ExchangeRateProvider {
    base_url: String,
    base_currency: String,
    api_key: Option<String>,
    timeout: Duration,
}

impl ExchangeRateProvider {
    pub fn new(
        base_url: &str,
        base_currency: &str,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Self {
        ExchangeRateProvider {
            base_url: base_url.to_string(),
            base_currency: base_currency.to_string(),
            api_key,
            timeout,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ExchangeRateResponse {
    result: String,
    #[serde(rename = "error-type")]
    error_type: Option<String>,
    conversion_rates: Option<HashMap<String, f64>>,
}

#[async_trait]
impl RateProvider for ExchangeRateProvider {
    fn source_id(&self) -> &'static str {
        SOURCE
    }

    #[instrument(name = "ExchangeRateFetch", skip(self))]
    async fn fetch_rates(&self) -> Result<RateSnapshot> {
        let Some(key) = &self.api_key else {
            return Err(Error::ProviderAuthError {
                provider: SOURCE.to_string(),
                reason: "EXCHANGERATE_API_KEY is not set".to_string(),
            });
        };
        let url = format!("{}/v6/{}/latest/{}", self.base_url, key, self.base_currency);
        debug!("Requesting fiat rates for base {}", self.base_currency);

        let client = util::http_client(self.timeout, SOURCE)?;
        let response = client
            .get(&url)
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
        let payload: ExchangeRateResponse =
            serde_json::from_str(&text).map_err(|e| Error::ProviderMalformedResponse {
                provider: SOURCE.to_string(),
                reason: format!("undecodable payload: {e}"),
            })?;

        if payload.result != "success" {
            let reason = payload
                .error_type
                .unwrap_or_else(|| "unknown error".to_string());
            return Err(match reason.as_str() {
                "invalid-key" | "inactive-account" => Error::ProviderAuthError {
                    provider: SOURCE.to_string(),
                    reason,
                },
                "quota-reached" => Error::ProviderUnavailable {
                    provider: SOURCE.to_string(),
                    reason,
                },
                _ => Error::ProviderMalformedResponse {
                    provider: SOURCE.to_string(),
                    reason,
                },
            });
        }

        let conversion = payload
            .conversion_rates
            .ok_or_else(|| Error::ProviderMalformedResponse {
                provider: SOURCE.to_string(),
                reason: "missing conversion_rates".to_string(),
            })?;

        let mut rates = HashMap::new();
        for code in currency::fiat_codes() {
            if code == self.base_currency {
                continue;
            }
            let rate = conversion
                .get(code)
                .copied()
                .ok_or_else(|| Error::ProviderMalformedResponse {
                    provider: SOURCE.to_string(),
                    reason: format!("missing rate for '{code}'"),
                })?;
            if rate <= 0.0 {
                return Err(Error::ProviderMalformedResponse {
                    provider: SOURCE.to_string(),
                    reason: format!("non-positive rate {rate} for '{code}'"),
                });
            }
            rates.insert(code.to_string(), rate);
        }

        Ok(RateSnapshot {
            base: self.base_currency.clone(),
            rates,
            fetched_at: Utc::now(),
        })
    }
}
