//! External rate sources and their shared HTTP plumbing.

pub mod coingecko;
pub mod exchangerate;
pub mod util;

pub use coingecko::CoinGeckoProvider;
pub use exchangerate::ExchangeRateProvider;

use std::env;
use std::time::Duration;

use anyhow::{Result, bail};

use crate::core::config::AppConfig;
use crate::core::rates::RateProvider;

/// Builds the provider named by `source`, falling back to the
/// configured default. API keys come from the environment:
/// `COINGECKO_API_KEY` (optional) and `EXCHANGERATE_API_KEY`
/// (required by the provider at fetch time).
pub fn build_provider(config: &AppConfig, source: Option<&str>) -> Result<Box<dyn RateProvider>> {
    let source = source.unwrap_or(&config.default_source);
    let timeout = Duration::from_secs(config.request_timeout_seconds);
    match source {
        "coingecko" => {
            let base_url = config
                .providers
                .coingecko
                .as_ref()
                .map_or(coingecko::DEFAULT_BASE_URL, |p| &p.base_url);
            let api_key = env::var("COINGECKO_API_KEY").ok();
            Ok(Box::new(CoinGeckoProvider::new(
                base_url,
                &config.base_currency,
                api_key,
                timeout,
            )))
        }
        "exchangerate" => {
            let base_url = config
                .providers
                .exchangerate
                .as_ref()
                .map_or(exchangerate::DEFAULT_BASE_URL, |p| &p.base_url);
            let api_key = env::var("EXCHANGERATE_API_KEY").ok();
            Ok(Box::new(ExchangeRateProvider::new(
                base_url,
                &config.base_currency,
                api_key,
                timeout,
            )))
        }
        other => bail!("unknown rate source '{other}' (expected 'coingecko' or 'exchangerate')"),
    }
}
