use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf};
use tracing::debug;

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct CoinGeckoProviderConfig {
    pub base_url: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ExchangeRateProviderConfig {
    pub base_url: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ProvidersConfig {
    pub coingecko: Option<CoinGeckoProviderConfig>,
    pub exchangerate: Option<ExchangeRateProviderConfig>,
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        ProvidersConfig {
            coingecko: Some(CoinGeckoProviderConfig {
                base_url: "https://api.coingecko.com".to_string(),
            }),
            exchangerate: Some(ExchangeRateProviderConfig {
                base_url: "https://v6.exchangerate-api.com".to_string(),
            }),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AppConfig {
    /// Currency rates are quoted in, trades settle against and
    /// portfolios are valued in unless overridden per command.
    #[serde(default = "default_base_currency")]
    pub base_currency: String,
    /// Seconds before a fetched snapshot counts as stale.
    #[serde(default = "default_rates_ttl_seconds")]
    pub rates_ttl_seconds: u64,
    /// Timeout for provider HTTP requests.
    #[serde(default = "default_request_timeout_seconds")]
    pub request_timeout_seconds: u64,
    /// Rate source used when `update-rates` gets no `--source`.
    #[serde(default = "default_source")]
    pub default_source: String,
    #[serde(default)]
    pub providers: ProvidersConfig,
    #[serde(default)]
    pub data_path: Option<String>,
}

fn default_base_currency() -> String {
    "USD".to_string()
}

fn default_rates_ttl_seconds() -> u64 {
    300
}

fn default_request_timeout_seconds() -> u64 {
    10
}

fn default_source() -> String {
    "coingecko".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            base_currency: default_base_currency(),
            rates_ttl_seconds: default_rates_ttl_seconds(),
            request_timeout_seconds: default_request_timeout_seconds(),
            default_source: default_source(),
            providers: ProvidersConfig::default(),
            data_path: None,
        }
    }
}

impl AppConfig {
    /// Loads the config from the default location. A missing file is
    /// not an error; every setting has a usable default.
    pub fn load() -> Result<Self> {
        debug!("Loading default config");
        let config_path = Self::default_config_path()?;
        if !config_path.exists() {
            debug!("No config file at {}, using defaults", config_path.display());
            return Ok(Self::default());
        }
        Self::load_from_path(&config_path)
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("io", "fxwallet", "fxwallet")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.config_dir().join("config.yaml"))
    }

    /// Directory holding the rate cache, history, wallets and audit
    /// log. `data_path` overrides the platform default.
    pub fn data_dir(&self) -> Result<PathBuf> {
        if let Some(custom_path) = &self.data_path {
            return Ok(PathBuf::from(custom_path));
        }
        let proj_dirs = ProjectDirs::from("io", "fxwallet", "fxwallet")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.data_dir().to_path_buf())
    }

    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let config_str = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Self = serde_yaml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;
        debug!("Successfully loaded config");
        Ok(config)
    }
}
