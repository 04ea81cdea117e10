//! Registry of currencies the simulator supports.
//!
//! Every user-facing currency code is validated against this registry
//! before it reaches the ledger or a provider. Codes are normalized to
//! uppercase so `btc` and `BTC` name the same asset.

use crate::core::error::{Error, Result};

/// Asset class plus the metadata that differs per class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CurrencyKind {
    Fiat {
        issuing_entity: &'static str,
    },
    Crypto {
        algorithm: &'static str,
        /// Identifier used by the CoinGecko price API.
        coingecko_id: &'static str,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Currency {
    pub code: &'static str,
    pub name: &'static str,
    pub kind: CurrencyKind,
}

impl Currency {
    pub fn is_crypto(&self) -> bool {
        matches!(self.kind, CurrencyKind::Crypto { .. })
    }

    pub fn coingecko_id(&self) -> Option<&'static str> {
        match self.kind {
            CurrencyKind::Crypto { coingecko_id, .. } => Some(coingecko_id),
            CurrencyKind::Fiat { .. } => None,
        }
    }

    pub fn kind_label(&self) -> &'static str {
        match self.kind {
            CurrencyKind::Fiat { .. } => "fiat",
            CurrencyKind::Crypto { .. } => "crypto",
        }
    }

    /// Human-readable one-liner, e.g. `Euro (fiat, Eurozone)`.
    pub fn describe(&self) -> String {
        match self.kind {
            CurrencyKind::Fiat { issuing_entity } => {
                format!("{} (fiat, {})", self.name, issuing_entity)
            }
            CurrencyKind::Crypto { algorithm, .. } => {
                format!("{} (crypto, {})", self.name, algorithm)
            }
        }
    }
}

const REGISTRY: &[Currency] = &[
    Currency {
        code: "USD",
        name: "US Dollar",
        kind: CurrencyKind::Fiat {
            issuing_entity: "United States",
        },
    },
    Currency {
        code: "EUR",
        name: "Euro",
        kind: CurrencyKind::Fiat {
            issuing_entity: "Eurozone",
        },
    },
    Currency {
        code: "GBP",
        name: "Pound Sterling",
        kind: CurrencyKind::Fiat {
            issuing_entity: "United Kingdom",
        },
    },
    Currency {
        code: "RUB",
        name: "Russian Ruble",
        kind: CurrencyKind::Fiat {
            issuing_entity: "Russia",
        },
    },
    Currency {
        code: "BTC",
        name: "Bitcoin",
        kind: CurrencyKind::Crypto {
            algorithm: "SHA-256",
            coingecko_id: "bitcoin",
        },
    },
    Currency {
        code: "ETH",
        name: "Ethereum",
        kind: CurrencyKind::Crypto {
            algorithm: "Ethash",
            coingecko_id: "ethereum",
        },
    },
    Currency {
        code: "SOL",
        name: "Solana",
        kind: CurrencyKind::Crypto {
            algorithm: "Proof of History",
            coingecko_id: "solana",
        },
    },
];

/// Uppercases and shape-checks a user-supplied code without consulting
/// the registry. Codes are 2 to 5 ASCII letters or digits.
pub fn normalize_code(code: &str) -> Result<String> {
    let normalized = code.trim().to_ascii_uppercase();
    let valid_shape = (2..=5).contains(&normalized.len())
        && normalized.chars().all(|c| c.is_ascii_alphanumeric());
    if !valid_shape {
        return Err(Error::UnknownCurrency {
            code: code.trim().to_string(),
        });
    }
    Ok(normalized)
}

/// Resolves a user-supplied code to its registry entry.
pub fn lookup(code: &str) -> Result<&'static Currency> {
    let normalized = normalize_code(code)?;
    REGISTRY
        .iter()
        .find(|c| c.code == normalized)
        .ok_or(Error::UnknownCurrency { code: normalized })
}

/// All registered codes, sorted for stable display.
pub fn supported_codes() -> Vec<&'static str> {
    let mut codes: Vec<_> = REGISTRY.iter().map(|c| c.code).collect();
    codes.sort_unstable();
    codes
}

/// Registered fiat codes, sorted.
pub fn fiat_codes() -> Vec<&'static str> {
    let mut codes: Vec<_> = REGISTRY
        .iter()
        .filter(|c| !c.is_crypto())
        .map(|c| c.code)
        .collect();
    codes.sort_unstable();
    codes
}

/// Registered cryptocurrencies.
pub fn cryptos() -> impl Iterator<Item = &'static Currency> {
    REGISTRY.iter().filter(|c| c.is_crypto())
}
