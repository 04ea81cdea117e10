//! Command implementations and terminal rendering.

pub mod portfolio;
pub mod rates;
pub mod setup;
pub mod trade;
pub mod ui;
pub mod update;

use crate::core::currency;
use crate::core::error::Error;

/// Wraps a core error with the follow-up a terminal user needs, e.g.
/// the supported currency list after an unknown code.
pub(crate) fn with_hint(err: Error) -> anyhow::Error {
    let hint = match &err {
        Error::UnknownCurrency { .. } => Some(format!(
            "supported currencies: {}",
            currency::supported_codes().join(", ")
        )),
        Error::StaleRates { .. } => {
            Some("run `fxwallet update-rates` or pass --force to trade on stale rates".to_string())
        }
        Error::ProviderUnavailable { .. } => {
            Some("check your network connection and try again".to_string())
        }
        Error::ProviderAuthError { .. } => {
            Some("check the provider API key environment variables".to_string())
        }
        _ => None,
    };
    match hint {
        Some(hint) => anyhow::anyhow!("{err}\n  hint: {hint}"),
        None => err.into(),
    }
}
