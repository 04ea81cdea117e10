//! Error taxonomy shared by the ledger, stores and providers.

use chrono::{DateTime, Utc};
use thiserror::Error;

/// Failures a command can surface. Provider variants carry the source
/// identifier so multi-source setups stay diagnosable.
#[derive(Error, Debug)]
pub enum Error {
    #[error("no exchange rates available yet; run `update-rates` first")]
    NoRatesAvailable,

    #[error("exchange rates are stale (fetched {fetched_at}, ttl {ttl_secs}s)")]
    StaleRates {
        fetched_at: DateTime<Utc>,
        ttl_secs: u64,
    },

    #[error("unknown currency '{code}'")]
    UnknownCurrency { code: String },

    #[error(
        "insufficient funds: required {required:.4} {currency}, available {available:.4} {currency}"
    )]
    InsufficientFunds {
        currency: String,
        required: f64,
        available: f64,
    },

    #[error("amount must be a positive number, got {amount}")]
    InvalidAmount { amount: f64 },

    #[error("user id must not be empty")]
    InvalidUser,

    #[error("provider '{provider}' is unavailable: {reason}")]
    ProviderUnavailable { provider: String, reason: String },

    #[error("provider '{provider}' rejected the API key: {reason}")]
    ProviderAuthError { provider: String, reason: String },

    #[error("provider '{provider}' returned a malformed response: {reason}")]
    ProviderMalformedResponse { provider: String, reason: String },

    #[error("failed to persist {what}: {reason}")]
    PersistenceFailure { what: String, reason: String },
}

pub type Result<T> = std::result::Result<T, Error>;
