//! Core business logic abstractions

pub mod audit;
pub mod config;
pub mod currency;
pub mod error;
pub mod ledger;
pub mod log;
pub mod rates;

// Re-export main types for cleaner imports
pub use error::{Error, Result};
pub use ledger::{DepositOutcome, Ledger, PortfolioView, TradeOutcome, TradeSide};
pub use rates::{ConversionEngine, RateHistoryEntry, RateProvider, RateQuote, RateSnapshot};
