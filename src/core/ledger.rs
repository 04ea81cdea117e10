//! Wallet mutations and portfolio valuation.
//!
//! Every mutation runs read-validate-commit under a per-user lock:
//! the wallet is loaded, changed in memory and only then persisted,
//! so a failed step leaves both stored and in-memory balances as
//! they were.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::Utc;
use tracing::debug;

use crate::core::currency;
use crate::core::error::{Error, Result};
use crate::core::rates::ConversionEngine;
use crate::store::WalletStore;

/// Which side of a trade is being executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TradeSide {
    Buy,
    Sell,
}

impl TradeSide {
    /// Uppercase token used in the audit log.
    pub fn label(&self) -> &'static str {
        match self {
            TradeSide::Buy => "BUY",
            TradeSide::Sell => "SELL",
        }
    }
}

/// Outcome of a deposit, with the touched balance before and after.
#[derive(Debug, Clone)]
pub struct DepositOutcome {
    pub user_id: String,
    pub currency: String,
    pub amount: f64,
    pub before: f64,
    pub after: f64,
}

/// Outcome of a committed trade.
///
/// `amount` is what the user asked to spend: settlement currency for
/// a buy, target currency for a sell. `credited` is the other side of
/// the exchange at `rate`.
#[derive(Debug, Clone)]
pub struct TradeOutcome {
    pub user_id: String,
    pub side: TradeSide,
    pub currency: String,
    pub settlement: String,
    pub amount: f64,
    pub credited: f64,
    pub rate: f64,
    pub currency_before: f64,
    pub currency_after: f64,
    pub settlement_before: f64,
    pub settlement_after: f64,
    /// True when the trade was forced through on stale rates.
    pub stale: bool,
}

/// One row of a portfolio valuation. `value` is empty when the rate
/// could not be resolved; `warning` then says why.
#[derive(Debug, Clone)]
pub struct PortfolioEntry {
    pub currency: String,
    pub balance: f64,
    pub rate: Option<f64>,
    pub value: Option<f64>,
    pub warning: Option<String>,
}

/// Valuation of one user's wallet in a base currency. `total` sums
/// the rows that could be valued; unresolvable rows are excluded and
/// carry their own warning.
#[derive(Debug)]
pub struct PortfolioView {
    pub user_id: String,
    pub base: String,
    pub entries: Vec<PortfolioEntry>,
    pub total: f64,
    pub stale: bool,
}

/// Applies deposits and trades to wallets and values portfolios.
///
/// Trades settle against a single configured currency: a buy spends
/// the settlement balance, a sell replenishes it. Rates come from the
/// conversion engine; stale rates refuse a trade unless the caller
/// explicitly allows them.
pub struct Ledger {
    wallets: Arc<WalletStore>,
    engine: ConversionEngine,
    settlement: String,
    locks: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl Ledger {
    pub fn new(
        wallets: Arc<WalletStore>,
        engine: ConversionEngine,
        settlement: impl Into<String>,
    ) -> Self {
        Self {
            wallets,
            engine,
            settlement: settlement.into(),
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// Credits external funds to the user's wallet, creating it on
    /// first use.
    pub async fn deposit(&self, user_id: &str, code: &str, amount: f64) -> Result<DepositOutcome> {
        let user = validate_user(user_id)?;
        let amount = validate_amount(amount)?;
        let currency = currency::lookup(code)?.code;

        let lock = self.wallet_lock(&user);
        let _guard = lock.lock().await;

        let mut wallet = self.wallets.get(&user);
        let before = wallet.balance(currency);
        wallet.credit(currency, amount);
        let after = wallet.balance(currency);
        self.wallets.put(wallet)?;

        debug!(user = %user, %currency, amount, "deposit committed");
        Ok(DepositOutcome {
            user_id: user,
            currency: currency.to_string(),
            amount,
            before,
            after,
        })
    }

    /// Spends `amount` of the settlement currency on `code`.
    pub async fn buy(
        &self,
        user_id: &str,
        code: &str,
        amount: f64,
        allow_stale: bool,
    ) -> Result<TradeOutcome> {
        self.trade(TradeSide::Buy, user_id, code, amount, allow_stale)
            .await
    }

    /// Sells `amount` of `code` back into the settlement currency.
    pub async fn sell(
        &self,
        user_id: &str,
        code: &str,
        amount: f64,
        allow_stale: bool,
    ) -> Result<TradeOutcome> {
        self.trade(TradeSide::Sell, user_id, code, amount, allow_stale)
            .await
    }

    async fn trade(
        &self,
        side: TradeSide,
        user_id: &str,
        code: &str,
        amount: f64,
        allow_stale: bool,
    ) -> Result<TradeOutcome> {
        let user = validate_user(user_id)?;
        let amount = validate_amount(amount)?;
        let target = currency::lookup(code)?.code;
        let settlement = self.settlement.as_str();

        // Debit the `from` side, credit the `to` side at the quoted rate.
        let (from, to) = match side {
            TradeSide::Buy => (settlement, target),
            TradeSide::Sell => (target, settlement),
        };

        let quote = self.engine.rate_with_staleness(from, to, Utc::now())?;
        if quote.stale
            && !allow_stale
            && let Some(fetched_at) = quote.fetched_at
        {
            return Err(Error::StaleRates {
                fetched_at,
                ttl_secs: self.engine.ttl_secs(),
            });
        }
        let credited = amount * quote.rate;

        let lock = self.wallet_lock(&user);
        let _guard = lock.lock().await;

        let mut wallet = self.wallets.get(&user);
        let from_before = wallet.balance(from);
        let to_before = wallet.balance(to);
        wallet.debit(from, amount)?;
        wallet.credit(to, credited);
        let from_after = wallet.balance(from);
        let to_after = wallet.balance(to);
        self.wallets.put(wallet)?;

        debug!(
            user = %user,
            side = side.label(),
            %target,
            amount,
            rate = quote.rate,
            stale = quote.stale,
            "trade committed"
        );

        let (currency_before, currency_after, settlement_before, settlement_after) = match side {
            TradeSide::Buy => (to_before, to_after, from_before, from_after),
            TradeSide::Sell => (from_before, from_after, to_before, to_after),
        };
        Ok(TradeOutcome {
            user_id: user,
            side,
            currency: target.to_string(),
            settlement: settlement.to_string(),
            amount,
            credited,
            rate: quote.rate,
            currency_before,
            currency_after,
            settlement_before,
            settlement_after,
            stale: quote.stale,
        })
    }

    /// Values the user's wallet in `base`. Currencies whose rate
    /// cannot be resolved become warning rows instead of failing the
    /// whole valuation.
    pub async fn valuate(&self, user_id: &str, base: &str) -> Result<PortfolioView> {
        let user = validate_user(user_id)?;
        let base = currency::lookup(base)?.code;

        let wallet = self.wallets.get(&user);
        let mut holdings: Vec<(String, f64)> = wallet
            .balances
            .into_iter()
            .filter(|(_, balance)| *balance > 0.0)
            .collect();
        holdings.sort_by(|a, b| a.0.cmp(&b.0));

        let mut entries = Vec::with_capacity(holdings.len());
        let mut total = 0.0;
        for (code, balance) in holdings {
            match self.engine.rate(&code, base) {
                Ok(rate) => {
                    let value = balance * rate;
                    total += value;
                    entries.push(PortfolioEntry {
                        currency: code,
                        balance,
                        rate: Some(rate),
                        value: Some(value),
                        warning: None,
                    });
                }
                Err(e) => entries.push(PortfolioEntry {
                    currency: code,
                    balance,
                    rate: None,
                    value: None,
                    warning: Some(e.to_string()),
                }),
            }
        }

        Ok(PortfolioView {
            user_id: user,
            base: base.to_string(),
            entries,
            total,
            stale: self.engine.snapshot_stale(Utc::now()),
        })
    }

    fn wallet_lock(&self, user_id: &str) -> Arc<tokio::sync::Mutex<()>> {
        self.locks
            .lock()
            .unwrap()
            .entry(user_id.to_string())
            .or_default()
            .clone()
    }
}

fn validate_user(user_id: &str) -> Result<String> {
    let trimmed = user_id.trim();
    if trimmed.is_empty() {
        return Err(Error::InvalidUser);
    }
    Ok(trimmed.to_string())
}

fn validate_amount(amount: f64) -> Result<f64> {
    if !amount.is_finite() || amount <= 0.0 {
        return Err(Error::InvalidAmount { amount });
    }
    Ok(amount)
}
