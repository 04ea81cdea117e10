//! Exchange-rate snapshots and conversion routing.
//!
//! All conversions route through a single base currency: a snapshot
//! stores how many units of each currency one unit of the base buys,
//! and any cross rate is derived from two base rates. Multi-hop
//! routing across differently-based snapshots is out of scope.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::core::error::{Error, Result};
use crate::store::RateStore;

/// One complete set of rates quoted against a single base currency,
/// fetched from one source at one point in time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateSnapshot {
    pub base: String,
    /// Units of each currency bought by 1 unit of `base`. Rates are
    /// always positive.
    pub rates: HashMap<String, f64>,
    pub fetched_at: DateTime<Utc>,
}

impl RateSnapshot {
    /// Conversion factor from `from` to `to`. Identical codes resolve
    /// to 1.0; anything else routes through the base currency.
    pub fn convert(&self, from: &str, to: &str) -> Result<f64> {
        if from == to {
            return Ok(1.0);
        }
        // rate(from, to) = rate(base, to) / rate(base, from)
        Ok(self.per_base(to)? / self.per_base(from)?)
    }

    /// Units of `code` per 1 unit of the base currency.
    fn per_base(&self, code: &str) -> Result<f64> {
        if code == self.base {
            return Ok(1.0);
        }
        self.rates
            .get(code)
            .copied()
            .filter(|rate| *rate > 0.0)
            .ok_or_else(|| Error::UnknownCurrency {
                code: code.to_string(),
            })
    }

    /// Age-based staleness. The cutoff is exclusive, so a snapshot
    /// exactly `ttl_secs` old is still fresh.
    pub fn is_stale(&self, now: DateTime<Utc>, ttl_secs: u64) -> bool {
        now - self.fetched_at > Duration::seconds(ttl_secs as i64)
    }
}

/// One archived snapshot together with the provider that produced it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateHistoryEntry {
    pub snapshot: RateSnapshot,
    pub source: String,
}

/// A resolved conversion plus the snapshot metadata callers need to
/// decide how to treat staleness. `fetched_at` is `None` for identity
/// quotes, which never consult a snapshot.
#[derive(Debug, Clone)]
pub struct RateQuote {
    pub from: String,
    pub to: String,
    pub rate: f64,
    pub fetched_at: Option<DateTime<Utc>>,
    pub stale: bool,
}

/// A single external rate source.
///
/// Implementations normalize their response schema into a
/// [`RateSnapshot`] quoted against one base currency. They never
/// retry and never touch the stores; orchestration happens above.
#[async_trait]
pub trait RateProvider: Send + Sync + std::fmt::Debug {
    /// Stable identifier recorded in rate history, e.g. `"coingecko"`.
    fn source_id(&self) -> &'static str;

    /// Fetch the latest rates from the remote API.
    async fn fetch_rates(&self) -> Result<RateSnapshot>;
}

/// Resolves conversion factors from the store's current snapshot.
pub struct ConversionEngine {
    store: Arc<RateStore>,
}

impl ConversionEngine {
    pub fn new(store: Arc<RateStore>) -> Self {
        Self { store }
    }

    pub fn ttl_secs(&self) -> u64 {
        self.store.ttl_secs()
    }

    /// Conversion factor between two currency codes. Identical codes
    /// resolve to 1.0 without consulting the store, so identity
    /// conversions keep working when no snapshot exists.
    pub fn rate(&self, from: &str, to: &str) -> Result<f64> {
        if from == to {
            return Ok(1.0);
        }
        self.store.get_snapshot()?.convert(from, to)
    }

    /// Like [`Self::rate`], but also reports whether the snapshot was
    /// stale at `now`. Staleness is advisory; callers decide whether
    /// to warn or refuse.
    pub fn rate_with_staleness(
        &self,
        from: &str,
        to: &str,
        now: DateTime<Utc>,
    ) -> Result<RateQuote> {
        if from == to {
            return Ok(RateQuote {
                from: from.to_string(),
                to: to.to_string(),
                rate: 1.0,
                fetched_at: None,
                stale: false,
            });
        }
        let snapshot = self.store.get_snapshot()?;
        let rate = snapshot.convert(from, to)?;
        Ok(RateQuote {
            from: from.to_string(),
            to: to.to_string(),
            rate,
            fetched_at: Some(snapshot.fetched_at),
            stale: snapshot.is_stale(now, self.store.ttl_secs()),
        })
    }

    /// Staleness of the current snapshot. A missing snapshot reports
    /// `false`; its absence surfaces through rate resolution instead.
    pub fn snapshot_stale(&self, now: DateTime<Utc>) -> bool {
        self.store.is_stale(now).unwrap_or(false)
    }
}
