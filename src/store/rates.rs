//! Current-snapshot cache with TTL staleness and atomic replace.

use std::path::PathBuf;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::core::error::{Error, Result};
use crate::core::rates::RateSnapshot;
use crate::store;

/// Owns the single current [`RateSnapshot`], mirrored to a JSON file.
///
/// The in-memory value only advances once the file write succeeds, so
/// the store never reports a snapshot that was not durably saved.
pub struct RateStore {
    path: PathBuf,
    ttl_secs: u64,
    current: Mutex<Option<RateSnapshot>>,
}

impl RateStore {
    /// Opens the store, loading the last persisted snapshot if one
    /// exists. An unreadable cache file is treated as empty.
    pub fn open(path: impl Into<PathBuf>, ttl_secs: u64) -> Self {
        let path = path.into();
        let current = match store::read_json::<RateSnapshot>(&path) {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!("ignoring unreadable rate cache {}: {e}", path.display());
                None
            }
        };
        Self {
            path,
            ttl_secs,
            current: Mutex::new(current),
        }
    }

    pub fn ttl_secs(&self) -> u64 {
        self.ttl_secs
    }

    /// The last successfully fetched snapshot.
    pub fn get_snapshot(&self) -> Result<RateSnapshot> {
        self.current
            .lock()
            .unwrap()
            .clone()
            .ok_or(Error::NoRatesAvailable)
    }

    /// Whether the current snapshot is older than the TTL at `now`.
    /// Advisory; callers decide whether to warn or refuse.
    pub fn is_stale(&self, now: DateTime<Utc>) -> Result<bool> {
        Ok(self.get_snapshot()?.is_stale(now, self.ttl_secs))
    }

    /// Replaces the current snapshot, all or nothing. If the write
    /// does not reach disk the prior snapshot stays in effect.
    pub fn replace(&self, snapshot: RateSnapshot) -> Result<()> {
        let mut current = self.current.lock().unwrap();
        if let Err(e) = store::write_json_atomic(&self.path, &snapshot) {
            return Err(Error::PersistenceFailure {
                what: "rate cache".to_string(),
                reason: e.to_string(),
            });
        }
        debug!(
            path = %self.path.display(),
            currencies = snapshot.rates.len(),
            "rate snapshot persisted"
        );
        *current = Some(snapshot);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::fs;
    use tempfile::tempdir;

    fn snapshot(eur: f64) -> RateSnapshot {
        RateSnapshot {
            base: "USD".to_string(),
            rates: HashMap::from([("EUR".to_string(), eur)]),
            fetched_at: Utc::now(),
        }
    }

    #[test]
    fn empty_store_has_no_snapshot() {
        let dir = tempdir().unwrap();
        let store = RateStore::open(dir.path().join("rates.json"), 300);
        assert!(matches!(store.get_snapshot(), Err(Error::NoRatesAvailable)));
        assert!(matches!(
            store.is_stale(Utc::now()),
            Err(Error::NoRatesAvailable)
        ));
    }

    #[test]
    fn replace_persists_across_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("rates.json");

        let store = RateStore::open(&path, 300);
        store.replace(snapshot(0.9)).unwrap();

        let reopened = RateStore::open(&path, 300);
        let loaded = reopened.get_snapshot().unwrap();
        assert_eq!(loaded.rates["EUR"], 0.9);
    }

    #[test]
    fn failed_replace_keeps_the_prior_snapshot() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("rates.json");

        let store = RateStore::open(&path, 300);
        store.replace(snapshot(0.9)).unwrap();

        // A directory squatting on the temp path fails the next write.
        fs::create_dir(dir.path().join("rates.json.tmp")).unwrap();
        let err = store.replace(snapshot(0.5)).unwrap_err();
        assert!(matches!(err, Error::PersistenceFailure { .. }));

        assert_eq!(store.get_snapshot().unwrap().rates["EUR"], 0.9);
        let reopened = RateStore::open(&path, 300);
        assert_eq!(reopened.get_snapshot().unwrap().rates["EUR"], 0.9);
    }

    #[test]
    fn corrupt_cache_file_is_ignored_on_open() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("rates.json");
        fs::write(&path, b"{ truncated").unwrap();

        let store = RateStore::open(&path, 300);
        assert!(matches!(store.get_snapshot(), Err(Error::NoRatesAvailable)));
    }

    #[test]
    fn staleness_follows_the_configured_ttl() {
        let dir = tempdir().unwrap();
        let store = RateStore::open(dir.path().join("rates.json"), 60);

        let mut snap = snapshot(0.9);
        snap.fetched_at = Utc::now() - chrono::Duration::seconds(120);
        store.replace(snap).unwrap();

        assert!(store.is_stale(Utc::now()).unwrap());

        store.replace(snapshot(0.9)).unwrap();
        assert!(!store.is_stale(Utc::now()).unwrap());
    }
}
