//! Per-user wallet balances, mirrored to a JSON file.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::core::error::{Error, Result};
use crate::store;

/// Balances one user holds, keyed by currency code. A code absent
/// from the mapping is a zero balance; balances never go negative.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Wallet {
    pub user_id: String,
    #[serde(default)]
    pub balances: HashMap<String, f64>,
}

impl Wallet {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            balances: HashMap::new(),
        }
    }

    pub fn balance(&self, code: &str) -> f64 {
        self.balances.get(code).copied().unwrap_or(0.0)
    }

    pub fn credit(&mut self, code: &str, amount: f64) {
        *self.balances.entry(code.to_string()).or_insert(0.0) += amount;
    }

    /// Removes `amount` of `code`, failing before any change when the
    /// balance would go negative.
    pub fn debit(&mut self, code: &str, amount: f64) -> Result<()> {
        let available = self.balance(code);
        if amount > available {
            return Err(Error::InsufficientFunds {
                currency: code.to_string(),
                required: amount,
                available,
            });
        }
        self.balances.insert(code.to_string(), available - amount);
        Ok(())
    }
}

/// All known wallets keyed by user id. `put` replaces one record and
/// persists the whole file; memory rolls back if the write fails so
/// callers never observe an unpersisted balance.
pub struct WalletStore {
    path: PathBuf,
    wallets: Mutex<HashMap<String, Wallet>>,
}

impl WalletStore {
    /// Opens the store, loading existing records. An unreadable file
    /// is treated as empty.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let records: Vec<Wallet> = match store::read_json(&path) {
            Ok(records) => records.unwrap_or_default(),
            Err(e) => {
                warn!("ignoring unreadable wallet state {}: {e}", path.display());
                Vec::new()
            }
        };
        let wallets = records.into_iter().map(|w| (w.user_id.clone(), w)).collect();
        Self {
            path,
            wallets: Mutex::new(wallets),
        }
    }

    /// The user's wallet, or a fresh empty one if none is stored yet.
    pub fn get(&self, user_id: &str) -> Wallet {
        self.wallets
            .lock()
            .unwrap()
            .get(user_id)
            .cloned()
            .unwrap_or_else(|| Wallet::new(user_id))
    }

    /// Replaces the stored record for the wallet's user and persists.
    pub fn put(&self, wallet: Wallet) -> Result<()> {
        let user_id = wallet.user_id.clone();
        let mut wallets = self.wallets.lock().unwrap();
        let prior = wallets.insert(user_id.clone(), wallet);

        let mut records: Vec<&Wallet> = wallets.values().collect();
        records.sort_by_key(|w| w.user_id.clone());

        if let Err(e) = store::write_json_atomic(&self.path, &records) {
            match prior {
                Some(prior) => wallets.insert(user_id, prior),
                None => wallets.remove(&user_id),
            };
            return Err(Error::PersistenceFailure {
                what: "wallet state".to_string(),
                reason: e.to_string(),
            });
        }
        debug!(user = %user_id, "wallet persisted");
        Ok(())
    }
}
