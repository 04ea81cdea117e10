pub mod cli;
pub mod core;
pub mod providers;
pub mod store;

use std::sync::Arc;

use anyhow::Result;
use tracing::{debug, info};

use crate::core::audit::AuditLog;
use crate::core::config::AppConfig;
use crate::core::ledger::{Ledger, TradeSide};
use crate::core::rates::ConversionEngine;
use crate::store::{RateHistory, RateStore, WalletStore};

/// Operations the application services, decoupled from the clap
/// surface so tests can drive them directly.
#[derive(Debug, Clone)]
pub enum AppCommand {
    Deposit {
        user: String,
        currency: String,
        amount: f64,
    },
    Buy {
        user: String,
        currency: String,
        amount: f64,
        force: bool,
    },
    Sell {
        user: String,
        currency: String,
        amount: f64,
        force: bool,
    },
    ShowPortfolio {
        user: String,
        base: Option<String>,
    },
    UpdateRates {
        source: Option<String>,
    },
    ShowRates {
        currency: Option<String>,
        top: Option<usize>,
        base: Option<String>,
    },
    GetRate {
        from: String,
        to: String,
    },
}

pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    info!("fxwallet starting...");

    let config = match config_path {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    };
    debug!("Loaded config: {config:#?}");

    let settlement = core::currency::lookup(&config.base_currency)
        .map_err(cli::with_hint)?
        .code;

    let data_dir = config.data_dir()?;
    let rate_store = Arc::new(RateStore::open(
        data_dir.join("rates.json"),
        config.rates_ttl_seconds,
    ));
    let history = RateHistory::open(data_dir.join("rates_history.json"));
    let wallets = Arc::new(WalletStore::open(data_dir.join("wallets.json")));
    let audit = AuditLog::open(data_dir.join("actions.log"));
    let engine = ConversionEngine::new(Arc::clone(&rate_store));
    let ledger = Ledger::new(
        Arc::clone(&wallets),
        ConversionEngine::new(Arc::clone(&rate_store)),
        settlement,
    );

    match command {
        AppCommand::Deposit {
            user,
            currency,
            amount,
        } => cli::trade::deposit(&ledger, &audit, &user, &currency, amount).await,
        AppCommand::Buy {
            user,
            currency,
            amount,
            force,
        } => cli::trade::execute(&ledger, &audit, TradeSide::Buy, &user, &currency, amount, force)
            .await,
        AppCommand::Sell {
            user,
            currency,
            amount,
            force,
        } => {
            cli::trade::execute(&ledger, &audit, TradeSide::Sell, &user, &currency, amount, force)
                .await
        }
        AppCommand::ShowPortfolio { user, base } => {
            cli::portfolio::run(&ledger, &user, base.as_deref(), settlement).await
        }
        AppCommand::UpdateRates { source } => {
            let provider = providers::build_provider(&config, source.as_deref())?;
            cli::update::run(&rate_store, &history, &audit, provider).await
        }
        AppCommand::ShowRates {
            currency,
            top,
            base,
        } => cli::rates::show(&rate_store, currency.as_deref(), top, base.as_deref()),
        AppCommand::GetRate { from, to } => cli::rates::quote(&engine, &from, &to),
    }
}
