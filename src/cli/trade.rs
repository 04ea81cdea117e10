use anyhow::Result;

use super::ui;
use crate::core::audit::AuditLog;
use crate::core::ledger::{Ledger, TradeSide};

pub async fn deposit(
    ledger: &Ledger,
    audit: &AuditLog,
    user: &str,
    currency: &str,
    amount: f64,
) -> Result<()> {
    let outcome = ledger
        .deposit(user, currency, amount)
        .await
        .map_err(super::with_hint)?;

    audit.record(
        "DEPOSIT",
        &format!(
            "user={} currency={} amount={:.4} balance={:.4}->{:.4}",
            outcome.user_id, outcome.currency, outcome.amount, outcome.before, outcome.after
        ),
    );

    println!(
        "Deposited {:.4} {} for {}",
        outcome.amount, outcome.currency, outcome.user_id
    );
    println!(
        "- {}: {:.4} -> {:.4}",
        outcome.currency, outcome.before, outcome.after
    );
    Ok(())
}

pub async fn execute(
    ledger: &Ledger,
    audit: &AuditLog,
    side: TradeSide,
    user: &str,
    currency: &str,
    amount: f64,
    force: bool,
) -> Result<()> {
    let outcome = match side {
        TradeSide::Buy => ledger.buy(user, currency, amount, force).await,
        TradeSide::Sell => ledger.sell(user, currency, amount, force).await,
    }
    .map_err(super::with_hint)?;

    audit.record(
        side.label(),
        &format!(
            "user={} currency={} amount={:.4} rate={:.6} credited={:.4} {}={:.4}->{:.4} {}={:.4}->{:.4} stale={}",
            outcome.user_id,
            outcome.currency,
            outcome.amount,
            outcome.rate,
            outcome.credited,
            outcome.currency,
            outcome.currency_before,
            outcome.currency_after,
            outcome.settlement,
            outcome.settlement_before,
            outcome.settlement_after,
            outcome.stale
        ),
    );

    match side {
        TradeSide::Buy => println!(
            "Bought {:.4} {} for {:.4} {} (rate {:.6})",
            outcome.credited, outcome.currency, outcome.amount, outcome.settlement, outcome.rate
        ),
        TradeSide::Sell => println!(
            "Sold {:.4} {} for {:.4} {} (rate {:.6})",
            outcome.amount, outcome.currency, outcome.credited, outcome.settlement, outcome.rate
        ),
    }
    println!(
        "- {}: {:.4} -> {:.4}",
        outcome.currency, outcome.currency_before, outcome.currency_after
    );
    if outcome.settlement != outcome.currency {
        println!(
            "- {}: {:.4} -> {:.4}",
            outcome.settlement, outcome.settlement_before, outcome.settlement_after
        );
    }
    if outcome.stale {
        ui::print_warning("trade executed on stale rates");
    }
    Ok(())
}
