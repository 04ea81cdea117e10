use anyhow::Result;

use super::ui;
use crate::core::audit::AuditLog;
use crate::core::rates::{RateHistoryEntry, RateProvider};
use crate::store::{RateHistory, RateStore};

/// Fetches fresh rates from one provider and replaces the cached
/// snapshot. The snapshot replace is all-or-nothing; the history
/// append afterwards is best-effort and never rolls it back.
pub async fn run(
    store: &RateStore,
    history: &RateHistory,
    audit: &AuditLog,
    provider: Box<dyn RateProvider>,
) -> Result<()> {
    let spinner = ui::new_spinner(format!("Fetching rates from {}...", provider.source_id()));
    let fetched = provider.fetch_rates().await;
    spinner.finish_and_clear();

    let snapshot = fetched.map_err(super::with_hint)?;
    store.replace(snapshot.clone()).map_err(super::with_hint)?;
    history.append(RateHistoryEntry {
        snapshot: snapshot.clone(),
        source: provider.source_id().to_string(),
    });
    audit.record(
        "UPDATE_RATES",
        &format!(
            "source={} base={} currencies={}",
            provider.source_id(),
            snapshot.base,
            snapshot.rates.len()
        ),
    );

    println!(
        "Updated {} rates from '{}' (base {}, fetched {})",
        snapshot.rates.len(),
        provider.source_id(),
        snapshot.base,
        snapshot.fetched_at.format("%Y-%m-%d %H:%M:%S UTC")
    );
    Ok(())
}
