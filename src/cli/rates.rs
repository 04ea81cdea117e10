use anyhow::Result;
use chrono::Utc;
use comfy_table::Cell;

use super::ui;
use crate::core::currency;
use crate::core::error::Result as CoreResult;
use crate::core::rates::{ConversionEngine, RateSnapshot};
use crate::store::RateStore;

/// One display row: the value of 1 unit of `code` in the view base.
#[derive(Debug)]
struct RateRow {
    code: String,
    rate: f64,
}

/// Builds display rows from a snapshot. Unfiltered listings cover
/// every quoted currency (plus the snapshot base when viewing in a
/// different base); rows sort by rate descending, then code.
fn build_rows(
    snapshot: &RateSnapshot,
    filter: Option<&str>,
    top: Option<usize>,
    view_base: &str,
) -> CoreResult<Vec<RateRow>> {
    let codes: Vec<String> = match filter {
        Some(code) => vec![code.to_string()],
        None => {
            let mut codes: Vec<String> = snapshot.rates.keys().cloned().collect();
            if snapshot.base != view_base {
                codes.push(snapshot.base.clone());
            }
            codes.retain(|c| c != view_base);
            codes
        }
    };

    let mut rows = Vec::with_capacity(codes.len());
    for code in codes {
        let rate = snapshot.convert(&code, view_base)?;
        rows.push(RateRow { code, rate });
    }
    rows.sort_by(|a, b| {
        b.rate
            .partial_cmp(&a.rate)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.code.cmp(&b.code))
    });
    if let Some(top) = top {
        rows.truncate(top);
    }
    Ok(rows)
}

pub fn show(
    store: &RateStore,
    filter: Option<&str>,
    top: Option<usize>,
    base: Option<&str>,
) -> Result<()> {
    let snapshot = store.get_snapshot().map_err(super::with_hint)?;

    let view_base = match base {
        Some(code) => currency::lookup(code).map_err(super::with_hint)?.code,
        None => snapshot.base.as_str(),
    }
    .to_string();
    let filter = match filter {
        Some(code) => Some(currency::normalize_code(code).map_err(super::with_hint)?),
        None => None,
    };

    if let Some(code) = &filter
        && let Ok(known) = currency::lookup(code)
    {
        println!("{}", known.describe());
    }

    let rows = build_rows(&snapshot, filter.as_deref(), top, &view_base)
        .map_err(super::with_hint)?;

    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Currency"),
        ui::header_cell("Name"),
        ui::header_cell("Kind"),
        ui::header_cell(&format!("1 unit in {view_base}")),
    ]);
    for row in &rows {
        let known = currency::lookup(&row.code).ok();
        table.add_row(vec![
            Cell::new(&row.code),
            Cell::new(known.map_or("-", |c| c.name)),
            Cell::new(known.map_or("-", |c| c.kind_label())),
            ui::format_optional_cell(Some(row.rate), |r| format!("{r:.6}")),
        ]);
    }
    println!("{table}");

    println!(
        "{}",
        ui::style_text(
            &format!(
                "Fetched at {} (base {})",
                snapshot.fetched_at.format("%Y-%m-%d %H:%M:%S UTC"),
                snapshot.base
            ),
            ui::StyleType::Subtle
        )
    );
    if snapshot.is_stale(Utc::now(), store.ttl_secs()) {
        ui::print_warning("rates are stale; run `fxwallet update-rates` to refresh");
    }
    Ok(())
}

pub fn quote(engine: &ConversionEngine, from: &str, to: &str) -> Result<()> {
    let from = currency::lookup(from).map_err(super::with_hint)?.code;
    let to = currency::lookup(to).map_err(super::with_hint)?.code;

    let now = Utc::now();
    let quote = engine
        .rate_with_staleness(from, to, now)
        .map_err(super::with_hint)?;
    let inverse = engine
        .rate_with_staleness(to, from, now)
        .map_err(super::with_hint)?;

    println!("1 {} = {:.6} {}", quote.from, quote.rate, quote.to);
    println!("1 {} = {:.6} {}", inverse.from, inverse.rate, inverse.to);
    if let Some(fetched_at) = quote.fetched_at {
        println!(
            "{}",
            ui::style_text(
                &format!("Fetched at {}", fetched_at.format("%Y-%m-%d %H:%M:%S UTC")),
                ui::StyleType::Subtle
            )
        );
    }
    if quote.stale {
        ui::print_warning("rates are stale; run `fxwallet update-rates` to refresh");
    }
    Ok(())
}
