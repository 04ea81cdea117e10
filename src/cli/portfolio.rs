use anyhow::Result;
use comfy_table::Cell;

use super::ui;
use crate::core::ledger::Ledger;

pub async fn run(ledger: &Ledger, user: &str, base: Option<&str>, default_base: &str) -> Result<()> {
    let base = base.unwrap_or(default_base);
    let view = ledger.valuate(user, base).await.map_err(super::with_hint)?;

    println!(
        "Portfolio: {}\n",
        ui::style_text(&view.user_id, ui::StyleType::Title)
    );

    if view.entries.is_empty() {
        println!("No balances yet. Use `fxwallet deposit` to add funds.");
        return Ok(());
    }

    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Currency"),
        ui::header_cell("Balance"),
        ui::header_cell(&format!("Rate ({})", view.base)),
        ui::header_cell(&format!("Value ({})", view.base)),
    ]);

    for entry in &view.entries {
        table.add_row(vec![
            Cell::new(&entry.currency),
            ui::format_optional_cell(Some(entry.balance), |b| format!("{b:.4}")),
            ui::format_optional_cell(entry.rate, |r| format!("{r:.6}")),
            ui::format_optional_cell(entry.value, |v| format!("{v:.2}")),
        ]);
    }
    println!("{table}");

    println!(
        "\nTotal Value ({}): {}",
        ui::style_text(&view.base, ui::StyleType::TotalLabel),
        ui::style_text(&format!("{:.2}", view.total), ui::StyleType::TotalValue)
    );

    for entry in &view.entries {
        if let Some(warning) = &entry.warning {
            ui::print_warning(&format!("{} not valued: {warning}", entry.currency));
        }
    }
    if view.stale {
        ui::print_warning("rates are stale; run `fxwallet update-rates` to refresh");
    }
    Ok(())
}
