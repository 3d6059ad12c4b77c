use super::ui;
use crate::core::{CurrencyCode, RateEntry, RateStore};
use anyhow::{Context, Result};
use comfy_table::Cell;
use rust_decimal::Decimal;

/// Renders the rate table, one row per currency.
pub fn display_as_table(entries: &[RateEntry], base: &CurrencyCode) -> String {
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Currency"),
        ui::header_cell(&format!("Rate (per {base})")),
        ui::header_cell(&format!("{base} per unit")),
        ui::header_cell("Updated (UTC)"),
    ]);

    for entry in entries {
        let name = if &entry.code == base {
            format!("{} {}", entry.code, ui::style_text("(base)", ui::StyleType::Subtle))
        } else {
            entry.code.to_string()
        };
        let inverse = Decimal::ONE
            .checked_div(entry.rate)
            .map_or("N/A".to_string(), |v| v.round_dp(6).normalize().to_string());

        table.add_row(vec![
            Cell::new(name),
            ui::number_cell(entry.rate),
            ui::number_cell(inverse),
            Cell::new(entry.updated_at.format("%Y-%m-%d %H:%M:%S")),
        ]);
    }

    format!(
        "Rates: {}\n\n{}",
        ui::style_text(&base.to_string(), ui::StyleType::Title),
        table
    )
}

pub async fn run(store: &dyn RateStore, json: bool) -> Result<()> {
    let entries = store.entries().await?;
    if json {
        let output =
            serde_json::to_string_pretty(&entries).context("Failed to serialize rate table")?;
        println!("{output}");
    } else {
        println!("{}", display_as_table(&entries, store.base()));
    }
    Ok(())
}
