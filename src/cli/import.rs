use super::{commit, ui};
use crate::core::allocation::{Allocation, CostBatch, DraftLineItem, allocate};
use crate::core::config::AppConfig;
use crate::core::currency::CurrencyRateProvider;
use crate::core::money;
use crate::core::persist::StateStore;
use crate::core::state::Action;
use anyhow::{Context, Result, anyhow, bail};
use chrono::Local;
use comfy_table::Cell;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

pub struct ImportOptions {
    pub batch_path: PathBuf,
    pub confirm: bool,
    pub fetch_rate: bool,
    /// `item=cost` pairs pinning a manual unit cost (foreign currency).
    pub manual: Vec<String>,
    /// Items to return to automatic allocation.
    pub auto: Vec<String>,
}

pub fn load_batch(path: &Path) -> Result<CostBatch> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read batch file: {}", path.display()))?;
    serde_yaml::from_str(&content)
        .with_context(|| format!("Failed to parse batch file: {}", path.display()))
}

pub fn save_batch(path: &Path, batch: &CostBatch) -> Result<()> {
    let content = serde_yaml::to_string(batch).context("Failed to serialize batch")?;
    std::fs::write(path, content)
        .with_context(|| format!("Failed to write batch file: {}", path.display()))
}

fn find_item<'a>(batch: &'a mut CostBatch, key: &str) -> Result<&'a mut DraftLineItem> {
    let key = key.trim();
    batch
        .items
        .iter_mut()
        .find(|item| item.id == key || item.name.eq_ignore_ascii_case(key))
        .ok_or_else(|| anyhow!("No item '{}' in batch", key))
}

/// Applies `--manual item=cost` and `--auto item` edits. Returns whether
/// anything changed.
pub fn apply_overrides(batch: &mut CostBatch, manual: &[String], auto: &[String]) -> Result<bool> {
    for entry in manual {
        let (key, cost) = entry
            .rsplit_once('=')
            .ok_or_else(|| anyhow!("Expected item=cost, got '{}'", entry))?;
        let cost = money::normalize_amount(cost);
        find_item(batch, key)?.set_manual_cost(cost);
    }
    for key in auto {
        find_item(batch, key)?.clear_manual_cost();
    }
    Ok(!manual.is_empty() || !auto.is_empty())
}

/// Fills a missing batch rate from the rate provider (when asked to) or
/// from the configured default.
pub async fn resolve_rate(
    batch: &mut CostBatch,
    config: &AppConfig,
    rates: &dyn CurrencyRateProvider,
    fetch: bool,
) -> Result<()> {
    if money::finite(batch.exchange_rate).is_some() {
        return Ok(());
    }
    if fetch {
        let foreign = config
            .foreign_currency
            .as_deref()
            .ok_or_else(|| anyhow!("foreign_currency is not configured"))?;
        let pb = ui::new_spinner(&format!("Fetching {foreign}/{} rate...", config.currency));
        let rate = rates.get_rate(foreign, &config.currency).await;
        pb.finish_and_clear();
        batch.exchange_rate = Some(rate?);
    } else {
        batch.exchange_rate = config.exchange_rate;
    }
    debug!(rate = ?batch.exchange_rate, "Resolved batch rate");
    Ok(())
}

pub fn render_preview(
    batch: &CostBatch,
    allocation: &Allocation,
    currency: &str,
    foreign_currency: &str,
) -> String {
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Item"),
        ui::header_cell("Qty"),
        ui::header_cell("Cost"),
        ui::header_cell(&format!("Unit ({foreign_currency})")),
        ui::header_cell(&format!("Landed ({currency})")),
        ui::header_cell(&format!("Total ({currency})")),
    ]);

    for item in &allocation.items {
        let mode = if item.is_manual_cost {
            "manual"
        } else {
            "auto"
        };
        table.add_row(vec![
            Cell::new(&item.name),
            ui::count_cell(item.quantity),
            Cell::new(mode),
            ui::money_cell(item.effective_unit_cost_foreign),
            ui::money_cell(item.net_unit_cost_local),
            ui::money_cell(item.net_unit_cost_local * f64::from(item.quantity)),
        ]);
    }

    let total = money::finite(batch.total_cost_foreign).unwrap_or(0.0);
    let rate = money::usable_rate(batch.exchange_rate);
    let mut output = format!(
        "{}\n\n",
        ui::style_text("Batch preview", ui::StyleType::Title)
    );
    output.push_str(&table.to_string());
    output.push_str(&format!(
        "\n\nBatch total: {total:.2} {foreign_currency} @ {rate} | Supplies/item: {:.2} {currency}",
        money::finite(batch.supply_cost_per_item_local).unwrap_or(0.0)
    ));
    output.push_str(&format!(
        "\nManual: {:.2} | Pool: {:.2} over {} units ({:.2}/unit)",
        allocation.manual_consumed_foreign,
        allocation.remaining_pool_foreign,
        allocation.auto_unit_count,
        allocation.auto_unit_cost_foreign
    ));
    if allocation.manual_consumed_foreign > total {
        output.push_str(&format!(
            "\n{}",
            ui::style_text(
                "Manual costs exceed the batch total; automatic items get nothing",
                ui::StyleType::Error
            )
        ));
    }
    if rate == 0.0 {
        output.push_str(&format!(
            "\n{}",
            ui::style_text("No exchange rate set; costs convert to 0", ui::StyleType::Error)
        ));
    }
    output.push_str(&format!(
        "\n\n{}: {}",
        ui::style_text(&format!("Landed total ({currency})"), ui::StyleType::TotalLabel),
        ui::style_text(
            &format!("{:.2}", allocation.total_landed_local()),
            ui::StyleType::TotalValue
        )
    ));
    output
}

pub async fn run(
    store: &dyn StateStore,
    config: &AppConfig,
    rates: &dyn CurrencyRateProvider,
    options: ImportOptions,
) -> Result<()> {
    let mut batch = load_batch(&options.batch_path)?;
    if batch.items.is_empty() {
        bail!("Batch {} has no items", options.batch_path.display());
    }

    if apply_overrides(&mut batch, &options.manual, &options.auto)? {
        save_batch(&options.batch_path, &batch)?;
        info!("Updated batch file {}", options.batch_path.display());
    }

    resolve_rate(&mut batch, config, rates, options.fetch_rate).await?;
    if money::finite(batch.supply_cost_per_item_local).is_none() {
        batch.supply_cost_per_item_local = Some(config.supplies.cost_per_item());
    }

    let allocation = allocate(&batch);
    let foreign = config.foreign_currency.as_deref().unwrap_or("foreign");
    println!(
        "{}",
        render_preview(&batch, &allocation, &config.currency, foreign)
    );

    if !options.confirm {
        println!(
            "\n{}",
            ui::style_text(
                "Preview only. Re-run with --confirm to add these items to inventory.",
                ui::StyleType::Subtle
            )
        );
        return Ok(());
    }

    if allocation.manual_consumed_foreign > money::finite(batch.total_cost_foreign).unwrap_or(0.0) {
        warn!("Importing a batch whose manual costs exceed its total");
    }
    let state = store.load()?;
    let already: Vec<&str> = batch
        .items
        .iter()
        .filter(|item| state.item(&item.id).is_some())
        .map(|item| item.id.as_str())
        .collect();
    if !already.is_empty() {
        bail!(
            "Batch {} was already imported (items in inventory: {})",
            options.batch_path.display(),
            already.join(", ")
        );
    }

    let records = allocation.into_inventory(&batch, Local::now().date_naive());
    let count = records.len();
    commit(store, Action::ImportBatch(records))?;
    info!(count, "Imported batch");
    println!("Added {count} items to inventory.");
    Ok(())
}
