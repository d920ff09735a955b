use super::{commit, non_blank, ui};
use crate::core::persist::StateStore;
use crate::core::records::{InventoryRecord, new_id};
use crate::core::reporting::stock_value;
use crate::core::state::{Action, AppState};
use anyhow::{Result, bail};
use chrono::Local;
use comfy_table::Cell;
use tracing::info;

pub struct NewItem {
    pub name: String,
    pub quantity: u32,
    pub unit_cost: f64,
    pub selling_price: Option<f64>,
    pub category: Option<String>,
}

pub fn render(state: &AppState, currency: &str) -> String {
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("ID"),
        ui::header_cell("Item"),
        ui::header_cell("Category"),
        ui::header_cell("Qty"),
        ui::header_cell(&format!("Unit cost ({currency})")),
        ui::header_cell("Price"),
        ui::header_cell("Value"),
    ]);

    let mut items: Vec<&InventoryRecord> = state.inventory.iter().collect();
    items.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));
    for item in items {
        let qty = if item.quantity == 0 {
            ui::count_cell(0).fg(comfy_table::Color::Red)
        } else {
            ui::count_cell(item.quantity)
        };
        table.add_row(vec![
            Cell::new(&item.id),
            Cell::new(&item.name),
            Cell::new(item.category.as_deref().unwrap_or("")),
            qty,
            ui::money_cell(item.unit_cost),
            ui::format_optional_cell(item.selling_price, |p| format!("{p:.2}")),
            ui::money_cell(item.stock_value()),
        ]);
    }

    format!(
        "{}\n\n{}\n\n{}: {}",
        ui::style_text("Inventory", ui::StyleType::Title),
        table,
        ui::style_text(&format!("Stock value ({currency})"), ui::StyleType::TotalLabel),
        ui::style_text(
            &format!("{:.2}", stock_value(&state.inventory)),
            ui::StyleType::TotalValue
        )
    )
}

pub fn list(store: &dyn StateStore, currency: &str) -> Result<()> {
    let state = store.load()?;
    if state.inventory.is_empty() {
        println!("Inventory is empty.");
        return Ok(());
    }
    println!("{}", render(&state, currency));
    Ok(())
}

pub fn add(store: &dyn StateStore, item: NewItem) -> Result<String> {
    let name = item.name.trim().to_string();
    if name.is_empty() {
        bail!("Item name is required");
    }
    let record = InventoryRecord {
        id: new_id(),
        name,
        category: non_blank(item.category),
        quantity: item.quantity,
        unit_cost: item.unit_cost.max(0.0),
        selling_price: item.selling_price,
        acquired_on: Local::now().date_naive(),
    };
    let id = record.id.clone();
    commit(store, Action::AddInventory(record))?;
    info!(%id, "Added inventory item");
    println!("Added item {id}");
    Ok(id)
}

pub fn adjust(store: &dyn StateStore, item_id: &str, delta: i64) -> Result<()> {
    if store.load()?.item(item_id).is_none() {
        bail!("No inventory item with id {}", item_id);
    }
    let state = commit(
        store,
        Action::AdjustStock {
            item_id: item_id.to_string(),
            delta,
        },
    )?;
    if let Some(item) = state.item(item_id) {
        println!("{} now has {} in stock", item.name, item.quantity);
    }
    Ok(())
}
