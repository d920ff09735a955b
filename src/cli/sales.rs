use super::{commit, ui};
use crate::core::config::AppConfig;
use crate::core::money::round2;
use crate::core::persist::StateStore;
use crate::core::records::{SaleRecord, new_id};
use crate::core::reporting::{DateWindow, line_profit, summarize_sales};
use crate::core::state::{Action, AppState};
use anyhow::{Result, anyhow, bail};
use chrono::{Local, Utc};
use comfy_table::Cell;
use tracing::{info, warn};

pub struct NewSale {
    pub item_id: String,
    pub quantity: u32,
    /// Defaults to the item's selling price.
    pub unit_price: Option<f64>,
    /// Defaults to the configured supply cost per item.
    pub supply_cost_per_unit: Option<f64>,
    pub shipping_cost_per_unit: f64,
    pub customer_id: Option<String>,
}

pub fn sell(store: &dyn StateStore, config: &AppConfig, sale: NewSale) -> Result<String> {
    let state = store.load()?;
    let item = state
        .item(&sale.item_id)
        .ok_or_else(|| anyhow!("No inventory item with id {}", sale.item_id))?;
    if sale.quantity == 0 {
        bail!("Quantity must be at least 1");
    }
    if let Some(customer_id) = &sale.customer_id {
        if state.customer(customer_id).is_none() {
            bail!("No customer with id {}", customer_id);
        }
    }
    let unit_price = sale
        .unit_price
        .or(item.selling_price)
        .ok_or_else(|| anyhow!("{} has no selling price; pass --price", item.name))?;
    if sale.quantity > item.quantity {
        warn!(
            stock = item.quantity,
            sold = sale.quantity,
            "Selling more than is in stock"
        );
    }

    let record = SaleRecord {
        id: new_id(),
        item_id: Some(item.id.clone()),
        item_name: item.name.clone(),
        category: item.category.clone(),
        quantity: sale.quantity,
        unit_price,
        total_amount: round2(unit_price * f64::from(sale.quantity)),
        unit_cost: item.unit_cost,
        supply_cost_per_unit: sale
            .supply_cost_per_unit
            .unwrap_or_else(|| config.supplies.cost_per_item()),
        shipping_cost_per_unit: sale.shipping_cost_per_unit.max(0.0),
        customer_id: sale.customer_id,
        sold_at: Utc::now(),
    };
    let id = record.id.clone();
    let profit = line_profit(&record);
    commit(store, Action::RecordSale(record))?;

    info!(%id, profit, "Recorded sale");
    println!("Recorded sale {id} (profit {profit:.2} {})", config.currency);
    Ok(id)
}

pub fn render(state: &AppState, window: DateWindow, currency: &str) -> String {
    let now = Local::now();
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("ID"),
        ui::header_cell("Date"),
        ui::header_cell("Item"),
        ui::header_cell("Qty"),
        ui::header_cell(&format!("Total ({currency})")),
        ui::header_cell("Profit"),
    ]);

    let mut sales: Vec<&SaleRecord> = state
        .sales
        .iter()
        .filter(|s| window.contains(&s.sold_at, &now))
        .collect();
    sales.sort_by_key(|s| s.sold_at);
    for sale in &sales {
        table.add_row(vec![
            Cell::new(&sale.id),
            Cell::new(sale.sold_at.with_timezone(&Local).format("%Y-%m-%d %H:%M")),
            Cell::new(&sale.item_name),
            ui::count_cell(sale.quantity),
            ui::money_cell(sale.total_amount),
            ui::profit_cell(line_profit(sale)),
        ]);
    }

    let totals = summarize_sales(&state.sales, window, &now);
    format!(
        "{}\n\n{}\n\nRevenue: {:.2} | Profit: {:.2} | Margin: {:.2}%",
        ui::style_text(&format!("Sales: {window}"), ui::StyleType::Title),
        table,
        totals.revenue,
        totals.profit,
        totals.margin_pct()
    )
}

pub fn list(store: &dyn StateStore, window: DateWindow, currency: &str) -> Result<()> {
    println!("{}", render(&store.load()?, window, currency));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::{ProvidersConfig, SuppliesConfig};
    use crate::core::records::InventoryRecord;
    use crate::store::memory::MemoryStateStore;
    use chrono::NaiveDate;

    fn config() -> AppConfig {
        AppConfig {
            currency: "PHP".to_string(),
            foreign_currency: None,
            exchange_rate: None,
            supplies: SuppliesConfig {
                cost_per_unit: 2.5,
                units_per_item: 2.0,
            },
            providers: ProvidersConfig::default(),
            data_path: None,
        }
    }

    fn store_with_item(selling_price: Option<f64>) -> MemoryStateStore {
        MemoryStateStore::with_state(AppState {
            inventory: vec![InventoryRecord {
                id: "lamp".to_string(),
                name: "Lamp".to_string(),
                category: Some("Home".to_string()),
                quantity: 2,
                unit_cost: 100.0,
                selling_price,
                acquired_on: NaiveDate::from_ymd_opt(2026, 3, 1).unwrap(),
            }],
            ..AppState::default()
        })
    }

    fn sale(quantity: u32, unit_price: Option<f64>) -> NewSale {
        NewSale {
            item_id: "lamp".to_string(),
            quantity,
            unit_price,
            supply_cost_per_unit: None,
            shipping_cost_per_unit: 20.0,
            customer_id: None,
        }
    }

    #[test]
    fn test_sale_snapshots_costs_and_decrements_stock() {
        let store = store_with_item(Some(250.0));
        let id = sell(&store, &config(), sale(1, None)).unwrap();

        let state = store.load().unwrap();
        let recorded = state.sale(&id).unwrap();
        assert_eq!(recorded.total_amount, 250.0);
        assert_eq!(recorded.unit_cost, 100.0);
        assert_eq!(recorded.supply_cost_per_unit, 5.0);
        assert_eq!(recorded.category.as_deref(), Some("Home"));
        assert_eq!(line_profit(recorded), 125.0);
        assert_eq!(state.item("lamp").unwrap().quantity, 1);
    }

    #[test]
    fn test_overselling_stops_at_zero() {
        let store = store_with_item(None);
        sell(&store, &config(), sale(5, Some(10.0))).unwrap();
        assert_eq!(store.load().unwrap().item("lamp").unwrap().quantity, 0);
    }

    #[test]
    fn test_rejects_bad_input() {
        let store = store_with_item(None);
        let err = sell(&store, &config(), sale(1, None)).unwrap_err();
        assert_eq!(err.to_string(), "Lamp has no selling price; pass --price");

        assert!(sell(&store, &config(), sale(0, Some(10.0))).is_err());

        let mut unknown = sale(1, Some(10.0));
        unknown.item_id = "nope".to_string();
        assert!(sell(&store, &config(), unknown).is_err());

        let mut stranger = sale(1, Some(10.0));
        stranger.customer_id = Some("ghost".to_string());
        assert!(sell(&store, &config(), stranger).is_err());

        assert!(store.load().unwrap().sales.is_empty());
    }
}
