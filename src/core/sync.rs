//! One-way push of flattened records to a spreadsheet backend.

use crate::core::money::round2;
use crate::core::reporting::{line_cost, line_profit};
use crate::core::state::AppState;
use anyhow::Result;
use async_trait::async_trait;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SaleRow {
    pub id: String,
    pub date: String,
    pub item: String,
    pub category: String,
    pub quantity: u32,
    pub unit_price: f64,
    pub total_amount: f64,
    pub cost: f64,
    pub profit: f64,
    pub customer: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InventoryRow {
    pub id: String,
    pub name: String,
    pub category: String,
    pub quantity: u32,
    pub unit_cost: f64,
    pub selling_price: Option<f64>,
    pub stock_value: f64,
    pub acquired_on: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExpenseRow {
    pub id: String,
    pub date: String,
    pub category: String,
    pub amount: f64,
    pub note: String,
}

/// All rows for one push, one vector per sheet.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SyncPayload {
    pub sales: Vec<SaleRow>,
    pub inventory: Vec<InventoryRow>,
    pub expenses: Vec<ExpenseRow>,
}

impl SyncPayload {
    pub fn from_state(state: &AppState) -> Self {
        let sales = state
            .sales
            .iter()
            .map(|sale| SaleRow {
                id: sale.id.clone(),
                date: sale.sold_at.format("%Y-%m-%d %H:%M").to_string(),
                item: sale.item_name.clone(),
                category: sale.category.clone().unwrap_or_default(),
                quantity: sale.quantity,
                unit_price: sale.unit_price,
                total_amount: sale.total_amount,
                cost: round2(line_cost(sale)),
                profit: round2(line_profit(sale)),
                customer: sale
                    .customer_id
                    .as_deref()
                    .and_then(|id| state.customer(id))
                    .map(|c| c.name.clone())
                    .unwrap_or_default(),
            })
            .collect();

        let inventory = state
            .inventory
            .iter()
            .map(|item| InventoryRow {
                id: item.id.clone(),
                name: item.name.clone(),
                category: item.category.clone().unwrap_or_default(),
                quantity: item.quantity,
                unit_cost: item.unit_cost,
                selling_price: item.selling_price,
                stock_value: round2(item.stock_value()),
                acquired_on: item.acquired_on.to_string(),
            })
            .collect();

        let expenses = state
            .expenses
            .iter()
            .map(|expense| ExpenseRow {
                id: expense.id.clone(),
                date: expense.date.to_string(),
                category: expense.category.clone(),
                amount: expense.amount,
                note: expense.note.clone().unwrap_or_default(),
            })
            .collect();

        Self {
            sales,
            inventory,
            expenses,
        }
    }

    pub fn row_count(&self) -> usize {
        self.sales.len() + self.inventory.len() + self.expenses.len()
    }
}

#[async_trait]
pub trait SyncSink: Send + Sync {
    /// Replaces the remote copy of every sheet with the payload's rows.
    async fn push(&self, payload: &SyncPayload) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::records::{Customer, SaleRecord};
    use chrono::{TimeZone, Utc};

    #[test]
    fn flattens_sales_with_profit_and_customer_name() {
        let state = AppState {
            customers: vec![Customer {
                id: "c1".to_string(),
                name: "Bea".to_string(),
                phone: None,
                email: None,
                address: None,
            }],
            sales: vec![SaleRecord {
                id: "s1".to_string(),
                item_id: None,
                item_name: "Tote".to_string(),
                category: Some("Bags".to_string()),
                quantity: 2,
                unit_price: 450.0,
                total_amount: 900.0,
                unit_cost: 200.0,
                supply_cost_per_unit: 10.0,
                shipping_cost_per_unit: 0.0,
                customer_id: Some("c1".to_string()),
                sold_at: Utc.with_ymd_and_hms(2026, 7, 4, 15, 30, 0).unwrap(),
            }],
            ..AppState::default()
        };

        let payload = SyncPayload::from_state(&state);
        assert_eq!(payload.row_count(), 1);
        let row = &payload.sales[0];
        assert_eq!(row.date, "2026-07-04 15:30");
        assert_eq!(row.cost, 420.0);
        assert_eq!(row.profit, 480.0);
        assert_eq!(row.customer, "Bea");
        assert_eq!(row.category, "Bags");
    }
}
