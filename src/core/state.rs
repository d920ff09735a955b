//! Whole-application state and the reducer that evolves it.
//!
//! Every change is a value of [`Action`] applied with [`apply`]; callers
//! persist the returned state as a whole.

use crate::core::records::{
    BudgetEntry, Customer, ExpenseRecord, InventoryRecord, Invoice, RecordRef, SaleRecord,
    Shipment, ShipmentStatus,
};
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppState {
    #[serde(default)]
    pub inventory: Vec<InventoryRecord>,
    #[serde(default)]
    pub sales: Vec<SaleRecord>,
    #[serde(default)]
    pub expenses: Vec<ExpenseRecord>,
    #[serde(default)]
    pub budgets: Vec<BudgetEntry>,
    #[serde(default)]
    pub customers: Vec<Customer>,
    #[serde(default)]
    pub invoices: Vec<Invoice>,
    #[serde(default)]
    pub shipments: Vec<Shipment>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    ImportBatch(Vec<InventoryRecord>),
    AddInventory(InventoryRecord),
    AdjustStock { item_id: String, delta: i64 },
    RecordSale(SaleRecord),
    AddExpense(ExpenseRecord),
    SetBudget(BudgetEntry),
    AddCustomer(Customer),
    IssueInvoice(Invoice),
    MarkInvoicePaid(String),
    BookShipment(Shipment),
    UpdateShipmentStatus {
        shipment_id: String,
        status: ShipmentStatus,
        tracking_number: Option<String>,
    },
    Delete { target: RecordRef, confirmed: bool },
}

impl AppState {
    pub fn item(&self, id: &str) -> Option<&InventoryRecord> {
        self.inventory.iter().find(|i| i.id == id)
    }

    pub fn sale(&self, id: &str) -> Option<&SaleRecord> {
        self.sales.iter().find(|s| s.id == id)
    }

    pub fn customer(&self, id: &str) -> Option<&Customer> {
        self.customers.iter().find(|c| c.id == id)
    }

    pub fn shipment(&self, id: &str) -> Option<&Shipment> {
        self.shipments.iter().find(|s| s.id == id)
    }

    pub fn invoice(&self, id: &str) -> Option<&Invoice> {
        self.invoices
            .iter()
            .find(|inv| inv.id == id || inv.number == id)
    }

    pub fn contains(&self, target: &RecordRef) -> bool {
        let id = target.id();
        match target {
            RecordRef::Inventory(_) => self.item(id).is_some(),
            RecordRef::Sale(_) => self.sale(id).is_some(),
            RecordRef::Expense(_) => self.expenses.iter().any(|e| e.id == id),
            RecordRef::Customer(_) => self.customer(id).is_some(),
            RecordRef::Invoice(_) => self.invoice(id).is_some(),
            RecordRef::Shipment(_) => self.shipment(id).is_some(),
        }
    }

    /// Next invoice number for the year of `issued_on`, e.g. `INV-2026-0003`.
    pub fn next_invoice_number(&self, issued_on: NaiveDate) -> String {
        let prefix = format!("INV-{}-", issued_on.year());
        let last = self
            .invoices
            .iter()
            .filter_map(|inv| inv.number.strip_prefix(&prefix))
            .filter_map(|seq| seq.parse::<u32>().ok())
            .max()
            .unwrap_or(0);
        format!("{prefix}{:04}", last + 1)
    }
}

/// Applies one action and returns the resulting state.
///
/// Actions that reference unknown ids leave the state unchanged, as does a
/// delete that was not confirmed.
pub fn apply(mut state: AppState, action: Action) -> AppState {
    debug!(?action, "Applying action");
    match action {
        Action::ImportBatch(records) => state.inventory.extend(records),
        Action::AddInventory(record) => state.inventory.push(record),
        Action::AdjustStock { item_id, delta } => {
            if let Some(item) = state.inventory.iter_mut().find(|i| i.id == item_id) {
                item.quantity = adjust(item.quantity, delta);
            }
        }
        Action::RecordSale(sale) => {
            if let Some(item_id) = &sale.item_id {
                if let Some(item) = state.inventory.iter_mut().find(|i| &i.id == item_id) {
                    item.quantity = item.quantity.saturating_sub(sale.quantity);
                }
            }
            state.sales.push(sale);
        }
        Action::AddExpense(expense) => state.expenses.push(expense),
        Action::SetBudget(entry) => {
            match state.budgets.iter_mut().find(|b| {
                b.year == entry.year && b.month == entry.month && b.category == entry.category
            }) {
                Some(existing) => existing.amount = entry.amount,
                None => state.budgets.push(entry),
            }
        }
        Action::AddCustomer(customer) => state.customers.push(customer),
        Action::IssueInvoice(invoice) => state.invoices.push(invoice),
        Action::MarkInvoicePaid(id) => {
            if let Some(invoice) = state
                .invoices
                .iter_mut()
                .find(|inv| inv.id == id || inv.number == id)
            {
                invoice.paid = true;
            }
        }
        Action::BookShipment(shipment) => state.shipments.push(shipment),
        Action::UpdateShipmentStatus {
            shipment_id,
            status,
            tracking_number,
        } => {
            if let Some(shipment) = state.shipments.iter_mut().find(|s| s.id == shipment_id) {
                if shipment.status.can_become(status) {
                    shipment.status = status;
                }
                if tracking_number.is_some() {
                    shipment.tracking_number = tracking_number;
                }
            }
        }
        Action::Delete { target, confirmed } => {
            if confirmed {
                delete(&mut state, &target);
            }
        }
    }
    state
}

fn adjust(quantity: u32, delta: i64) -> u32 {
    let next = i64::from(quantity) + delta;
    next.clamp(0, i64::from(u32::MAX)) as u32
}

fn delete(state: &mut AppState, target: &RecordRef) {
    let id = target.id();
    match target {
        RecordRef::Inventory(_) => state.inventory.retain(|i| i.id != id),
        RecordRef::Sale(_) => state.sales.retain(|s| s.id != id),
        RecordRef::Expense(_) => state.expenses.retain(|e| e.id != id),
        RecordRef::Customer(_) => state.customers.retain(|c| c.id != id),
        RecordRef::Invoice(_) => state.invoices.retain(|inv| inv.id != id && inv.number != id),
        RecordRef::Shipment(_) => state.shipments.retain(|s| s.id != id),
    }
}
