use super::{commit, non_blank, ui};
use crate::core::persist::StateStore;
use crate::core::records::{Customer, new_id};
use crate::core::state::{Action, AppState};
use anyhow::{Result, bail};
use comfy_table::Cell;
use tracing::info;

pub struct NewCustomer {
    pub name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
}

pub fn add(store: &dyn StateStore, customer: NewCustomer) -> Result<String> {
    let name = customer.name.trim().to_string();
    if name.is_empty() {
        bail!("Customer name is required");
    }
    let record = Customer {
        id: new_id(),
        name,
        phone: non_blank(customer.phone),
        email: non_blank(customer.email),
        address: non_blank(customer.address),
    };
    let id = record.id.clone();
    commit(store, Action::AddCustomer(record))?;
    info!(%id, "Added customer");
    println!("Added customer {id}");
    Ok(id)
}

pub fn render(state: &AppState) -> String {
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("ID"),
        ui::header_cell("Name"),
        ui::header_cell("Phone"),
        ui::header_cell("Email"),
        ui::header_cell("Address"),
        ui::header_cell("Purchases"),
    ]);
    for customer in &state.customers {
        let purchases = state
            .sales
            .iter()
            .filter(|s| s.customer_id.as_deref() == Some(customer.id.as_str()))
            .count();
        table.add_row(vec![
            Cell::new(&customer.id),
            Cell::new(&customer.name),
            Cell::new(customer.phone.as_deref().unwrap_or("")),
            Cell::new(customer.email.as_deref().unwrap_or("")),
            Cell::new(customer.address.as_deref().unwrap_or("")),
            ui::count_cell(purchases),
        ]);
    }
    format!(
        "{}\n\n{}",
        ui::style_text("Customers", ui::StyleType::Title),
        table
    )
}

pub fn list(store: &dyn StateStore) -> Result<()> {
    let state = store.load()?;
    if state.customers.is_empty() {
        println!("No customers yet.");
        return Ok(());
    }
    println!("{}", render(&state));
    Ok(())
}
