use super::{commit, ui};
use crate::core::money::round2;
use crate::core::persist::StateStore;
use crate::core::records::{Invoice, new_id};
use crate::core::state::{Action, AppState};
use anyhow::{Result, anyhow, bail};
use chrono::{Local, NaiveDate};
use comfy_table::{Cell, Color};
use tracing::info;

/// Issues an invoice over existing sales and returns its number.
pub fn create(
    store: &dyn StateStore,
    customer_id: &str,
    sale_ids: &[String],
    issued_on: Option<NaiveDate>,
) -> Result<String> {
    let state = store.load()?;
    state
        .customer(customer_id)
        .ok_or_else(|| anyhow!("No customer with id {}", customer_id))?;
    if sale_ids.is_empty() {
        bail!("An invoice needs at least one sale");
    }
    let mut total = 0.0;
    for id in sale_ids {
        let sale = state
            .sale(id)
            .ok_or_else(|| anyhow!("No sale with id {}", id))?;
        total += sale.total_amount;
    }

    let issued_on = issued_on.unwrap_or_else(|| Local::now().date_naive());
    let invoice = Invoice {
        id: new_id(),
        number: state.next_invoice_number(issued_on),
        customer_id: customer_id.to_string(),
        sale_ids: sale_ids.to_vec(),
        issued_on,
        total: round2(total),
        paid: false,
    };
    let number = invoice.number.clone();
    commit(store, Action::IssueInvoice(invoice))?;
    info!(%number, total, "Issued invoice");
    println!("Issued {number} for {total:.2}");
    Ok(number)
}

/// Marks an invoice paid, by id or number.
pub fn pay(store: &dyn StateStore, id_or_number: &str) -> Result<()> {
    let state = store.load()?;
    let invoice = state
        .invoice(id_or_number)
        .ok_or_else(|| anyhow!("No invoice {}", id_or_number))?;
    if invoice.paid {
        println!("{} is already paid", invoice.number);
        return Ok(());
    }
    let number = invoice.number.clone();
    commit(store, Action::MarkInvoicePaid(id_or_number.to_string()))?;
    info!(%number, "Invoice paid");
    println!("Marked {number} as paid");
    Ok(())
}

pub fn render(state: &AppState, currency: &str) -> String {
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Number"),
        ui::header_cell("Issued"),
        ui::header_cell("Customer"),
        ui::header_cell("Sales"),
        ui::header_cell(&format!("Total ({currency})")),
        ui::header_cell("Status"),
    ]);
    let mut outstanding = 0.0;
    for invoice in &state.invoices {
        let customer = state
            .customer(&invoice.customer_id)
            .map_or(invoice.customer_id.as_str(), |c| c.name.as_str());
        let status = if invoice.paid {
            Cell::new("paid").fg(Color::Green)
        } else {
            outstanding += invoice.total;
            Cell::new("unpaid").fg(Color::Yellow)
        };
        table.add_row(vec![
            Cell::new(&invoice.number),
            Cell::new(invoice.issued_on),
            Cell::new(customer),
            ui::count_cell(invoice.sale_ids.len()),
            ui::money_cell(invoice.total),
            status,
        ]);
    }
    format!(
        "{}\n\n{}\n\nOutstanding: {:.2}",
        ui::style_text("Invoices", ui::StyleType::Title),
        table,
        outstanding
    )
}

pub fn list(store: &dyn StateStore, currency: &str) -> Result<()> {
    let state = store.load()?;
    if state.invoices.is_empty() {
        println!("No invoices yet.");
        return Ok(());
    }
    println!("{}", render(&state, currency));
    Ok(())
}
