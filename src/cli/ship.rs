use super::{commit, non_blank, ui};
use crate::core::persist::StateStore;
use crate::core::records::{Shipment, ShipmentStatus, new_id};
use crate::core::state::{Action, AppState};
use anyhow::{Result, anyhow, bail};
use chrono::Local;
use comfy_table::{Cell, Color};
use tracing::info;

pub struct NewShipment {
    pub sale_id: Option<String>,
    pub courier: String,
    /// Defaults to the sale's customer.
    pub recipient: Option<String>,
    /// Defaults to the sale's customer address.
    pub address: Option<String>,
    pub phone: Option<String>,
    pub fee: f64,
}

pub fn book(store: &dyn StateStore, shipment: NewShipment) -> Result<String> {
    let state = store.load()?;
    let customer = match &shipment.sale_id {
        Some(sale_id) => {
            let sale = state
                .sale(sale_id)
                .ok_or_else(|| anyhow!("No sale with id {}", sale_id))?;
            sale.customer_id.as_deref().and_then(|id| state.customer(id))
        }
        None => None,
    };

    let recipient = non_blank(shipment.recipient)
        .or_else(|| customer.map(|c| c.name.clone()))
        .ok_or_else(|| anyhow!("Recipient is required"))?;
    let address = non_blank(shipment.address)
        .or_else(|| customer.and_then(|c| c.address.clone()))
        .ok_or_else(|| anyhow!("Address is required"))?;
    let courier = shipment.courier.trim().to_string();
    if courier.is_empty() {
        bail!("Courier is required");
    }

    let record = Shipment {
        id: new_id(),
        sale_id: shipment.sale_id,
        courier,
        recipient,
        address,
        phone: non_blank(shipment.phone).or_else(|| customer.and_then(|c| c.phone.clone())),
        fee: shipment.fee.max(0.0),
        status: ShipmentStatus::Booked,
        tracking_number: None,
        booked_on: Local::now().date_naive(),
    };
    let id = record.id.clone();
    commit(store, Action::BookShipment(record))?;
    info!(%id, "Booked shipment");
    println!("Booked shipment {id}");
    Ok(id)
}

pub fn update_status(
    store: &dyn StateStore,
    shipment_id: &str,
    status: ShipmentStatus,
    tracking_number: Option<String>,
) -> Result<()> {
    let state = store.load()?;
    let shipment = state
        .shipment(shipment_id)
        .ok_or_else(|| anyhow!("No shipment with id {}", shipment_id))?;
    if shipment.status != status && !shipment.status.can_become(status) {
        bail!(
            "Cannot move shipment from {} to {}",
            shipment.status,
            status
        );
    }
    commit(
        store,
        Action::UpdateShipmentStatus {
            shipment_id: shipment_id.to_string(),
            status,
            tracking_number: non_blank(tracking_number),
        },
    )?;
    info!(shipment_id, %status, "Shipment updated");
    println!("Shipment {shipment_id} is now {status}");
    Ok(())
}

/// Booking request text for a shipment, with the sold item when linked.
pub fn note(state: &AppState, shipment_id: &str) -> Result<String> {
    let shipment = state
        .shipment(shipment_id)
        .ok_or_else(|| anyhow!("No shipment with id {}", shipment_id))?;
    let items = shipment
        .sale_id
        .as_deref()
        .and_then(|id| state.sale(id))
        .map(|sale| format!("{} x {}", sale.quantity, sale.item_name));
    Ok(shipment.booking_note(items.as_deref()))
}

pub fn print_note(store: &dyn StateStore, shipment_id: &str) -> Result<()> {
    println!("{}", note(&store.load()?, shipment_id)?);
    Ok(())
}

pub fn render(state: &AppState) -> String {
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("ID"),
        ui::header_cell("Booked"),
        ui::header_cell("Courier"),
        ui::header_cell("Recipient"),
        ui::header_cell("Fee"),
        ui::header_cell("Tracking"),
        ui::header_cell("Status"),
    ]);
    for shipment in &state.shipments {
        let color = match shipment.status {
            ShipmentStatus::Booked => Color::Yellow,
            ShipmentStatus::InTransit => Color::Cyan,
            ShipmentStatus::Delivered => Color::Green,
            ShipmentStatus::Cancelled => Color::DarkGrey,
        };
        table.add_row(vec![
            Cell::new(&shipment.id),
            Cell::new(shipment.booked_on),
            Cell::new(&shipment.courier),
            Cell::new(&shipment.recipient),
            ui::money_cell(shipment.fee),
            Cell::new(shipment.tracking_number.as_deref().unwrap_or("")),
            Cell::new(shipment.status).fg(color),
        ]);
    }
    format!(
        "{}\n\n{}",
        ui::style_text("Shipments", ui::StyleType::Title),
        table
    )
}

pub fn list(store: &dyn StateStore) -> Result<()> {
    let state = store.load()?;
    if state.shipments.is_empty() {
        println!("No shipments yet.");
        return Ok(());
    }
    println!("{}", render(&state));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::records::{Customer, SaleRecord};
    use crate::store::memory::MemoryStateStore;
    use chrono::{TimeZone, Utc};

    fn store() -> MemoryStateStore {
        MemoryStateStore::with_state(AppState {
            customers: vec![Customer {
                id: "c1".to_string(),
                name: "Ana".to_string(),
                phone: Some("0917".to_string()),
                email: None,
                address: Some("12 Mabini St".to_string()),
            }],
            sales: vec![SaleRecord {
                id: "s1".to_string(),
                item_id: None,
                item_name: "Lamp".to_string(),
                category: None,
                quantity: 2,
                unit_price: 100.0,
                total_amount: 200.0,
                unit_cost: 0.0,
                supply_cost_per_unit: 0.0,
                shipping_cost_per_unit: 0.0,
                customer_id: Some("c1".to_string()),
                sold_at: Utc.with_ymd_and_hms(2026, 4, 1, 10, 0, 0).unwrap(),
            }],
            ..AppState::default()
        })
    }

    fn for_sale() -> NewShipment {
        NewShipment {
            sale_id: Some("s1".to_string()),
            courier: "LBC".to_string(),
            recipient: None,
            address: None,
            phone: None,
            fee: 95.0,
        }
    }

    #[test]
    fn test_booking_defaults_from_customer() {
        let store = store();
        let id = book(&store, for_sale()).unwrap();

        let state = store.load().unwrap();
        let shipment = state.shipment(&id).unwrap();
        assert_eq!(shipment.recipient, "Ana");
        assert_eq!(shipment.address, "12 Mabini St");
        assert_eq!(shipment.status, ShipmentStatus::Booked);

        let text = note(&state, &id).unwrap();
        assert!(text.contains("Booking request (LBC)"));
        assert!(text.contains("Package: 2 x Lamp"));
        assert!(text.contains("Contact: 0917"));
    }

    #[test]
    fn test_booking_without_address_fails() {
        let store = store();
        let shipment = NewShipment {
            sale_id: None,
            recipient: Some("Ben".to_string()),
            ..for_sale()
        };
        let err = book(&store, shipment).unwrap_err();
        assert_eq!(err.to_string(), "Address is required");
    }

    #[test]
    fn test_status_only_moves_forward() {
        let store = store();
        let id = book(&store, for_sale()).unwrap();

        update_status(&store, &id, ShipmentStatus::InTransit, Some("TRK1".into())).unwrap();
        let err = update_status(&store, &id, ShipmentStatus::Booked, None).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Cannot move shipment from in-transit to booked"
        );
        update_status(&store, &id, ShipmentStatus::Delivered, None).unwrap();

        let state = store.load().unwrap();
        let shipment = state.shipment(&id).unwrap();
        assert_eq!(shipment.status, ShipmentStatus::Delivered);
        assert_eq!(shipment.tracking_number.as_deref(), Some("TRK1"));
    }
}
