//! Permanent business records held in [`crate::core::state::AppState`].

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::str::FromStr;
use uuid::Uuid;

/// Fresh random identifier for a new record.
pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryRecord {
    pub id: String,
    pub name: String,
    pub category: Option<String>,
    pub quantity: u32,
    /// Landed cost per unit in local currency.
    pub unit_cost: f64,
    pub selling_price: Option<f64>,
    pub acquired_on: NaiveDate,
}

impl InventoryRecord {
    pub fn stock_value(&self) -> f64 {
        self.unit_cost * f64::from(self.quantity)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaleRecord {
    pub id: String,
    pub item_id: Option<String>,
    pub item_name: String,
    pub category: Option<String>,
    pub quantity: u32,
    pub unit_price: f64,
    pub total_amount: f64,
    pub unit_cost: f64,
    #[serde(default)]
    pub supply_cost_per_unit: f64,
    #[serde(default)]
    pub shipping_cost_per_unit: f64,
    pub customer_id: Option<String>,
    pub sold_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpenseRecord {
    pub id: String,
    pub date: NaiveDate,
    pub category: String,
    pub amount: f64,
    pub note: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetEntry {
    pub year: i32,
    pub month: u32,
    pub category: String,
    pub amount: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    pub id: String,
    pub name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Invoice {
    pub id: String,
    pub number: String,
    pub customer_id: String,
    pub sale_ids: Vec<String>,
    pub issued_on: NaiveDate,
    pub total: f64,
    pub paid: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShipmentStatus {
    Booked,
    InTransit,
    Delivered,
    Cancelled,
}

impl ShipmentStatus {
    /// Whether a shipment may move from `self` to `next`.
    pub fn can_become(self, next: ShipmentStatus) -> bool {
        use ShipmentStatus::*;
        matches!(
            (self, next),
            (Booked, InTransit) | (Booked, Cancelled) | (InTransit, Delivered) | (Booked, Delivered)
        )
    }
}

impl Display for ShipmentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                ShipmentStatus::Booked => "booked",
                ShipmentStatus::InTransit => "in-transit",
                ShipmentStatus::Delivered => "delivered",
                ShipmentStatus::Cancelled => "cancelled",
            }
        )
    }
}

impl FromStr for ShipmentStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('_', "-").as_str() {
            "booked" => Ok(ShipmentStatus::Booked),
            "in-transit" | "transit" => Ok(ShipmentStatus::InTransit),
            "delivered" => Ok(ShipmentStatus::Delivered),
            "cancelled" | "canceled" => Ok(ShipmentStatus::Cancelled),
            _ => Err(anyhow::anyhow!("Invalid shipment status: {}", s)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shipment {
    pub id: String,
    pub sale_id: Option<String>,
    pub courier: String,
    pub recipient: String,
    pub address: String,
    pub phone: Option<String>,
    pub fee: f64,
    pub status: ShipmentStatus,
    pub tracking_number: Option<String>,
    pub booked_on: NaiveDate,
}

impl Shipment {
    /// Plain-text booking request to paste into a courier's chat or form.
    pub fn booking_note(&self, item_summary: Option<&str>) -> String {
        let mut note = format!(
            "Booking request ({})\nRecipient: {}\nAddress: {}\n",
            self.courier, self.recipient, self.address
        );
        if let Some(phone) = &self.phone {
            note.push_str(&format!("Contact: {phone}\n"));
        }
        if let Some(items) = item_summary {
            note.push_str(&format!("Package: {items}\n"));
        }
        note.push_str(&format!("Pickup date: {}\n", self.booked_on));
        note
    }
}

/// Identifies a record for deletion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordRef {
    Inventory(String),
    Sale(String),
    Expense(String),
    Customer(String),
    Invoice(String),
    Shipment(String),
}

impl RecordRef {
    pub fn parse(kind: &str, id: &str) -> anyhow::Result<Self> {
        let id = id.to_string();
        match kind.to_lowercase().as_str() {
            "inventory" | "item" => Ok(RecordRef::Inventory(id)),
            "sale" | "sales" => Ok(RecordRef::Sale(id)),
            "expense" | "expenses" => Ok(RecordRef::Expense(id)),
            "customer" | "customers" => Ok(RecordRef::Customer(id)),
            "invoice" | "invoices" => Ok(RecordRef::Invoice(id)),
            "shipment" | "shipments" => Ok(RecordRef::Shipment(id)),
            _ => Err(anyhow::anyhow!("Unknown record kind: {}", kind)),
        }
    }

    pub fn id(&self) -> &str {
        match self {
            RecordRef::Inventory(id)
            | RecordRef::Sale(id)
            | RecordRef::Expense(id)
            | RecordRef::Customer(id)
            | RecordRef::Invoice(id)
            | RecordRef::Shipment(id) => id,
        }
    }
}
