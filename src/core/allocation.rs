//! Landed-cost allocation for a batch of acquired items.
//!
//! A batch is bought for one total price in a foreign currency. Items whose
//! unit cost the user pinned by hand are paid out of the total first; what is
//! left is spread evenly over every remaining physical unit, converted to the
//! local currency, and topped up with the per-item supply surcharge.
//!
//! The result is always recomputed from scratch. Nothing here mutates the
//! batch, so the same input yields bit-identical output regardless of item
//! order.

use crate::core::money::{self, lenient};
use crate::core::records::{InventoryRecord, new_id};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

fn default_quantity() -> u32 {
    1
}

/// An item while it is still part of an import session.
///
/// Carries the allocation metadata that never reaches the permanent
/// inventory record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DraftLineItem {
    #[serde(default = "new_id")]
    pub id: String,
    pub name: String,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub is_manual_cost: bool,
    #[serde(default, with = "lenient")]
    pub manual_unit_cost_foreign: Option<f64>,
    #[serde(default, with = "lenient")]
    pub estimated_relative_value: Option<f64>,
    #[serde(default, with = "lenient")]
    pub selling_price: Option<f64>,
}

impl DraftLineItem {
    pub fn new(name: &str, quantity: u32) -> Self {
        Self {
            id: new_id(),
            name: name.to_string(),
            quantity: quantity.max(1),
            category: None,
            is_manual_cost: false,
            manual_unit_cost_foreign: None,
            estimated_relative_value: None,
            selling_price: None,
        }
    }

    /// Pins the unit cost, taking the item out of the shared pool.
    pub fn set_manual_cost(&mut self, unit_cost_foreign: Option<f64>) {
        self.is_manual_cost = true;
        self.manual_unit_cost_foreign = unit_cost_foreign;
    }

    /// Returns the item to the shared pool. A stale manual value may stay on
    /// the record; it is ignored while `is_manual_cost` is false.
    pub fn clear_manual_cost(&mut self) {
        self.is_manual_cost = false;
    }

    fn units(&self) -> f64 {
        f64::from(self.quantity.max(1))
    }

    fn manual_unit_cost(&self) -> f64 {
        money::finite(self.manual_unit_cost_foreign)
            .unwrap_or(0.0)
            .max(0.0)
    }
}

/// The allocation context for one import session.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CostBatch {
    #[serde(default, with = "lenient")]
    pub total_cost_foreign: Option<f64>,
    #[serde(default, with = "lenient")]
    pub exchange_rate: Option<f64>,
    /// Unset means "use the configured supplies"; an explicit 0 is kept.
    #[serde(default, with = "lenient")]
    pub supply_cost_per_item_local: Option<f64>,
    #[serde(default)]
    pub items: Vec<DraftLineItem>,
}

/// Per-item output of [`allocate`].
#[derive(Debug, Clone, PartialEq)]
pub struct AllocatedItem {
    pub id: String,
    pub name: String,
    pub quantity: u32,
    pub is_manual_cost: bool,
    pub effective_unit_cost_foreign: f64,
    pub net_unit_cost_local: f64,
}

/// Pool figures and per-item costs for a batch.
#[derive(Debug, Clone, PartialEq)]
pub struct Allocation {
    pub manual_consumed_foreign: f64,
    pub remaining_pool_foreign: f64,
    pub auto_unit_count: u64,
    pub auto_unit_cost_foreign: f64,
    pub items: Vec<AllocatedItem>,
}

impl Allocation {
    pub fn item(&self, id: &str) -> Option<&AllocatedItem> {
        self.items.iter().find(|item| item.id == id)
    }

    /// Sum of `net_unit_cost_local * quantity` across the batch.
    pub fn total_landed_local(&self) -> f64 {
        self.items
            .iter()
            .map(|item| item.net_unit_cost_local * f64::from(item.quantity))
            .sum()
    }

    /// Materialises the batch into permanent inventory records.
    ///
    /// The allocation metadata (`is_manual_cost`, the manual cost and the
    /// estimated value) is dropped here; only the landed unit cost survives.
    pub fn into_inventory(self, batch: &CostBatch, acquired_on: NaiveDate) -> Vec<InventoryRecord> {
        let drafts: HashMap<&str, &DraftLineItem> = batch
            .items
            .iter()
            .map(|item| (item.id.as_str(), item))
            .collect();

        self.items
            .into_iter()
            .map(|allocated| {
                let draft = drafts.get(allocated.id.as_str());
                InventoryRecord {
                    id: allocated.id,
                    name: allocated.name,
                    category: draft.and_then(|d| d.category.clone()),
                    quantity: allocated.quantity,
                    unit_cost: allocated.net_unit_cost_local,
                    selling_price: draft.and_then(|d| money::finite(d.selling_price)),
                    acquired_on,
                }
            })
            .collect()
    }
}

/// Spreads the batch total over its items.
///
/// Manual items consume `manual_unit_cost_foreign * quantity` from the total.
/// The remainder (never below zero) is split evenly per automatic unit;
/// `estimated_relative_value` is carried but does not weight the split.
pub fn allocate(batch: &CostBatch) -> Allocation {
    let total = money::finite(batch.total_cost_foreign)
        .unwrap_or(0.0)
        .max(0.0);
    let rate = money::usable_rate(batch.exchange_rate);
    let supply = money::finite(batch.supply_cost_per_item_local).unwrap_or(0.0);

    let (manual, auto): (Vec<&DraftLineItem>, Vec<&DraftLineItem>) =
        batch.items.iter().partition(|item| item.is_manual_cost);

    let manual_consumed_foreign: f64 = manual
        .iter()
        .map(|item| item.manual_unit_cost() * item.units())
        .sum();
    let remaining_pool_foreign = (total - manual_consumed_foreign).max(0.0);
    let auto_unit_count: u64 = auto.iter().map(|item| u64::from(item.quantity.max(1))).sum();
    let auto_unit_cost_foreign = if auto_unit_count > 0 {
        remaining_pool_foreign / auto_unit_count as f64
    } else {
        0.0
    };

    debug!(
        total,
        rate,
        supply,
        manual_consumed_foreign,
        remaining_pool_foreign,
        auto_unit_count,
        auto_unit_cost_foreign,
        "Allocated batch cost"
    );

    let items = batch
        .items
        .iter()
        .map(|item| {
            let effective_unit_cost_foreign = if item.is_manual_cost {
                item.manual_unit_cost()
            } else {
                auto_unit_cost_foreign
            };
            AllocatedItem {
                id: item.id.clone(),
                name: item.name.clone(),
                quantity: item.quantity.max(1),
                is_manual_cost: item.is_manual_cost,
                effective_unit_cost_foreign,
                net_unit_cost_local: money::round2(effective_unit_cost_foreign * rate + supply),
            }
        })
        .collect();

    Allocation {
        manual_consumed_foreign,
        remaining_pool_foreign,
        auto_unit_count,
        auto_unit_cost_foreign,
        items,
    }
}
