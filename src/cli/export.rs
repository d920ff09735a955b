use crate::core::persist::StateStore;
use crate::core::sync::SyncPayload;
use anyhow::{Context, Result, anyhow};
use serde::Serialize;
use std::fmt::Display;
use std::path::Path;
use std::str::FromStr;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dataset {
    Inventory,
    Sales,
    Expenses,
}

impl Display for Dataset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Dataset::Inventory => write!(f, "inventory"),
            Dataset::Sales => write!(f, "sales"),
            Dataset::Expenses => write!(f, "expenses"),
        }
    }
}

impl FromStr for Dataset {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "inventory" => Ok(Dataset::Inventory),
            "sales" => Ok(Dataset::Sales),
            "expenses" => Ok(Dataset::Expenses),
            _ => Err(anyhow!("Unknown dataset: {}", s)),
        }
    }
}

fn write_rows<T: Serialize>(path: &Path, rows: &[T], delimiter: u8) -> Result<()> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(delimiter)
        .from_path(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

/// Writes one dataset as CSV (or TSV) and returns the number of rows.
pub fn run(store: &dyn StateStore, dataset: Dataset, out: &Path, tsv: bool) -> Result<usize> {
    let payload = SyncPayload::from_state(&store.load()?);
    let delimiter = if tsv { b'\t' } else { b',' };
    let count = match dataset {
        Dataset::Inventory => {
            write_rows(out, &payload.inventory, delimiter)?;
            payload.inventory.len()
        }
        Dataset::Sales => {
            write_rows(out, &payload.sales, delimiter)?;
            payload.sales.len()
        }
        Dataset::Expenses => {
            write_rows(out, &payload.expenses, delimiter)?;
            payload.expenses.len()
        }
    };
    info!(%dataset, count, "Exported {}", out.display());
    println!("Wrote {count} {dataset} rows to {}", out.display());
    Ok(count)
}
