use super::ui;
use crate::core::persist::StateStore;
use crate::core::sync::{SyncPayload, SyncSink};
use anyhow::Result;
use tracing::info;

/// Pushes every sheet to the sync backend. Local state is only read.
pub async fn run(store: &dyn StateStore, sink: &dyn SyncSink) -> Result<()> {
    let payload = SyncPayload::from_state(&store.load()?);

    let pb = ui::new_spinner(&format!("Syncing {} rows...", payload.row_count()));
    let result = sink.push(&payload).await;
    pb.finish_and_clear();
    result?;

    info!(rows = payload.row_count(), "Sync complete");
    println!(
        "Synced {} sales, {} inventory items and {} expenses.",
        payload.sales.len(),
        payload.inventory.len(),
        payload.expenses.len()
    );
    Ok(())
}
