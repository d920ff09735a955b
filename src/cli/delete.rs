use super::commit;
use crate::core::persist::StateStore;
use crate::core::records::RecordRef;
use crate::core::state::Action;
use anyhow::{Result, anyhow};
use tracing::info;

/// Removes a record once the caller has confirmed. Returns whether anything
/// was deleted.
pub fn run(store: &dyn StateStore, target: RecordRef, confirmed: bool) -> Result<bool> {
    if !store.load()?.contains(&target) {
        return Err(anyhow!("No record {:?}", target));
    }
    if !confirmed {
        println!("Cancelled.");
        return Ok(false);
    }
    commit(
        store,
        Action::Delete {
            target: target.clone(),
            confirmed,
        },
    )?;
    info!(?target, "Deleted record");
    println!("Deleted {}", target.id());
    Ok(true)
}
