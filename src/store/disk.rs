use crate::core::persist::{STORAGE_KEY, StateStore};
use crate::core::state::AppState;
use anyhow::{Context, Result};
use fjall::{Keyspace, PartitionCreateOptions, PartitionHandle, PersistMode};
use std::path::Path;
use tracing::debug;

const PARTITION: &str = "shopkeep";

/// Keeps the state as one JSON document in a fjall partition.
pub struct FjallStateStore {
    keyspace: Keyspace,
    partition: PartitionHandle,
}

impl FjallStateStore {
    pub fn open(path: &Path) -> Result<Self> {
        std::fs::create_dir_all(path)
            .with_context(|| format!("Failed to create data directory: {}", path.display()))?;

        let keyspace = fjall::Config::new(path)
            .open()
            .with_context(|| format!("Failed to open keyspace at {}", path.display()))?;
        let partition = keyspace
            .open_partition(PARTITION, PartitionCreateOptions::default())
            .context("Failed to open state partition")?;
        debug!("Opened state store at {}", path.display());

        Ok(Self {
            keyspace,
            partition,
        })
    }
}

impl StateStore for FjallStateStore {
    fn load(&self) -> Result<AppState> {
        match self.partition.get(STORAGE_KEY)? {
            Some(bytes) => {
                let state: AppState =
                    serde_json::from_slice(&bytes).context("Failed to decode stored state")?;
                debug!(
                    inventory = state.inventory.len(),
                    sales = state.sales.len(),
                    "Loaded state"
                );
                Ok(state)
            }
            None => {
                debug!("No stored state, starting empty");
                Ok(AppState::default())
            }
        }
    }

    fn save(&self, state: &AppState) -> Result<()> {
        let bytes = serde_json::to_vec(state).context("Failed to encode state")?;
        self.partition.insert(STORAGE_KEY, bytes)?;
        self.keyspace
            .persist(PersistMode::SyncAll)
            .context("Failed to flush state to disk")?;
        debug!("Saved state");
        Ok(())
    }
}
