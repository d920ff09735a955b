pub mod disk;
pub mod memory;

use crate::core::config::AppConfig;
use crate::core::persist::StateStore;
use anyhow::Result;
use disk::FjallStateStore;

/// Opens the on-disk store under the configured data directory.
pub fn open_state_store(config: &AppConfig) -> Result<Box<dyn StateStore>> {
    let path = config.default_data_path()?.join("state");
    Ok(Box::new(FjallStateStore::open(&path)?))
}
