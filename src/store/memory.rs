use crate::core::persist::StateStore;
use crate::core::state::AppState;
use anyhow::{Result, anyhow};
use std::sync::Mutex;
use tracing::debug;

/// In-memory state store; nothing survives the process.
#[derive(Default)]
pub struct MemoryStateStore {
    inner: Mutex<Option<AppState>>,
}

impl MemoryStateStore {
    /// Creates a new MemoryStateStore instance
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_state(state: AppState) -> Self {
        Self {
            inner: Mutex::new(Some(state)),
        }
    }
}

impl StateStore for MemoryStateStore {
    fn load(&self) -> Result<AppState> {
        let guard = self
            .inner
            .lock()
            .map_err(|_| anyhow!("State store lock poisoned"))?;
        debug!(present = guard.is_some(), "Memory store LOAD");
        Ok(guard.clone().unwrap_or_default())
    }

    fn save(&self, state: &AppState) -> Result<()> {
        let mut guard = self
            .inner
            .lock()
            .map_err(|_| anyhow!("State store lock poisoned"))?;
        debug!("Memory store SAVE");
        *guard = Some(state.clone());
        Ok(())
    }
}
