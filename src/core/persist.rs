//! Persistence abstraction for the application state.

use crate::core::state::AppState;
use anyhow::Result;

/// Fixed key under which the whole state is stored.
pub const STORAGE_KEY: &str = "app_state";

/// Stores one [`AppState`] snapshot. Writers replace the snapshot wholesale.
pub trait StateStore: Send + Sync {
    /// Returns the stored state, or the empty state if nothing was saved yet.
    fn load(&self) -> Result<AppState>;
    fn save(&self, state: &AppState) -> Result<()>;
}
