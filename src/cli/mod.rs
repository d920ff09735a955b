//! Command handlers and terminal rendering

pub mod budget;
pub mod customer;
pub mod delete;
pub mod expense;
pub mod export;
pub mod extract;
pub mod import;
pub mod inventory;
pub mod invoice;
pub mod report;
pub mod sales;
pub mod setup;
pub mod ship;
pub mod sync;
pub mod ui;

use crate::core::persist::StateStore;
use crate::core::state::{Action, AppState, apply};
use anyhow::Result;

/// Loads the state, applies one action and saves the result.
pub(crate) fn commit(store: &dyn StateStore, action: Action) -> Result<AppState> {
    let state = store.load()?;
    let next = apply(state, action);
    store.save(&next)?;
    Ok(next)
}

/// Trims optional text input, treating blank as absent.
pub(crate) fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
