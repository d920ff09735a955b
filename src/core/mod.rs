//! Domain logic and the traits external collaborators implement

pub mod allocation;
pub mod budget;
pub mod cache;
pub mod config;
pub mod currency;
pub mod extraction;
pub mod log;
pub mod money;
pub mod persist;
pub mod records;
pub mod reporting;
pub mod state;
pub mod sync;

// Re-export main types for cleaner imports
pub use allocation::{Allocation, CostBatch, DraftLineItem, allocate};
pub use currency::CurrencyRateProvider;
pub use extraction::{ExtractionRequest, ExtractionService};
pub use persist::StateStore;
pub use state::{Action, AppState, apply};
pub use sync::{SyncPayload, SyncSink};
