pub mod gemini;
pub mod sheets;
pub mod yahoo_rates;

// Re-export the shared cache for providers that memoise lookups
pub use crate::core::cache::Cache;
