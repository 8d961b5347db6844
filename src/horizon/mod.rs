/// HTTP client for the Horizon ledger API
pub mod client;
/// Wire types for Horizon requests and responses
pub mod types;

pub use client::{HorizonClient, LedgerClient};
pub use types::*;
