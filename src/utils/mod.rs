//!
//! Utility module for the payment service.
//!
//! Re-exports the fixed-point amount helpers used throughout the codebase.
/// Fixed-point amount parsing and comparison
pub mod amount;

pub use amount::{AmountError, parse_amount};
