/// Error taxonomy and normalization for ledger failures
pub mod error;
/// Payment and trust-line submission orchestration
pub mod orchestrator;
/// Per-source-account submission serialization
pub mod sequencer;

#[cfg(test)]
pub(crate) mod testing;

pub use error::PaymentError;
pub use orchestrator::{BalanceView, PaymentOrchestrator, PaymentReceipt, PaymentRequest};
pub use sequencer::SequenceGate;
