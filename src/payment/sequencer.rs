//!
//! Per-source-account submission serialization.
//!
//! The ledger network accepts exactly one transaction per sequence number per
//! account. Two concurrent submissions from the same source key that load the
//! same pre-submission sequence number race: the loser fails with a bad
//! sequence, or worse, both build valid-looking but conflicting transactions.
//! The gate makes submissions from one source strictly sequential while
//! leaving submissions from different sources fully parallel.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::OwnedMutexGuard;

/// Per-source-key lease table.
///
/// A lease must be acquired before the source account's ledger state is
/// loaded and held until the submission completes. Releasing happens on drop,
/// so every exit path, including early error returns, releases the lease.
#[derive(Default)]
pub struct SequenceGate {
	leases: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl SequenceGate {
	pub fn new() -> Self {
		Self::default()
	}

	/// Acquires the submission lease for a source public key, waiting for any
	/// in-flight submission from the same key to finish. Acquisition order
	/// totally orders submissions per key.
	pub async fn acquire(&self, source_key: &str) -> OwnedMutexGuard<()> {
		let lease = {
			let mut table = self.leases.lock().expect("lease table mutex poisoned");
			table
				.entry(source_key.to_string())
				.or_insert_with(|| Arc::new(tokio::sync::Mutex::new(())))
				.clone()
		};
		// The table lock is released before awaiting the lease itself.
		lease.lock_owned().await
	}
}
