//!
//! Account provisioning: keypair generation, faucet funding, trust-line
//! setup, and best-effort local persistence.
//!
//! Funding is the only fatal step. A failed trust-line attempt leaves a valid,
//! usable account (it can still receive the native asset or add trust later),
//! so it is logged and surfaced in the result instead of aborting. A failed
//! audit write is logged and swallowed: the caller already holds usable keys
//! and the network already has the account, so failing the response would
//! contradict reality.

use crate::account::Keypair;
use crate::horizon::client::LedgerClient;
use crate::payment::{PaymentError, PaymentOrchestrator};
use crate::store::{AuditStore, NewAccount};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

/// The two actor roles accounts are provisioned for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
	Employer,
	Freelancer,
}

impl Role {
	pub fn as_str(&self) -> &'static str {
		match self {
			Role::Employer => "employer",
			Role::Freelancer => "freelancer",
		}
	}
}

impl std::fmt::Display for Role {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Outcome of the trust-line attempt made during provisioning.
#[derive(Debug, Clone, Serialize)]
pub struct TrustOutcome {
	pub established: bool,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub error: Option<String>,
}

/// A freshly provisioned account. The secret key is returned exactly once,
/// here; it is never re-displayed by any other query.
#[derive(Debug, Serialize)]
pub struct ProvisionedAccount {
	pub public_key: String,
	pub secret_key: String,
	pub role: Role,
	pub trust: TrustOutcome,
}

/// Creates and funds ledger accounts for the two actor roles.
pub struct AccountProvisioner {
	ledger: Arc<dyn LedgerClient>,
	store: Arc<dyn AuditStore>,
	orchestrator: Arc<PaymentOrchestrator>,
}

impl AccountProvisioner {
	pub fn new(
		ledger: Arc<dyn LedgerClient>,
		store: Arc<dyn AuditStore>,
		orchestrator: Arc<PaymentOrchestrator>,
	) -> Self {
		Self {
			ledger,
			store,
			orchestrator,
		}
	}

	pub async fn create_account(&self, role: Role) -> Result<ProvisionedAccount, PaymentError> {
		let keypair = Keypair::random();
		let public_key = keypair.public_key();
		let secret_key = keypair.secret();

		self.ledger
			.fund_account(&public_key)
			.await
			.map_err(|e| PaymentError::FundingFailed(e.to_string()))?;
		info!("funded new {} account {}", role, public_key);

		let trust = match self.orchestrator.add_trustline(&secret_key).await {
			Ok(_) => TrustOutcome {
				established: true,
				error: None,
			},
			Err(e) => {
				warn!("trustline setup failed for {}: {}", public_key, e);
				TrustOutcome {
					established: false,
					error: Some(e.to_string()),
				}
			}
		};

		let record = NewAccount {
			public_key: public_key.clone(),
			secret_key: secret_key.clone(),
			role: role.as_str().to_string(),
		};
		if let Err(e) = self.store.save_account(record).await {
			// The network account exists and the caller gets its keys either
			// way; the mirror is not the ledger of record.
			warn!("account record write failed for {}: {}", public_key, e);
		}

		Ok(ProvisionedAccount {
			public_key,
			secret_key,
			role,
			trust,
		})
	}
}
