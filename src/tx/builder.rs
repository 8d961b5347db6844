//! Ledger transaction builder
//!
//! This module provides a builder pattern for constructing single-source
//! ledger transactions: a sequence number derived from freshly loaded account
//! state, a per-operation fee, a bounded validity window, the operation list,
//! and an optional text memo. Signing binds the payload to the network
//! passphrase so a transaction built for one network is invalid on another.

use crate::account::Keypair;
use crate::horizon::{AccountRecord, BalanceRecord};
use serde::{Deserialize, Serialize};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use thiserror::Error;

/// Validity window applied to every submission. A transaction not included
/// within this many seconds is rejected by the network as expired instead of
/// staying pending indefinitely.
pub const TX_TIMEOUT_SECS: u64 = 30;

/// Network limit for text memos, in bytes.
pub const MAX_MEMO_BYTES: usize = 28;

#[derive(Error, Debug)]
pub enum TxBuildError {
	#[error("transaction has no operations")]
	NoOperations,

	#[error("transaction fee is not set")]
	MissingFee,

	#[error("memo exceeds {MAX_MEMO_BYTES} bytes ({0} bytes)")]
	MemoTooLong(usize),

	#[error("failed to serialize transaction payload: {0}")]
	Serialization(#[from] serde_json::Error),
}

/// A ledger asset: the native token or a trust-line-gated credit asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Asset {
	Native,
	Credit { code: String, issuer: String },
}

impl Asset {
	/// Whether a reported balance entry is for this asset.
	pub fn matches(&self, balance: &BalanceRecord) -> bool {
		match self {
			Asset::Native => balance.is_native(),
			Asset::Credit { code, issuer } => {
				balance.asset_code.as_deref() == Some(code.as_str())
					&& balance.asset_issuer.as_deref() == Some(issuer.as_str())
			}
		}
	}
}

/// Operations supported by the orchestration layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Operation {
	Payment {
		destination: String,
		asset: Asset,
		/// Decimal string; fixed-point semantics, never binary float.
		amount: String,
	},
	ChangeTrust {
		asset: Asset,
		#[serde(skip_serializing_if = "Option::is_none")]
		limit: Option<String>,
	},
}

/// Transaction memo. Only text memos are supported.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Memo {
	Text(String),
}

/// An unsigned transaction payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
	pub source_account: String,
	/// One past the source account's loaded sequence number.
	pub sequence: i64,
	/// Total fee in stroops (base fee times operation count).
	pub fee: u32,
	pub min_time: u64,
	pub max_time: u64,
	pub operations: Vec<Operation>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub memo: Option<Memo>,
}

impl Transaction {
	/// The byte payload that gets signed: the network passphrase followed by
	/// the canonical JSON encoding of the transaction.
	pub fn signing_payload(&self, network_passphrase: &str) -> Result<Vec<u8>, TxBuildError> {
		let mut payload = network_passphrase.as_bytes().to_vec();
		payload.extend_from_slice(&serde_json::to_vec(self)?);
		Ok(payload)
	}

	/// Signs the transaction with the source keypair.
	pub fn sign(
		self,
		keypair: &Keypair,
		network_passphrase: &str,
	) -> Result<SignedTransaction, TxBuildError> {
		let payload = self.signing_payload(network_passphrase)?;
		let signature = keypair.sign(&payload);
		Ok(SignedTransaction {
			tx: self,
			signature: hex::encode(signature.to_bytes()),
		})
	}
}

/// A signed transaction ready for submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignedTransaction {
	pub tx: Transaction,
	/// Hex-encoded ed25519 signature over the signing payload.
	pub signature: String,
}

/// Builder for constructing ledger transactions from loaded account state
pub struct TransactionBuilder {
	source: AccountRecord,
	base_fee: Option<u32>,
	timeout: Duration,
	operations: Vec<Operation>,
	memo: Option<Memo>,
}

impl TransactionBuilder {
	/// Creates a new builder seeded from freshly loaded account state.
	pub fn new(source: AccountRecord) -> Self {
		Self {
			source,
			base_fee: None,
			timeout: Duration::from_secs(TX_TIMEOUT_SECS),
			operations: Vec::new(),
			memo: None,
		}
	}

	/// Sets the per-operation base fee in stroops.
	pub fn with_base_fee(mut self, fee: u32) -> Self {
		self.base_fee = Some(fee);
		self
	}

	/// Overrides the validity window.
	pub fn with_timeout(mut self, timeout: Duration) -> Self {
		self.timeout = timeout;
		self
	}

	/// Appends an operation.
	pub fn add_operation(mut self, operation: Operation) -> Self {
		self.operations.push(operation);
		self
	}

	/// Attaches a memo.
	pub fn with_memo(mut self, memo: Memo) -> Self {
		self.memo = Some(memo);
		self
	}

	/// Builds the unsigned transaction, assigning the next sequence number
	/// and the bounded validity window.
	pub fn build(self) -> Result<Transaction, TxBuildError> {
		if self.operations.is_empty() {
			return Err(TxBuildError::NoOperations);
		}
		let base_fee = self.base_fee.ok_or(TxBuildError::MissingFee)?;

		if let Some(Memo::Text(text)) = &self.memo {
			if text.len() > MAX_MEMO_BYTES {
				return Err(TxBuildError::MemoTooLong(text.len()));
			}
		}

		let now = SystemTime::now()
			.duration_since(UNIX_EPOCH)
			.unwrap_or_default()
			.as_secs();

		Ok(Transaction {
			source_account: self.source.account_id.clone(),
			sequence: self.source.sequence + 1,
			fee: base_fee * self.operations.len() as u32,
			min_time: 0,
			max_time: now + self.timeout.as_secs(),
			operations: self.operations,
			memo: self.memo,
		})
	}
}
