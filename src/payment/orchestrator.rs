//! Payment and trust-line submission orchestration.
//!
//! The orchestrator owns the full submission pipeline: preflight validation,
//! per-source sequence serialization, loading authoritative account state,
//! building and signing the transaction with a bounded validity window,
//! submitting it, normalizing any failure onto the closed taxonomy, and
//! mirroring confirmed payments into the audit store.
//!
//! Two rules are contractual:
//! - submissions sharing a source public key are totally ordered by lease
//!   acquisition; submissions from different sources proceed in parallel;
//! - a successful ledger submission is reported as success even when the
//!   audit mirror write fails afterwards. The ledger, not the mirror, is the
//!   source of truth.

use crate::account::Keypair;
use crate::account::keys::decode_public_key;
use crate::horizon::client::LedgerClient;
use crate::horizon::SubmitSuccess;
use crate::payment::error::PaymentError;
use crate::payment::sequencer::SequenceGate;
use crate::store::{AuditStore, NewTransaction};
use crate::tx::{
	Asset, MAX_MEMO_BYTES, Memo, Operation, TransactionBuilder, TxBuildError,
};
use crate::utils::amount::{parse_amount, parse_balance};
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

/// Result of a confirmed payment submission.
#[derive(Debug, Clone, Serialize)]
pub struct PaymentReceipt {
	pub hash: String,
	pub fee_charged: i64,
	pub ledger: i64,
}

/// A payment submission request. The sender secret lives only for the
/// duration of this request.
#[derive(Debug, Clone)]
pub struct PaymentRequest {
	pub sender_secret: String,
	pub receiver_public: String,
	pub amount: String,
	pub memo: Option<String>,
}

/// Normalized balance entry for history/balance queries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BalanceView {
	pub asset: String,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub issuer: Option<String>,
	pub balance: String,
}

/// Symbolic name the native asset is reported under.
const NATIVE_ASSET_NAME: &str = "XLM";

fn asset_code(asset: &Asset) -> &str {
	match asset {
		Asset::Native => NATIVE_ASSET_NAME,
		Asset::Credit { code, .. } => code,
	}
}

fn map_build_error(err: TxBuildError) -> PaymentError {
	match err {
		TxBuildError::MemoTooLong(_) => PaymentError::InvalidArgument(err.to_string()),
		other => PaymentError::TransactionRejected {
			reason: format!("could not build transaction: {other}"),
			details: None,
		},
	}
}

/// Orchestrates trust-line and payment submissions against the ledger.
pub struct PaymentOrchestrator {
	ledger: Arc<dyn LedgerClient>,
	store: Arc<dyn AuditStore>,
	gate: SequenceGate,
	payment_asset: Asset,
	network_passphrase: String,
}

impl PaymentOrchestrator {
	pub fn new(
		ledger: Arc<dyn LedgerClient>,
		store: Arc<dyn AuditStore>,
		payment_asset: Asset,
		network_passphrase: String,
	) -> Self {
		Self {
			ledger,
			store,
			gate: SequenceGate::new(),
			payment_asset,
			network_passphrase,
		}
	}

	fn normalize(&self, err: crate::horizon::HorizonError) -> PaymentError {
		PaymentError::normalize(err, asset_code(&self.payment_asset))
	}

	/// Establishes the payment-asset trust line for the account derived from
	/// `secret_key`. Success means the account may hold the asset afterwards.
	pub async fn add_trustline(&self, secret_key: &str) -> Result<SubmitSuccess, PaymentError> {
		let keypair = Keypair::from_secret(secret_key)
			.map_err(|e| PaymentError::InvalidArgument(format!("malformed secret key: {e}")))?;
		let public_key = keypair.public_key();

		let _lease = self.gate.acquire(&public_key).await;
		let account = self
			.ledger
			.load_account(&public_key)
			.await
			.map_err(|e| self.normalize(e))?;
		let base_fee = self
			.ledger
			.fetch_base_fee()
			.await
			.map_err(|e| self.normalize(e))?;

		let tx = TransactionBuilder::new(account)
			.with_base_fee(base_fee)
			.add_operation(Operation::ChangeTrust {
				asset: self.payment_asset.clone(),
				limit: None,
			})
			.build()
			.map_err(map_build_error)?;
		let signed = tx
			.sign(&keypair, &self.network_passphrase)
			.map_err(map_build_error)?;

		let success = self
			.ledger
			.submit_transaction(&signed)
			.await
			.map_err(|e| self.normalize(e))?;
		info!(
			"trustline added for {} ({})",
			public_key,
			asset_code(&self.payment_asset)
		);
		Ok(success)
	}

	/// Submits a payment of the configured asset.
	///
	/// Validation happens before any network call; the sequence lease is held
	/// from account load through submission; audit mirroring is best-effort
	/// and never changes the outcome of a confirmed submission.
	pub async fn send_payment(
		&self,
		request: PaymentRequest,
	) -> Result<PaymentReceipt, PaymentError> {
		let amount_stroops = parse_amount(&request.amount)
			.map_err(|e| PaymentError::InvalidArgument(e.to_string()))?;
		if let Some(memo) = &request.memo {
			if memo.len() > MAX_MEMO_BYTES {
				return Err(PaymentError::InvalidArgument(format!(
					"memo exceeds {MAX_MEMO_BYTES} bytes ({} bytes)",
					memo.len()
				)));
			}
		}
		let keypair = Keypair::from_secret(&request.sender_secret)
			.map_err(|e| PaymentError::InvalidArgument(format!("malformed sender secret: {e}")))?;
		decode_public_key(&request.receiver_public).map_err(|e| {
			PaymentError::InvalidArgument(format!("malformed receiver public key: {e}"))
		})?;
		let sender_public = keypair.public_key();

		let lease = self.gate.acquire(&sender_public).await;
		let account = self
			.ledger
			.load_account(&sender_public)
			.await
			.map_err(|e| self.normalize(e))?;
		let base_fee = self
			.ledger
			.fetch_base_fee()
			.await
			.map_err(|e| self.normalize(e))?;

		// Preflight balance check. Best-effort guard only: a race between
		// this read and the actual submission is possible, so the network's
		// own underfunded rejection still gets normalized below.
		let held = account
			.balances
			.iter()
			.find(|b| self.payment_asset.matches(b));
		let available_stroops = match held {
			Some(entry) => parse_balance(&entry.balance).map_err(|e| {
				PaymentError::NetworkError(format!("ledger reported malformed balance: {e}"))
			})?,
			None => 0,
		};
		if available_stroops < amount_stroops {
			return Err(PaymentError::InsufficientBalance {
				asset: asset_code(&self.payment_asset).to_string(),
				available: held.map_or_else(|| "0".to_string(), |b| b.balance.clone()),
				requested: request.amount.clone(),
			});
		}

		let mut builder = TransactionBuilder::new(account)
			.with_base_fee(base_fee)
			.add_operation(Operation::Payment {
				destination: request.receiver_public.clone(),
				asset: self.payment_asset.clone(),
				amount: request.amount.clone(),
			});
		if let Some(text) = request.memo.clone() {
			builder = builder.with_memo(Memo::Text(text));
		}
		let tx = builder.build().map_err(map_build_error)?;
		let signed = tx
			.sign(&keypair, &self.network_passphrase)
			.map_err(map_build_error)?;

		let submitted = self.ledger.submit_transaction(&signed).await;
		drop(lease);
		let success = submitted.map_err(|e| self.normalize(e))?;
		info!(
			"sent payment: {} -> {} amount {} hash {}",
			sender_public, request.receiver_public, request.amount, success.hash
		);

		// The payment already happened on the authoritative ledger; a mirror
		// write failure is logged and absorbed.
		let record = NewTransaction {
			hash: success.hash.clone(),
			sender_public_key: sender_public,
			receiver_public_key: request.receiver_public,
			amount: request.amount,
			memo: request.memo,
			ledger: success.ledger,
		};
		if let Err(e) = self.store.save_transaction(record).await {
			warn!(
				"audit mirror write failed for confirmed payment {}: {}",
				success.hash, e
			);
		}

		Ok(PaymentReceipt {
			hash: success.hash,
			fee_charged: success.fee_charged,
			ledger: success.ledger,
		})
	}

	/// Live balance read. Not part of the sequence lease; may observe state
	/// from either side of a concurrent in-flight submission.
	pub async fn get_balances(&self, public_key: &str) -> Result<Vec<BalanceView>, PaymentError> {
		decode_public_key(public_key)
			.map_err(|e| PaymentError::InvalidArgument(format!("malformed public key: {e}")))?;
		let account = self
			.ledger
			.load_account(public_key)
			.await
			.map_err(|e| self.normalize(e))?;

		let balances = account
			.balances
			.into_iter()
			.map(|entry| {
				if entry.is_native() {
					BalanceView {
						asset: NATIVE_ASSET_NAME.to_string(),
						issuer: None,
						balance: entry.balance,
					}
				} else {
					BalanceView {
						asset: entry.asset_code.unwrap_or(entry.asset_type),
						issuer: entry.asset_issuer,
						balance: entry.balance,
					}
				}
			})
			.collect();
		Ok(balances)
	}
}
