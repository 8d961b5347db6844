//!
//! Closed error taxonomy for payment orchestration.
//!
//! Every failure path of the orchestration layer maps onto exactly one of the
//! variants below before it crosses the component boundary. Raw vendor
//! payloads from a rejected submission are retained as an opaque `details`
//! value for diagnostics; callers must never pattern-match on them.

use crate::horizon::{HorizonError, SubmissionFailure};
use serde_json::Value;
use thiserror::Error;

/// Ledger operation result code for a missing destination trust line.
const OP_NO_TRUST: &str = "op_no_trust";
/// Ledger operation result code for insufficient source funds.
const OP_UNDERFUNDED: &str = "op_underfunded";

#[derive(Debug, Error)]
pub enum PaymentError {
	/// Caller error caught before any network call.
	#[error("invalid argument: {0}")]
	InvalidArgument(String),

	/// Preflight-detected shortfall; no submission was made.
	#[error("insufficient balance: sender has {available} {asset}, needs {requested}")]
	InsufficientBalance {
		asset: String,
		available: String,
		requested: String,
	},

	/// The recipient has no trust line for the payment asset.
	#[error("{asset} not trusted by recipient: add a trustline for {asset} before retrying")]
	NoTrustline {
		asset: String,
		details: Option<Value>,
	},

	/// The network itself rejected the operation as underfunded.
	#[error("insufficient balance on the ledger to perform the operation")]
	Underfunded { details: Option<Value> },

	/// Transaction-level rejection: bad sequence, expired validity window,
	/// insufficient fee, or any other non-operation failure.
	#[error("transaction rejected: {reason}")]
	TransactionRejected {
		reason: String,
		details: Option<Value>,
	},

	/// Transport or decoding failure with no structured rejection payload.
	#[error("ledger network error: {0}")]
	NetworkError(String),

	/// Faucet funding of a new account failed; fatal to account creation.
	#[error("account funding failed: {0}")]
	FundingFailed(String),

	/// Audit store write failed. Never surfaced as the primary failure once
	/// the ledger operation succeeded; logged and absorbed instead.
	#[error("persistence failed: {0}")]
	PersistenceFailed(String),
}

impl PaymentError {
	/// Maps a raw ledger client failure onto the taxonomy. Total: every
	/// `HorizonError` produces exactly one variant.
	pub fn normalize(err: HorizonError, asset: &str) -> Self {
		match err {
			HorizonError::Submission(failure) => Self::from_submission(failure, asset),
			HorizonError::UnexpectedStatus { status, body } => {
				let details = serde_json::from_str(&body).ok();
				Self::TransactionRejected {
					reason: format!("ledger returned status {status}"),
					details,
				}
			}
			HorizonError::Faucet(reason) => Self::FundingFailed(reason),
			other => Self::NetworkError(other.to_string()),
		}
	}

	fn from_submission(failure: SubmissionFailure, asset: &str) -> Self {
		let codes = &failure.result_codes;
		let op_codes = codes.operations.as_deref().unwrap_or_default();

		if op_codes.iter().any(|c| c == OP_NO_TRUST) {
			return Self::NoTrustline {
				asset: asset.to_string(),
				details: failure.raw,
			};
		}
		if op_codes.iter().any(|c| c == OP_UNDERFUNDED) {
			return Self::Underfunded {
				details: failure.raw,
			};
		}

		let reason = match (&codes.transaction, op_codes.is_empty()) {
			(Some(tx_code), false) => format!("{} ({})", tx_code, op_codes.join(", ")),
			(Some(tx_code), true) => tx_code.clone(),
			(None, false) => op_codes.join(", "),
			(None, true) => "transaction failed with no result codes".to_string(),
		};
		Self::TransactionRejected {
			reason,
			details: failure.raw,
		}
	}

	/// Stable machine-readable name for the boundary layer.
	pub fn kind(&self) -> &'static str {
		match self {
			Self::InvalidArgument(_) => "invalid_argument",
			Self::InsufficientBalance { .. } => "insufficient_balance",
			Self::NoTrustline { .. } => "no_trustline",
			Self::Underfunded { .. } => "underfunded",
			Self::TransactionRejected { .. } => "transaction_rejected",
			Self::NetworkError(_) => "network_error",
			Self::FundingFailed(_) => "funding_failed",
			Self::PersistenceFailed(_) => "persistence_failed",
		}
	}

	/// Raw rejection payload, if the failure carried one. Diagnostics only.
	pub fn details(&self) -> Option<&Value> {
		match self {
			Self::NoTrustline { details, .. }
			| Self::Underfunded { details }
			| Self::TransactionRejected { details, .. } => details.as_ref(),
			_ => None,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::horizon::ResultCodes;

	fn submission(transaction: Option<&str>, operations: Option<Vec<&str>>) -> HorizonError {
		HorizonError::Submission(SubmissionFailure {
			result_codes: ResultCodes {
				transaction: transaction.map(str::to_string),
				operations: operations.map(|ops| ops.into_iter().map(str::to_string).collect()),
			},
			raw: Some(serde_json::json!({"title": "Transaction Failed"})),
		})
	}

	#[test]
	fn maps_missing_trustline_first() {
		let err = PaymentError::normalize(
			submission(Some("tx_failed"), Some(vec!["op_no_trust"])),
			"USDC",
		);
		assert!(matches!(err, PaymentError::NoTrustline { .. }));
		assert!(err.details().is_some());
		assert!(err.to_string().contains("trustline"));
	}

	#[test]
	fn maps_underfunded_operation() {
		let err = PaymentError::normalize(
			submission(Some("tx_failed"), Some(vec!["op_underfunded"])),
			"USDC",
		);
		assert!(matches!(err, PaymentError::Underfunded { .. }));
	}

	#[test]
	fn maps_transaction_level_rejections_with_reason() {
		let err = PaymentError::normalize(submission(Some("tx_bad_seq"), None), "USDC");
		match err {
			PaymentError::TransactionRejected { reason, .. } => assert_eq!(reason, "tx_bad_seq"),
			other => panic!("unexpected mapping: {other:?}"),
		}

		let err = PaymentError::normalize(submission(Some("tx_too_late"), Some(vec![])), "USDC");
		assert!(err.to_string().contains("tx_too_late"));
	}

	#[test]
	fn maps_unrecognized_operation_codes_to_rejection() {
		let err = PaymentError::normalize(
			submission(None, Some(vec!["op_no_destination"])),
			"USDC",
		);
		match err {
			PaymentError::TransactionRejected { reason, .. } => {
				assert_eq!(reason, "op_no_destination")
			}
			other => panic!("unexpected mapping: {other:?}"),
		}
	}

	#[test]
	fn maps_transport_failures_to_network_error() {
		let err = PaymentError::normalize(
			HorizonError::MalformedRecord("truncated body".to_string()),
			"USDC",
		);
		assert!(matches!(err, PaymentError::NetworkError(_)));
		assert!(err.details().is_none());
	}

	#[test]
	fn maps_unexpected_status_to_rejection() {
		let err = PaymentError::normalize(
			HorizonError::UnexpectedStatus {
				status: 404,
				body: "{}".to_string(),
			},
			"USDC",
		);
		match err {
			PaymentError::TransactionRejected { reason, .. } => {
				assert!(reason.contains("404"))
			}
			other => panic!("unexpected mapping: {other:?}"),
		}
	}

	#[test]
	fn kinds_are_stable() {
		assert_eq!(
			PaymentError::InvalidArgument("x".into()).kind(),
			"invalid_argument"
		);
		assert_eq!(
			PaymentError::PersistenceFailed("x".into()).kind(),
			"persistence_failed"
		);
	}
}
