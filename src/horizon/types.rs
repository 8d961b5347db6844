//! Types for the Horizon ledger API boundary.

use serde::{Deserialize, Deserializer, Serialize};

fn de_i64_from_string<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
	D: Deserializer<'de>,
{
	// Horizon encodes 64-bit counters as decimal strings.
	let raw = String::deserialize(deserializer)?;
	raw.parse().map_err(serde::de::Error::custom)
}

fn de_u32_from_string<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
	D: Deserializer<'de>,
{
	let raw = String::deserialize(deserializer)?;
	raw.parse().map_err(serde::de::Error::custom)
}

/// One balance entry on a ledger account.
///
/// The native asset is reported with `asset_type == "native"` and carries no
/// code or issuer; credit assets carry both.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BalanceRecord {
	pub asset_type: String,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub asset_code: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub asset_issuer: Option<String>,
	pub balance: String,
}

impl BalanceRecord {
	pub fn is_native(&self) -> bool {
		self.asset_type == "native"
	}
}

/// Authoritative account state loaded from the ledger.
///
/// `sequence` is the per-account monotonic counter; the next accepted
/// transaction from this account must carry `sequence + 1`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountRecord {
	pub account_id: String,
	#[serde(deserialize_with = "de_i64_from_string")]
	pub sequence: i64,
	pub balances: Vec<BalanceRecord>,
}

/// Subset of `GET /fee_stats` the orchestrator consumes.
#[derive(Debug, Clone, Deserialize)]
pub struct FeeStats {
	#[serde(deserialize_with = "de_u32_from_string")]
	pub last_ledger_base_fee: u32,
}

/// Successful submission response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitSuccess {
	/// Network-assigned transaction hash.
	pub hash: String,
	/// Ledger sequence the transaction was included in.
	pub ledger: i64,
	/// Fee actually charged, in stroops.
	pub fee_charged: i64,
}

/// Symbolic result codes attached to a rejected submission.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResultCodes {
	/// Transaction-level rejection reason, e.g. `tx_bad_seq` or `tx_too_late`.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub transaction: Option<String>,
	/// Per-operation failure reasons, e.g. `op_no_trust`.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub operations: Option<Vec<String>>,
}

/// Structured payload of a rejected submission.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SubmissionFailure {
	#[serde(default)]
	pub result_codes: ResultCodes,
	/// Raw extras document, retained for diagnostics only.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub raw: Option<serde_json::Value>,
}

/// Horizon-style problem document returned on a failed submission.
#[derive(Debug, Clone, Deserialize)]
pub struct ProblemDocument {
	#[serde(default)]
	pub extras: Option<ProblemExtras>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProblemExtras {
	#[serde(default)]
	pub result_codes: Option<ResultCodes>,
}

/// Error types for ledger client operations
#[derive(Debug, thiserror::Error)]
pub enum HorizonError {
	#[error("HTTP error: {0}")]
	Http(#[from] reqwest::Error),

	#[error("JSON parse error: {0}")]
	Json(#[from] serde_json::Error),

	#[error("unexpected status {status}: {body}")]
	UnexpectedStatus { status: u16, body: String },

	#[error("transaction submission rejected")]
	Submission(SubmissionFailure),

	#[error("faucet error: {0}")]
	Faucet(String),

	#[error("malformed ledger record: {0}")]
	MalformedRecord(String),
}
