//!
//! Local audit mirror of accounts and ledger-confirmed transactions.
//!
//! The store is a mirror, not a ledger of record: the authoritative state
//! always lives on the ledger network, and a store failure must never block
//! or falsify a network operation that already succeeded. History reads may
//! lag the ledger; that eventual consistency is deliberate.

/// SQLite-backed audit store
pub mod sqlite;

pub use sqlite::SqliteAuditStore;

use serde::Serialize;
use thiserror::Error;

/// Hard cap on history query limits.
pub const MAX_HISTORY_LIMIT: usize = 500;
/// Default limit for per-account history queries.
pub const DEFAULT_ACCOUNT_HISTORY_LIMIT: usize = 50;
/// Default limit for the global history query.
pub const DEFAULT_HISTORY_LIMIT: usize = 100;

/// Clamps a requested history limit to the allowed range.
pub fn effective_limit(requested: Option<usize>, default: usize) -> usize {
	requested.unwrap_or(default).min(MAX_HISTORY_LIMIT)
}

#[derive(Debug, Error)]
pub enum StoreError {
	#[error("database error: {0}")]
	Database(#[from] rusqlite::Error),
}

/// A provisioned account to persist.
#[derive(Debug, Clone)]
pub struct NewAccount {
	pub public_key: String,
	pub secret_key: String,
	pub role: String,
}

/// A stored account, secret included. Internal use only.
#[derive(Debug, Clone)]
pub struct AccountRow {
	pub public_key: String,
	pub secret_key: String,
	pub role: String,
	pub created_at: String,
}

/// Account listing entry. Never carries the secret key.
#[derive(Debug, Clone, Serialize)]
pub struct AccountSummary {
	pub public_key: String,
	pub role: String,
	pub created_at: String,
}

/// A network-confirmed payment to mirror. Only successful submissions are
/// ever recorded.
#[derive(Debug, Clone)]
pub struct NewTransaction {
	pub hash: String,
	pub sender_public_key: String,
	pub receiver_public_key: String,
	pub amount: String,
	pub memo: Option<String>,
	pub ledger: i64,
}

/// A mirrored transaction record.
#[derive(Debug, Clone, Serialize)]
pub struct TransactionRow {
	pub hash: String,
	pub sender_public_key: String,
	pub receiver_public_key: String,
	pub amount: String,
	pub memo: Option<String>,
	pub ledger: i64,
	pub status: String,
	pub created_at: String,
}

/// Durable audit mirror of accounts and transactions.
#[async_trait::async_trait]
pub trait AuditStore: Send + Sync {
	async fn save_account(&self, account: NewAccount) -> Result<(), StoreError>;
	async fn get_account(&self, public_key: &str) -> Result<Option<AccountRow>, StoreError>;
	async fn list_accounts(&self) -> Result<Vec<AccountSummary>, StoreError>;
	async fn save_transaction(&self, tx: NewTransaction) -> Result<(), StoreError>;
	/// Transactions sent or received by the account, most recent first.
	async fn account_transactions(
		&self,
		public_key: &str,
		limit: Option<usize>,
	) -> Result<Vec<TransactionRow>, StoreError>;
	/// All recorded transactions, most recent first.
	async fn all_transactions(&self, limit: Option<usize>)
	-> Result<Vec<TransactionRow>, StoreError>;
}
