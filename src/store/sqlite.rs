//! SQLite implementation of the audit store.
//!
//! # Schema
//!
//! Two tables: `accounts(publicKey UNIQUE, secretKey, role, createdAt)` and
//! `transactions(hash UNIQUE, senderPublicKey, receiverPublicKey, amount,
//! memo, ledger, status, createdAt)`. Transactions reference accounts by
//! public key softly: a payment touching an account never provisioned through
//! this service is still recorded.

use super::{
	AccountRow, AccountSummary, AuditStore, DEFAULT_ACCOUNT_HISTORY_LIMIT, DEFAULT_HISTORY_LIMIT,
	NewAccount, NewTransaction, StoreError, TransactionRow, effective_limit,
};
use rusqlite::{Connection, OptionalExtension, params};
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::info;

/// Durable audit store backed by SQLite.
///
/// The connection lives behind a mutex; schema initialization runs to
/// completion before the store is handed out, so all later reads and writes
/// see the full schema.
pub struct SqliteAuditStore {
	conn: Arc<Mutex<Connection>>,
}

impl SqliteAuditStore {
	/// Opens (or creates) the database at `path` and initializes the schema.
	pub fn open(path: &Path) -> Result<Self, StoreError> {
		let conn = Connection::open(path)?;
		Self::init_schema(&conn)?;
		info!("database connected at {:?}", path);
		Ok(Self {
			conn: Arc::new(Mutex::new(conn)),
		})
	}

	/// Opens an in-memory database, used by tests and throwaway runs.
	pub fn open_in_memory() -> Result<Self, StoreError> {
		let conn = Connection::open_in_memory()?;
		Self::init_schema(&conn)?;
		Ok(Self {
			conn: Arc::new(Mutex::new(conn)),
		})
	}

	fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
		conn.execute(
			"CREATE TABLE IF NOT EXISTS accounts (
				id INTEGER PRIMARY KEY AUTOINCREMENT,
				publicKey TEXT UNIQUE NOT NULL,
				secretKey TEXT NOT NULL,
				role TEXT NOT NULL,
				createdAt TEXT NOT NULL
			)",
			[],
		)?;
		conn.execute(
			"CREATE TABLE IF NOT EXISTS transactions (
				id INTEGER PRIMARY KEY AUTOINCREMENT,
				hash TEXT UNIQUE NOT NULL,
				senderPublicKey TEXT NOT NULL,
				receiverPublicKey TEXT NOT NULL,
				amount TEXT NOT NULL,
				memo TEXT,
				ledger INTEGER NOT NULL,
				status TEXT NOT NULL DEFAULT 'success',
				createdAt TEXT NOT NULL
			)",
			[],
		)?;
		conn.execute(
			"CREATE INDEX IF NOT EXISTS idx_transactions_sender
			 ON transactions(senderPublicKey)",
			[],
		)?;
		conn.execute(
			"CREATE INDEX IF NOT EXISTS idx_transactions_receiver
			 ON transactions(receiverPublicKey)",
			[],
		)?;
		Ok(())
	}

	fn lock(&self) -> std::sync::MutexGuard<'_, Connection> {
		self.conn.lock().expect("audit store mutex poisoned")
	}
}

fn row_to_transaction(row: &rusqlite::Row<'_>) -> rusqlite::Result<TransactionRow> {
	Ok(TransactionRow {
		hash: row.get("hash")?,
		sender_public_key: row.get("senderPublicKey")?,
		receiver_public_key: row.get("receiverPublicKey")?,
		amount: row.get("amount")?,
		memo: row.get("memo")?,
		ledger: row.get("ledger")?,
		status: row.get("status")?,
		created_at: row.get("createdAt")?,
	})
}

#[async_trait::async_trait]
impl AuditStore for SqliteAuditStore {
	async fn save_account(&self, account: NewAccount) -> Result<(), StoreError> {
		let created_at = chrono::Utc::now().to_rfc3339();
		self.lock().execute(
			"INSERT INTO accounts (publicKey, secretKey, role, createdAt)
			 VALUES (?1, ?2, ?3, ?4)",
			params![
				account.public_key,
				account.secret_key,
				account.role,
				created_at
			],
		)?;
		Ok(())
	}

	async fn get_account(&self, public_key: &str) -> Result<Option<AccountRow>, StoreError> {
		let row = self
			.lock()
			.query_row(
				"SELECT publicKey, secretKey, role, createdAt
				 FROM accounts WHERE publicKey = ?1",
				params![public_key],
				|row| {
					Ok(AccountRow {
						public_key: row.get(0)?,
						secret_key: row.get(1)?,
						role: row.get(2)?,
						created_at: row.get(3)?,
					})
				},
			)
			.optional()?;
		Ok(row)
	}

	async fn list_accounts(&self) -> Result<Vec<AccountSummary>, StoreError> {
		let conn = self.lock();
		let mut stmt =
			conn.prepare("SELECT publicKey, role, createdAt FROM accounts ORDER BY id")?;
		let rows = stmt
			.query_map([], |row| {
				Ok(AccountSummary {
					public_key: row.get(0)?,
					role: row.get(1)?,
					created_at: row.get(2)?,
				})
			})?
			.collect::<rusqlite::Result<Vec<_>>>()?;
		Ok(rows)
	}

	async fn save_transaction(&self, tx: NewTransaction) -> Result<(), StoreError> {
		let created_at = chrono::Utc::now().to_rfc3339();
		self.lock().execute(
			"INSERT INTO transactions
			 (hash, senderPublicKey, receiverPublicKey, amount, memo, ledger, status, createdAt)
			 VALUES (?1, ?2, ?3, ?4, ?5, ?6, 'success', ?7)",
			params![
				tx.hash,
				tx.sender_public_key,
				tx.receiver_public_key,
				tx.amount,
				tx.memo,
				tx.ledger,
				created_at
			],
		)?;
		Ok(())
	}

	async fn account_transactions(
		&self,
		public_key: &str,
		limit: Option<usize>,
	) -> Result<Vec<TransactionRow>, StoreError> {
		let limit = effective_limit(limit, DEFAULT_ACCOUNT_HISTORY_LIMIT);
		let conn = self.lock();
		let mut stmt = conn.prepare(
			"SELECT hash, senderPublicKey, receiverPublicKey, amount, memo, ledger, status, createdAt
			 FROM transactions
			 WHERE senderPublicKey = ?1 OR receiverPublicKey = ?1
			 ORDER BY createdAt DESC, id DESC
			 LIMIT ?2",
		)?;
		let rows = stmt
			.query_map(params![public_key, limit as i64], row_to_transaction)?
			.collect::<rusqlite::Result<Vec<_>>>()?;
		Ok(rows)
	}

	async fn all_transactions(
		&self,
		limit: Option<usize>,
	) -> Result<Vec<TransactionRow>, StoreError> {
		let limit = effective_limit(limit, DEFAULT_HISTORY_LIMIT);
		let conn = self.lock();
		let mut stmt = conn.prepare(
			"SELECT hash, senderPublicKey, receiverPublicKey, amount, memo, ledger, status, createdAt
			 FROM transactions
			 ORDER BY createdAt DESC, id DESC
			 LIMIT ?1",
		)?;
		let rows = stmt
			.query_map(params![limit as i64], row_to_transaction)?
			.collect::<rusqlite::Result<Vec<_>>>()?;
		Ok(rows)
	}
}
