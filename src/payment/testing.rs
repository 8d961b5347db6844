//! Deterministic in-process ledger fake for orchestration tests.
//!
//! Models the pieces of network behavior the orchestrator depends on: a
//! per-account sequence counter that accepts exactly one transaction per
//! number, trust-line-gated credit balances, and structured rejection
//! payloads. Instrumented with call counters and an overlap detector so tests
//! can assert preflight short-circuits and lease mutual exclusion.

use crate::horizon::{
	AccountRecord, BalanceRecord, HorizonError, ResultCodes, SubmissionFailure, SubmitSuccess,
};
use crate::horizon::client::LedgerClient;
use crate::store::{
	AccountRow, AccountSummary, AuditStore, NewAccount, NewTransaction, StoreError, TransactionRow,
};
use crate::tx::{Asset, Operation, SignedTransaction};
use crate::utils::amount::{STROOPS_PER_UNIT, parse_amount};
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicUsize, Ordering};
use std::time::Duration;

pub fn format_stroops(stroops: i64) -> String {
	format!(
		"{}.{:07}",
		stroops / STROOPS_PER_UNIT,
		stroops % STROOPS_PER_UNIT
	)
}

#[derive(Default, Clone)]
pub struct FakeAccount {
	pub sequence: i64,
	pub native_stroops: i64,
	/// (code, issuer) -> balance. Presence of a key is the trust line.
	pub trustlines: HashMap<(String, String), i64>,
}

pub struct FakeLedger {
	accounts: Mutex<HashMap<String, FakeAccount>>,
	in_flight: Mutex<HashSet<String>>,
	pub overlaps: AtomicUsize,
	pub load_calls: AtomicUsize,
	pub submit_calls: AtomicUsize,
	pub fail_funding: AtomicBool,
	pub fail_trust: AtomicBool,
	next_ledger: AtomicI64,
	next_hash: AtomicI64,
}

impl FakeLedger {
	pub fn new() -> Self {
		Self {
			accounts: Mutex::new(HashMap::new()),
			in_flight: Mutex::new(HashSet::new()),
			overlaps: AtomicUsize::new(0),
			load_calls: AtomicUsize::new(0),
			submit_calls: AtomicUsize::new(0),
			fail_funding: AtomicBool::new(false),
			fail_trust: AtomicBool::new(false),
			next_ledger: AtomicI64::new(1000),
			next_hash: AtomicI64::new(1),
		}
	}

	/// Registers a funded account directly, bypassing the faucet.
	pub fn seed_account(&self, public_key: &str, native_stroops: i64) {
		self.accounts.lock().unwrap().insert(
			public_key.to_string(),
			FakeAccount {
				sequence: 0,
				native_stroops,
				trustlines: HashMap::new(),
			},
		);
	}

	/// Grants a trust line and credits a balance in one step.
	pub fn credit(&self, public_key: &str, asset: &Asset, stroops: i64) {
		let Asset::Credit { code, issuer } = asset else {
			panic!("credit() is for credit assets");
		};
		let mut accounts = self.accounts.lock().unwrap();
		let account = accounts.get_mut(public_key).expect("unknown fake account");
		*account
			.trustlines
			.entry((code.clone(), issuer.clone()))
			.or_insert(0) += stroops;
	}

	pub fn sequence_of(&self, public_key: &str) -> i64 {
		self.accounts.lock().unwrap()[public_key].sequence
	}

	pub fn has_trustline(&self, public_key: &str, asset: &Asset) -> bool {
		let Asset::Credit { code, issuer } = asset else {
			return true;
		};
		self.accounts.lock().unwrap()[public_key]
			.trustlines
			.contains_key(&(code.clone(), issuer.clone()))
	}

	fn reject(transaction: Option<&str>, operations: Option<Vec<&str>>) -> HorizonError {
		HorizonError::Submission(SubmissionFailure {
			result_codes: ResultCodes {
				transaction: transaction.map(str::to_string),
				operations: operations.map(|ops| ops.into_iter().map(str::to_string).collect()),
			},
			raw: Some(serde_json::json!({"title": "Transaction Failed"})),
		})
	}

	fn apply(&self, tx: &SignedTransaction) -> Result<SubmitSuccess, HorizonError> {
		let mut accounts = self.accounts.lock().unwrap();
		let source = tx.tx.source_account.clone();
		let Some(account) = accounts.get(&source) else {
			return Err(Self::reject(Some("tx_no_source_account"), None));
		};
		if tx.tx.sequence != account.sequence + 1 {
			return Err(Self::reject(Some("tx_bad_seq"), None));
		}

		// An included-but-failed transaction still consumes its sequence
		// number, matching the network.
		accounts.get_mut(&source).unwrap().sequence += 1;

		for op in &tx.tx.operations {
			match op {
				Operation::ChangeTrust { asset, .. } => {
					if self.fail_trust.load(Ordering::SeqCst) {
						return Err(Self::reject(
							Some("tx_failed"),
							Some(vec!["op_low_reserve"]),
						));
					}
					let Asset::Credit { code, issuer } = asset else {
						return Err(Self::reject(Some("tx_failed"), Some(vec!["op_malformed"])));
					};
					accounts
						.get_mut(&source)
						.unwrap()
						.trustlines
						.entry((code.clone(), issuer.clone()))
						.or_insert(0);
				}
				Operation::Payment {
					destination,
					asset,
					amount,
				} => {
					let stroops = parse_amount(amount)
						.map_err(|_| Self::reject(Some("tx_failed"), Some(vec!["op_malformed"])))?;
					let Asset::Credit { code, issuer } = asset else {
						return Err(Self::reject(Some("tx_failed"), Some(vec!["op_malformed"])));
					};
					let key = (code.clone(), issuer.clone());

					let sender_balance = accounts[&source]
						.trustlines
						.get(&key)
						.copied()
						.unwrap_or(0);
					if sender_balance < stroops {
						return Err(Self::reject(
							Some("tx_failed"),
							Some(vec!["op_underfunded"]),
						));
					}
					let Some(receiver) = accounts.get(destination) else {
						return Err(Self::reject(
							Some("tx_failed"),
							Some(vec!["op_no_destination"]),
						));
					};
					if !receiver.trustlines.contains_key(&key) {
						return Err(Self::reject(Some("tx_failed"), Some(vec!["op_no_trust"])));
					}

					*accounts
						.get_mut(&source)
						.unwrap()
						.trustlines
						.get_mut(&key)
						.unwrap() -= stroops;
					*accounts
						.get_mut(destination)
						.unwrap()
						.trustlines
						.get_mut(&key)
						.unwrap() += stroops;
				}
			}
		}

		Ok(SubmitSuccess {
			hash: format!("fakehash{:08}", self.next_hash.fetch_add(1, Ordering::SeqCst)),
			ledger: self.next_ledger.fetch_add(1, Ordering::SeqCst),
			fee_charged: tx.tx.fee as i64,
		})
	}
}

#[async_trait::async_trait]
impl LedgerClient for FakeLedger {
	async fn load_account(&self, account_id: &str) -> Result<AccountRecord, HorizonError> {
		self.load_calls.fetch_add(1, Ordering::SeqCst);
		let accounts = self.accounts.lock().unwrap();
		let Some(account) = accounts.get(account_id) else {
			return Err(HorizonError::UnexpectedStatus {
				status: 404,
				body: "{\"title\":\"Resource Missing\"}".to_string(),
			});
		};

		let mut balances = vec![BalanceRecord {
			asset_type: "native".to_string(),
			asset_code: None,
			asset_issuer: None,
			balance: format_stroops(account.native_stroops),
		}];
		for ((code, issuer), stroops) in &account.trustlines {
			balances.push(BalanceRecord {
				asset_type: "credit_alphanum4".to_string(),
				asset_code: Some(code.clone()),
				asset_issuer: Some(issuer.clone()),
				balance: format_stroops(*stroops),
			});
		}
		Ok(AccountRecord {
			account_id: account_id.to_string(),
			sequence: account.sequence,
			balances,
		})
	}

	async fn fetch_base_fee(&self) -> Result<u32, HorizonError> {
		Ok(100)
	}

	async fn submit_transaction(
		&self,
		tx: &SignedTransaction,
	) -> Result<SubmitSuccess, HorizonError> {
		self.submit_calls.fetch_add(1, Ordering::SeqCst);

		// Overlap detector: two concurrent submission windows for one source
		// key mean the lease failed.
		let source = tx.tx.source_account.clone();
		{
			let mut in_flight = self.in_flight.lock().unwrap();
			if !in_flight.insert(source.clone()) {
				self.overlaps.fetch_add(1, Ordering::SeqCst);
			}
		}
		tokio::time::sleep(Duration::from_millis(2)).await;
		let result = self.apply(tx);
		self.in_flight.lock().unwrap().remove(&source);
		result
	}

	async fn fund_account(&self, account_id: &str) -> Result<(), HorizonError> {
		if self.fail_funding.load(Ordering::SeqCst) {
			return Err(HorizonError::Faucet("faucet is down".to_string()));
		}
		self.seed_account(account_id, 10_000 * STROOPS_PER_UNIT);
		Ok(())
	}
}

/// Audit store wrapper that fails every transaction write, for exercising
/// the best-effort persistence contract.
pub struct FailingTransactionStore {
	pub inner: crate::store::SqliteAuditStore,
	pub failed_writes: AtomicUsize,
}

impl FailingTransactionStore {
	pub fn new() -> Self {
		Self {
			inner: crate::store::SqliteAuditStore::open_in_memory().unwrap(),
			failed_writes: AtomicUsize::new(0),
		}
	}
}

#[async_trait::async_trait]
impl AuditStore for FailingTransactionStore {
	async fn save_account(&self, account: NewAccount) -> Result<(), StoreError> {
		self.inner.save_account(account).await
	}

	async fn get_account(&self, public_key: &str) -> Result<Option<AccountRow>, StoreError> {
		self.inner.get_account(public_key).await
	}

	async fn list_accounts(&self) -> Result<Vec<AccountSummary>, StoreError> {
		self.inner.list_accounts().await
	}

	async fn save_transaction(&self, _tx: NewTransaction) -> Result<(), StoreError> {
		self.failed_writes.fetch_add(1, Ordering::SeqCst);
		Err(StoreError::Database(rusqlite::Error::InvalidQuery))
	}

	async fn account_transactions(
		&self,
		public_key: &str,
		limit: Option<usize>,
	) -> Result<Vec<TransactionRow>, StoreError> {
		self.inner.account_transactions(public_key, limit).await
	}

	async fn all_transactions(
		&self,
		limit: Option<usize>,
	) -> Result<Vec<TransactionRow>, StoreError> {
		self.inner.all_transactions(limit).await
	}
}

/// Audit store wrapper that fails every account write, for exercising the
/// swallow-and-log contract of account provisioning.
pub struct FailingAccountStore {
	pub inner: crate::store::SqliteAuditStore,
	pub failed_writes: AtomicUsize,
}

impl FailingAccountStore {
	pub fn new() -> Self {
		Self {
			inner: crate::store::SqliteAuditStore::open_in_memory().unwrap(),
			failed_writes: AtomicUsize::new(0),
		}
	}
}

#[async_trait::async_trait]
impl AuditStore for FailingAccountStore {
	async fn save_account(&self, _account: NewAccount) -> Result<(), StoreError> {
		self.failed_writes.fetch_add(1, Ordering::SeqCst);
		Err(StoreError::Database(rusqlite::Error::InvalidQuery))
	}

	async fn get_account(&self, public_key: &str) -> Result<Option<AccountRow>, StoreError> {
		self.inner.get_account(public_key).await
	}

	async fn list_accounts(&self) -> Result<Vec<AccountSummary>, StoreError> {
		self.inner.list_accounts().await
	}

	async fn save_transaction(&self, tx: NewTransaction) -> Result<(), StoreError> {
		self.inner.save_transaction(tx).await
	}

	async fn account_transactions(
		&self,
		public_key: &str,
		limit: Option<usize>,
	) -> Result<Vec<TransactionRow>, StoreError> {
		self.inner.account_transactions(public_key, limit).await
	}

	async fn all_transactions(
		&self,
		limit: Option<usize>,
	) -> Result<Vec<TransactionRow>, StoreError> {
		self.inner.all_transactions(limit).await
	}
}
