//!
//! HTTP client for the Horizon-style ledger network API.
//!
//! This module defines the `LedgerClient` seam the orchestration layer depends
//! on (load account state, fetch the base fee, submit a signed transaction,
//! request faucet funding) and the `HorizonClient` implementation backed by
//! `reqwest`. Retry and backoff policy is left to the network layer; every
//! method performs exactly one round trip.

use super::types::*;
use crate::tx::SignedTransaction;
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, info};

/// The four ledger network primitives the orchestration layer uses.
///
/// Implemented by [`HorizonClient`] in production; tests substitute a
/// deterministic fake.
#[async_trait]
pub trait LedgerClient: Send + Sync {
	/// Loads authoritative account state (sequence number and balances).
	async fn load_account(&self, account_id: &str) -> Result<AccountRecord, HorizonError>;

	/// Fetches the current per-operation base fee in stroops.
	async fn fetch_base_fee(&self) -> Result<u32, HorizonError>;

	/// Submits a signed transaction and waits for the network's verdict.
	async fn submit_transaction(
		&self,
		tx: &SignedTransaction,
	) -> Result<SubmitSuccess, HorizonError>;

	/// Requests faucet funding for a newly generated account.
	async fn fund_account(&self, account_id: &str) -> Result<(), HorizonError>;
}

/// Horizon ledger API client
#[derive(Clone)]
pub struct HorizonClient {
	/// The underlying HTTP client.
	http_client: Client,
	/// Base URL of the Horizon API.
	horizon_url: String,
	/// Faucet endpoint for funding new testnet accounts.
	friendbot_url: String,
}

impl HorizonClient {
	/// Create a new Horizon client.
	pub fn new(horizon_url: String, friendbot_url: String) -> Self {
		let http_client = Client::builder()
			.timeout(Duration::from_secs(30))
			.build()
			.expect("Failed to create HTTP client");

		Self {
			http_client,
			horizon_url,
			friendbot_url,
		}
	}
}

#[async_trait]
impl LedgerClient for HorizonClient {
	async fn load_account(&self, account_id: &str) -> Result<AccountRecord, HorizonError> {
		let url = format!("{}/accounts/{}", self.horizon_url, account_id);
		debug!("Loading account state from {}", url);

		let response = self.http_client.get(&url).send().await?;
		if !response.status().is_success() {
			return Err(HorizonError::UnexpectedStatus {
				status: response.status().as_u16(),
				body: response.text().await.unwrap_or_default(),
			});
		}

		let record: AccountRecord = response.json().await?;
		Ok(record)
	}

	async fn fetch_base_fee(&self) -> Result<u32, HorizonError> {
		let url = format!("{}/fee_stats", self.horizon_url);
		let response = self.http_client.get(&url).send().await?;
		if !response.status().is_success() {
			return Err(HorizonError::UnexpectedStatus {
				status: response.status().as_u16(),
				body: response.text().await.unwrap_or_default(),
			});
		}

		let stats: FeeStats = response.json().await?;
		Ok(stats.last_ledger_base_fee)
	}

	async fn submit_transaction(
		&self,
		tx: &SignedTransaction,
	) -> Result<SubmitSuccess, HorizonError> {
		let url = format!("{}/transactions", self.horizon_url);
		debug!(
			"Submitting transaction for source {} at sequence {}",
			tx.tx.source_account, tx.tx.sequence
		);

		let response = self.http_client.post(&url).json(tx).send().await?;
		let status = response.status();

		if status.is_success() {
			let success: SubmitSuccess = response.json().await?;
			info!(
				"Transaction accepted: hash {} in ledger {}",
				success.hash, success.ledger
			);
			return Ok(success);
		}

		// Rejections come back as a problem document; decode the result codes
		// and keep the raw extras for diagnostics.
		let body = response.text().await.unwrap_or_default();
		match serde_json::from_str::<ProblemDocument>(&body) {
			Ok(problem) => {
				let raw = serde_json::from_str(&body).ok();
				let result_codes = problem
					.extras
					.and_then(|e| e.result_codes)
					.unwrap_or_default();
				Err(HorizonError::Submission(SubmissionFailure {
					result_codes,
					raw,
				}))
			}
			Err(_) => Err(HorizonError::UnexpectedStatus {
				status: status.as_u16(),
				body,
			}),
		}
	}

	async fn fund_account(&self, account_id: &str) -> Result<(), HorizonError> {
		let url = format!("{}?addr={}", self.friendbot_url, account_id);
		info!("Requesting faucet funding for {}", account_id);

		let response = self
			.http_client
			.get(&url)
			.send()
			.await
			.map_err(|e| HorizonError::Faucet(e.to_string()))?;

		if !response.status().is_success() {
			let body = response.text().await.unwrap_or_default();
			return Err(HorizonError::Faucet(body));
		}
		Ok(())
	}
}
