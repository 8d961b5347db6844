mod account;
mod config;
mod horizon;
mod payment;
mod store;
mod tx;
mod utils;

use std::sync::Arc;
use tracing::{error, info, warn};

use crate::account::{AccountProvisioner, Role};
use crate::config::Config;
use crate::horizon::HorizonClient;
use crate::payment::{PaymentOrchestrator, PaymentRequest};
use crate::store::{AuditStore, SqliteAuditStore};

#[tokio::main]
async fn main() {
	tracing_subscriber::fmt()
		.with_env_filter(
			tracing_subscriber::EnvFilter::from_default_env()
				.add_directive(tracing::Level::INFO.into()),
		)
		.with_target(false)
		.with_thread_ids(false)
		.with_thread_names(false)
		.with_file(false)
		.with_line_number(false)
		.with_timer(tracing_subscriber::fmt::time::time())
		.init();

	info!("Starting payment orchestration service");
	let config = Config::from_env();

	if let Some(parent) = config.database_path.parent() {
		if let Err(e) = std::fs::create_dir_all(parent) {
			error!("Failed to create data directory {:?}: {}", parent, e);
			return;
		}
	}
	let store: Arc<dyn AuditStore> = match SqliteAuditStore::open(&config.database_path) {
		Ok(store) => Arc::new(store),
		Err(e) => {
			error!("Failed to open audit store: {}", e);
			return;
		}
	};

	let ledger = Arc::new(HorizonClient::new(
		config.horizon_url.clone(),
		config.friendbot_url.clone(),
	));
	let orchestrator = Arc::new(PaymentOrchestrator::new(
		ledger.clone(),
		store.clone(),
		config.payment_asset(),
		config.network.passphrase().to_string(),
	));
	let provisioner = AccountProvisioner::new(ledger, store.clone(), orchestrator.clone());

	info!("Created Horizon client for {}", config.horizon_url);

	// End-to-end flow: provision both roles, pay, and read back the mirror.
	let employer = match provisioner.create_account(Role::Employer).await {
		Ok(account) => account,
		Err(e) => {
			error!("Failed to create employer account: {}", e);
			return;
		}
	};
	info!(
		"Created employer account {} (trustline established: {})",
		employer.public_key, employer.trust.established
	);

	let freelancer = match provisioner.create_account(Role::Freelancer).await {
		Ok(account) => account,
		Err(e) => {
			error!("Failed to create freelancer account: {}", e);
			return;
		}
	};
	info!(
		"Created freelancer account {} (trustline established: {})",
		freelancer.public_key, freelancer.trust.established
	);

	// A fresh testnet employer holds no USDC yet, so the payment below is
	// expected to fail underfunded unless the issuer has credited it; the
	// point of the demo is exercising the full pipeline either way.
	let request = PaymentRequest {
		sender_secret: employer.secret_key.clone(),
		receiver_public: freelancer.public_key.clone(),
		amount: "10".to_string(),
		memo: Some("demo payment".to_string()),
	};
	match orchestrator.send_payment(request).await {
		Ok(receipt) => info!(
			"Payment confirmed: hash {} in ledger {} (fee {} stroops)",
			receipt.hash, receipt.ledger, receipt.fee_charged
		),
		Err(e) => warn!("Payment failed ({}): {}", e.kind(), e),
	}

	match orchestrator.get_balances(&freelancer.public_key).await {
		Ok(balances) => {
			for balance in balances {
				info!(
					"Freelancer balance: {} {}{}",
					balance.balance,
					balance.asset,
					balance
						.issuer
						.map(|i| format!(" (issuer {i})"))
						.unwrap_or_default()
				);
			}
		}
		Err(e) => warn!("Balance query failed: {}", e),
	}

	match store.account_transactions(&freelancer.public_key, None).await {
		Ok(transactions) => {
			info!("Mirrored transactions: {}", transactions.len());
			for tx in transactions {
				info!(
					"  {} {} -> {} amount {}",
					tx.hash, tx.sender_public_key, tx.receiver_public_key, tx.amount
				);
			}
		}
		Err(e) => warn!("History query failed: {}", e),
	}
}
