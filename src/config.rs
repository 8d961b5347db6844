//! Environment-driven configuration with testnet defaults.

use crate::tx::Asset;
use std::env;
use std::path::PathBuf;

/// Which ledger network submissions are signed for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Network {
	Testnet,
	Public,
}

impl Network {
	/// The passphrase mixed into every signing payload; a transaction signed
	/// for one network is invalid on the other.
	pub fn passphrase(&self) -> &'static str {
		match self {
			Network::Testnet => "Test SDF Network ; September 2015",
			Network::Public => "Public Global Stellar Network ; September 2015",
		}
	}
}

#[derive(Debug, Clone)]
pub struct Config {
	pub horizon_url: String,
	pub friendbot_url: String,
	pub usdc_issuer: String,
	pub network: Network,
	pub database_path: PathBuf,
}

impl Config {
	pub fn from_env() -> Self {
		let network = match env::var("STELLAR_NETWORK").as_deref() {
			Ok("PUBLIC") => Network::Public,
			_ => Network::Testnet,
		};
		Self {
			horizon_url: env::var("HORIZON_URL")
				.unwrap_or_else(|_| "https://horizon-testnet.stellar.org".to_string()),
			friendbot_url: env::var("FRIENDBOT_URL")
				.unwrap_or_else(|_| "https://friendbot.stellar.org".to_string()),
			usdc_issuer: env::var("USDC_ISSUER").unwrap_or_else(|_| {
				"GBBD47IF6LWK7P7MDEVSCWR7DPUWV3NY3DTQEVFL4NAT4AQH3ZLLFLA5".to_string()
			}),
			network,
			database_path: env::var("DATABASE_PATH")
				.map(PathBuf::from)
				.unwrap_or_else(|_| PathBuf::from("data/freelancepay.db")),
		}
	}

	/// The fixed payment asset all trust lines and payments use.
	pub fn payment_asset(&self) -> Asset {
		Asset::Credit {
			code: "USDC".to_string(),
			issuer: self.usdc_issuer.clone(),
		}
	}
}
