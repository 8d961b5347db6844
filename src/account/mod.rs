/// Strkey keypair codec for ledger accounts
pub mod keys;
/// Account provisioning service
pub mod provisioner;

pub use keys::{Keypair, KeyError};
pub use provisioner::{AccountProvisioner, ProvisionedAccount, Role, TrustOutcome};
