/// Transaction builder module for constructing ledger transactions
pub mod builder;

pub use builder::{
	Asset, Memo, Operation, SignedTransaction, Transaction, TransactionBuilder, TxBuildError,
	MAX_MEMO_BYTES, TX_TIMEOUT_SECS,
};
