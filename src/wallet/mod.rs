pub mod ledger;
pub mod models;
pub mod repository;

pub use ledger::{LedgerCore, LedgerError};
pub use models::{NewTransaction, P2pTransfer, Transaction, Wallet, WithdrawalConfig};
pub use repository::{
    P2pRepository, TransactionRepository, WalletRepository, WithdrawalConfigRepository,
};
