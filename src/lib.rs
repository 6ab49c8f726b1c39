//! kobovault - Wallet Ledger & Transfer Engine
//!
//! Deposits, withdrawals, P2P transfers and admin adjustments over
//! PostgreSQL, with exactly one serialized code path for every balance
//! mutation.
//!
//! # Modules
//!
//! - [`core_types`] - Shared type definitions (wallet keys, tiers, statuses)
//! - [`wallet`] - Wallet/transaction records, repositories and the ledger core
//! - [`funding`] - Deposit, withdrawal, P2P and adjustment orchestrators
//! - [`fees`] - Deterministic fee calculation
//! - [`limits`] - Tiered limits and daily spend counters
//! - [`reference`] - Transaction reference generation
//! - [`events`] - Post-commit notification events
//! - [`audit`] - Append-only audit trail
//! - [`account`] - User surface and PIN verification seam

// Core types - must be first!
pub mod core_types;

pub mod account;
pub mod audit;
pub mod config;
pub mod db;
pub mod error;
pub mod events;
pub mod fees;
pub mod funding;
pub mod limits;
pub mod logging;
pub mod reference;
pub mod wallet;

// Convenient re-exports at crate root
pub use core_types::{
    KycTier, SpendCategory, TxnMetadata, TxnStatus, TxnType, WalletKey, WalletType,
};
pub use db::Database;
pub use error::{ProviderError, WalletError};
pub use events::{EventPublisher, NotificationEvent};
pub use funding::{
    AdjustmentService, DepositService, MockPaymentProvider, P2pService, PaymentProvider,
    WithdrawService,
};
pub use limits::{LimitCheck, LimitEnforcer};
pub use wallet::{LedgerCore, LedgerError, Transaction, Wallet};
