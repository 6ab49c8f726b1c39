//! Engine-wide error taxonomy
//!
//! Orchestrators surface `WalletError`; the ledger core has its own
//! `LedgerError` (see `wallet::ledger`) which converts into this taxonomy
//! at the service boundary.

use rust_decimal::Decimal;
use thiserror::Error;

/// External payment provider failure
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("Provider request failed: {0}")]
    Request(String),
    #[error("Provider request timed out")]
    Timeout,
    #[error("Charge was declined: {0}")]
    ChargeDeclined(String),
    #[error("Transfer was rejected: {0}")]
    TransferRejected(String),
}

#[derive(Debug, Error)]
pub enum WalletError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("{0}")]
    Validation(String),

    #[error("Insufficient balance")]
    InsufficientBalance,

    #[error("Wallet is locked")]
    WalletLocked,

    #[error("Daily limit exceeded: limit {limit}, spent {spent}")]
    LimitExceeded { limit: Decimal, spent: Decimal },

    #[error("Wallet is busy, please try again")]
    ConflictRetryExhausted,

    #[error("Provider failure: {0}")]
    Provider(#[from] ProviderError),

    #[error("{0} not found")]
    NotFound(String),

    #[error("Invalid transaction PIN")]
    InvalidPin,

    #[error("Duplicate reference: {0}")]
    DuplicateReference(String),
}

impl WalletError {
    /// Replayed webhooks are a success no-op to the caller, not a failure.
    pub fn is_duplicate(&self) -> bool {
        matches!(self, WalletError::DuplicateReference(_))
    }
}
