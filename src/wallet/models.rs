//! Wallet, transaction and policy records

use crate::core_types::{TxnMetadata, TxnStatus, TxnType, WalletKey, WalletType};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

/// One row per `(user_id, wallet_type)`. Mutated only through the ledger
/// core; never physically deleted.
#[derive(Debug, Clone, Serialize)]
pub struct Wallet {
    pub wallet_id: i64,
    pub user_id: i64,
    pub wallet_type: WalletType,
    pub balance: Decimal,
    /// Mirror of `balance`; reserved for available-vs-pending semantics
    pub ledger_balance: Decimal,
    pub is_locked: bool,
    pub locked_reason: Option<String>,
    pub daily_spent: Decimal,
    pub monthly_spent: Decimal,
    pub last_reset_at: DateTime<Utc>,
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Wallet {
    pub fn key(&self) -> WalletKey {
        WalletKey::new(self.user_id, self.wallet_type)
    }
}

/// One row per monetary movement. `reference` is the idempotency key.
#[derive(Debug, Clone, Serialize)]
pub struct Transaction {
    pub txn_id: i64,
    pub reference: String,
    pub user_id: i64,
    pub wallet_type: WalletType,
    pub txn_type: TxnType,
    pub status: TxnStatus,
    pub amount: Decimal,
    pub fee: Decimal,
    pub total_amount: Decimal,
    pub balance_before: Decimal,
    pub balance_after: Decimal,
    pub metadata: TxnMetadata,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input to the ledger core: the transaction record to write alongside a
/// balance mutation. `balance_before`/`balance_after` are captured inside
/// the transactional boundary, not by the caller.
#[derive(Debug, Clone)]
pub struct NewTransaction {
    pub reference: String,
    pub txn_type: TxnType,
    pub status: TxnStatus,
    pub amount: Decimal,
    pub fee: Decimal,
    pub metadata: TxnMetadata,
}

impl NewTransaction {
    pub fn total_amount(&self) -> Decimal {
        self.amount + self.fee
    }
}

/// Links the sender-side debit and receiver-side credit transactions of a
/// P2P transfer under one reference.
#[derive(Debug, Clone, Serialize)]
pub struct P2pTransfer {
    pub transfer_id: i64,
    pub reference: String,
    pub sender_id: i64,
    pub receiver_id: i64,
    pub debit_reference: String,
    pub credit_reference: String,
    pub amount: Decimal,
    pub fee: Decimal,
    pub status: TxnStatus,
    pub message: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Withdrawal fee type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i16)]
pub enum FeeType {
    Flat = 1,
    Percentage = 2,
}

impl FeeType {
    #[inline]
    pub fn id(&self) -> i16 {
        *self as i16
    }

    pub fn from_id(id: i16) -> Option<Self> {
        match id {
            1 => Some(FeeType::Flat),
            2 => Some(FeeType::Percentage),
            _ => None,
        }
    }
}

/// Tier-scoped withdrawal fee and limit policy. `tier_level = None` is the
/// global default row. Read-only to the engine.
#[derive(Debug, Clone)]
pub struct WithdrawalConfig {
    pub fee_type: FeeType,
    pub fee_value: Decimal,
    pub min_fee: Decimal,
    /// No upper clamp when absent
    pub max_fee: Option<Decimal>,
    pub min_withdrawal: Decimal,
    pub max_withdrawal: Decimal,
    pub tier_level: Option<i16>,
    pub is_active: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_total_amount() {
        let txn = NewTransaction {
            reference: "WTH-1-ABCDEF".to_string(),
            txn_type: TxnType::Withdrawal,
            status: TxnStatus::Processing,
            amount: Decimal::from(5000),
            fee: Decimal::from(75),
            metadata: TxnMetadata::Withdrawal(Default::default()),
        };
        assert_eq!(txn.total_amount(), Decimal::from(5075));
    }

    #[test]
    fn test_fee_type_roundtrip() {
        assert_eq!(FeeType::from_id(1), Some(FeeType::Flat));
        assert_eq!(FeeType::from_id(2), Some(FeeType::Percentage));
        assert_eq!(FeeType::from_id(0), None);
    }
}
