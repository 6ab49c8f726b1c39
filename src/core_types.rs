//! Core type definitions shared across the engine
//!
//! Wallet identity, transaction enums, KYC tiers and the typed
//! transaction metadata union.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Wallet currency type
///
/// One wallet row exists per `(user_id, wallet_type)`. The NGN wallet is
/// created at registration; the others are created implicitly on first
/// credit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
#[repr(i16)]
pub enum WalletType {
    #[default]
    Ngn = 1,
    Usd = 2,
    Usdt = 3,
    Btc = 4,
}

impl WalletType {
    /// Numeric ID for PostgreSQL storage
    #[inline]
    pub fn id(&self) -> i16 {
        *self as i16
    }

    pub fn from_id(id: i16) -> Option<Self> {
        match id {
            1 => Some(WalletType::Ngn),
            2 => Some(WalletType::Usd),
            3 => Some(WalletType::Usdt),
            4 => Some(WalletType::Btc),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            WalletType::Ngn => "NGN",
            WalletType::Usd => "USD",
            WalletType::Usdt => "USDT",
            WalletType::Btc => "BTC",
        }
    }
}

impl fmt::Display for WalletType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for WalletType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "NGN" | "NAIRA" => Ok(WalletType::Ngn),
            "USD" => Ok(WalletType::Usd),
            "USDT" => Ok(WalletType::Usdt),
            "BTC" => Ok(WalletType::Btc),
            _ => Err(format!("Invalid wallet type: {}", s)),
        }
    }
}

/// Composite wallet identity: `(user_id, wallet_type)` is unique.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WalletKey {
    pub user_id: i64,
    pub wallet_type: WalletType,
}

impl WalletKey {
    pub fn new(user_id: i64, wallet_type: WalletType) -> Self {
        Self {
            user_id,
            wallet_type,
        }
    }

    /// The default NGN wallet for a user
    pub fn ngn(user_id: i64) -> Self {
        Self::new(user_id, WalletType::Ngn)
    }
}

impl fmt::Display for WalletKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.user_id, self.wallet_type)
    }
}

/// KYC verification tier, gating transaction limits
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(i16)]
pub enum KycTier {
    Tier0 = 0,
    Tier1 = 1,
    Tier2 = 2,
    Tier3 = 3,
}

impl KycTier {
    #[inline]
    pub fn id(&self) -> i16 {
        *self as i16
    }

    pub fn from_id(id: i16) -> Option<Self> {
        match id {
            0 => Some(KycTier::Tier0),
            1 => Some(KycTier::Tier1),
            2 => Some(KycTier::Tier2),
            3 => Some(KycTier::Tier3),
            _ => None,
        }
    }

    /// Tier 1 and above may send P2P transfers
    pub fn can_send_p2p(&self) -> bool {
        *self >= KycTier::Tier1
    }
}

impl fmt::Display for KycTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TIER_{}", self.id())
    }
}

/// Monetary movement type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
#[repr(i16)]
pub enum TxnType {
    Deposit = 1,
    Withdrawal = 2,
    Transfer = 3,
}

impl TxnType {
    #[inline]
    pub fn id(&self) -> i16 {
        *self as i16
    }

    pub fn from_id(id: i16) -> Option<Self> {
        match id {
            1 => Some(TxnType::Deposit),
            2 => Some(TxnType::Withdrawal),
            3 => Some(TxnType::Transfer),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TxnType::Deposit => "DEPOSIT",
            TxnType::Withdrawal => "WITHDRAWAL",
            TxnType::Transfer => "TRANSFER",
        }
    }
}

impl fmt::Display for TxnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Transaction lifecycle status
///
/// PENDING and PROCESSING are in-flight; the rest are terminal. A
/// COMPLETED row is immutable except for metadata annotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
#[repr(i16)]
pub enum TxnStatus {
    Pending = 1,
    Processing = 2,
    Completed = 3,
    Failed = 4,
    Cancelled = 5,
}

impl TxnStatus {
    #[inline]
    pub fn id(&self) -> i16 {
        *self as i16
    }

    pub fn from_id(id: i16) -> Option<Self> {
        match id {
            1 => Some(TxnStatus::Pending),
            2 => Some(TxnStatus::Processing),
            3 => Some(TxnStatus::Completed),
            4 => Some(TxnStatus::Failed),
            5 => Some(TxnStatus::Cancelled),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TxnStatus::Completed | TxnStatus::Failed | TxnStatus::Cancelled
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TxnStatus::Pending => "PENDING",
            TxnStatus::Processing => "PROCESSING",
            TxnStatus::Completed => "COMPLETED",
            TxnStatus::Failed => "FAILED",
            TxnStatus::Cancelled => "CANCELLED",
        }
    }
}

impl fmt::Display for TxnStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Daily spend counter category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(i16)]
pub enum SpendCategory {
    Deposit = 1,
    Withdrawal = 2,
    P2pSend = 3,
}

impl SpendCategory {
    #[inline]
    pub fn id(&self) -> i16 {
        *self as i16
    }

    pub fn from_id(id: i16) -> Option<Self> {
        match id {
            1 => Some(SpendCategory::Deposit),
            2 => Some(SpendCategory::Withdrawal),
            3 => Some(SpendCategory::P2pSend),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SpendCategory::Deposit => "deposit",
            SpendCategory::Withdrawal => "withdrawal",
            SpendCategory::P2pSend => "p2p_send",
        }
    }
}

impl fmt::Display for SpendCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Deposit funding channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DepositChannel {
    Card,
    BankTransfer,
}

// ============================================================================
// Transaction metadata (typed per subtype)
// ============================================================================

/// Typed transaction metadata, stored as JSONB.
///
/// Each transaction subtype carries its own shape; `extra` is a raw bag
/// for forward-compatible annotation without a schema change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TxnMetadata {
    Deposit(DepositMetadata),
    Withdrawal(WithdrawalMetadata),
    P2p(P2pMetadata),
    Adjustment(AdjustmentMetadata),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct DepositMetadata {
    pub channel: Option<DepositChannel>,
    /// Provider-side charge or receipt reference
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider_reference: Option<String>,
    /// Virtual account number for bank-transfer receipts
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_number: Option<String>,
    /// Fee retained by the provider, if reported
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider_fee: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub paid_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub extra: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct WithdrawalMetadata {
    pub bank_code: String,
    pub account_number: String,
    pub account_name: String,
    /// Provider transfer code, attached once the transfer is initiated
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transfer_code: Option<String>,
    /// Provider error captured on a failed initiation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure_reason: Option<String>,
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub extra: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct P2pMetadata {
    pub counterparty_id: i64,
    pub counterparty_tag: String,
    /// "debit" on the sender leg, "credit" on the receiver leg
    pub direction: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub extra: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct AdjustmentMetadata {
    pub admin_id: i64,
    pub reason: String,
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub extra: serde_json::Value,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wallet_type_roundtrip() {
        assert_eq!(WalletType::from_id(1), Some(WalletType::Ngn));
        assert_eq!(WalletType::from_id(4), Some(WalletType::Btc));
        assert_eq!(WalletType::from_id(0), None);
        assert_eq!("naira".parse::<WalletType>().unwrap(), WalletType::Ngn);
        assert!("XRP".parse::<WalletType>().is_err());
    }

    #[test]
    fn test_kyc_tier_ordering() {
        assert!(KycTier::Tier2 > KycTier::Tier1);
        assert!(!KycTier::Tier0.can_send_p2p());
        assert!(KycTier::Tier1.can_send_p2p());
        assert_eq!(KycTier::from_id(3), Some(KycTier::Tier3));
        assert_eq!(KycTier::from_id(4), None);
    }

    #[test]
    fn test_txn_status_terminal() {
        assert!(!TxnStatus::Pending.is_terminal());
        assert!(!TxnStatus::Processing.is_terminal());
        assert!(TxnStatus::Completed.is_terminal());
        assert!(TxnStatus::Failed.is_terminal());
        assert!(TxnStatus::Cancelled.is_terminal());
    }

    #[test]
    fn test_metadata_tagged_serde() {
        let meta = TxnMetadata::Withdrawal(WithdrawalMetadata {
            bank_code: "058".to_string(),
            account_number: "0123456789".to_string(),
            account_name: "Ada Obi".to_string(),
            transfer_code: Some("TRF_abc123".to_string()),
            failure_reason: None,
            extra: serde_json::Value::Null,
        });

        let json = serde_json::to_value(&meta).unwrap();
        assert_eq!(json["kind"], "withdrawal");
        assert_eq!(json["bank_code"], "058");

        let back: TxnMetadata = serde_json::from_value(json).unwrap();
        assert_eq!(back, meta);
    }

    #[test]
    fn test_metadata_extra_bag_roundtrip() {
        let meta = TxnMetadata::Deposit(DepositMetadata {
            channel: Some(DepositChannel::BankTransfer),
            provider_reference: Some("rcpt_001".to_string()),
            account_number: Some("9901234567".to_string()),
            provider_fee: Some(Decimal::new(5000, 2)),
            paid_at: None,
            extra: serde_json::json!({"narration": "salary"}),
        });

        let json = serde_json::to_string(&meta).unwrap();
        let back: TxnMetadata = serde_json::from_str(&json).unwrap();
        assert_eq!(back, meta);
    }
}
