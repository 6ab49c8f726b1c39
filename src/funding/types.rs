//! Request and receipt types for the funding services

use crate::core_types::TxnStatus;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Destination bank account for a withdrawal
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BankAccount {
    pub bank_code: String,
    pub account_number: String,
    pub account_name: String,
}

#[derive(Debug, Clone)]
pub struct WithdrawRequest {
    pub amount: Decimal,
    pub bank: BankAccount,
    pub pin: String,
}

/// Returned to the caller once the debit committed and the provider
/// transfer was initiated
#[derive(Debug, Clone, Serialize)]
pub struct WithdrawReceipt {
    pub reference: String,
    pub amount: Decimal,
    pub fee: Decimal,
    pub total_debit: Decimal,
    pub status: TxnStatus,
}

/// Returned from deposit initialization
#[derive(Debug, Clone, Serialize)]
pub struct DepositInit {
    pub reference: String,
    pub authorization_url: String,
    pub amount: Decimal,
    pub fee: Decimal,
    pub total_charge: Decimal,
}

#[derive(Debug, Clone, Serialize)]
pub struct P2pReceipt {
    pub reference: String,
    pub amount: Decimal,
    pub fee: Decimal,
    pub status: TxnStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdjustmentDirection {
    Credit,
    Debit,
}

#[derive(Debug, Clone)]
pub struct AdjustmentRequest {
    pub direction: AdjustmentDirection,
    pub amount: Decimal,
    pub reason: String,
}
