//! External payment provider seam
//!
//! Card charges and outbound bank transfers go through this trait; the
//! real client lives with the integration layer. Provider calls always
//! happen outside the ledger's transactional boundary.

use crate::error::ProviderError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::fmt::Debug;
use std::sync::Mutex;

/// Result of initializing a card charge
#[derive(Debug, Clone)]
pub struct ChargeInit {
    pub authorization_url: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChargeState {
    Success,
    Failed,
    Abandoned,
    Pending,
}

/// Result of verifying a charge
#[derive(Debug, Clone)]
pub struct ChargeStatus {
    pub state: ChargeState,
    pub amount: Decimal,
    pub paid_at: Option<DateTime<Utc>>,
}

/// Result of initiating an outbound bank transfer
#[derive(Debug, Clone)]
pub struct TransferInit {
    pub transfer_code: String,
    pub status: String,
}

#[async_trait]
pub trait PaymentProvider: Send + Sync + Debug {
    /// Initialize a card charge; the payer completes it on the returned
    /// authorization URL.
    async fn initialize_charge(
        &self,
        payer_email: &str,
        total_amount: Decimal,
        reference: &str,
        callback_url: &str,
    ) -> Result<ChargeInit, ProviderError>;

    /// Verify a charge by reference.
    async fn verify_charge(&self, reference: &str) -> Result<ChargeStatus, ProviderError>;

    /// Initiate a bank transfer to the given account.
    async fn initiate_transfer(
        &self,
        amount: Decimal,
        account_name: &str,
        account_number: &str,
        bank_code: &str,
        narration: &str,
        reference: &str,
    ) -> Result<TransferInit, ProviderError>;
}

/// In-memory provider for tests and local runs.
///
/// Charges initialized through it verify as successful; `failing_transfers`
/// makes every transfer initiation fail, to exercise the compensation path.
#[derive(Debug, Default)]
pub struct MockPaymentProvider {
    charges: Mutex<HashMap<String, Decimal>>,
    fail_transfers: bool,
}

impl MockPaymentProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_transfers() -> Self {
        Self {
            charges: Mutex::new(HashMap::new()),
            fail_transfers: true,
        }
    }
}

#[async_trait]
impl PaymentProvider for MockPaymentProvider {
    async fn initialize_charge(
        &self,
        _payer_email: &str,
        total_amount: Decimal,
        reference: &str,
        _callback_url: &str,
    ) -> Result<ChargeInit, ProviderError> {
        self.charges
            .lock()
            .expect("charges mutex")
            .insert(reference.to_string(), total_amount);
        Ok(ChargeInit {
            authorization_url: format!("https://checkout.example.test/{}", reference),
        })
    }

    async fn verify_charge(&self, reference: &str) -> Result<ChargeStatus, ProviderError> {
        let amount = self
            .charges
            .lock()
            .expect("charges mutex")
            .get(reference)
            .copied();
        match amount {
            Some(amount) => Ok(ChargeStatus {
                state: ChargeState::Success,
                amount,
                paid_at: Some(Utc::now()),
            }),
            None => Err(ProviderError::Request(format!(
                "unknown charge reference: {}",
                reference
            ))),
        }
    }

    async fn initiate_transfer(
        &self,
        _amount: Decimal,
        _account_name: &str,
        _account_number: &str,
        _bank_code: &str,
        _narration: &str,
        reference: &str,
    ) -> Result<TransferInit, ProviderError> {
        if self.fail_transfers {
            return Err(ProviderError::TransferRejected(
                "mock transfer failure".to_string(),
            ));
        }
        Ok(TransferInit {
            transfer_code: format!("TRF_{}", uuid::Uuid::new_v4().simple()),
            status: "pending".to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_charge_roundtrip() {
        let provider = MockPaymentProvider::new();
        provider
            .initialize_charge("ada@example.test", Decimal::from(1015), "DEP-1-AAAAAA", "cb")
            .await
            .unwrap();

        let status = provider.verify_charge("DEP-1-AAAAAA").await.unwrap();
        assert_eq!(status.state, ChargeState::Success);
        assert_eq!(status.amount, Decimal::from(1015));
    }

    #[tokio::test]
    async fn test_unknown_reference_fails_verification() {
        let provider = MockPaymentProvider::new();
        assert!(provider.verify_charge("DEP-0-MISSING").await.is_err());
    }

    #[tokio::test]
    async fn test_failing_transfers() {
        let provider = MockPaymentProvider::failing_transfers();
        let result = provider
            .initiate_transfer(
                Decimal::from(5000),
                "Ada Obi",
                "0123456789",
                "058",
                "Wallet withdrawal",
                "WTH-1-AAAAAA",
            )
            .await;
        assert!(matches!(result, Err(ProviderError::TransferRejected(_))));
    }
}
