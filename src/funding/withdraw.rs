//! Withdrawal orchestrator
//!
//! PENDING -> PROCESSING -> {COMPLETED, FAILED}. The debit commits before
//! the provider call, which runs outside the row lock; a failed or
//! timed-out initiation triggers a compensating credit before the error
//! surfaces. The caller never observes a debited-but-unreversed wallet.

use crate::account::{PinVerifier, UserRepository};
use crate::config::ProviderConfig;
use crate::core_types::{
    SpendCategory, TxnMetadata, TxnStatus, TxnType, WalletKey, WithdrawalMetadata,
};
use crate::error::WalletError;
use crate::events::{EventPublisher, EventType, NotificationEvent};
use crate::fees;
use crate::funding::provider::PaymentProvider;
use crate::funding::types::{WithdrawReceipt, WithdrawRequest};
use crate::limits::{tier_limits, LimitEnforcer};
use crate::reference::{self, RefKind};
use crate::wallet::models::NewTransaction;
use crate::wallet::{LedgerCore, TransactionRepository, WalletRepository};
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::{error, info, warn};

pub struct WithdrawService {
    ledger: LedgerCore,
    limits: Arc<LimitEnforcer>,
    provider: Arc<dyn PaymentProvider>,
    pin: Arc<dyn PinVerifier>,
    events: EventPublisher,
    config: ProviderConfig,
}

impl WithdrawService {
    pub fn new(
        ledger: LedgerCore,
        limits: Arc<LimitEnforcer>,
        provider: Arc<dyn PaymentProvider>,
        pin: Arc<dyn PinVerifier>,
        events: EventPublisher,
        config: ProviderConfig,
    ) -> Self {
        Self {
            ledger,
            limits,
            provider,
            pin,
            events,
            config,
        }
    }

    pub async fn withdraw(
        &self,
        user_id: i64,
        req: WithdrawRequest,
    ) -> Result<WithdrawReceipt, WalletError> {
        if req.amount <= Decimal::ZERO {
            return Err(WalletError::Validation(
                "Amount must be positive".to_string(),
            ));
        }

        let user = UserRepository::get_by_id(self.ledger.pool(), user_id)
            .await?
            .ok_or_else(|| WalletError::NotFound("User".to_string()))?;
        if !user.is_active() {
            return Err(WalletError::Validation("Account is not active".to_string()));
        }

        if !self.pin.verify(user_id, &req.pin).await? {
            return Err(WalletError::InvalidPin);
        }

        let key = WalletKey::ngn(user_id);
        let wallet = WalletRepository::get(self.ledger.pool(), key)
            .await?
            .ok_or_else(|| WalletError::NotFound("Wallet".to_string()))?;
        if wallet.is_locked {
            return Err(WalletError::WalletLocked);
        }

        // Amount bounds: KYC tier range plus the resolved fee config range.
        tier_limits(user.kyc_tier)
            .validate_amount(req.amount, SpendCategory::Withdrawal)
            .map_err(WalletError::Validation)?;
        let config = fees::withdrawal_config_for(self.ledger.pool(), user.kyc_tier).await?;
        if req.amount < config.min_withdrawal {
            return Err(WalletError::Validation(format!(
                "Minimum withdrawal is {}",
                config.min_withdrawal
            )));
        }
        if req.amount > config.max_withdrawal {
            return Err(WalletError::Validation(format!(
                "Maximum withdrawal is {}",
                config.max_withdrawal
            )));
        }

        let fee = fees::withdrawal_fee(req.amount, &config);
        let total_debit = req.amount + fee;
        if wallet.balance < total_debit {
            return Err(WalletError::InsufficientBalance);
        }

        // Fail-closed: an over-limit withdrawal performs zero mutation.
        let check = self
            .limits
            .check_daily_limit(user_id, user.kyc_tier, req.amount, SpendCategory::Withdrawal)
            .await?;
        if !check.can_proceed {
            return Err(WalletError::LimitExceeded {
                limit: check.limit.unwrap_or(Decimal::ZERO),
                spent: check.spent,
            });
        }

        let txn_reference = reference::generate(RefKind::Withdrawal);
        let metadata = WithdrawalMetadata {
            bank_code: req.bank.bank_code.clone(),
            account_number: req.bank.account_number.clone(),
            account_name: req.bank.account_name.clone(),
            transfer_code: None,
            failure_reason: None,
            extra: serde_json::Value::Null,
        };
        let new_txn = NewTransaction {
            reference: txn_reference.clone(),
            txn_type: TxnType::Withdrawal,
            status: TxnStatus::Processing,
            amount: req.amount,
            fee,
            metadata: TxnMetadata::Withdrawal(metadata.clone()),
        };

        let (_, txn) = self.ledger.mutate(key, -total_debit, new_txn).await?;
        info!(user_id, reference = %txn.reference, amount = %req.amount, %fee, "withdrawal debited");

        // Provider call outside the transactional boundary.
        let transfer = self
            .provider
            .initiate_transfer(
                req.amount,
                &req.bank.account_name,
                &req.bank.account_number,
                &req.bank.bank_code,
                &self.config.transfer_narration,
                &txn.reference,
            )
            .await;

        match transfer {
            Ok(init) => {
                let annotated = TxnMetadata::Withdrawal(WithdrawalMetadata {
                    transfer_code: Some(init.transfer_code.clone()),
                    ..metadata
                });
                TransactionRepository::annotate_metadata(
                    self.ledger.pool(),
                    &txn.reference,
                    &annotated,
                )
                .await?;

                let limits = Arc::clone(&self.limits);
                let amount = req.amount;
                tokio::spawn(async move {
                    if let Err(e) = limits
                        .increment_daily_spend(user_id, amount, SpendCategory::Withdrawal)
                        .await
                    {
                        warn!(user_id, error = %e, "withdrawal spend counter increment failed");
                    }
                });

                self.events.publish(NotificationEvent::new(
                    user_id,
                    EventType::WithdrawalInitiated,
                    serde_json::json!({
                        "reference": txn.reference,
                        "amount": req.amount,
                        "fee": fee,
                    }),
                ));

                Ok(WithdrawReceipt {
                    reference: txn.reference,
                    amount: req.amount,
                    fee,
                    total_debit,
                    status: TxnStatus::Processing,
                })
            }
            Err(provider_err) => {
                error!(
                    user_id,
                    reference = %txn.reference,
                    error = %provider_err,
                    "transfer initiation failed, reversing debit"
                );
                let failed_metadata = TxnMetadata::Withdrawal(WithdrawalMetadata {
                    failure_reason: Some(provider_err.to_string()),
                    ..metadata
                });
                self.ledger
                    .revert(
                        key,
                        &txn.reference,
                        total_debit,
                        TxnStatus::Failed,
                        &failed_metadata,
                    )
                    .await?;

                self.events.publish(NotificationEvent::new(
                    user_id,
                    EventType::WithdrawalFailed,
                    serde_json::json!({
                        "reference": txn.reference,
                        "amount": req.amount,
                    }),
                ));

                Err(WalletError::Provider(provider_err))
            }
        }
    }

    /// Provider settlement callback: the initiated transfer cleared.
    pub async fn mark_withdrawal_settled(&self, reference: &str) -> Result<(), WalletError> {
        TransactionRepository::set_status(self.ledger.pool(), reference, TxnStatus::Completed)
            .await?;
        Ok(())
    }
}
