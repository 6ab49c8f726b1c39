//! Deposit settlement: card charges and bank-transfer receipts
//!
//! Card flow: initialize a PENDING transaction plus a provider charge,
//! then settle on verification. Bank-transfer flow: credit on the
//! provider's receipt webhook. Both paths are idempotent on the
//! transaction reference, and both apply the fail-open-then-lock policy
//! for daily deposit-limit breaches: incoming money always lands, further
//! spend is halted.

use crate::account::UserRepository;
use crate::audit::AuditLogger;
use crate::config::ProviderConfig;
use crate::core_types::{
    DepositChannel, DepositMetadata, SpendCategory, TxnMetadata, TxnStatus, TxnType, WalletKey,
};
use crate::error::WalletError;
use crate::events::{EventPublisher, EventType, NotificationEvent};
use crate::fees;
use crate::funding::provider::{ChargeState, PaymentProvider};
use crate::funding::types::DepositInit;
use crate::limits::{tier_limits, LimitCheck, LimitEnforcer};
use crate::reference::{self, RefKind};
use crate::wallet::models::{NewTransaction, Transaction, Wallet};
use crate::wallet::{LedgerCore, LedgerError, TransactionRepository, WalletRepository};
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::{info, warn};

pub struct DepositService {
    ledger: LedgerCore,
    limits: Arc<LimitEnforcer>,
    provider: Arc<dyn PaymentProvider>,
    events: EventPublisher,
    audit: Arc<AuditLogger>,
    config: ProviderConfig,
}

impl DepositService {
    pub fn new(
        ledger: LedgerCore,
        limits: Arc<LimitEnforcer>,
        provider: Arc<dyn PaymentProvider>,
        events: EventPublisher,
        audit: Arc<AuditLogger>,
        config: ProviderConfig,
    ) -> Self {
        Self {
            ledger,
            limits,
            provider,
            events,
            audit,
            config,
        }
    }

    /// Start a card deposit: PENDING transaction plus provider charge.
    pub async fn initialize_deposit(
        &self,
        user_id: i64,
        amount: Decimal,
    ) -> Result<DepositInit, WalletError> {
        if amount <= Decimal::ZERO {
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
        let payer_email = user
            .email
            .ok_or_else(|| WalletError::Validation("Email required for card deposit".to_string()))?;

        tier_limits(user.kyc_tier)
            .validate_amount(amount, SpendCategory::Deposit)
            .map_err(WalletError::Validation)?;

        let fee = fees::card_deposit_fee(amount);
        let total_charge = amount + fee;
        let reference = reference::generate(RefKind::Deposit);

        let key = WalletKey::ngn(user_id);
        let wallet = WalletRepository::get_or_create(self.ledger.pool(), key).await?;

        let new_txn = NewTransaction {
            reference: reference.clone(),
            txn_type: TxnType::Deposit,
            status: TxnStatus::Pending,
            amount,
            fee,
            metadata: TxnMetadata::Deposit(DepositMetadata {
                channel: Some(DepositChannel::Card),
                ..Default::default()
            }),
        };
        TransactionRepository::insert_pending(
            self.ledger.pool(),
            user_id,
            key.wallet_type,
            &new_txn,
            wallet.balance,
        )
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.code().as_deref() == Some("23505") => {
                WalletError::DuplicateReference(reference.clone())
            }
            _ => WalletError::Database(e),
        })?;

        let charge = self
            .provider
            .initialize_charge(&payer_email, total_charge, &reference, &self.config.callback_url)
            .await?;

        info!(user_id, %reference, %amount, "card deposit initialized");
        Ok(DepositInit {
            reference,
            authorization_url: charge.authorization_url,
            amount,
            fee,
            total_charge,
        })
    }

    /// Verify a card charge and settle the deposit. Safe to call
    /// repeatedly: an already-settled reference returns the existing
    /// transaction unchanged.
    pub async fn verify_deposit(
        &self,
        user_id: i64,
        reference: &str,
    ) -> Result<Transaction, WalletError> {
        let txn = TransactionRepository::get_by_reference(self.ledger.pool(), reference)
            .await?
            .ok_or_else(|| WalletError::NotFound("Transaction".to_string()))?;
        if txn.user_id != user_id || txn.txn_type != TxnType::Deposit {
            return Err(WalletError::NotFound("Transaction".to_string()));
        }
        if txn.status.is_terminal() {
            return Ok(txn);
        }

        let status = self.provider.verify_charge(reference).await?;
        match status.state {
            ChargeState::Success => {
                let metadata = TxnMetadata::Deposit(DepositMetadata {
                    channel: Some(DepositChannel::Card),
                    provider_reference: Some(reference.to_string()),
                    paid_at: status.paid_at,
                    ..Default::default()
                });
                let (wallet, settled) = self
                    .settle_credit(user_id, txn.amount, reference, &metadata)
                    .await?;
                self.post_credit_effects(&wallet, &settled).await;
                Ok(settled)
            }
            ChargeState::Failed => {
                TransactionRepository::set_status(self.ledger.pool(), reference, TxnStatus::Failed)
                    .await?;
                self.events.publish(NotificationEvent::new(
                    user_id,
                    EventType::DepositFailed,
                    serde_json::json!({ "reference": reference }),
                ));
                TransactionRepository::get_by_reference(self.ledger.pool(), reference)
                    .await?
                    .ok_or_else(|| WalletError::NotFound("Transaction".to_string()))
            }
            ChargeState::Abandoned => {
                TransactionRepository::set_status(
                    self.ledger.pool(),
                    reference,
                    TxnStatus::Cancelled,
                )
                .await?;
                TransactionRepository::get_by_reference(self.ledger.pool(), reference)
                    .await?
                    .ok_or_else(|| WalletError::NotFound("Transaction".to_string()))
            }
            ChargeState::Pending => Ok(txn),
        }
    }

    /// Webhook entrypoint: a bank transfer landed on a user's virtual
    /// account. Replays of the same reference are a no-op success.
    pub async fn credit_virtual_account_receipt(
        &self,
        reference: &str,
        amount: Decimal,
        account_number: &str,
        provider_fee: Decimal,
    ) -> Result<Transaction, WalletError> {
        if amount <= Decimal::ZERO {
            return Err(WalletError::Validation(
                "Amount must be positive".to_string(),
            ));
        }

        // Replay protection: one transaction and one credit per reference.
        if let Some(existing) =
            TransactionRepository::get_by_reference(self.ledger.pool(), reference).await?
        {
            info!(%reference, "duplicate receipt webhook ignored");
            return Ok(existing);
        }

        let user = UserRepository::get_by_virtual_account(self.ledger.pool(), account_number)
            .await?
            .ok_or_else(|| WalletError::NotFound("Virtual account".to_string()))?;

        let key = WalletKey::ngn(user.user_id);
        let check = self
            .limits
            .check_daily_limit(user.user_id, user.kyc_tier, amount, SpendCategory::Deposit)
            .await?;
        let lock_reason = breach_lock_reason(&check);

        let new_txn = NewTransaction {
            reference: reference.to_string(),
            txn_type: TxnType::Deposit,
            status: TxnStatus::Completed,
            amount,
            fee: Decimal::ZERO,
            metadata: TxnMetadata::Deposit(DepositMetadata {
                channel: Some(DepositChannel::BankTransfer),
                provider_reference: Some(reference.to_string()),
                account_number: Some(account_number.to_string()),
                provider_fee: Some(provider_fee),
                ..Default::default()
            }),
        };

        let result = match lock_reason.as_deref() {
            Some(reason) => {
                self.ledger
                    .mutate_and_lock(key, amount, new_txn, reason)
                    .await
            }
            None => self.ledger.mutate(key, amount, new_txn).await,
        };

        let (wallet, txn) = match result {
            Ok(pair) => pair,
            // Lost the race against a concurrent replay: the first writer
            // owns the credit.
            Err(LedgerError::DuplicateReference(_)) => {
                info!(%reference, "duplicate receipt webhook ignored (raced)");
                return TransactionRepository::get_by_reference(self.ledger.pool(), reference)
                    .await?
                    .ok_or_else(|| WalletError::NotFound("Transaction".to_string()));
            }
            Err(e) => return Err(e.into()),
        };

        self.post_credit_effects(&wallet, &txn).await;
        Ok(txn)
    }

    /// Settle an existing PENDING deposit row: credit plus finalize, with
    /// the deposit-limit breach riding the same commit as a lock.
    async fn settle_credit(
        &self,
        user_id: i64,
        amount: Decimal,
        reference: &str,
        metadata: &TxnMetadata,
    ) -> Result<(Wallet, Transaction), WalletError> {
        let user = UserRepository::get_by_id(self.ledger.pool(), user_id)
            .await?
            .ok_or_else(|| WalletError::NotFound("User".to_string()))?;
        let key = WalletKey::ngn(user_id);

        let check = self
            .limits
            .check_daily_limit(user_id, user.kyc_tier, amount, SpendCategory::Deposit)
            .await?;
        let lock_reason = breach_lock_reason(&check);

        let result = self
            .ledger
            .settle(
                key,
                amount,
                reference,
                TxnStatus::Completed,
                metadata,
                lock_reason.as_deref(),
            )
            .await;

        match result {
            Ok(pair) => Ok(pair),
            Err(LedgerError::DuplicateReference(_)) => {
                // Settled by a concurrent verification; return the row.
                let txn = TransactionRepository::get_by_reference(self.ledger.pool(), reference)
                    .await?
                    .ok_or_else(|| WalletError::NotFound("Transaction".to_string()))?;
                let wallet = WalletRepository::get(self.ledger.pool(), key)
                    .await?
                    .ok_or_else(|| WalletError::NotFound("Wallet".to_string()))?;
                Ok((wallet, txn))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Best-effort side effects after a committed credit: spend counter,
    /// notifications, audit entry when the commit locked the wallet.
    async fn post_credit_effects(&self, wallet: &Wallet, txn: &Transaction) {
        let limits = Arc::clone(&self.limits);
        let user_id = txn.user_id;
        let amount = txn.amount;
        tokio::spawn(async move {
            if let Err(e) = limits
                .increment_daily_spend(user_id, amount, SpendCategory::Deposit)
                .await
            {
                warn!(user_id, error = %e, "deposit spend counter increment failed");
            }
        });

        self.events.publish(NotificationEvent::new(
            txn.user_id,
            EventType::DepositSettled,
            serde_json::json!({
                "reference": txn.reference,
                "amount": txn.amount,
                "balance": wallet.balance,
            }),
        ));

        if wallet.is_locked {
            if let Some(reason) = &wallet.locked_reason {
                self.events.publish(NotificationEvent::new(
                    txn.user_id,
                    EventType::WalletLocked,
                    serde_json::json!({ "reason": reason }),
                ));
                self.audit
                    .record_best_effort(
                        txn.user_id,
                        "wallet_locked_on_deposit_limit",
                        Some(txn.user_id),
                        serde_json::json!({
                            "reference": txn.reference,
                            "reason": reason,
                        }),
                    )
                    .await;
            }
        }
    }
}

/// Fail-open-then-lock: an over-limit credit still applies, with this
/// reason recorded on the wallet in the same commit.
pub(crate) fn breach_lock_reason(check: &LimitCheck) -> Option<String> {
    if check.can_proceed {
        return None;
    }
    let limit = check
        .limit
        .map(|l| l.to_string())
        .unwrap_or_else(|| "unlimited".to_string());
    Some(format!(
        "Daily deposit limit exceeded: limit {}, spent {}",
        limit, check.spent
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_breach_lock_reason() {
        let ok = LimitCheck {
            can_proceed: true,
            limit: Some(Decimal::from(50_000)),
            spent: Decimal::from(10_000),
            remaining: Some(Decimal::from(40_000)),
        };
        assert!(breach_lock_reason(&ok).is_none());

        let breached = LimitCheck {
            can_proceed: false,
            limit: Some(Decimal::from(50_000)),
            spent: Decimal::from(48_000),
            remaining: Some(Decimal::from(2_000)),
        };
        let reason = breach_lock_reason(&breached).unwrap();
        assert!(reason.contains("50000"));
        assert!(reason.contains("48000"));
    }
}
