//! P2P transfer orchestrator
//!
//! Debit leg, credit leg and the transfer link row settle in one
//! serialized transaction or not at all. The sender's daily send limit is
//! fail-closed; the receiver's deposit limit is fail-open-then-lock (money
//! is always acceptable, only further spend is halted). A receiver's
//! locked wallet does not block incoming transfers.

use crate::account::UserRepository;
use crate::audit::AuditLogger;
use crate::core_types::{P2pMetadata, SpendCategory, TxnMetadata, TxnStatus, TxnType, WalletKey};
use crate::error::WalletError;
use crate::events::{EventPublisher, EventType, NotificationEvent};
use crate::fees;
use crate::funding::deposit::breach_lock_reason;
use crate::funding::types::P2pReceipt;
use crate::limits::{tier_limits, LimitEnforcer};
use crate::reference::{self, RefKind};
use crate::wallet::ledger::classify;
use crate::wallet::models::NewTransaction;
use crate::wallet::repository::NewP2pTransfer;
use crate::wallet::{LedgerCore, LedgerError, P2pRepository, WalletRepository};
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::{info, warn};

pub struct P2pService {
    ledger: LedgerCore,
    limits: Arc<LimitEnforcer>,
    events: EventPublisher,
    audit: Arc<AuditLogger>,
}

impl P2pService {
    pub fn new(
        ledger: LedgerCore,
        limits: Arc<LimitEnforcer>,
        events: EventPublisher,
        audit: Arc<AuditLogger>,
    ) -> Self {
        Self {
            ledger,
            limits,
            events,
            audit,
        }
    }

    pub async fn send(
        &self,
        sender_id: i64,
        recipient_tag: &str,
        amount: Decimal,
        message: Option<String>,
    ) -> Result<P2pReceipt, WalletError> {
        if amount <= Decimal::ZERO {
            return Err(WalletError::Validation(
                "Amount must be positive".to_string(),
            ));
        }

        let sender = UserRepository::get_by_id(self.ledger.pool(), sender_id)
            .await?
            .ok_or_else(|| WalletError::NotFound("User".to_string()))?;
        if !sender.is_active() {
            return Err(WalletError::Validation("Account is not active".to_string()));
        }
        if !sender.kyc_tier.can_send_p2p() {
            return Err(WalletError::Validation(
                "Account tier cannot send transfers; complete verification first".to_string(),
            ));
        }
        tier_limits(sender.kyc_tier)
            .validate_amount(amount, SpendCategory::P2pSend)
            .map_err(WalletError::Validation)?;

        let receiver = UserRepository::get_by_tag(self.ledger.pool(), recipient_tag)
            .await?
            .ok_or_else(|| WalletError::NotFound("Recipient".to_string()))?;
        if receiver.user_id == sender_id {
            return Err(WalletError::Validation(
                "Cannot transfer to yourself".to_string(),
            ));
        }
        if !receiver.is_active() {
            return Err(WalletError::Validation(
                "Recipient account is not active".to_string(),
            ));
        }

        let sender_key = WalletKey::ngn(sender_id);
        let receiver_key = WalletKey::ngn(receiver.user_id);

        let sender_wallet = WalletRepository::get(self.ledger.pool(), sender_key)
            .await?
            .ok_or_else(|| WalletError::NotFound("Wallet".to_string()))?;
        if sender_wallet.is_locked {
            return Err(WalletError::WalletLocked);
        }

        let fee = fees::p2p_fee();
        if sender_wallet.balance < amount + fee {
            return Err(WalletError::InsufficientBalance);
        }

        // Sender side is fail-closed.
        let send_check = self
            .limits
            .check_daily_limit(sender_id, sender.kyc_tier, amount, SpendCategory::P2pSend)
            .await?;
        if !send_check.can_proceed {
            return Err(WalletError::LimitExceeded {
                limit: send_check.limit.unwrap_or(Decimal::ZERO),
                spent: send_check.spent,
            });
        }

        // Receiver side is fail-open-then-lock.
        let receive_check = self
            .limits
            .check_daily_limit(
                receiver.user_id,
                receiver.kyc_tier,
                amount,
                SpendCategory::Deposit,
            )
            .await?;
        let receiver_lock_reason = breach_lock_reason(&receive_check);

        let transfer_reference = reference::generate(RefKind::P2p);
        let debit_txn = NewTransaction {
            reference: format!("{}-D", transfer_reference),
            txn_type: TxnType::Transfer,
            status: TxnStatus::Completed,
            amount,
            fee,
            metadata: TxnMetadata::P2p(P2pMetadata {
                counterparty_id: receiver.user_id,
                counterparty_tag: receiver.tag.clone(),
                direction: "debit".to_string(),
                message: message.clone(),
                extra: serde_json::Value::Null,
            }),
        };
        let credit_txn = NewTransaction {
            reference: format!("{}-C", transfer_reference),
            txn_type: TxnType::Transfer,
            status: TxnStatus::Completed,
            amount,
            fee: Decimal::ZERO,
            metadata: TxnMetadata::P2p(P2pMetadata {
                counterparty_id: sender_id,
                counterparty_tag: sender.tag.clone(),
                direction: "credit".to_string(),
                message: message.clone(),
                extra: serde_json::Value::Null,
            }),
        };
        let link = NewP2pTransfer {
            reference: transfer_reference.clone(),
            sender_id,
            receiver_id: receiver.user_id,
            debit_reference: debit_txn.reference.clone(),
            credit_reference: credit_txn.reference.clone(),
            amount,
            fee,
            status: TxnStatus::Completed,
            message,
        };

        // One atomic unit: debit, credit, link row. Bounded retry on
        // serialization conflicts, same discipline as the ledger's own
        // single-wallet path.
        let mut attempt = 0u32;
        let receiver_wallet = loop {
            let mut tx = self.ledger.begin_serializable().await.map_err(WalletError::from)?;
            let body = async {
                LedgerCore::apply(&mut tx, sender_key, -(amount + fee), &debit_txn, None).await?;
                let (receiver_wallet, _) = LedgerCore::apply(
                    &mut tx,
                    receiver_key,
                    amount,
                    &credit_txn,
                    receiver_lock_reason.as_deref(),
                )
                .await?;
                P2pRepository::insert(&mut tx, &link).await.map_err(classify)?;
                Ok::<_, LedgerError>(receiver_wallet)
            }
            .await;

            match body {
                Ok(receiver_wallet) => match tx.commit().await.map_err(classify) {
                    Ok(()) => break receiver_wallet,
                    Err(LedgerError::Conflict) => {}
                    Err(other) => return Err(other.into()),
                },
                Err(LedgerError::Conflict) => {
                    let _ = tx.rollback().await;
                }
                Err(other) => {
                    let _ = tx.rollback().await;
                    return Err(other.into());
                }
            }

            attempt += 1;
            if attempt >= self.ledger.max_attempts() {
                warn!(sender_id, receiver_id = receiver.user_id, "transfer retries exhausted");
                return Err(WalletError::ConflictRetryExhausted);
            }
            tokio::time::sleep(self.ledger.backoff(attempt)).await;
        };

        info!(
            sender_id,
            receiver_id = receiver.user_id,
            reference = %transfer_reference,
            %amount,
            "transfer settled"
        );

        self.post_commit_effects(
            sender_id,
            &receiver,
            amount,
            &transfer_reference,
            receiver_wallet.is_locked,
            receiver_lock_reason,
        )
        .await;

        Ok(P2pReceipt {
            reference: transfer_reference,
            amount,
            fee,
            status: TxnStatus::Completed,
        })
    }

    async fn post_commit_effects(
        &self,
        sender_id: i64,
        receiver: &crate::account::User,
        amount: Decimal,
        reference: &str,
        receiver_locked: bool,
        receiver_lock_reason: Option<String>,
    ) {
        let limits = Arc::clone(&self.limits);
        let receiver_id = receiver.user_id;
        tokio::spawn(async move {
            if let Err(e) = limits
                .increment_daily_spend(sender_id, amount, SpendCategory::P2pSend)
                .await
            {
                warn!(user_id = sender_id, error = %e, "p2p spend counter increment failed");
            }
            if let Err(e) = limits
                .increment_daily_spend(receiver_id, amount, SpendCategory::Deposit)
                .await
            {
                warn!(user_id = receiver_id, error = %e, "deposit counter increment failed");
            }
        });

        self.events.publish(NotificationEvent::new(
            sender_id,
            EventType::TransferSent,
            serde_json::json!({
                "reference": reference,
                "amount": amount,
                "recipient_tag": receiver.tag,
            }),
        ));
        self.events.publish(NotificationEvent::new(
            receiver.user_id,
            EventType::TransferReceived,
            serde_json::json!({
                "reference": reference,
                "amount": amount,
            }),
        ));

        if receiver_locked {
            if let Some(reason) = receiver_lock_reason {
                self.events.publish(NotificationEvent::new(
                    receiver.user_id,
                    EventType::WalletLocked,
                    serde_json::json!({ "reason": reason }),
                ));
                self.audit
                    .record_best_effort(
                        receiver.user_id,
                        "wallet_locked_on_deposit_limit",
                        Some(receiver.user_id),
                        serde_json::json!({
                            "reference": reference,
                            "reason": reason,
                        }),
                    )
                    .await;
            }
        }
    }
}
