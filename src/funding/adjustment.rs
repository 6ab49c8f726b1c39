//! Admin balance adjustments
//!
//! Manual credit/debit through the ledger core, with a mandatory audit
//! trail. Concurrent adjustments on the same wallet resolve through the
//! ledger's conflict retry; both land exactly once.

use crate::account::UserRepository;
use crate::audit::AuditLogger;
use crate::core_types::{AdjustmentMetadata, TxnMetadata, TxnStatus, TxnType, WalletKey};
use crate::error::WalletError;
use crate::events::{EventPublisher, EventType, NotificationEvent};
use crate::funding::types::{AdjustmentDirection, AdjustmentRequest};
use crate::reference::{self, RefKind};
use crate::wallet::models::{NewTransaction, Transaction, Wallet};
use crate::wallet::LedgerCore;
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::info;

pub struct AdjustmentService {
    ledger: LedgerCore,
    events: EventPublisher,
    audit: Arc<AuditLogger>,
}

impl AdjustmentService {
    pub fn new(ledger: LedgerCore, events: EventPublisher, audit: Arc<AuditLogger>) -> Self {
        Self {
            ledger,
            events,
            audit,
        }
    }

    pub async fn adjust_balance(
        &self,
        admin_id: i64,
        user_id: i64,
        req: AdjustmentRequest,
    ) -> Result<(Wallet, Transaction), WalletError> {
        if req.amount <= Decimal::ZERO {
            return Err(WalletError::Validation(
                "Amount must be positive".to_string(),
            ));
        }
        if req.reason.trim().is_empty() {
            return Err(WalletError::Validation(
                "Adjustment reason is required".to_string(),
            ));
        }

        UserRepository::get_by_id(self.ledger.pool(), user_id)
            .await?
            .ok_or_else(|| WalletError::NotFound("User".to_string()))?;

        let (delta, txn_type) = match req.direction {
            AdjustmentDirection::Credit => (req.amount, TxnType::Deposit),
            AdjustmentDirection::Debit => (-req.amount, TxnType::Withdrawal),
        };

        let new_txn = NewTransaction {
            reference: reference::generate(RefKind::Adjustment),
            txn_type,
            status: TxnStatus::Completed,
            amount: req.amount,
            fee: Decimal::ZERO,
            metadata: TxnMetadata::Adjustment(AdjustmentMetadata {
                admin_id,
                reason: req.reason.clone(),
                extra: serde_json::Value::Null,
            }),
        };

        let key = WalletKey::ngn(user_id);
        let (wallet, txn) = self.ledger.mutate(key, delta, new_txn).await?;

        info!(
            admin_id,
            user_id,
            reference = %txn.reference,
            direction = ?req.direction,
            amount = %req.amount,
            "admin balance adjustment applied"
        );

        self.audit
            .record_best_effort(
                admin_id,
                "wallet_adjustment",
                Some(user_id),
                serde_json::json!({
                    "reference": txn.reference,
                    "direction": req.direction,
                    "amount": req.amount,
                    "reason": req.reason,
                    "balance_before": txn.balance_before,
                    "balance_after": txn.balance_after,
                }),
            )
            .await;

        self.events.publish(NotificationEvent::new(
            user_id,
            EventType::BalanceAdjusted,
            serde_json::json!({
                "reference": txn.reference,
                "direction": req.direction,
                "amount": req.amount,
            }),
        ));

        Ok((wallet, txn))
    }
}
