//! Repository layer for wallet, transaction and policy rows
//!
//! Read paths and post-commit annotations live here. Balance mutation is
//! the ledger core's job; nothing in this module changes a balance.

use super::models::{FeeType, NewTransaction, P2pTransfer, Transaction, Wallet, WithdrawalConfig};
use crate::core_types::{KycTier, TxnMetadata, TxnStatus, TxnType, WalletKey, WalletType};
use rust_decimal::Decimal;
use sqlx::postgres::PgRow;
use sqlx::types::Json;
use sqlx::{PgConnection, PgPool, Row};

pub(crate) fn row_to_wallet(r: &PgRow) -> Result<Wallet, sqlx::Error> {
    let wallet_type = WalletType::from_id(r.try_get::<i16, _>("wallet_type")?)
        .ok_or_else(|| sqlx::Error::Decode("invalid wallet_type".into()))?;
    Ok(Wallet {
        wallet_id: r.try_get("wallet_id")?,
        user_id: r.try_get("user_id")?,
        wallet_type,
        balance: r.try_get("balance")?,
        ledger_balance: r.try_get("ledger_balance")?,
        is_locked: r.try_get("is_locked")?,
        locked_reason: r.try_get("locked_reason")?,
        daily_spent: r.try_get("daily_spent")?,
        monthly_spent: r.try_get("monthly_spent")?,
        last_reset_at: r.try_get("last_reset_at")?,
        version: r.try_get("version")?,
        created_at: r.try_get("created_at")?,
        updated_at: r.try_get("updated_at")?,
    })
}

pub(crate) fn row_to_txn(r: &PgRow) -> Result<Transaction, sqlx::Error> {
    let wallet_type = WalletType::from_id(r.try_get::<i16, _>("wallet_type")?)
        .ok_or_else(|| sqlx::Error::Decode("invalid wallet_type".into()))?;
    let txn_type = TxnType::from_id(r.try_get::<i16, _>("txn_type")?)
        .ok_or_else(|| sqlx::Error::Decode("invalid txn_type".into()))?;
    let status = TxnStatus::from_id(r.try_get::<i16, _>("status")?)
        .ok_or_else(|| sqlx::Error::Decode("invalid status".into()))?;
    let metadata: Json<TxnMetadata> = r.try_get("metadata")?;
    Ok(Transaction {
        txn_id: r.try_get("txn_id")?,
        reference: r.try_get("reference")?,
        user_id: r.try_get("user_id")?,
        wallet_type,
        txn_type,
        status,
        amount: r.try_get("amount")?,
        fee: r.try_get("fee")?,
        total_amount: r.try_get("total_amount")?,
        balance_before: r.try_get("balance_before")?,
        balance_after: r.try_get("balance_after")?,
        metadata: metadata.0,
        created_at: r.try_get("created_at")?,
        updated_at: r.try_get("updated_at")?,
    })
}

pub(crate) const WALLET_COLUMNS: &str = "wallet_id, user_id, wallet_type, balance, ledger_balance, \
     is_locked, locked_reason, daily_spent, monthly_spent, last_reset_at, version, \
     created_at, updated_at";

pub(crate) const TXN_COLUMNS: &str = "txn_id, reference, user_id, wallet_type, txn_type, status, \
     amount, fee, total_amount, balance_before, balance_after, metadata, created_at, updated_at";

/// Wallet row access
pub struct WalletRepository;

impl WalletRepository {
    pub async fn get(pool: &PgPool, key: WalletKey) -> Result<Option<Wallet>, sqlx::Error> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM wallets_tb WHERE user_id = $1 AND wallet_type = $2",
            WALLET_COLUMNS
        ))
        .bind(key.user_id)
        .bind(key.wallet_type.id())
        .fetch_optional(pool)
        .await?;

        row.as_ref().map(row_to_wallet).transpose()
    }

    /// Get the wallet, creating a zero-balance row if absent. Used at
    /// registration (NGN) and before deposit initialization for implicit
    /// non-NGN wallets.
    pub async fn get_or_create(pool: &PgPool, key: WalletKey) -> Result<Wallet, sqlx::Error> {
        sqlx::query(
            "INSERT INTO wallets_tb (user_id, wallet_type) VALUES ($1, $2)
             ON CONFLICT (user_id, wallet_type) DO NOTHING",
        )
        .bind(key.user_id)
        .bind(key.wallet_type.id())
        .execute(pool)
        .await?;

        let row = sqlx::query(&format!(
            "SELECT {} FROM wallets_tb WHERE user_id = $1 AND wallet_type = $2",
            WALLET_COLUMNS
        ))
        .bind(key.user_id)
        .bind(key.wallet_type.id())
        .fetch_one(pool)
        .await?;

        row_to_wallet(&row)
    }

    /// Lock or unlock a wallet outside of a balance mutation (admin path).
    pub async fn set_lock(
        pool: &PgPool,
        key: WalletKey,
        reason: Option<&str>,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE wallets_tb
             SET is_locked = $1, locked_reason = $2, version = version + 1, updated_at = NOW()
             WHERE user_id = $3 AND wallet_type = $4",
        )
        .bind(reason.is_some())
        .bind(reason)
        .bind(key.user_id)
        .bind(key.wallet_type.id())
        .execute(pool)
        .await?;
        Ok(())
    }
}

/// Transaction row access and post-commit annotation
pub struct TransactionRepository;

impl TransactionRepository {
    pub async fn get_by_reference(
        pool: &PgPool,
        reference: &str,
    ) -> Result<Option<Transaction>, sqlx::Error> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM transactions_tb WHERE reference = $1",
            TXN_COLUMNS
        ))
        .bind(reference)
        .fetch_optional(pool)
        .await?;

        row.as_ref().map(row_to_txn).transpose()
    }

    pub async fn exists(pool: &PgPool, reference: &str) -> Result<bool, sqlx::Error> {
        let found: Option<i64> =
            sqlx::query_scalar("SELECT txn_id FROM transactions_tb WHERE reference = $1")
                .bind(reference)
                .fetch_optional(pool)
                .await?;
        Ok(found.is_some())
    }

    pub async fn history(
        pool: &PgPool,
        user_id: i64,
        limit: i64,
    ) -> Result<Vec<Transaction>, sqlx::Error> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM transactions_tb
             WHERE user_id = $1 ORDER BY created_at DESC LIMIT $2",
            TXN_COLUMNS
        ))
        .bind(user_id)
        .bind(limit)
        .fetch_all(pool)
        .await?;

        rows.iter().map(row_to_txn).collect()
    }

    /// Record a transaction at operation start, before any balance
    /// mutation. Both captured balances hold the current balance until the
    /// ledger settles the row.
    pub async fn insert_pending(
        pool: &PgPool,
        user_id: i64,
        wallet_type: WalletType,
        new_txn: &NewTransaction,
        current_balance: Decimal,
    ) -> Result<Transaction, sqlx::Error> {
        let row = sqlx::query(&format!(
            "INSERT INTO transactions_tb
                 (reference, user_id, wallet_type, txn_type, status, amount, fee,
                  total_amount, balance_before, balance_after, metadata)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $9, $10)
             RETURNING {}",
            TXN_COLUMNS
        ))
        .bind(&new_txn.reference)
        .bind(user_id)
        .bind(wallet_type.id())
        .bind(new_txn.txn_type.id())
        .bind(new_txn.status.id())
        .bind(new_txn.amount)
        .bind(new_txn.fee)
        .bind(new_txn.total_amount())
        .bind(current_balance)
        .bind(Json(&new_txn.metadata))
        .fetch_one(pool)
        .await?;

        row_to_txn(&row)
    }

    /// Finalize an in-flight transaction. COMPLETED rows are not updated
    /// again through this path.
    pub async fn set_status(
        pool: &PgPool,
        reference: &str,
        status: TxnStatus,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE transactions_tb SET status = $1, updated_at = NOW()
             WHERE reference = $2 AND status NOT IN ($3, $4, $5)",
        )
        .bind(status.id())
        .bind(reference)
        .bind(TxnStatus::Completed.id())
        .bind(TxnStatus::Failed.id())
        .bind(TxnStatus::Cancelled.id())
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Replace the metadata bag. Permitted on any row, including COMPLETED
    /// (annotation is the one allowed post-completion mutation).
    pub async fn annotate_metadata(
        pool: &PgPool,
        reference: &str,
        metadata: &TxnMetadata,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE transactions_tb SET metadata = $1, updated_at = NOW() WHERE reference = $2",
        )
        .bind(Json(metadata))
        .bind(reference)
        .execute(pool)
        .await?;
        Ok(())
    }
}

/// New P2P link row, written inside the transfer's atomic unit
#[derive(Debug, Clone)]
pub struct NewP2pTransfer {
    pub reference: String,
    pub sender_id: i64,
    pub receiver_id: i64,
    pub debit_reference: String,
    pub credit_reference: String,
    pub amount: Decimal,
    pub fee: Decimal,
    pub status: TxnStatus,
    pub message: Option<String>,
}

/// P2P transfer link rows
pub struct P2pRepository;

impl P2pRepository {
    /// Insert the link row. Takes a connection so the caller can place it
    /// inside the same transaction as both legs.
    pub async fn insert(
        conn: &mut PgConnection,
        record: &NewP2pTransfer,
    ) -> Result<P2pTransfer, sqlx::Error> {
        let row = sqlx::query(
            "INSERT INTO p2p_transfers_tb
                 (reference, sender_id, receiver_id, debit_reference, credit_reference,
                  amount, fee, status, message)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
             RETURNING transfer_id, reference, sender_id, receiver_id, debit_reference,
                       credit_reference, amount, fee, status, message, created_at",
        )
        .bind(&record.reference)
        .bind(record.sender_id)
        .bind(record.receiver_id)
        .bind(&record.debit_reference)
        .bind(&record.credit_reference)
        .bind(record.amount)
        .bind(record.fee)
        .bind(record.status.id())
        .bind(&record.message)
        .fetch_one(&mut *conn)
        .await?;

        Self::row_to_transfer(&row)
    }

    pub async fn get_by_reference(
        pool: &PgPool,
        reference: &str,
    ) -> Result<Option<P2pTransfer>, sqlx::Error> {
        let row = sqlx::query(
            "SELECT transfer_id, reference, sender_id, receiver_id, debit_reference,
                    credit_reference, amount, fee, status, message, created_at
             FROM p2p_transfers_tb WHERE reference = $1",
        )
        .bind(reference)
        .fetch_optional(pool)
        .await?;

        row.as_ref().map(Self::row_to_transfer).transpose()
    }

    fn row_to_transfer(r: &PgRow) -> Result<P2pTransfer, sqlx::Error> {
        let status = TxnStatus::from_id(r.try_get::<i16, _>("status")?)
            .ok_or_else(|| sqlx::Error::Decode("invalid status".into()))?;
        Ok(P2pTransfer {
            transfer_id: r.try_get("transfer_id")?,
            reference: r.try_get("reference")?,
            sender_id: r.try_get("sender_id")?,
            receiver_id: r.try_get("receiver_id")?,
            debit_reference: r.try_get("debit_reference")?,
            credit_reference: r.try_get("credit_reference")?,
            amount: r.try_get("amount")?,
            fee: r.try_get("fee")?,
            status,
            message: r.try_get("message")?,
            created_at: r.try_get("created_at")?,
        })
    }
}

/// Withdrawal fee/limit policy rows (read-only to the engine)
pub struct WithdrawalConfigRepository;

impl WithdrawalConfigRepository {
    /// Resolve the active config for a tier: tier-scoped row first, then
    /// the global (`tier_level IS NULL`) row.
    pub async fn resolve(
        pool: &PgPool,
        tier: KycTier,
    ) -> Result<Option<WithdrawalConfig>, sqlx::Error> {
        let row = sqlx::query(
            "SELECT fee_type, fee_value, min_fee, max_fee, min_withdrawal, max_withdrawal,
                    tier_level, is_active
             FROM withdrawal_configs_tb
             WHERE is_active AND (tier_level = $1 OR tier_level IS NULL)
             ORDER BY tier_level NULLS LAST
             LIMIT 1",
        )
        .bind(tier.id())
        .fetch_optional(pool)
        .await?;

        row.map(|r| {
            let fee_type = FeeType::from_id(r.try_get::<i16, _>("fee_type")?)
                .ok_or_else(|| sqlx::Error::Decode("invalid fee_type".into()))?;
            Ok(WithdrawalConfig {
                fee_type,
                fee_value: r.try_get("fee_value")?,
                min_fee: r.try_get("min_fee")?,
                max_fee: r.try_get("max_fee")?,
                min_withdrawal: r.try_get("min_withdrawal")?,
                max_withdrawal: r.try_get("max_withdrawal")?,
                tier_level: r.try_get("tier_level")?,
                is_active: r.try_get("is_active")?,
            })
        })
        .transpose()
    }
}
