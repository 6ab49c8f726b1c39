//! Database connection management

use crate::config::DatabaseConfig;
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;

/// PostgreSQL database connection pool
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Create a new database connection pool
    pub async fn connect(database_url: &str) -> Result<Self, sqlx::Error> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .acquire_timeout(Duration::from_secs(5))
            .connect(database_url)
            .await?;

        tracing::info!("PostgreSQL connection pool established");
        Ok(Self { pool })
    }

    /// Create a pool using explicit config values
    pub async fn connect_with(config: &DatabaseConfig) -> Result<Self, sqlx::Error> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
            .connect(&config.url)
            .await?;

        tracing::info!("PostgreSQL connection pool established");
        Ok(Self { pool })
    }

    /// Get a reference to the connection pool
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Check database health
    pub async fn health_check(&self) -> Result<(), sqlx::Error> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

/// Idempotent DDL for the wallet engine tables.
///
/// Applied with `CREATE TABLE IF NOT EXISTS` so a bare database (including
/// the test database) can bootstrap itself.
pub async fn init_schema(pool: &PgPool) -> Result<(), sqlx::Error> {
    let statements = [
        r#"
        CREATE TABLE IF NOT EXISTS users_tb (
            user_id     BIGSERIAL PRIMARY KEY,
            tag         TEXT NOT NULL UNIQUE,
            email       TEXT,
            status      SMALLINT NOT NULL DEFAULT 1,
            kyc_tier    SMALLINT NOT NULL DEFAULT 0,
            pin_hash    TEXT,
            created_at  TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )
        "#,
        r#"
        CREATE TABLE IF NOT EXISTS virtual_accounts_tb (
            account_number  TEXT PRIMARY KEY,
            user_id         BIGINT NOT NULL,
            bank_name       TEXT,
            created_at      TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )
        "#,
        r#"
        CREATE TABLE IF NOT EXISTS wallets_tb (
            wallet_id       BIGSERIAL PRIMARY KEY,
            user_id         BIGINT NOT NULL,
            wallet_type     SMALLINT NOT NULL,
            balance         NUMERIC(20,2) NOT NULL DEFAULT 0 CHECK (balance >= 0),
            ledger_balance  NUMERIC(20,2) NOT NULL DEFAULT 0,
            is_locked       BOOLEAN NOT NULL DEFAULT FALSE,
            locked_reason   TEXT,
            daily_spent     NUMERIC(20,2) NOT NULL DEFAULT 0,
            monthly_spent   NUMERIC(20,2) NOT NULL DEFAULT 0,
            last_reset_at   TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            version         BIGINT NOT NULL DEFAULT 1,
            created_at      TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            updated_at      TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            UNIQUE (user_id, wallet_type)
        )
        "#,
        r#"
        CREATE TABLE IF NOT EXISTS transactions_tb (
            txn_id          BIGSERIAL PRIMARY KEY,
            reference       TEXT NOT NULL UNIQUE,
            user_id         BIGINT NOT NULL,
            wallet_type     SMALLINT NOT NULL,
            txn_type        SMALLINT NOT NULL,
            status          SMALLINT NOT NULL,
            amount          NUMERIC(20,2) NOT NULL,
            fee             NUMERIC(20,2) NOT NULL DEFAULT 0,
            total_amount    NUMERIC(20,2) NOT NULL,
            balance_before  NUMERIC(20,2) NOT NULL,
            balance_after   NUMERIC(20,2) NOT NULL,
            metadata        JSONB NOT NULL DEFAULT '{}'::jsonb,
            created_at      TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            updated_at      TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )
        "#,
        r#"
        CREATE INDEX IF NOT EXISTS idx_transactions_user
            ON transactions_tb (user_id, created_at DESC)
        "#,
        r#"
        CREATE TABLE IF NOT EXISTS p2p_transfers_tb (
            transfer_id      BIGSERIAL PRIMARY KEY,
            reference        TEXT NOT NULL UNIQUE,
            sender_id        BIGINT NOT NULL,
            receiver_id      BIGINT NOT NULL,
            debit_reference  TEXT NOT NULL,
            credit_reference TEXT NOT NULL,
            amount           NUMERIC(20,2) NOT NULL,
            fee              NUMERIC(20,2) NOT NULL DEFAULT 0,
            status           SMALLINT NOT NULL,
            message          TEXT,
            created_at       TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )
        "#,
        r#"
        CREATE TABLE IF NOT EXISTS withdrawal_configs_tb (
            config_id       BIGSERIAL PRIMARY KEY,
            fee_type        SMALLINT NOT NULL,
            fee_value       NUMERIC(20,2) NOT NULL,
            min_fee         NUMERIC(20,2) NOT NULL DEFAULT 0,
            max_fee         NUMERIC(20,2),
            min_withdrawal  NUMERIC(20,2) NOT NULL,
            max_withdrawal  NUMERIC(20,2) NOT NULL,
            tier_level      SMALLINT,
            is_active       BOOLEAN NOT NULL DEFAULT TRUE,
            created_at      TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )
        "#,
        r#"
        CREATE TABLE IF NOT EXISTS daily_spend_tb (
            user_id     BIGINT NOT NULL,
            category    SMALLINT NOT NULL,
            day         DATE NOT NULL,
            spent       NUMERIC(20,2) NOT NULL DEFAULT 0,
            updated_at  TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            PRIMARY KEY (user_id, category, day)
        )
        "#,
        r#"
        CREATE TABLE IF NOT EXISTS audit_logs_tb (
            audit_id    BIGSERIAL PRIMARY KEY,
            actor_id    BIGINT NOT NULL,
            action      TEXT NOT NULL,
            target_id   BIGINT,
            detail      JSONB NOT NULL DEFAULT '{}'::jsonb,
            created_at  TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )
        "#,
    ];

    for ddl in statements {
        sqlx::query(ddl).execute(pool).await?;
    }

    Ok(())
}
