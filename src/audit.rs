//! Append-only audit trail
//!
//! Write-only contract: the engine records every balance-affecting
//! admin/system action and never reads the log back.

use sqlx::PgPool;
use tracing::warn;

pub struct AuditLogger {
    pool: PgPool,
}

impl AuditLogger {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn record(
        &self,
        actor_id: i64,
        action: &str,
        target_id: Option<i64>,
        detail: serde_json::Value,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO audit_logs_tb (actor_id, action, target_id, detail)
             VALUES ($1, $2, $3, $4)",
        )
        .bind(actor_id)
        .bind(action)
        .bind(target_id)
        .bind(detail)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Post-commit variant: a failed write is logged, never propagated.
    pub async fn record_best_effort(
        &self,
        actor_id: i64,
        action: &str,
        target_id: Option<i64>,
        detail: serde_json::Value,
    ) {
        if let Err(e) = self.record(actor_id, action, target_id, detail).await {
            warn!(actor_id, action, error = %e, "audit log write failed");
        }
    }
}
