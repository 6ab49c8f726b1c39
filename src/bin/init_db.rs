//! Bootstrap the wallet database: apply schema DDL and seed the global
//! withdrawal config row if none is active.
//!
//! Usage: `init_db [env]` (default: dev), reading `config/{env}.yaml`.

use anyhow::Result;
use kobovault::config::AppConfig;
use kobovault::db::{self, Database};
use kobovault::fees::DEFAULT_WITHDRAWAL_CONFIG;
use kobovault::logging::init_logging;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    let env = std::env::args().nth(1).unwrap_or_else(|| "dev".to_string());
    let config = AppConfig::load(&env);
    let _guard = init_logging(&config);

    let database = Database::connect_with(&config.database).await?;
    db::init_schema(database.pool()).await?;
    info!("schema applied");

    let active: Option<i64> = sqlx::query_scalar(
        "SELECT config_id FROM withdrawal_configs_tb
         WHERE is_active AND tier_level IS NULL LIMIT 1",
    )
    .fetch_optional(database.pool())
    .await?;

    if active.is_none() {
        let default = &*DEFAULT_WITHDRAWAL_CONFIG;
        sqlx::query(
            "INSERT INTO withdrawal_configs_tb
                 (fee_type, fee_value, min_fee, max_fee, min_withdrawal, max_withdrawal,
                  tier_level, is_active)
             VALUES ($1, $2, $3, $4, $5, $6, NULL, TRUE)",
        )
        .bind(default.fee_type.id())
        .bind(default.fee_value)
        .bind(default.min_fee)
        .bind(default.max_fee)
        .bind(default.min_withdrawal)
        .bind(default.max_withdrawal)
        .execute(database.pool())
        .await?;
        info!("seeded global withdrawal config");
    } else {
        info!("global withdrawal config already present");
    }

    Ok(())
}
