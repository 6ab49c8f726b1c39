//! Repository layer for user lookups

use super::models::{User, UserStatus};
use crate::core_types::KycTier;
use sqlx::{PgPool, Row};

/// User repository for read operations
pub struct UserRepository;

impl UserRepository {
    /// Get user by ID
    pub async fn get_by_id(pool: &PgPool, user_id: i64) -> Result<Option<User>, sqlx::Error> {
        let row = sqlx::query(
            r#"SELECT user_id, tag, email, status, kyc_tier, created_at
               FROM users_tb WHERE user_id = $1"#,
        )
        .bind(user_id)
        .fetch_optional(pool)
        .await?;

        Ok(row.map(Self::row_to_user))
    }

    /// Get user by their unique P2P tag
    pub async fn get_by_tag(pool: &PgPool, tag: &str) -> Result<Option<User>, sqlx::Error> {
        let row = sqlx::query(
            r#"SELECT user_id, tag, email, status, kyc_tier, created_at
               FROM users_tb WHERE tag = $1"#,
        )
        .bind(tag)
        .fetch_optional(pool)
        .await?;

        Ok(row.map(Self::row_to_user))
    }

    /// Resolve the owner of a provisioned virtual account. Provisioning
    /// itself is a collaborator; the engine only reads the mapping when a
    /// bank-transfer receipt arrives.
    pub async fn get_by_virtual_account(
        pool: &PgPool,
        account_number: &str,
    ) -> Result<Option<User>, sqlx::Error> {
        let row = sqlx::query(
            r#"SELECT u.user_id, u.tag, u.email, u.status, u.kyc_tier, u.created_at
               FROM users_tb u
               JOIN virtual_accounts_tb v ON v.user_id = u.user_id
               WHERE v.account_number = $1"#,
        )
        .bind(account_number)
        .fetch_optional(pool)
        .await?;

        Ok(row.map(Self::row_to_user))
    }

    fn row_to_user(r: sqlx::postgres::PgRow) -> User {
        let tier = KycTier::from_id(r.get::<i16, _>("kyc_tier")).unwrap_or(KycTier::Tier0);
        User {
            user_id: r.get("user_id"),
            tag: r.get("tag"),
            email: r.get("email"),
            status: UserStatus::from(r.get::<i16, _>("status")),
            kyc_tier: tier,
            created_at: r.get("created_at"),
        }
    }
}
