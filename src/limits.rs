//! Tiered transaction limits
//!
//! Static per-tier policy tables plus the rolling daily spend counters.
//! The asymmetry is deliberate: over-limit deposits still apply and the
//! wallet is locked afterwards, while over-limit withdrawals and P2P sends
//! are rejected before any balance mutation. Counter increments run only
//! after a commit and are best-effort.

use crate::core_types::{KycTier, SpendCategory, WalletType};
use chrono::Utc;
use rust_decimal::Decimal;
use sqlx::{PgPool, Row};

/// Per-tier static caps. `None` means unlimited.
#[derive(Debug, Clone)]
pub struct TierLimits {
    pub min_deposit: Decimal,
    pub max_deposit: Option<Decimal>,
    pub min_withdrawal: Decimal,
    pub max_withdrawal: Option<Decimal>,
    pub daily_deposit_cap: Option<Decimal>,
    pub daily_withdrawal_cap: Option<Decimal>,
    /// Per-transaction P2P send cap; zero for tiers that cannot send
    pub p2p_txn_cap: Option<Decimal>,
    pub daily_p2p_cap: Option<Decimal>,
}

/// Policy table, TIER_0 through TIER_3.
pub fn tier_limits(tier: KycTier) -> TierLimits {
    let d = |v: i64| Decimal::from(v);
    match tier {
        KycTier::Tier0 => TierLimits {
            min_deposit: d(100),
            max_deposit: Some(d(50_000)),
            min_withdrawal: d(100),
            max_withdrawal: Some(d(20_000)),
            daily_deposit_cap: Some(d(50_000)),
            daily_withdrawal_cap: Some(d(20_000)),
            p2p_txn_cap: Some(Decimal::ZERO),
            daily_p2p_cap: Some(Decimal::ZERO),
        },
        KycTier::Tier1 => TierLimits {
            min_deposit: d(100),
            max_deposit: Some(d(200_000)),
            min_withdrawal: d(100),
            max_withdrawal: Some(d(100_000)),
            daily_deposit_cap: Some(d(200_000)),
            daily_withdrawal_cap: Some(d(100_000)),
            p2p_txn_cap: Some(d(100_000)),
            daily_p2p_cap: Some(d(500_000)),
        },
        KycTier::Tier2 => TierLimits {
            min_deposit: d(100),
            max_deposit: Some(d(1_000_000)),
            min_withdrawal: d(100),
            max_withdrawal: Some(d(500_000)),
            daily_deposit_cap: Some(d(1_000_000)),
            daily_withdrawal_cap: Some(d(500_000)),
            p2p_txn_cap: Some(d(1_000_000)),
            daily_p2p_cap: Some(d(5_000_000)),
        },
        KycTier::Tier3 => TierLimits {
            min_deposit: d(100),
            max_deposit: None,
            min_withdrawal: d(100),
            max_withdrawal: None,
            daily_deposit_cap: None,
            daily_withdrawal_cap: None,
            p2p_txn_cap: None,
            daily_p2p_cap: None,
        },
    }
}

impl TierLimits {
    pub fn daily_cap(&self, category: SpendCategory) -> Option<Decimal> {
        match category {
            SpendCategory::Deposit => self.daily_deposit_cap,
            SpendCategory::Withdrawal => self.daily_withdrawal_cap,
            SpendCategory::P2pSend => self.daily_p2p_cap,
        }
    }

    /// Per-transaction amount range for a category; the message names the
    /// bound for the caller's rejection reason.
    pub fn validate_amount(&self, amount: Decimal, category: SpendCategory) -> Result<(), String> {
        let (min, max) = match category {
            SpendCategory::Deposit => (self.min_deposit, self.max_deposit),
            SpendCategory::Withdrawal => (self.min_withdrawal, self.max_withdrawal),
            SpendCategory::P2pSend => (Decimal::ZERO, self.p2p_txn_cap),
        };
        if amount < min {
            return Err(format!("Amount below minimum of {}", min));
        }
        if let Some(cap) = max {
            if amount > cap {
                return Err(format!("Amount above maximum of {}", cap));
            }
        }
        Ok(())
    }
}

/// Result of a daily-limit check
#[derive(Debug, Clone)]
pub struct LimitCheck {
    pub can_proceed: bool,
    /// Absent when the tier is unlimited for this category
    pub limit: Option<Decimal>,
    pub spent: Decimal,
    pub remaining: Option<Decimal>,
}

/// Reads and writes the rolling daily spend counters.
pub struct LimitEnforcer {
    pool: PgPool,
}

impl LimitEnforcer {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Would `amount` fit under today's cap for this category?
    pub async fn check_daily_limit(
        &self,
        user_id: i64,
        tier: KycTier,
        amount: Decimal,
        category: SpendCategory,
    ) -> Result<LimitCheck, sqlx::Error> {
        let cap = tier_limits(tier).daily_cap(category);
        let spent = self.spent_today(user_id, category).await?;

        let check = match cap {
            None => LimitCheck {
                can_proceed: true,
                limit: None,
                spent,
                remaining: None,
            },
            Some(limit) => {
                let remaining = (limit - spent).max(Decimal::ZERO);
                LimitCheck {
                    can_proceed: spent + amount <= limit,
                    limit: Some(limit),
                    spent,
                    remaining: Some(remaining),
                }
            }
        };
        Ok(check)
    }

    /// Add to today's counter. Called only after the triggering commit;
    /// callers treat failures as log-and-continue.
    pub async fn increment_daily_spend(
        &self,
        user_id: i64,
        amount: Decimal,
        category: SpendCategory,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO daily_spend_tb (user_id, category, day, spent)
             VALUES ($1, $2, $3, $4)
             ON CONFLICT (user_id, category, day)
             DO UPDATE SET spent = daily_spend_tb.spent + EXCLUDED.spent, updated_at = NOW()",
        )
        .bind(user_id)
        .bind(category.id())
        .bind(Utc::now().date_naive())
        .bind(amount)
        .execute(&self.pool)
        .await?;

        // Mirror outbound spend onto the wallet's own counters, rolling
        // them over at the day/month boundary.
        if matches!(category, SpendCategory::Withdrawal | SpendCategory::P2pSend) {
            sqlx::query(
                "UPDATE wallets_tb
                 SET daily_spent = CASE
                         WHEN last_reset_at::date < CURRENT_DATE THEN $1
                         ELSE daily_spent + $1
                     END,
                     monthly_spent = CASE
                         WHEN date_trunc('month', last_reset_at) < date_trunc('month', NOW()) THEN $1
                         ELSE monthly_spent + $1
                     END,
                     last_reset_at = NOW()
                 WHERE user_id = $2 AND wallet_type = $3",
            )
            .bind(amount)
            .bind(user_id)
            .bind(WalletType::Ngn.id())
            .execute(&self.pool)
            .await?;
        }
        Ok(())
    }

    async fn spent_today(
        &self,
        user_id: i64,
        category: SpendCategory,
    ) -> Result<Decimal, sqlx::Error> {
        let row = sqlx::query(
            "SELECT spent FROM daily_spend_tb
             WHERE user_id = $1 AND category = $2 AND day = $3",
        )
        .bind(user_id)
        .bind(category.id())
        .bind(Utc::now().date_naive())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row
            .map(|r| r.get::<Decimal, _>("spent"))
            .unwrap_or(Decimal::ZERO))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier0_cannot_send_p2p() {
        let limits = tier_limits(KycTier::Tier0);
        assert_eq!(limits.p2p_txn_cap, Some(Decimal::ZERO));
        assert!(limits
            .validate_amount(Decimal::from(1), SpendCategory::P2pSend)
            .is_err());
    }

    #[test]
    fn test_p2p_txn_caps_by_tier() {
        assert_eq!(
            tier_limits(KycTier::Tier1).p2p_txn_cap,
            Some(Decimal::from(100_000))
        );
        assert_eq!(
            tier_limits(KycTier::Tier2).p2p_txn_cap,
            Some(Decimal::from(1_000_000))
        );
        assert_eq!(tier_limits(KycTier::Tier3).p2p_txn_cap, None);
    }

    #[test]
    fn test_caps_widen_with_tier() {
        let t1 = tier_limits(KycTier::Tier1);
        let t2 = tier_limits(KycTier::Tier2);
        assert!(t1.daily_withdrawal_cap.unwrap() < t2.daily_withdrawal_cap.unwrap());
        assert!(t1.max_deposit.unwrap() < t2.max_deposit.unwrap());
    }

    #[test]
    fn test_validate_amount_range() {
        let limits = tier_limits(KycTier::Tier1);
        assert!(limits
            .validate_amount(Decimal::from(50), SpendCategory::Withdrawal)
            .is_err());
        assert!(limits
            .validate_amount(Decimal::from(5_000), SpendCategory::Withdrawal)
            .is_ok());
        assert!(limits
            .validate_amount(Decimal::from(150_000), SpendCategory::Withdrawal)
            .is_err());
        // Tier 3: no upper bound
        assert!(tier_limits(KycTier::Tier3)
            .validate_amount(Decimal::from(10_000_000), SpendCategory::Withdrawal)
            .is_ok());
    }

    #[test]
    fn test_daily_cap_selection() {
        let limits = tier_limits(KycTier::Tier1);
        assert_eq!(
            limits.daily_cap(SpendCategory::Deposit),
            Some(Decimal::from(200_000))
        );
        assert_eq!(
            limits.daily_cap(SpendCategory::P2pSend),
            Some(Decimal::from(500_000))
        );
    }
}
