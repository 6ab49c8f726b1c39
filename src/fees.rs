//! Fee calculation
//!
//! Identical inputs always yield identical fees: the arithmetic is pure,
//! and the only I/O is the withdrawal-config lookup, resolved before the
//! math runs.

use crate::core_types::KycTier;
use crate::wallet::models::{FeeType, WithdrawalConfig};
use crate::wallet::WithdrawalConfigRepository;
use once_cell::sync::Lazy;
use rust_decimal::Decimal;
use sqlx::PgPool;

/// Card deposit fee rate: 1.5%
static CARD_RATE: Lazy<Decimal> = Lazy::new(|| Decimal::new(15, 3));
/// Flat surcharge on card deposits of 2500 and above
static CARD_SURCHARGE: Lazy<Decimal> = Lazy::new(|| Decimal::from(100));
/// Surcharge threshold
static CARD_SURCHARGE_FLOOR: Lazy<Decimal> = Lazy::new(|| Decimal::from(2500));
/// Card deposit fee cap
static CARD_FEE_CAP: Lazy<Decimal> = Lazy::new(|| Decimal::from(2000));

/// Hardcoded fallback when no withdrawal config row is active
pub static DEFAULT_WITHDRAWAL_CONFIG: Lazy<WithdrawalConfig> = Lazy::new(|| WithdrawalConfig {
    fee_type: FeeType::Percentage,
    fee_value: Decimal::new(15, 1), // 1.5%
    min_fee: Decimal::from(50),
    max_fee: Some(Decimal::from(500)),
    min_withdrawal: Decimal::from(100),
    max_withdrawal: Decimal::from(50_000),
    tier_level: None,
    is_active: true,
});

/// Card deposit fee: 1.5% below 2500, else 1.5% + 100 capped at 2000.
pub fn card_deposit_fee(amount: Decimal) -> Decimal {
    let base = amount * *CARD_RATE;
    if amount < *CARD_SURCHARGE_FLOOR {
        base
    } else {
        (base + *CARD_SURCHARGE).min(*CARD_FEE_CAP)
    }
}

/// Withdrawal fee under a resolved config: flat value or percentage of the
/// amount, clamped to `[min_fee, max_fee]` (no upper clamp when `max_fee`
/// is absent).
pub fn withdrawal_fee(amount: Decimal, config: &WithdrawalConfig) -> Decimal {
    let raw = match config.fee_type {
        FeeType::Flat => config.fee_value,
        FeeType::Percentage => amount * config.fee_value / Decimal::from(100),
    };
    let floored = raw.max(config.min_fee);
    match config.max_fee {
        Some(cap) => floored.min(cap),
        None => floored,
    }
}

/// P2P transfers carry no fee. Deliberate policy, not an oversight.
pub fn p2p_fee() -> Decimal {
    Decimal::ZERO
}

/// Resolve the withdrawal config for a tier: tier-scoped active row, then
/// the global active row, then the hardcoded default.
pub async fn withdrawal_config_for(
    pool: &PgPool,
    tier: KycTier,
) -> Result<WithdrawalConfig, sqlx::Error> {
    Ok(WithdrawalConfigRepository::resolve(pool, tier)
        .await?
        .unwrap_or_else(|| DEFAULT_WITHDRAWAL_CONFIG.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_card_fee_below_surcharge_floor() {
        // 2499 * 1.5% = 37.485, no surcharge
        assert_eq!(
            card_deposit_fee(Decimal::from(2499)),
            Decimal::from(2499) * Decimal::new(15, 3)
        );
    }

    #[test]
    fn test_card_fee_at_surcharge_floor() {
        // 2500 * 1.5% + 100 = 137.5
        assert_eq!(card_deposit_fee(Decimal::from(2500)), Decimal::new(1375, 1));
    }

    #[test]
    fn test_card_fee_capped() {
        // 500_000 * 1.5% + 100 = 7600 -> capped at 2000
        assert_eq!(card_deposit_fee(Decimal::from(500_000)), Decimal::from(2000));
    }

    #[test]
    fn test_withdrawal_fee_percentage_clamped_high() {
        // 100_000 * 1.5% = 1500 -> clamped to max 500
        let fee = withdrawal_fee(Decimal::from(100_000), &DEFAULT_WITHDRAWAL_CONFIG);
        assert_eq!(fee, Decimal::from(500));
    }

    #[test]
    fn test_withdrawal_fee_percentage_clamped_low() {
        // 1000 * 1.5% = 15 -> clamped up to min 50
        let fee = withdrawal_fee(Decimal::from(1000), &DEFAULT_WITHDRAWAL_CONFIG);
        assert_eq!(fee, Decimal::from(50));
    }

    #[test]
    fn test_withdrawal_fee_mid_range() {
        // 5000 * 1.5% = 75, inside [50, 500]
        let fee = withdrawal_fee(Decimal::from(5000), &DEFAULT_WITHDRAWAL_CONFIG);
        assert_eq!(fee, Decimal::from(75));
    }

    #[test]
    fn test_withdrawal_fee_flat() {
        let config = WithdrawalConfig {
            fee_type: FeeType::Flat,
            fee_value: Decimal::from(25),
            min_fee: Decimal::from(10),
            max_fee: None,
            min_withdrawal: Decimal::from(100),
            max_withdrawal: Decimal::from(50_000),
            tier_level: Some(2),
            is_active: true,
        };
        assert_eq!(withdrawal_fee(Decimal::from(9_999), &config), Decimal::from(25));
    }

    #[test]
    fn test_withdrawal_fee_no_upper_clamp() {
        let config = WithdrawalConfig {
            max_fee: None,
            ..DEFAULT_WITHDRAWAL_CONFIG.clone()
        };
        // 100_000 * 1.5% = 1500, no cap
        assert_eq!(
            withdrawal_fee(Decimal::from(100_000), &config),
            Decimal::from(1500)
        );
    }

    #[test]
    fn test_p2p_fee_is_zero() {
        assert_eq!(p2p_fee(), Decimal::ZERO);
    }

    #[test]
    fn test_determinism() {
        for _ in 0..3 {
            assert_eq!(
                card_deposit_fee(Decimal::from(7_350)),
                card_deposit_fee(Decimal::from(7_350))
            );
        }
    }
}
