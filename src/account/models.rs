//! Data models for the user surface the engine reads

use crate::core_types::KycTier;
use chrono::{DateTime, Utc};

/// User status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i16)]
pub enum UserStatus {
    Suspended = 0,
    Active = 1,
}

impl From<i16> for UserStatus {
    fn from(v: i16) -> Self {
        match v {
            0 => UserStatus::Suspended,
            _ => UserStatus::Active,
        }
    }
}

/// Platform user as seen by the wallet engine.
///
/// Identity lifecycle (registration, KYC document flow, sessions) is a
/// collaborator; the engine reads tier, status and tag.
#[derive(Debug, Clone)]
pub struct User {
    pub user_id: i64,
    /// Unique P2P handle
    pub tag: String,
    pub email: Option<String>,
    pub status: UserStatus,
    pub kyc_tier: KycTier,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn is_active(&self) -> bool {
        self.status == UserStatus::Active
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_status_from_i16() {
        assert_eq!(UserStatus::from(0), UserStatus::Suspended);
        assert_eq!(UserStatus::from(1), UserStatus::Active);
        assert_eq!(UserStatus::from(99), UserStatus::Active); // default to Active
    }

    #[test]
    fn test_is_active() {
        let user = User {
            user_id: 1,
            tag: "ada".to_string(),
            email: None,
            status: UserStatus::Suspended,
            kyc_tier: KycTier::Tier1,
            created_at: Utc::now(),
        };
        assert!(!user.is_active());
    }
}
