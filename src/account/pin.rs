//! Transaction PIN verification seam
//!
//! The real verifier lives with the identity service; withdrawals only
//! need a yes/no before any balance mutation.

use async_trait::async_trait;

#[async_trait]
pub trait PinVerifier: Send + Sync {
    /// Verify the transaction PIN for a user. `Ok(false)` is a wrong PIN;
    /// `Err` is an infrastructure failure.
    async fn verify(&self, user_id: i64, pin: &str) -> Result<bool, sqlx::Error>;
}

/// Fixed-PIN verifier for tests and local runs
#[derive(Debug, Clone)]
pub struct StaticPinVerifier {
    pin: String,
}

impl StaticPinVerifier {
    pub fn new(pin: impl Into<String>) -> Self {
        Self { pin: pin.into() }
    }
}

#[async_trait]
impl PinVerifier for StaticPinVerifier {
    async fn verify(&self, _user_id: i64, pin: &str) -> Result<bool, sqlx::Error> {
        Ok(pin == self.pin)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_static_pin() {
        let v = StaticPinVerifier::new("1234");
        assert!(v.verify(1, "1234").await.unwrap());
        assert!(!v.verify(1, "0000").await.unwrap());
    }
}
