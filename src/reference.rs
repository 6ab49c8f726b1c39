//! Transaction reference generation
//!
//! References are human-traceable: an operation prefix, a millisecond
//! timestamp and a random uppercase tail. Global uniqueness is enforced by
//! the unique index on `transactions_tb.reference`; an insert collision
//! surfaces as a duplicate-reference error and is never silently reused.

use crate::core_types::TxnType;
use rand::distributions::Alphanumeric;
use rand::Rng;

/// Operation prefixes as they appear in statements and support tooling
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefKind {
    Deposit,
    Withdrawal,
    P2p,
    Adjustment,
}

impl RefKind {
    pub fn prefix(&self) -> &'static str {
        match self {
            RefKind::Deposit => "DEP",
            RefKind::Withdrawal => "WTH",
            RefKind::P2p => "P2P",
            RefKind::Adjustment => "ADJ",
        }
    }

    pub fn from_txn_type(txn_type: TxnType) -> Self {
        match txn_type {
            TxnType::Deposit => RefKind::Deposit,
            TxnType::Withdrawal => RefKind::Withdrawal,
            TxnType::Transfer => RefKind::P2p,
        }
    }
}

/// Generate a new transaction reference, e.g. `DEP-1722950400123-8F3KQZ`
pub fn generate(kind: RefKind) -> String {
    let ts = chrono::Utc::now().timestamp_millis();
    let tail: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(6)
        .map(|c| (c as char).to_ascii_uppercase())
        .collect();
    format!("{}-{}-{}", kind.prefix(), ts, tail)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefixes() {
        assert!(generate(RefKind::Deposit).starts_with("DEP-"));
        assert!(generate(RefKind::Withdrawal).starts_with("WTH-"));
        assert!(generate(RefKind::P2p).starts_with("P2P-"));
        assert!(generate(RefKind::Adjustment).starts_with("ADJ-"));
    }

    #[test]
    fn test_shape() {
        let r = generate(RefKind::Withdrawal);
        let parts: Vec<&str> = r.split('-').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[2].len(), 6);
        assert!(parts[1].parse::<i64>().is_ok());
        assert!(parts[2].chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()));
    }

    #[test]
    fn test_uniqueness_over_a_burst() {
        let mut seen = std::collections::HashSet::new();
        for _ in 0..1000 {
            assert!(seen.insert(generate(RefKind::P2p)));
        }
    }
}
