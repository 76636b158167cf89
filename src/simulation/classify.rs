//! Coarse error buckets for simulated RPC failures
//!
//! Matching is on the lowercase platform message. It is a diagnostic
//! heuristic and will misfile messages that merely mention a lock.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorClass {
    RaceCondition,
    Deadlock,
    Failure,
}

/// `deadlock` wins over `lock`, since every deadlock message contains both
pub fn classify(message: &str) -> ErrorClass {
    let message = message.to_lowercase();
    if message.contains("deadlock") {
        ErrorClass::Deadlock
    } else if message.contains("lock") || message.contains("concurrent") {
        ErrorClass::RaceCondition
    } else {
        ErrorClass::Failure
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify() {
        assert_eq!(classify("ERROR: deadlock detected"), ErrorClass::Deadlock);
        assert_eq!(
            classify("could not obtain lock on row in relation \"token_balances\""),
            ErrorClass::RaceCondition
        );
        assert_eq!(
            classify("could not serialize access due to concurrent update"),
            ErrorClass::RaceCondition
        );
        assert_eq!(classify("Invitation already redeemed"), ErrorClass::Failure);
        assert_eq!(classify(""), ErrorClass::Failure);
    }
}
