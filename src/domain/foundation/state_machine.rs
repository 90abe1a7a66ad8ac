//! State machine trait for status enums.
//!
//! Provides a consistent interface for validating and performing state
//! transitions on entity lifecycle statuses.

use super::DomainError;

/// Trait for status enums that represent state machines.
///
/// Implementors define valid state transitions and get validated
/// transition methods for free. Transitions are one-way: there is no
/// generic "undo", and an invalid transition surfaces as `Conflict`.
pub trait StateMachine: Sized + Copy + PartialEq + std::fmt::Debug {
    /// Returns true if transition from self to target is valid.
    fn can_transition_to(&self, target: &Self) -> bool;

    /// Returns all valid target states from current state.
    fn valid_transitions(&self) -> Vec<Self>;

    /// Performs transition with validation, returning `Conflict` if invalid.
    fn transition_to(&self, target: Self) -> Result<Self, DomainError> {
        if self.can_transition_to(&target) {
            Ok(target)
        } else {
            Err(DomainError::conflict(format!(
                "Cannot transition from {:?} to {:?}",
                self, target
            )))
        }
    }

    /// Checks if current state is terminal (no valid outgoing transitions).
    fn is_terminal(&self) -> bool {
        self.valid_transitions().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::ErrorCode;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum TestStatus {
        Open,
        Settled,
        Closed,
    }

    impl StateMachine for TestStatus {
        fn can_transition_to(&self, target: &Self) -> bool {
            use TestStatus::*;
            matches!((self, target), (Open, Settled) | (Settled, Closed))
        }

        fn valid_transitions(&self) -> Vec<Self> {
            use TestStatus::*;
            match self {
                Open => vec![Settled],
                Settled => vec![Closed],
                Closed => vec![],
            }
        }
    }

    #[test]
    fn transition_to_succeeds_for_valid_transition() {
        let result = TestStatus::Open.transition_to(TestStatus::Settled);
        assert_eq!(result.unwrap(), TestStatus::Settled);
    }

    #[test]
    fn transition_to_surfaces_conflict_for_invalid_transition() {
        let err = TestStatus::Open.transition_to(TestStatus::Closed).unwrap_err();
        assert_eq!(err.code, ErrorCode::Conflict);
    }

    #[test]
    fn is_terminal_matches_valid_transitions() {
        assert!(TestStatus::Closed.is_terminal());
        assert!(!TestStatus::Open.is_terminal());
    }
}
