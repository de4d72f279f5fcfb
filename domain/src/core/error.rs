//! Domain error types

use thiserror::Error;

/// Domain-level errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomainError {
    #[error("No council models configured")]
    NoCouncil,

    #[error("Convergence threshold must be in (0, 1], got {0}")]
    InvalidThreshold(f64),

    #[error("Maximum rounds must be at least 1")]
    InvalidMaxRounds,

    #[error("Invalid question: {0}")]
    InvalidQuestion(String),

    #[error("Round {0} is already frozen")]
    RoundFrozen(u32),

    #[error("Operation cancelled")]
    Cancelled,
}

impl DomainError {
    /// Check if this error represents a cancellation
    pub fn is_cancelled(&self) -> bool {
        matches!(self, DomainError::Cancelled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_threshold_error_display() {
        let error = DomainError::InvalidThreshold(1.5);
        assert_eq!(
            error.to_string(),
            "Convergence threshold must be in (0, 1], got 1.5"
        );
    }

    #[test]
    fn test_is_cancelled_check() {
        assert!(DomainError::Cancelled.is_cancelled());
        assert!(!DomainError::NoCouncil.is_cancelled());
        assert!(!DomainError::RoundFrozen(2).is_cancelled());
    }
}
