//! Type definitions for the RunDeliberation use case.

use crate::config::DeliberationParams;
use council_domain::{
    CallFailure, ConvergencePolicy, DomainError, ModelConfig, Question, Round, TurnFailure,
    TurnFailureKind,
};
use thiserror::Error;

/// Input for the RunDeliberation use case
#[derive(Debug, Clone)]
pub struct RunDeliberationInput {
    /// The question put to the council
    pub question: Question,
    /// Council roster (speaking order) and chairman
    pub models: ModelConfig,
    /// Threshold, round ceiling and high-score policy
    pub policy: ConvergencePolicy,
    /// Call timeouts
    pub params: DeliberationParams,
}

impl RunDeliberationInput {
    pub fn new(question: impl Into<Question>, models: ModelConfig) -> Self {
        Self {
            question: question.into(),
            models,
            policy: ConvergencePolicy::default(),
            params: DeliberationParams::default(),
        }
    }

    pub fn with_policy(mut self, policy: ConvergencePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_params(mut self, params: DeliberationParams) -> Self {
        self.params = params;
        self
    }

    /// Reject configurations no turn can run with.
    pub fn validate(&self) -> Result<(), DomainError> {
        self.models.validate()?;
        // Re-check: a deserialized policy bypasses the constructor
        ConvergencePolicy::new(self.policy.threshold(), self.policy.max_rounds())?;
        Ok(())
    }
}

/// Errors that end a deliberation turn
#[derive(Error, Debug, Clone)]
pub enum RunDeliberationError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("All council calls failed in round {round}")]
    AllCallsFailed {
        round: u32,
        failures: Vec<CallFailure>,
    },

    #[error("Chairman evaluation failed in round {round}: {reason}")]
    EvaluatorFailed {
        round: u32,
        reason: String,
        /// Rounds completed before the failing one
        completed_rounds: Vec<Round>,
        /// The failing round, with its council responses
        partial_round: Option<Round>,
    },

    #[error("Operation cancelled")]
    Cancelled { completed_rounds: Vec<Round> },

    #[error("Deliberation ended without a result")]
    StreamClosed,
}

impl RunDeliberationError {
    /// Check if this error represents a cancellation
    pub fn is_cancelled(&self) -> bool {
        matches!(self, RunDeliberationError::Cancelled { .. })
    }

    /// Rounds that completed before the turn failed.
    pub fn completed_rounds(&self) -> &[Round] {
        match self {
            RunDeliberationError::EvaluatorFailed {
                completed_rounds, ..
            }
            | RunDeliberationError::Cancelled { completed_rounds } => completed_rounds,
            _ => &[],
        }
    }
}

impl From<DomainError> for RunDeliberationError {
    fn from(error: DomainError) -> Self {
        match error {
            DomainError::Cancelled => RunDeliberationError::Cancelled {
                completed_rounds: Vec::new(),
            },
            other => RunDeliberationError::InvalidConfig(other.to_string()),
        }
    }
}

impl From<RunDeliberationError> for TurnFailure {
    fn from(error: RunDeliberationError) -> Self {
        let message = error.to_string();
        match error {
            RunDeliberationError::InvalidConfig(_) => {
                TurnFailure::new(TurnFailureKind::InvalidConfig, message)
            }
            RunDeliberationError::AllCallsFailed { round, failures } => {
                let mut partial = Round::new(round);
                for failure in failures {
                    partial.record_failure(failure);
                }
                partial.close_dispatch();
                TurnFailure::new(TurnFailureKind::AllCallsFailed, message)
                    .in_round(round)
                    .with_rounds(Vec::new(), Some(partial))
            }
            RunDeliberationError::EvaluatorFailed {
                round,
                completed_rounds,
                partial_round,
                ..
            } => TurnFailure::new(TurnFailureKind::EvaluatorFailure, message)
                .in_round(round)
                .with_rounds(completed_rounds, partial_round),
            RunDeliberationError::Cancelled { completed_rounds } => {
                TurnFailure::new(TurnFailureKind::Cancelled, message)
                    .with_rounds(completed_rounds, None)
            }
            RunDeliberationError::StreamClosed => {
                TurnFailure::new(TurnFailureKind::StreamClosed, message)
            }
        }
    }
}

impl From<TurnFailure> for RunDeliberationError {
    fn from(failure: TurnFailure) -> Self {
        let round = failure.round.unwrap_or_default();
        match failure.kind {
            TurnFailureKind::InvalidConfig => RunDeliberationError::InvalidConfig(
                failure
                    .message
                    .trim_start_matches("Invalid configuration: ")
                    .to_string(),
            ),
            TurnFailureKind::AllCallsFailed => RunDeliberationError::AllCallsFailed {
                round,
                failures: failure
                    .partial_round
                    .map(|r| r.failures)
                    .unwrap_or_default(),
            },
            TurnFailureKind::EvaluatorFailure => RunDeliberationError::EvaluatorFailed {
                round,
                reason: evaluator_reason(&failure.message, round),
                completed_rounds: failure.completed_rounds,
                partial_round: failure.partial_round,
            },
            TurnFailureKind::Cancelled => RunDeliberationError::Cancelled {
                completed_rounds: failure.completed_rounds,
            },
            TurnFailureKind::StreamClosed => RunDeliberationError::StreamClosed,
        }
    }
}

fn evaluator_reason(message: &str, round: u32) -> String {
    let prefix = format!("Chairman evaluation failed in round {round}: ");
    message
        .strip_prefix(&prefix)
        .unwrap_or(message)
        .to_string()
}
