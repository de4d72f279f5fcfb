//! Convergence policy: threshold, round ceiling and the high-score rule.

use crate::core::error::DomainError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Default minimum stability score required to declare convergence
pub const DEFAULT_THRESHOLD: f64 = 0.85;

/// Default round ceiling, divergent round included
pub const DEFAULT_MAX_ROUNDS: u32 = 5;

/// What to do when the chairman reports `is_converged = false` although its
/// own stability score already meets the threshold.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HighScorePolicy {
    /// Keep the chairman's verdict; deliberation continues.
    #[default]
    RespectEvaluator,
    /// The score wins; the round is treated as converged.
    ForceConvergence,
}

impl HighScorePolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            HighScorePolicy::RespectEvaluator => "respect_evaluator",
            HighScorePolicy::ForceConvergence => "force_convergence",
        }
    }
}

impl FromStr for HighScorePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "respect_evaluator" | "respect" => Ok(HighScorePolicy::RespectEvaluator),
            "force_convergence" | "force" => Ok(HighScorePolicy::ForceConvergence),
            other => Err(format!("unknown high score policy: {other}")),
        }
    }
}

impl std::fmt::Display for HighScorePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Immutable convergence rules for one deliberation turn.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConvergencePolicy {
    threshold: f64,
    max_rounds: u32,
    high_score_policy: HighScorePolicy,
}

impl ConvergencePolicy {
    /// Create a policy, rejecting a threshold outside `(0, 1]` or a zero ceiling.
    pub fn new(threshold: f64, max_rounds: u32) -> Result<Self, DomainError> {
        if !(threshold > 0.0 && threshold <= 1.0) {
            return Err(DomainError::InvalidThreshold(threshold));
        }
        if max_rounds == 0 {
            return Err(DomainError::InvalidMaxRounds);
        }
        Ok(Self {
            threshold,
            max_rounds,
            high_score_policy: HighScorePolicy::default(),
        })
    }

    pub fn with_high_score_policy(mut self, policy: HighScorePolicy) -> Self {
        self.high_score_policy = policy;
        self
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn max_rounds(&self) -> u32 {
        self.max_rounds
    }

    pub fn high_score_policy(&self) -> HighScorePolicy {
        self.high_score_policy
    }

    /// Whether a (clamped) score is high enough to back a converged verdict.
    pub fn meets_threshold(&self, score: f64) -> bool {
        score >= self.threshold
    }
}

impl Default for ConvergencePolicy {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            max_rounds: DEFAULT_MAX_ROUNDS,
            high_score_policy: HighScorePolicy::default(),
        }
    }
}
