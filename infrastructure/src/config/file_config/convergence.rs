//! Convergence configuration from TOML (`[convergence]` section)

use council_domain::{
    ConfigIssue, ConfigIssueCode, ConvergencePolicy, DEFAULT_MAX_ROUNDS, DEFAULT_THRESHOLD,
    HighScorePolicy,
};
use serde::{Deserialize, Serialize};

/// Convergence configuration from TOML
///
/// # Example
///
/// ```toml
/// [convergence]
/// threshold = 0.85
/// max_rounds = 5
/// high_score_policy = "respect_evaluator"   # or "force_convergence"
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConvergenceConfig {
    /// Minimum stability score required to converge, in (0, 1]
    pub threshold: f64,
    /// Round ceiling, divergent round included
    pub max_rounds: u32,
    /// What to do when the chairman denies convergence at a passing score
    pub high_score_policy: String,
}

impl Default for FileConvergenceConfig {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            max_rounds: DEFAULT_MAX_ROUNDS,
            high_score_policy: HighScorePolicy::default().as_str().to_string(),
        }
    }
}

impl FileConvergenceConfig {
    /// Parse the high-score policy, falling back to the default on unknown values.
    pub fn parse_high_score_policy(&self) -> (HighScorePolicy, Vec<ConfigIssue>) {
        match self.high_score_policy.parse::<HighScorePolicy>() {
            Ok(policy) => (policy, Vec::new()),
            Err(_) => (
                HighScorePolicy::default(),
                vec![ConfigIssue::warning(
                    ConfigIssueCode::UnknownHighScorePolicy,
                    format!(
                        "convergence.high_score_policy: unknown value '{}', falling back to '{}'",
                        self.high_score_policy,
                        HighScorePolicy::default()
                    ),
                )],
            ),
        }
    }

    /// Range checks for threshold and round ceiling.
    pub fn validate(&self) -> Vec<ConfigIssue> {
        let mut issues = Vec::new();

        if !(self.threshold > 0.0 && self.threshold <= 1.0) {
            issues.push(ConfigIssue::error(
                ConfigIssueCode::ThresholdOutOfRange,
                format!(
                    "convergence.threshold: must be in (0, 1], got {}",
                    self.threshold
                ),
            ));
        }
        if self.max_rounds == 0 {
            issues.push(ConfigIssue::error(
                ConfigIssueCode::ZeroMaxRounds,
                "convergence.max_rounds: must be at least 1",
            ));
        }
        issues.extend(self.parse_high_score_policy().1);

        issues
    }

    /// Build the policy; `None` if threshold or round ceiling are out of range.
    pub fn to_policy(&self) -> Option<ConvergencePolicy> {
        let (high_score_policy, _) = self.parse_high_score_policy();
        ConvergencePolicy::new(self.threshold, self.max_rounds)
            .ok()
            .map(|policy| policy.with_high_score_policy(high_score_policy))
    }
}
