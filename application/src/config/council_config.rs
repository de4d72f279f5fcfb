//! Council configuration container.
//!
//! [`CouncilConfig`] groups the split configuration types into a single
//! immutable value that is handed to the use case at turn start.
//!
//! | Type | Layer | Controls |
//! |------|-------|----------|
//! | `ModelConfig` | domain | council roster, chairman |
//! | `ConvergencePolicy` | domain | threshold, max rounds, high-score policy |
//! | `DeliberationParams` | application | call timeouts |

use crate::config::DeliberationParams;
use crate::use_cases::run_deliberation::RunDeliberationInput;
use council_domain::{
    ConfigIssue, ConfigIssueCode, ConvergencePolicy, ModelConfig, Question, Severity,
};
use std::collections::HashSet;

/// Configuration container for a deliberation.
#[derive(Debug, Clone, Default)]
pub struct CouncilConfig {
    models: ModelConfig,
    policy: ConvergencePolicy,
    params: DeliberationParams,
}

impl CouncilConfig {
    pub fn new(models: ModelConfig, policy: ConvergencePolicy, params: DeliberationParams) -> Self {
        Self {
            models,
            policy,
            params,
        }
    }

    // ==================== Accessors ====================

    pub fn models(&self) -> &ModelConfig {
        &self.models
    }

    pub fn policy(&self) -> &ConvergencePolicy {
        &self.policy
    }

    pub fn params(&self) -> &DeliberationParams {
        &self.params
    }

    // ==================== Use Case Input Factory ====================

    /// Build the input for one deliberation turn.
    pub fn to_input(&self, question: impl Into<Question>) -> RunDeliberationInput {
        RunDeliberationInput::new(question, self.models.clone())
            .with_policy(self.policy)
            .with_params(self.params)
    }

    // ==================== Validation ====================

    /// Check the roster and timeouts.
    ///
    /// Threshold and round ceiling are validated when the
    /// [`ConvergencePolicy`] is constructed.
    pub fn validate(&self) -> Vec<ConfigIssue> {
        let mut issues = Vec::new();

        if self.models.council.is_empty() {
            issues.push(ConfigIssue::error(
                ConfigIssueCode::NoCouncil,
                "No council models configured",
            ));
        }

        let mut seen = HashSet::new();
        for model in &self.models.council {
            if model.as_str().trim().is_empty() {
                issues.push(ConfigIssue::error(
                    ConfigIssueCode::EmptyModelId,
                    "Council contains an empty model identifier",
                ));
            } else if !seen.insert(model) {
                issues.push(ConfigIssue::warning(
                    ConfigIssueCode::DuplicateCouncilMember,
                    format!("Model {} appears more than once in the council", model),
                ));
            }
        }

        if self.models.chairman.as_str().trim().is_empty() {
            issues.push(ConfigIssue::error(
                ConfigIssueCode::EmptyModelId,
                "Chairman model identifier is empty",
            ));
        }

        if self.params.call_timeout.is_zero() || self.params.chairman_timeout.is_zero() {
            issues.push(ConfigIssue::error(
                ConfigIssueCode::ZeroTimeout,
                "Provider timeouts must be at least one second",
            ));
        } else if self.params.chairman_timeout < self.params.call_timeout {
            issues.push(ConfigIssue::warning(
                ConfigIssueCode::ChairmanTimeoutShorter,
                format!(
                    "Chairman timeout ({}s) is shorter than the council call timeout ({}s)",
                    self.params.chairman_timeout.as_secs(),
                    self.params.call_timeout.as_secs()
                ),
            ));
        }

        issues
    }

    /// Check whether any issues are errors (i.e. fatal).
    pub fn has_errors(issues: &[ConfigIssue]) -> bool {
        issues.iter().any(|i| i.severity == Severity::Error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use council_domain::Model;
    use std::time::Duration;

    #[test]
    fn test_default_is_valid() {
        let config = CouncilConfig::default();
        assert!(config.validate().is_empty());
    }

    #[test]
    fn test_empty_council_is_error() {
        let config = CouncilConfig::new(
            ModelConfig::default().with_council(vec![]),
            ConvergencePolicy::default(),
            DeliberationParams::default(),
        );
        let issues = config.validate();
        assert!(CouncilConfig::has_errors(&issues));
        assert_eq!(issues[0].code, ConfigIssueCode::NoCouncil);
    }

    #[test]
    fn test_duplicate_member_is_warning() {
        let config = CouncilConfig::new(
            ModelConfig::default().with_council(vec![Model::Glm45Air, Model::Glm45Air]),
            ConvergencePolicy::default(),
            DeliberationParams::default(),
        );
        let issues = config.validate();
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].code, ConfigIssueCode::DuplicateCouncilMember);
        assert!(!CouncilConfig::has_errors(&issues));
    }

    #[test]
    fn test_timeouts() {
        let config = CouncilConfig::new(
            ModelConfig::default(),
            ConvergencePolicy::default(),
            DeliberationParams::default().with_chairman_timeout(Duration::from_secs(30)),
        );
        let issues = config.validate();
        assert_eq!(issues[0].code, ConfigIssueCode::ChairmanTimeoutShorter);

        let config = CouncilConfig::new(
            ModelConfig::default(),
            ConvergencePolicy::default(),
            DeliberationParams::default().with_call_timeout(Duration::ZERO),
        );
        assert!(CouncilConfig::has_errors(&config.validate()));
    }

    #[test]
    fn test_to_input_carries_config() {
        let policy = ConvergencePolicy::new(0.7, 3).unwrap();
        let config = CouncilConfig::new(ModelConfig::default(), policy, DeliberationParams::default());
        let input = config.to_input("Why?");
        assert_eq!(input.question.content(), "Why?");
        assert_eq!(input.policy.max_rounds(), 3);
        assert_eq!(input.models.council.len(), 4);
    }
}
