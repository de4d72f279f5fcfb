//! Raw TOML configuration data types
//!
//! These structs represent the exact structure of the TOML config file.
//! Enumerated values are kept as strings and parsed with their issues
//! collected, so one bad value does not hide the others.

mod convergence;
mod council;
mod logging;
mod output;
mod provider;

pub use convergence::FileConvergenceConfig;
pub use council::FileCouncilConfig;
pub use logging::FileLoggingConfig;
pub use output::FileOutputConfig;
pub use provider::{DEFAULT_API_KEY_ENV, DEFAULT_BASE_URL, FileProviderConfig};

use council_application::CouncilConfig;
use council_domain::{ConfigIssue, ModelConfig};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration validation errors
#[derive(Debug, Error)]
pub enum ConfigValidationError {
    #[error("invalid configuration:\n{}", render_issues(.0))]
    Invalid(Vec<ConfigIssue>),
}

fn render_issues(issues: &[ConfigIssue]) -> String {
    issues
        .iter()
        .map(|i| format!("  {i}"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Complete file configuration (raw TOML structure)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    /// Council roster and chairman
    pub council: FileCouncilConfig,
    /// Convergence threshold and round ceiling
    pub convergence: FileConvergenceConfig,
    /// Model provider endpoint and timeouts
    pub provider: FileProviderConfig,
    /// Output settings
    pub output: FileOutputConfig,
    /// Transcript settings
    pub logging: FileLoggingConfig,
}

impl FileConfig {
    /// Validate the entire configuration, returning all detected issues.
    ///
    /// Section-level checks run first. Roster-level warnings (duplicate
    /// members, a chairman timeout shorter than the call timeout) are only
    /// reported once the sections themselves are free of errors.
    pub fn validate(&self) -> Vec<ConfigIssue> {
        let mut issues = Vec::new();

        issues.extend(self.council.parse_models().1);
        issues.extend(self.council.parse_chairman().1);
        issues.extend(self.convergence.validate());
        issues.extend(self.provider.validate());
        issues.extend(self.output.parse_format().1);

        if !CouncilConfig::has_errors(&issues)
            && let Some(config) = self.build()
        {
            issues.extend(config.validate());
        }

        issues
    }

    /// Convert into the application-level configuration container.
    ///
    /// Fails with every error-severity issue when the file is unusable.
    /// Warnings are not included; callers print them from [`FileConfig::validate`].
    pub fn to_council_config(&self) -> Result<CouncilConfig, ConfigValidationError> {
        let issues = self.validate();
        if CouncilConfig::has_errors(&issues) {
            return Err(ConfigValidationError::Invalid(
                issues.into_iter().filter(|i| i.is_error()).collect(),
            ));
        }
        self.build()
            .ok_or_else(|| ConfigValidationError::Invalid(Vec::new()))
    }

    fn build(&self) -> Option<CouncilConfig> {
        let mut models = ModelConfig::default();
        if let (Some(council), _) = self.council.parse_models() {
            models = models.with_council(council);
        }
        if let (Some(chairman), _) = self.council.parse_chairman() {
            models = models.with_chairman(chairman);
        }

        let policy = self.convergence.to_policy()?;
        Some(CouncilConfig::new(models, policy, self.provider.to_params()))
    }
}
