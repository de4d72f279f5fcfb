//! Configuration validation issues.
//!
//! Configuration sources are checked before a turn starts. Each problem is
//! reported as a [`ConfigIssue`] with a severity: errors block the run,
//! warnings are shown and the run proceeds.

/// Severity level of a configuration issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Fatal: the configuration cannot work at all.
    Error,
    /// Non-fatal: the configuration works but may not behave as expected.
    Warning,
}

/// Identifies a specific configuration issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigIssueCode {
    /// `council.models` is empty.
    NoCouncil,
    /// A model identifier is blank.
    EmptyModelId,
    /// The same model appears twice in the council.
    DuplicateCouncilMember,
    /// `convergence.threshold` is outside `(0, 1]`.
    ThresholdOutOfRange,
    /// `convergence.max_rounds` is zero.
    ZeroMaxRounds,
    /// A provider timeout is zero seconds.
    ZeroTimeout,
    /// The chairman timeout is shorter than the council call timeout.
    ChairmanTimeoutShorter,
    /// `convergence.high_score_policy` is not a known policy.
    UnknownHighScorePolicy,
    /// `output.format` is not a known format.
    UnknownOutputFormat,
}

/// A detected issue in the configuration.
#[derive(Debug, Clone)]
pub struct ConfigIssue {
    pub severity: Severity,
    pub code: ConfigIssueCode,
    pub message: String,
}

impl ConfigIssue {
    pub fn error(code: ConfigIssueCode, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            code,
            message: message.into(),
        }
    }

    pub fn warning(code: ConfigIssueCode, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            code,
            message: message.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl std::fmt::Display for ConfigIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self.severity {
            Severity::Error => "error",
            Severity::Warning => "warning",
        };
        write!(f, "{}: {}", label, self.message)
    }
}
