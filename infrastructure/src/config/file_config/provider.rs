//! Provider configuration from TOML (`[provider]` section)

use council_application::DeliberationParams;
use council_domain::{ConfigIssue, ConfigIssueCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default OpenRouter-compatible chat completions endpoint
pub const DEFAULT_BASE_URL: &str = "https://openrouter.ai/api/v1/chat/completions";

/// Default environment variable holding the API key
pub const DEFAULT_API_KEY_ENV: &str = "OPENROUTER_API_KEY";

/// Model provider configuration.
///
/// # Example
///
/// ```toml
/// [provider]
/// base_url = "https://openrouter.ai/api/v1/chat/completions"
/// api_key_env = "OPENROUTER_API_KEY"
/// timeout_secs = 120
/// chairman_timeout_secs = 180
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileProviderConfig {
    /// Chat completions endpoint
    pub base_url: String,
    /// Environment variable name for the API key
    pub api_key_env: String,
    /// Direct API key (not recommended, use the env var instead)
    pub api_key: Option<String>,
    /// Timeout for one council member call
    pub timeout_secs: u64,
    /// Timeout for one chairman evaluation call
    pub chairman_timeout_secs: u64,
}

impl Default for FileProviderConfig {
    fn default() -> Self {
        let params = DeliberationParams::default();
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key_env: DEFAULT_API_KEY_ENV.to_string(),
            api_key: None,
            timeout_secs: params.call_timeout.as_secs(),
            chairman_timeout_secs: params.chairman_timeout.as_secs(),
        }
    }
}

impl FileProviderConfig {
    /// API key from the config file, or from `api_key_env`.
    pub fn resolve_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .or_else(|| std::env::var(&self.api_key_env).ok())
            .filter(|k| !k.trim().is_empty())
    }

    pub fn to_params(&self) -> DeliberationParams {
        DeliberationParams::default()
            .with_call_timeout(Duration::from_secs(self.timeout_secs))
            .with_chairman_timeout(Duration::from_secs(self.chairman_timeout_secs))
    }

    pub fn validate(&self) -> Vec<ConfigIssue> {
        let mut issues = Vec::new();
        if self.timeout_secs == 0 {
            issues.push(ConfigIssue::error(
                ConfigIssueCode::ZeroTimeout,
                "provider.timeout_secs cannot be 0",
            ));
        }
        if self.chairman_timeout_secs == 0 {
            issues.push(ConfigIssue::error(
                ConfigIssueCode::ZeroTimeout,
                "provider.chairman_timeout_secs cannot be 0",
            ));
        }
        issues
    }
}
