//! Output configuration from TOML (`[output]` section)

use council_domain::{ConfigIssue, ConfigIssueCode, OutputFormat};
use serde::{Deserialize, Serialize};

/// Raw output configuration from TOML
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileOutputConfig {
    /// Output format: "full", "synthesis", "json" or "events"
    pub format: Option<String>,
    /// Enable colored terminal output
    pub color: bool,
}

impl Default for FileOutputConfig {
    fn default() -> Self {
        Self {
            format: None,
            color: true,
        }
    }
}

impl FileOutputConfig {
    /// Parse the format, falling back to the default on unknown values.
    pub fn parse_format(&self) -> (Option<OutputFormat>, Vec<ConfigIssue>) {
        let Some(raw) = &self.format else {
            return (None, Vec::new());
        };
        match raw.parse::<OutputFormat>() {
            Ok(format) => (Some(format), Vec::new()),
            Err(_) => (
                None,
                vec![ConfigIssue::warning(
                    ConfigIssueCode::UnknownOutputFormat,
                    format!(
                        "output.format: unknown value '{}', falling back to '{}'",
                        raw,
                        OutputFormat::default().as_str()
                    ),
                )],
            ),
        }
    }
}
