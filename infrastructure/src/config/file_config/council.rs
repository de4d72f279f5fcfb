//! Council roster configuration from TOML (`[council]` section)

use council_domain::{ConfigIssue, ConfigIssueCode, Model};
use serde::{Deserialize, Serialize};

/// Council roster configuration from TOML
///
/// # Example
///
/// ```toml
/// [council]
/// models = ["z-ai/glm-4.5-air:free", "x-ai/grok-4.1-fast:free"]
/// chairman = "z-ai/glm-4.5-air:free"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileCouncilConfig {
    /// Council members in speaking order
    pub models: Option<Vec<String>>,
    /// Evaluating model
    pub chairman: Option<String>,
}

impl FileCouncilConfig {
    /// Parse the roster, collecting issues for empty names.
    ///
    /// An explicitly empty list is reported; an absent one means "use the
    /// default council".
    pub fn parse_models(&self) -> (Option<Vec<Model>>, Vec<ConfigIssue>) {
        let mut issues = Vec::new();
        let Some(names) = &self.models else {
            return (None, issues);
        };

        if names.is_empty() {
            issues.push(ConfigIssue::error(
                ConfigIssueCode::NoCouncil,
                "council.models: at least one council model is required",
            ));
        }

        let mut models = Vec::new();
        for name in names {
            if name.trim().is_empty() {
                issues.push(ConfigIssue::error(
                    ConfigIssueCode::EmptyModelId,
                    "council.models: model name cannot be empty in list",
                ));
            } else {
                models.push(Model::from(name.trim()));
            }
        }
        (Some(models), issues)
    }

    /// Parse the chairman, collecting an issue for an empty name.
    pub fn parse_chairman(&self) -> (Option<Model>, Vec<ConfigIssue>) {
        match &self.chairman {
            None => (None, Vec::new()),
            Some(name) if name.trim().is_empty() => (
                None,
                vec![ConfigIssue::error(
                    ConfigIssueCode::EmptyModelId,
                    "council.chairman: model name cannot be empty",
                )],
            ),
            Some(name) => (Some(Model::from(name.trim())), Vec::new()),
        }
    }
}
