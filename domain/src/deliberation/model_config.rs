//! Role-based model configuration.
//!
//! [`ModelConfig`] groups the model selections for a deliberation. It is a
//! static value object: once a turn starts, the roster does not change.

use crate::core::{error::DomainError, model::Model};
use serde::{Deserialize, Serialize};

/// Council roster and chairman.
///
/// # Example
///
/// ```
/// use council_domain::deliberation::model_config::ModelConfig;
/// use council_domain::Model;
///
/// let config = ModelConfig::default()
///     .with_chairman(Model::Gemini25Flash)
///     .with_council(vec![Model::Glm45Air, Model::Grok41Fast]);
///
/// assert_eq!(config.chairman, Model::Gemini25Flash);
/// assert_eq!(config.council.len(), 2);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Council members, in speaking order for the divergent round.
    pub council: Vec<Model>,
    /// Model that evaluates each round and writes the final answer.
    pub chairman: Model,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            council: Model::default_council(),
            chairman: Model::default_chairman(),
        }
    }
}

impl ModelConfig {
    pub fn with_council(mut self, models: Vec<Model>) -> Self {
        self.council = models;
        self
    }

    pub fn with_chairman(mut self, model: Model) -> Self {
        self.chairman = model;
        self
    }

    /// A deliberation needs at least one council member.
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.council.is_empty() {
            return Err(DomainError::NoCouncil);
        }
        Ok(())
    }
}
