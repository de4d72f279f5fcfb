//! Model value object representing a council participant

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A generative model endpoint identifier (Value Object)
///
/// Identifiers follow the `vendor/model[:variant]` convention used by
/// OpenRouter-compatible gateways. Well-known council models get their own
/// variant; anything else is carried verbatim in [`Model::Custom`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Model {
    Glm45Air,
    Grok41Fast,
    DeepSeekR1t2Chimera,
    KatCoderPro,
    Gemini25Flash,
    Gpt51,
    ClaudeSonnet45,
    Custom(String),
}

impl Model {
    /// Get the string identifier for this model
    pub fn as_str(&self) -> &str {
        match self {
            Model::Glm45Air => "z-ai/glm-4.5-air:free",
            Model::Grok41Fast => "x-ai/grok-4.1-fast:free",
            Model::DeepSeekR1t2Chimera => "tngtech/deepseek-r1t2-chimera:free",
            Model::KatCoderPro => "kwaipilot/kat-coder-pro:free",
            Model::Gemini25Flash => "google/gemini-2.5-flash",
            Model::Gpt51 => "openai/gpt-5.1",
            Model::ClaudeSonnet45 => "anthropic/claude-sonnet-4.5",
            Model::Custom(s) => s,
        }
    }

    /// Default council roster, in speaking order
    pub fn default_council() -> Vec<Model> {
        vec![
            Model::Glm45Air,
            Model::Grok41Fast,
            Model::DeepSeekR1t2Chimera,
            Model::KatCoderPro,
        ]
    }

    /// Default chairman (may coincide with a council member)
    pub fn default_chairman() -> Model {
        Model::Glm45Air
    }

    /// Vendor prefix of the identifier (`"z-ai"` for `z-ai/glm-4.5-air:free`)
    pub fn vendor(&self) -> Option<&str> {
        self.as_str().split_once('/').map(|(vendor, _)| vendor)
    }

    /// Whether this identifier routes to a free-tier variant
    pub fn is_free_tier(&self) -> bool {
        self.as_str().ends_with(":free")
    }
}

impl Default for Model {
    fn default() -> Self {
        Model::default_chairman()
    }
}

impl std::fmt::Display for Model {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Model {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(match s.trim() {
            "z-ai/glm-4.5-air:free" => Model::Glm45Air,
            "x-ai/grok-4.1-fast:free" => Model::Grok41Fast,
            "tngtech/deepseek-r1t2-chimera:free" => Model::DeepSeekR1t2Chimera,
            "kwaipilot/kat-coder-pro:free" => Model::KatCoderPro,
            "google/gemini-2.5-flash" => Model::Gemini25Flash,
            "openai/gpt-5.1" => Model::Gpt51,
            "anthropic/claude-sonnet-4.5" => Model::ClaudeSonnet45,
            other => Model::Custom(other.to_string()),
        })
    }
}

impl From<&str> for Model {
    fn from(s: &str) -> Self {
        match s.parse() {
            Ok(model) => model,
            Err(never) => match never {},
        }
    }
}

impl Serialize for Model {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Model {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(Model::from(s.as_str()))
    }
}
