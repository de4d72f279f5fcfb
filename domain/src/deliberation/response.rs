//! Council member responses and their structured interpretation.
//!
//! Every successful call produces a [`ModelResponse`] that always keeps the
//! raw text. Whether the text could be read as the requested JSON record is
//! expressed by [`ParsedResponse`]: consumers match on it instead of probing
//! for optional fields.

use crate::core::model::Model;
use serde::{Deserialize, Deserializer, Serialize};

/// Response from a single council member in one round
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelResponse {
    /// The model that produced this response
    pub model: Model,
    /// Raw text as returned by the provider (always kept)
    pub response: String,
    /// Structured reading of the raw text
    pub parsed: ParsedResponse,
}

impl ModelResponse {
    pub fn new(model: Model, response: impl Into<String>, parsed: ParsedResponse) -> Self {
        Self {
            model,
            response: response.into(),
            parsed,
        }
    }

    /// Returns the structured record if the response parsed.
    pub fn structured(&self) -> Option<&StructuredResponse> {
        match &self.parsed {
            ParsedResponse::Valid(record) => Some(record),
            ParsedResponse::Fallback => None,
        }
    }
}

/// Outcome of validating a council member's raw output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ParsedResponse {
    /// The output matched the phase's required structure.
    Valid(StructuredResponse),
    /// The output could not be read; the raw text is authoritative.
    Fallback,
}

impl ParsedResponse {
    pub fn is_valid(&self) -> bool {
        matches!(self, ParsedResponse::Valid(_))
    }
}

/// The JSON record every council member is asked to produce
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructuredResponse {
    #[serde(deserialize_with = "string_or_null")]
    pub summary: String,
    pub viewpoints: Vec<String>,
    pub conflicts: Vec<String>,
    pub suggestions: Vec<String>,
    #[serde(deserialize_with = "string_or_null")]
    pub final_answer_candidate: String,
    /// Per-consensus-point analysis (convergent rounds only)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub consensus_analysis: Vec<ConsensusAnalysis>,
    /// Per-conflict-point analysis (convergent rounds only)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conflict_analysis: Vec<ConflictAnalysis>,
}

/// A respondent's position on one consensus point from the previous round
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsensusAnalysis {
    pub consensus_point: String,
    /// Agreement stance ("fully agree", "partially agree", ...)
    pub agreement_level: String,
    /// Supporting detail or evidence
    pub supplement: String,
    /// Conditions under which the point holds
    pub conditions: String,
    pub deeper_insight: String,
}

/// A respondent's position on one conflict point from the previous round
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConflictAnalysis {
    pub conflict_point: String,
    pub your_position: String,
    pub reconciliation_approach: String,
    pub root_cause: String,
    pub impact_assessment: String,
}

/// Models occasionally emit `null` for text fields they have nothing to say about.
fn string_or_null<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}
