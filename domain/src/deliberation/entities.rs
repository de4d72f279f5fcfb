//! Deliberation entities: rounds, final results and turn metadata.

use super::assessment::ChairmanAssessment;
use super::response::ModelResponse;
use crate::core::{error::DomainError, model::Model, question::Question};
use serde::{Deserialize, Serialize};

/// Phase of a deliberation round
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Round 1: members speak one after another, each seeing its predecessors
    Divergent,
    /// Rounds 2+: members answer the chairman's questions in parallel
    Convergent,
}

impl Phase {
    /// The phase of a given 1-based round index.
    pub fn for_round(index: u32) -> Self {
        if index <= 1 {
            Phase::Divergent
        } else {
            Phase::Convergent
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Divergent => "divergent",
            Phase::Convergent => "convergent",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Phase::Divergent => "Divergent",
            Phase::Convergent => "Convergent",
        }
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A council call that produced no response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallFailure {
    pub model: Model,
    pub reason: String,
}

impl CallFailure {
    pub fn new(model: Model, reason: impl Into<String>) -> Self {
        Self {
            model,
            reason: reason.into(),
        }
    }
}

/// One round of deliberation (Entity)
///
/// Responses and failures are kept in dispatch order. The round is mutated
/// only by the orchestrator while in progress and becomes frozen once the
/// chairman's assessment is attached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Round {
    #[serde(rename = "round")]
    pub index: u32,
    pub phase: Phase,
    pub responses: Vec<ModelResponse>,
    #[serde(default)]
    pub failures: Vec<CallFailure>,
    /// Set when every council call of the round failed
    #[serde(default)]
    pub failed: bool,
    pub chairman_assessment: Option<ChairmanAssessment>,
}

impl Round {
    pub fn new(index: u32) -> Self {
        Self {
            index,
            phase: Phase::for_round(index),
            responses: Vec::new(),
            failures: Vec::new(),
            failed: false,
            chairman_assessment: None,
        }
    }

    pub fn record_response(&mut self, response: ModelResponse) {
        self.responses.push(response);
    }

    pub fn record_failure(&mut self, failure: CallFailure) {
        self.failures.push(failure);
    }

    /// Mark dispatch as finished; flags the round failed if nothing succeeded.
    pub fn close_dispatch(&mut self) {
        self.failed = self.responses.is_empty();
    }

    /// Attach the chairman's verdict, freezing the round.
    pub fn attach_assessment(&mut self, assessment: ChairmanAssessment) -> Result<(), DomainError> {
        if self.is_frozen() {
            return Err(DomainError::RoundFrozen(self.index));
        }
        self.chairman_assessment = Some(assessment);
        Ok(())
    }

    pub fn is_frozen(&self) -> bool {
        self.chairman_assessment.is_some()
    }

    pub fn is_failed(&self) -> bool {
        self.failed
    }

    /// Number of dispatched calls (successful or not)
    pub fn dispatched(&self) -> usize {
        self.responses.len() + self.failures.len()
    }
}

/// The chairman's final answer for the turn
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinalResult {
    pub model: Model,
    pub response: String,
}

/// How a turn ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Termination {
    Converged,
    MaxRoundsReached,
}

impl Termination {
    pub fn as_str(&self) -> &'static str {
        match self {
            Termination::Converged => "converged",
            Termination::MaxRoundsReached => "max_rounds_reached",
        }
    }
}

/// Turn-level metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    /// Round in which convergence was declared; null when the ceiling was hit
    pub converged_round: Option<u32>,
    pub rounds_completed: u32,
    pub threshold: f64,
    pub termination: Termination,
}

impl Metadata {
    pub fn is_converged(&self) -> bool {
        self.termination == Termination::Converged
    }
}

/// Complete outcome of one deliberation turn
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeliberationResult {
    pub question: Question,
    pub council: Vec<Model>,
    pub chairman: Model,
    pub all_rounds: Vec<Round>,
    pub final_result: Option<FinalResult>,
    pub metadata: Metadata,
}

impl DeliberationResult {
    /// Assessment of the last round, if any round completed
    pub fn last_assessment(&self) -> Option<&ChairmanAssessment> {
        self.all_rounds
            .last()
            .and_then(|round| round.chairman_assessment.as_ref())
    }

    pub fn final_text(&self) -> Option<&str> {
        self.final_result.as_ref().map(|r| r.response.as_str())
    }
}
