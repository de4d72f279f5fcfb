//! Per-turn deliberation state machine.

use super::assessment::ChairmanAssessment;
use super::entities::Phase;
use super::model_config::ModelConfig;
use super::policy::ConvergencePolicy;
use crate::core::model::Model;

/// What the orchestrator does after a round has been evaluated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Not converged and rounds remain: run another convergent round
    Continue,
    /// The latest assessment is converged
    Converged,
    /// Not converged and the ceiling has been reached
    MaxRoundsReached,
}

/// Accumulator for one turn.
///
/// Created at turn start and dropped at turn end. Only the orchestrator
/// owns it.
#[derive(Debug, Clone)]
pub struct DeliberationState {
    round: u32,
    last_assessment: Option<ChairmanAssessment>,
    models: ModelConfig,
    policy: ConvergencePolicy,
}

impl DeliberationState {
    pub fn new(models: ModelConfig, policy: ConvergencePolicy) -> Self {
        Self {
            round: 0,
            last_assessment: None,
            models,
            policy,
        }
    }

    /// Advance to the next round, returning its index and phase.
    pub fn begin_round(&mut self) -> (u32, Phase) {
        self.round += 1;
        (self.round, Phase::for_round(self.round))
    }

    /// Store the evaluated assessment of the current round.
    pub fn record_assessment(&mut self, assessment: ChairmanAssessment) {
        self.last_assessment = Some(assessment);
    }

    /// Decide what follows the current round.
    pub fn transition(&self) -> Transition {
        match &self.last_assessment {
            Some(a) if a.is_converged => Transition::Converged,
            _ if self.round >= self.policy.max_rounds() => Transition::MaxRoundsReached,
            _ => Transition::Continue,
        }
    }

    pub fn round(&self) -> u32 {
        self.round
    }

    pub fn last_assessment(&self) -> Option<&ChairmanAssessment> {
        self.last_assessment.as_ref()
    }

    pub fn council(&self) -> &[Model] {
        &self.models.council
    }

    pub fn chairman(&self) -> &Model {
        &self.models.chairman
    }

    pub fn policy(&self) -> &ConvergencePolicy {
        &self.policy
    }
}
