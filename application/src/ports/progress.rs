//! Progress notification port
//!
//! Defines the interface for reporting progress during a deliberation.

use council_domain::{DeliberationEvent, DeliberationResult, Model, Phase, Round, TurnFailure};

/// Callback for progress updates during a deliberation
///
/// Implementations live in the presentation layer and can display
/// progress in various ways (console, web UI, etc.)
pub trait ProgressNotifier: Send + Sync {
    /// Called when a round starts
    fn on_round_start(&self, round: u32, phase: Phase);

    /// Called when a council call settles within a round
    fn on_model_complete(&self, round: u32, model: &Model, success: bool);

    /// Called when a round has been evaluated by the chairman
    fn on_round_complete(&self, round: &Round);

    // ==================== Turn Callbacks ====================

    /// Called once before the first round.
    fn on_turn_start(&self, _council: &[Model], _chairman: &Model) {}

    /// Called when the turn finishes with a result.
    fn on_turn_complete(&self, _result: &DeliberationResult) {}

    /// Called when the turn fails.
    fn on_turn_failed(&self, _failure: &TurnFailure) {}
}

/// No-op progress notifier for when progress reporting is not needed
pub struct NoProgress;

impl ProgressNotifier for NoProgress {
    fn on_round_start(&self, _round: u32, _phase: Phase) {}
    fn on_model_complete(&self, _round: u32, _model: &Model, _success: bool) {}
    fn on_round_complete(&self, _round: &Round) {}
}

/// Forward a stream event to the matching progress callback.
pub fn notify(progress: &dyn ProgressNotifier, event: &DeliberationEvent) {
    match event {
        DeliberationEvent::Initializing {
            council, chairman, ..
        } => progress.on_turn_start(council, chairman),
        DeliberationEvent::RoundStart { round, phase } => progress.on_round_start(*round, *phase),
        DeliberationEvent::ModelResponseComplete { round, model, .. } => {
            progress.on_model_complete(*round, model, true)
        }
        DeliberationEvent::ModelCallFailed { round, model, .. } => {
            progress.on_model_complete(*round, model, false)
        }
        DeliberationEvent::RoundComplete(round) => progress.on_round_complete(round),
        DeliberationEvent::Complete(result) => progress.on_turn_complete(result),
        DeliberationEvent::Error(failure) => progress.on_turn_failed(failure),
        DeliberationEvent::StreamComplete => {}
    }
}
