//! Run Deliberation use case
//!
//! Orchestrates a council deliberation as a round state machine:
//!
//! ```text
//! INIT -> DIVERGENT -> EVALUATE -> CONVERGED ----------> FINALIZE
//!                          |
//!                          +-> NOT_CONVERGED -> CONVERGENT -> EVALUATE ...
//!                          +-> MAX_ROUNDS_REACHED -------> FINALIZE
//! ```
//!
//! | Phase      | Rounds | Dispatch                         | Prompt |
//! |------------|--------|----------------------------------|--------|
//! | Divergent  | 1      | sequential, each sees its predecessors | per speaker |
//! | Convergent | 2+     | parallel fan-out                 | shared |
//!
//! Every transition is emitted as a [`DeliberationEvent`]. Streaming callers
//! consume [`RunDeliberationUseCase::stream`]; [`RunDeliberationUseCase::execute`]
//! drains the same stream and returns its terminal payload.

mod dispatch;
mod evaluation;
mod stream;
mod types;

pub use dispatch::{Batch, CallOutcome, ModelClient, Settled};
pub use evaluation::{ConvergenceEvaluator, EvaluatorError};
pub use stream::DeliberationStream;
pub use types::{RunDeliberationError, RunDeliberationInput};

use crate::ports::conversation_logger::ConversationLogger;
use crate::ports::llm_gateway::LlmGateway;
use crate::ports::progress::{NoProgress, ProgressNotifier, notify};
use council_domain::{
    CallFailure, DeliberationEvent, DeliberationResult, DeliberationState, FinalResult, Metadata,
    Model, ModelResponse, NO_CONVERGENCE_NOTICE, Phase, PromptTemplate, Round, Termination,
    Transition, validate_response,
};
use futures::StreamExt;
use std::future::Future;
use std::sync::Arc;
use stream::{Disconnected, EVENT_BUFFER, EventEmitter};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Use case for running a council deliberation
pub struct RunDeliberationUseCase<G: LlmGateway + 'static> {
    gateway: Arc<G>,
    logger: Option<Arc<dyn ConversationLogger>>,
    cancellation_token: Option<CancellationToken>,
}

impl<G: LlmGateway + 'static> Clone for RunDeliberationUseCase<G> {
    fn clone(&self) -> Self {
        Self {
            gateway: self.gateway.clone(),
            logger: self.logger.clone(),
            cancellation_token: self.cancellation_token.clone(),
        }
    }
}

impl<G: LlmGateway + 'static> RunDeliberationUseCase<G> {
    pub fn new(gateway: Arc<G>) -> Self {
        Self {
            gateway,
            logger: None,
            cancellation_token: None,
        }
    }

    /// Mirror every emitted event to a transcript logger
    pub fn with_logger(mut self, logger: Arc<dyn ConversationLogger>) -> Self {
        self.logger = Some(logger);
        self
    }

    /// Set a cancellation token for graceful interruption
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation_token = Some(token);
        self
    }

    /// Start a turn and return its event stream.
    ///
    /// Must be called within a tokio runtime. The stream always ends with
    /// `stream_complete` unless it is dropped first.
    pub fn stream(&self, input: RunDeliberationInput) -> DeliberationStream {
        let (tx, rx) = mpsc::channel(EVENT_BUFFER);
        let driver = Driver {
            gateway: Arc::clone(&self.gateway),
            emitter: EventEmitter::new(tx, self.logger.clone()),
            cancellation_token: self.cancellation_token.clone(),
        };
        let task = tokio::spawn(driver.run(input));
        DeliberationStream::new(rx, task)
    }

    /// Execute the use case with default (no-op) progress
    pub async fn execute(
        &self,
        input: RunDeliberationInput,
    ) -> Result<DeliberationResult, RunDeliberationError> {
        self.execute_with_progress(input, &NoProgress).await
    }

    /// Execute the use case with progress callbacks
    pub async fn execute_with_progress(
        &self,
        input: RunDeliberationInput,
        progress: &dyn ProgressNotifier,
    ) -> Result<DeliberationResult, RunDeliberationError> {
        let mut events = self.stream(input);
        let mut outcome = None;

        while let Some(event) = events.next().await {
            notify(progress, &event);
            match event {
                DeliberationEvent::Complete(result) => outcome = Some(Ok(result)),
                DeliberationEvent::Error(failure) => outcome = Some(Err(failure.into())),
                _ => {}
            }
        }

        outcome.unwrap_or(Err(RunDeliberationError::StreamClosed))
    }
}

/// Why the driver stopped before producing a result
enum Halt {
    Failed(RunDeliberationError),
    Disconnected,
}

impl From<Disconnected> for Halt {
    fn from(_: Disconnected) -> Self {
        Halt::Disconnected
    }
}

impl From<RunDeliberationError> for Halt {
    fn from(error: RunDeliberationError) -> Self {
        Halt::Failed(error)
    }
}

/// Drives one turn on its own task. Single writer of round state.
struct Driver<G: LlmGateway + 'static> {
    gateway: Arc<G>,
    emitter: EventEmitter,
    cancellation_token: Option<CancellationToken>,
}

impl<G: LlmGateway + 'static> Driver<G> {
    async fn run(self, input: RunDeliberationInput) {
        let terminal = match self.deliberate(&input).await {
            Ok(result) => DeliberationEvent::Complete(result),
            Err(Halt::Failed(error)) => {
                warn!("Deliberation failed: {}", error);
                DeliberationEvent::Error(error.into())
            }
            Err(Halt::Disconnected) => {
                info!("Event consumer went away; stopping deliberation");
                return;
            }
        };

        if self.emitter.emit(terminal).await.is_ok() {
            let _ = self.emitter.emit(DeliberationEvent::StreamComplete).await;
        }
    }

    async fn deliberate(&self, input: &RunDeliberationInput) -> Result<DeliberationResult, Halt> {
        input
            .validate()
            .map_err(|e| RunDeliberationError::InvalidConfig(e.to_string()))?;

        let question = input.question.content();
        let mut state = DeliberationState::new(input.models.clone(), input.policy);
        // The roster and policy are fixed for the turn
        let council = state.council().to_vec();
        let chairman = state.chairman().clone();
        let policy = *state.policy();

        info!(
            "Starting deliberation with {} council models, chairman {}",
            council.len(),
            chairman
        );

        self.emitter
            .emit(DeliberationEvent::Initializing {
                question: input.question.clone(),
                council: council.clone(),
                chairman: chairman.clone(),
                threshold: policy.threshold(),
                max_rounds: policy.max_rounds(),
            })
            .await?;

        let client = ModelClient::new(Arc::clone(&self.gateway), input.params.call_timeout);
        let evaluator = ConvergenceEvaluator::new(
            ModelClient::new(Arc::clone(&self.gateway), input.params.chairman_timeout),
            chairman.clone(),
            policy,
        );
        let mut rounds: Vec<Round> = Vec::new();

        loop {
            self.check_cancelled(&rounds)?;

            let (index, phase) = state.begin_round();
            info!("Round {}: {} phase", index, phase);
            self.emitter
                .emit(DeliberationEvent::RoundStart {
                    round: index,
                    phase,
                })
                .await?;

            let mut round = match phase {
                Phase::Divergent => {
                    self.divergent_round(&client, index, question, &council, &rounds)
                        .await?
                }
                Phase::Convergent => {
                    let (consensus, conflicts, questions) = match state.last_assessment() {
                        Some(a) => (
                            a.consensus_points.as_slice(),
                            a.conflict_points.as_slice(),
                            a.next_questions(),
                        ),
                        None => (&[][..], &[][..], &[][..]),
                    };
                    let prompt =
                        PromptTemplate::convergent_prompt(question, consensus, conflicts, questions);
                    self.convergent_round(&client, index, &prompt, &council, &rounds)
                        .await?
                }
            };

            round.close_dispatch();
            debug!(
                "Round {}: {} of {} calls answered",
                index,
                round.responses.len(),
                round.dispatched()
            );
            if round.is_failed() {
                if phase == Phase::Divergent {
                    return Err(RunDeliberationError::AllCallsFailed {
                        round: index,
                        failures: round.failures,
                    }
                    .into());
                }
                warn!(
                    "Round {}: every council call failed; evaluating an empty round",
                    index
                );
            }

            self.check_cancelled(&rounds)?;
            let evaluation = evaluator.evaluate(
                question,
                &round.responses,
                index,
                state.last_assessment(),
            );
            let assessment = self
                .cancellable(&rounds, evaluation)
                .await?
                .map_err(|e| RunDeliberationError::EvaluatorFailed {
                    round: index,
                    reason: e.to_string(),
                    completed_rounds: rounds.clone(),
                    partial_round: Some(round.clone()),
                })?;

            state.record_assessment(assessment.clone());
            if let Err(e) = round.attach_assessment(assessment) {
                warn!("Round {}: {}", index, e);
            }

            self.emitter
                .emit(DeliberationEvent::RoundComplete(round.clone()))
                .await?;
            rounds.push(round);

            match state.transition() {
                Transition::Continue => continue,
                Transition::Converged => {
                    info!("Converged in round {}", index);
                    return Ok(finalize(input, &state, rounds, Termination::Converged));
                }
                Transition::MaxRoundsReached => {
                    info!("Reached the {} round ceiling without converging", index);
                    return Ok(finalize(input, &state, rounds, Termination::MaxRoundsReached));
                }
            }
        }
    }

    /// Round 1: a left fold over the roster. The round's responses so far
    /// are the accumulator every later speaker sees.
    async fn divergent_round(
        &self,
        client: &ModelClient<G>,
        index: u32,
        question: &str,
        council: &[Model],
        completed: &[Round],
    ) -> Result<Round, Halt> {
        let mut round = Round::new(index);

        for model in council {
            self.check_cancelled(completed)?;

            let prompt = PromptTemplate::divergent_prompt(question, &round.responses);
            let outcome = self
                .cancellable(completed, client.invoke(model, &prompt))
                .await?;

            match self
                .settle(index, Phase::Divergent, model.clone(), outcome, &round, council.len())
                .await?
            {
                Ok(response) => round.record_response(response),
                Err(failure) => round.record_failure(failure),
            }
        }

        Ok(round)
    }

    /// Rounds 2+: the same prompt to every member in parallel. Events are
    /// emitted as calls settle; the round stores them in dispatch order.
    async fn convergent_round(
        &self,
        client: &ModelClient<G>,
        index: u32,
        prompt: &str,
        council: &[Model],
        completed: &[Round],
    ) -> Result<Round, Halt> {
        let requests = council
            .iter()
            .map(|model| (model.clone(), prompt.to_string()))
            .collect();
        let mut batch = client.spawn_batch(requests);
        let mut slots: Vec<Option<Result<ModelResponse, CallFailure>>> =
            (0..council.len()).map(|_| None).collect();
        // Tracks completion counts for events; not the stored round
        let mut progress = Round::new(index);

        while let Some(settled) = self.cancellable(completed, batch.next_settled()).await? {
            let result = self
                .settle(
                    index,
                    Phase::Convergent,
                    settled.model,
                    settled.outcome,
                    &progress,
                    council.len(),
                )
                .await?;
            match &result {
                Ok(response) => progress.record_response(response.clone()),
                Err(failure) => progress.record_failure(failure.clone()),
            }
            slots[settled.index] = Some(result);
        }

        let mut round = Round::new(index);
        for (model, slot) in council.iter().zip(slots) {
            match slot {
                Some(Ok(response)) => round.record_response(response),
                Some(Err(failure)) => round.record_failure(failure),
                None => round.record_failure(CallFailure::new(model.clone(), "call did not settle")),
            }
        }
        Ok(round)
    }

    /// Validate one call outcome and emit its event.
    async fn settle(
        &self,
        index: u32,
        phase: Phase,
        model: Model,
        outcome: CallOutcome,
        round_so_far: &Round,
        total_count: usize,
    ) -> Result<Result<ModelResponse, CallFailure>, Halt> {
        match outcome {
            Ok(text) => {
                let parsed = validate_response(&text, phase);
                if !parsed.is_valid() {
                    warn!(
                        "Round {}: {} returned unstructured output; keeping raw text",
                        index, model
                    );
                }
                let response = ModelResponse::new(model, text, parsed);
                self.emitter
                    .emit(DeliberationEvent::ModelResponseComplete {
                        round: index,
                        model: response.model.clone(),
                        response: response.response.clone(),
                        parsed: response.parsed.clone(),
                        completed_count: round_so_far.responses.len() + 1,
                        total_count,
                    })
                    .await?;
                Ok(Ok(response))
            }
            Err(e) => {
                warn!("Round {}: {} failed: {}", index, model, e);
                let failure = CallFailure::new(model, e.to_string());
                self.emitter
                    .emit(DeliberationEvent::ModelCallFailed {
                        round: index,
                        model: failure.model.clone(),
                        reason: failure.reason.clone(),
                        completed_count: round_so_far.responses.len(),
                        total_count,
                    })
                    .await?;
                Ok(Err(failure))
            }
        }
    }

    fn check_cancelled(&self, completed: &[Round]) -> Result<(), Halt> {
        if let Some(token) = &self.cancellation_token
            && token.is_cancelled()
        {
            return Err(cancelled(completed));
        }
        Ok(())
    }

    /// Await `future` unless the turn is cancelled first.
    async fn cancellable<F: Future>(&self, completed: &[Round], future: F) -> Result<F::Output, Halt> {
        match &self.cancellation_token {
            Some(token) => tokio::select! {
                biased;
                _ = token.cancelled() => Err(cancelled(completed)),
                output = future => Ok(output),
            },
            None => Ok(future.await),
        }
    }
}

fn cancelled(completed: &[Round]) -> Halt {
    info!("Deliberation cancelled after {} rounds", completed.len());
    Halt::Failed(RunDeliberationError::Cancelled {
        completed_rounds: completed.to_vec(),
    })
}

/// Build the turn result from the last recorded assessment.
fn finalize(
    input: &RunDeliberationInput,
    state: &DeliberationState,
    rounds: Vec<Round>,
    termination: Termination,
) -> DeliberationResult {
    let chairman = state.chairman().clone();
    let response = match state.last_assessment() {
        Some(assessment) => assessment.concluding_text(),
        None => NO_CONVERGENCE_NOTICE.to_string(),
    };
    let final_result = Some(FinalResult {
        model: chairman.clone(),
        response,
    });

    DeliberationResult {
        question: input.question.clone(),
        council: state.council().to_vec(),
        chairman,
        metadata: Metadata {
            converged_round: (termination == Termination::Converged).then_some(state.round()),
            rounds_completed: rounds.len() as u32,
            threshold: state.policy().threshold(),
            termination,
        },
        all_rounds: rounds,
        final_result,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::conversation_logger::ConversationEvent;
    use crate::ports::llm_gateway::GatewayError;
    use async_trait::async_trait;
    use council_domain::{
        AssessmentCorrection, ConvergencePolicy, HighScorePolicy, ModelConfig, TurnFailureKind,
    };
    use serde_json::json;
    use std::collections::{HashMap, VecDeque};
    use std::sync::Mutex;
    use std::time::Duration;

    // ==================== Scripted Gateway ====================

    type Reply = Result<String, GatewayError>;

    /// Gateway that answers from per-model reply queues
    struct ScriptedGateway {
        replies: Mutex<HashMap<String, VecDeque<Reply>>>,
        delays: HashMap<String, Duration>,
        /// (model, prompt) in call order
        calls: Mutex<Vec<(String, String)>>,
    }

    impl ScriptedGateway {
        fn new() -> Self {
            Self {
                replies: Mutex::new(HashMap::new()),
                delays: HashMap::new(),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn script(self, model: &Model, replies: Vec<Reply>) -> Self {
            self.replies
                .lock()
                .unwrap()
                .entry(model.to_string())
                .or_default()
                .extend(replies);
            self
        }

        fn delay(mut self, model: &Model, delay: Duration) -> Self {
            self.delays.insert(model.to_string(), delay);
            self
        }

        fn prompts_for(&self, model: &Model) -> Vec<String> {
            self.calls
                .lock()
                .unwrap()
                .iter()
                .filter(|(m, _)| m == model.as_str())
                .map(|(_, p)| p.clone())
                .collect()
        }

        fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl LlmGateway for ScriptedGateway {
        async fn complete(&self, model: &Model, prompt: &str) -> Result<String, GatewayError> {
            self.calls
                .lock()
                .unwrap()
                .push((model.to_string(), prompt.to_string()));
            if let Some(delay) = self.delays.get(model.as_str()) {
                tokio::time::sleep(*delay).await;
            }
            self.replies
                .lock()
                .unwrap()
                .get_mut(model.as_str())
                .and_then(|queue| queue.pop_front())
                .unwrap_or_else(|| Err(GatewayError::Other(format!("no scripted reply for {model}"))))
        }
    }

    // ==================== Helpers ====================

    fn chairman() -> Model {
        Model::Custom("test/chairman".to_string())
    }

    fn council() -> Vec<Model> {
        Model::default_council()
    }

    fn input(policy: ConvergencePolicy) -> RunDeliberationInput {
        RunDeliberationInput::new(
            "How should a city store renewable energy?",
            ModelConfig::default()
                .with_council(council())
                .with_chairman(chairman()),
        )
        .with_policy(policy)
    }

    fn member(summary: &str) -> Reply {
        Ok(json!({
            "summary": summary,
            "viewpoints": [format!("{summary} viewpoint")],
            "conflicts": [],
            "suggestions": [],
            "final_answer_candidate": ""
        })
        .to_string())
    }

    fn verdict(score: f64, converged: bool) -> Reply {
        let mut reply = json!({
            "stability_score": score,
            "is_converged": converged,
            "consensus_points": ["Storage is needed"],
            "conflict_points": ["Batteries versus pumped hydro"],
            "explanation": format!("Stability at {score}")
        });
        if converged {
            reply["final_integrated_conclusion"] = json!("Combine batteries with pumped hydro");
        } else {
            reply["questions_for_next_round"] = json!(["Which mix fits the grid?"]);
        }
        Ok(reply.to_string())
    }

    /// Script every council member with `rounds` successful replies.
    fn all_members(mut gateway: ScriptedGateway, rounds: usize) -> ScriptedGateway {
        for (i, model) in council().iter().enumerate() {
            let replies = (1..=rounds).map(|r| member(&format!("member {} round {}", i + 1, r)));
            gateway = gateway.script(model, replies.collect());
        }
        gateway
    }

    fn event_types(events: &[DeliberationEvent]) -> Vec<&'static str> {
        events.iter().map(|e| e.event_type()).collect()
    }

    // ==================== Convergence ====================

    #[tokio::test]
    async fn test_low_score_convergence_claim_is_overridden() {
        let gateway = all_members(ScriptedGateway::new(), 2)
            .script(&chairman(), vec![verdict(0.6, true), verdict(0.9, true)]);
        let use_case = RunDeliberationUseCase::new(Arc::new(gateway));

        let result = use_case
            .execute(input(ConvergencePolicy::default()))
            .await
            .unwrap();

        let first = result.all_rounds[0].chairman_assessment.as_ref().unwrap();
        assert!(first.claimed_converged);
        assert!(!first.is_converged);
        assert_eq!(
            first.correction,
            Some(AssessmentCorrection::BelowThreshold { threshold: 0.85 })
        );
        assert!(!first.next_questions().is_empty());
        assert!(first.final_integrated_conclusion.is_none());

        assert_eq!(result.metadata.converged_round, Some(2));
        assert_eq!(result.metadata.termination, Termination::Converged);
        assert_eq!(
            result.final_text(),
            Some("Combine batteries with pumped hydro")
        );
        assert_eq!(result.final_result.unwrap().model, chairman());
    }

    #[tokio::test]
    async fn test_converges_in_first_round() {
        let gateway =
            all_members(ScriptedGateway::new(), 1).script(&chairman(), vec![verdict(0.92, true)]);
        let use_case = RunDeliberationUseCase::new(Arc::new(gateway));

        let result = use_case
            .execute(input(ConvergencePolicy::default()))
            .await
            .unwrap();

        assert_eq!(result.all_rounds.len(), 1);
        assert_eq!(result.metadata.converged_round, Some(1));
        assert_eq!(result.metadata.rounds_completed, 1);
        assert_eq!(result.metadata.threshold, 0.85);
    }

    #[tokio::test]
    async fn test_high_score_non_convergence_forced_by_policy() {
        let gateway =
            all_members(ScriptedGateway::new(), 1).script(&chairman(), vec![verdict(0.9, false)]);
        let use_case = RunDeliberationUseCase::new(Arc::new(gateway));
        let policy =
            ConvergencePolicy::default().with_high_score_policy(HighScorePolicy::ForceConvergence);

        let result = use_case.execute(input(policy)).await.unwrap();

        let assessment = result.last_assessment().unwrap();
        assert!(assessment.is_converged);
        assert_eq!(
            assessment.correction,
            Some(AssessmentCorrection::ForcedConvergence { threshold: 0.85 })
        );
        assert_eq!(result.metadata.converged_round, Some(1));
        assert!(result.final_text().unwrap().contains("Storage is needed"));
    }

    #[tokio::test]
    async fn test_max_rounds_finalizes_without_error() {
        let gateway = all_members(ScriptedGateway::new(), 3).script(
            &chairman(),
            vec![verdict(0.4, false), verdict(0.5, false), verdict(0.6, false)],
        );
        let gateway = Arc::new(gateway);
        let use_case = RunDeliberationUseCase::new(Arc::clone(&gateway));

        let result = use_case
            .execute(input(ConvergencePolicy::new(0.85, 3).unwrap()))
            .await
            .unwrap();

        assert_eq!(result.all_rounds.len(), 3);
        assert_eq!(result.metadata.converged_round, None);
        assert_eq!(result.metadata.termination, Termination::MaxRoundsReached);
        let text = result.final_text().unwrap();
        assert!(text.starts_with("Stability at 0.6"));
        assert!(text.contains("- Storage is needed"));
        // 3 rounds x 4 members + 3 evaluations
        assert_eq!(gateway.call_count(), 15);
    }

    #[tokio::test]
    async fn test_max_rounds_with_empty_assessments_still_has_final_result() {
        let blank = || {
            Ok(json!({
                "stability_score": 0.3,
                "is_converged": false,
                "explanation": "",
                "consensus_points": []
            })
            .to_string())
        };
        let gateway = all_members(ScriptedGateway::new(), 2)
            .script(&chairman(), vec![blank(), blank()]);
        let use_case = RunDeliberationUseCase::new(Arc::new(gateway));

        let result = use_case
            .execute(input(ConvergencePolicy::new(0.85, 2).unwrap()))
            .await
            .unwrap();

        assert_eq!(result.metadata.termination, Termination::MaxRoundsReached);
        assert_eq!(result.metadata.threshold, 0.85);
        assert_eq!(result.council, council());
        let final_result = result.final_result.as_ref().unwrap();
        assert_eq!(final_result.model, chairman());
        assert_eq!(final_result.response, NO_CONVERGENCE_NOTICE);
    }

    #[tokio::test]
    async fn test_round_indices_and_phases() {
        let gateway = all_members(ScriptedGateway::new(), 3).script(
            &chairman(),
            vec![verdict(0.3, false), verdict(0.5, false), verdict(0.95, true)],
        );
        let use_case = RunDeliberationUseCase::new(Arc::new(gateway));

        let result = use_case
            .execute(input(ConvergencePolicy::default()))
            .await
            .unwrap();

        let indices: Vec<u32> = result.all_rounds.iter().map(|r| r.index).collect();
        assert_eq!(indices, vec![1, 2, 3]);
        assert_eq!(result.all_rounds[0].phase, Phase::Divergent);
        assert!(result.all_rounds[1..]
            .iter()
            .all(|r| r.phase == Phase::Convergent));
        assert!(result.all_rounds.iter().all(|r| r.is_frozen()));
        for round in &result.all_rounds {
            assert!(round.responses.len() <= council().len());
            let assessment = round.chairman_assessment.as_ref().unwrap();
            assert!(!assessment.is_converged || assessment.stability_score >= 0.85);
        }
    }

    // ==================== Dispatch ====================

    #[tokio::test]
    async fn test_failed_member_is_omitted_from_divergent_chain() {
        let models = council();
        let gateway = ScriptedGateway::new()
            .script(&models[0], vec![member("first speaker")])
            .script(
                &models[1],
                vec![Err(GatewayError::RequestFailed("503".to_string()))],
            )
            .script(&models[2], vec![member("third speaker")])
            .script(&models[3], vec![member("fourth speaker")])
            .script(&chairman(), vec![verdict(0.9, true)]);
        let gateway = Arc::new(gateway);
        let use_case = RunDeliberationUseCase::new(Arc::clone(&gateway));

        let result = use_case
            .execute(input(ConvergencePolicy::default()))
            .await
            .unwrap();

        let round = &result.all_rounds[0];
        assert_eq!(round.responses.len(), 3);
        assert_eq!(round.failures.len(), 1);
        assert_eq!(round.failures[0].model, models[1]);
        let order: Vec<&Model> = round.responses.iter().map(|r| &r.model).collect();
        assert_eq!(order, vec![&models[0], &models[2], &models[3]]);

        let third = &gateway.prompts_for(&models[2])[0];
        assert!(third.contains("first speaker"));
        assert!(third.contains("## Participant 1"));
        assert!(!third.contains("## Participant 2"));

        let fourth = &gateway.prompts_for(&models[3])[0];
        assert!(fourth.contains("first speaker"));
        assert!(fourth.contains("third speaker"));
        assert!(!fourth.contains("## Participant 3"));
    }

    #[tokio::test]
    async fn test_unstructured_reply_is_kept_as_fallback() {
        let models = council();
        let gateway = ScriptedGateway::new()
            .script(&models[0], vec![Ok("Plain prose about storage".to_string())])
            .script(&models[1], vec![member("second")])
            .script(&models[2], vec![member("third")])
            .script(&models[3], vec![member("fourth")])
            .script(&chairman(), vec![verdict(0.9, true)]);
        let gateway = Arc::new(gateway);
        let use_case = RunDeliberationUseCase::new(Arc::clone(&gateway));

        let result = use_case
            .execute(input(ConvergencePolicy::default()))
            .await
            .unwrap();

        let first = &result.all_rounds[0].responses[0];
        assert!(!first.parsed.is_valid());
        assert_eq!(first.response, "Plain prose about storage");
        // The next speaker sees the raw text
        assert!(gateway.prompts_for(&models[1])[0].contains("Plain prose about storage"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_convergent_round_stores_dispatch_order() {
        let models = council();
        let gateway = all_members(ScriptedGateway::new(), 2)
            .script(&chairman(), vec![verdict(0.5, false), verdict(0.9, true)])
            .delay(&models[0], Duration::from_millis(40))
            .delay(&models[1], Duration::from_millis(30))
            .delay(&models[2], Duration::from_millis(20))
            .delay(&models[3], Duration::from_millis(10));
        let use_case = RunDeliberationUseCase::new(Arc::new(gateway));

        let events: Vec<DeliberationEvent> = use_case
            .stream(input(ConvergencePolicy::default()))
            .collect()
            .await;

        let round_two_completions: Vec<(Model, usize)> = events
            .iter()
            .filter_map(|e| match e {
                DeliberationEvent::ModelResponseComplete {
                    round: 2,
                    model,
                    completed_count,
                    total_count,
                    ..
                } => {
                    assert_eq!(*total_count, 4);
                    Some((model.clone(), *completed_count))
                }
                _ => None,
            })
            .collect();
        assert_eq!(
            round_two_completions,
            vec![
                (models[3].clone(), 1),
                (models[2].clone(), 2),
                (models[1].clone(), 3),
                (models[0].clone(), 4),
            ]
        );

        let Some(DeliberationEvent::Complete(result)) =
            events.iter().find(|e| matches!(e, DeliberationEvent::Complete(_)))
        else {
            panic!("expected a complete event");
        };
        let stored: Vec<Model> = result.all_rounds[1]
            .responses
            .iter()
            .map(|r| r.model.clone())
            .collect();
        assert_eq!(stored, models);
    }

    #[tokio::test]
    async fn test_convergent_prompt_carries_chairman_questions() {
        let models = council();
        let gateway = all_members(ScriptedGateway::new(), 2)
            .script(&chairman(), vec![verdict(0.5, false), verdict(0.9, true)]);
        let gateway = Arc::new(gateway);
        let use_case = RunDeliberationUseCase::new(Arc::clone(&gateway));

        use_case
            .execute(input(ConvergencePolicy::default()))
            .await
            .unwrap();

        let prompts = gateway.prompts_for(&models[0]);
        assert_eq!(prompts.len(), 2);
        assert!(prompts[1].contains("1. Which mix fits the grid?"));
        assert!(prompts[1].contains("- Batteries versus pumped hydro"));
        // Every member gets the same convergent prompt
        assert_eq!(gateway.prompts_for(&models[3])[1], prompts[1]);
    }

    // ==================== Failures ====================

    #[tokio::test]
    async fn test_all_calls_failed_in_round_one() {
        let mut gateway = ScriptedGateway::new();
        for model in council() {
            gateway = gateway.script(&model, vec![Err(GatewayError::Timeout(Duration::from_secs(1)))]);
        }
        let gateway = Arc::new(gateway);
        let use_case = RunDeliberationUseCase::new(Arc::clone(&gateway));

        let error = use_case
            .execute(input(ConvergencePolicy::default()))
            .await
            .unwrap_err();

        match error {
            RunDeliberationError::AllCallsFailed { round, failures } => {
                assert_eq!(round, 1);
                assert_eq!(failures.len(), 4);
            }
            other => panic!("unexpected error: {other:?}"),
        }
        // The chairman was never called
        assert!(gateway.prompts_for(&chairman()).is_empty());
    }

    #[tokio::test]
    async fn test_all_calls_failed_in_later_round_is_evaluated() {
        let gateway = all_members(ScriptedGateway::new(), 1)
            .script(&chairman(), vec![verdict(0.5, false), verdict(0.9, true)]);
        let gateway = Arc::new(gateway);
        let use_case = RunDeliberationUseCase::new(Arc::clone(&gateway));

        // Members have no replies scripted for round 2
        let result = use_case
            .execute(input(ConvergencePolicy::default()))
            .await
            .unwrap();

        let second = &result.all_rounds[1];
        assert!(second.is_failed());
        assert!(second.responses.is_empty());
        assert_eq!(second.failures.len(), 4);
        assert!(second.is_frozen());
        assert!(gateway.prompts_for(&chairman())[1].contains("No participant produced a response"));
    }

    #[tokio::test]
    async fn test_evaluator_failure_keeps_round_one() {
        let gateway = all_members(ScriptedGateway::new(), 1).script(
            &chairman(),
            vec![Err(GatewayError::RequestFailed("chairman down".to_string()))],
        );
        let use_case = RunDeliberationUseCase::new(Arc::new(gateway));

        let events: Vec<DeliberationEvent> = use_case
            .stream(input(ConvergencePolicy::default()))
            .collect()
            .await;

        assert_eq!(
            event_types(&events),
            vec![
                "initializing",
                "round_start",
                "model_response_complete",
                "model_response_complete",
                "model_response_complete",
                "model_response_complete",
                "error",
                "stream_complete",
            ]
        );

        let DeliberationEvent::Error(failure) = &events[6] else {
            panic!("expected an error event");
        };
        assert_eq!(failure.kind, TurnFailureKind::EvaluatorFailure);
        assert_eq!(failure.round, Some(1));

        match RunDeliberationError::from(failure.clone()) {
            RunDeliberationError::EvaluatorFailed {
                round,
                partial_round,
                completed_rounds,
                ..
            } => {
                assert_eq!(round, 1);
                assert!(completed_rounds.is_empty());
                assert_eq!(partial_round.unwrap().responses.len(), 4);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_unparsable_evaluator_reply_is_fatal() {
        let gateway = all_members(ScriptedGateway::new(), 2).script(
            &chairman(),
            vec![verdict(0.5, false), Ok("Looks converged to me".to_string())],
        );
        let use_case = RunDeliberationUseCase::new(Arc::new(gateway));

        let error = use_case
            .execute(input(ConvergencePolicy::default()))
            .await
            .unwrap_err();

        match &error {
            RunDeliberationError::EvaluatorFailed { round, .. } => assert_eq!(*round, 2),
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(error.completed_rounds().len(), 1);
    }

    #[tokio::test]
    async fn test_invalid_config_makes_no_calls() {
        let gateway = Arc::new(ScriptedGateway::new());
        let use_case = RunDeliberationUseCase::new(Arc::clone(&gateway));
        let input = RunDeliberationInput::new(
            "Why?",
            ModelConfig::default().with_council(vec![]),
        );

        let events: Vec<DeliberationEvent> = use_case.stream(input).collect().await;

        assert_eq!(event_types(&events), vec!["error", "stream_complete"]);
        let DeliberationEvent::Error(failure) = &events[0] else {
            panic!("expected an error event");
        };
        assert_eq!(failure.kind, TurnFailureKind::InvalidConfig);
        assert_eq!(gateway.call_count(), 0);
    }

    // ==================== Stream ====================

    #[tokio::test]
    async fn test_event_order_for_two_rounds() {
        let gateway = all_members(ScriptedGateway::new(), 2)
            .script(&chairman(), vec![verdict(0.5, false), verdict(0.9, true)]);
        let use_case = RunDeliberationUseCase::new(Arc::new(gateway));

        let events: Vec<DeliberationEvent> = use_case
            .stream(input(ConvergencePolicy::default()))
            .collect()
            .await;

        let mut expected = vec!["initializing"];
        for _ in 0..2 {
            expected.push("round_start");
            expected.extend(["model_response_complete"; 4]);
            expected.push("round_complete");
        }
        expected.extend(["complete", "stream_complete"]);
        assert_eq!(event_types(&events), expected);

        let DeliberationEvent::RoundComplete(round) = &events[6] else {
            panic!("expected round_complete");
        };
        assert_eq!(round.index, 1);
        assert!(round.chairman_assessment.is_some());
    }

    #[tokio::test]
    async fn test_streaming_and_execute_share_the_final_payload() {
        let script = || {
            all_members(ScriptedGateway::new(), 1).script(&chairman(), vec![verdict(0.9, true)])
        };

        let streamed: Vec<DeliberationEvent> = RunDeliberationUseCase::new(Arc::new(script()))
            .stream(input(ConvergencePolicy::default()))
            .collect()
            .await;
        let Some(DeliberationEvent::Complete(from_stream)) = streamed
            .into_iter()
            .find(|e| matches!(e, DeliberationEvent::Complete(_)))
        else {
            panic!("expected a complete event");
        };

        let executed = RunDeliberationUseCase::new(Arc::new(script()))
            .execute(input(ConvergencePolicy::default()))
            .await
            .unwrap();

        assert_eq!(from_stream, executed);
    }

    #[tokio::test]
    async fn test_logger_receives_every_event() {
        #[derive(Default)]
        struct MemoryLogger {
            types: Mutex<Vec<&'static str>>,
        }

        impl ConversationLogger for MemoryLogger {
            fn log(&self, event: ConversationEvent) {
                self.types.lock().unwrap().push(event.event_type);
            }
        }

        let gateway =
            all_members(ScriptedGateway::new(), 1).script(&chairman(), vec![verdict(0.9, true)]);
        let logger = Arc::new(MemoryLogger::default());
        let use_case = RunDeliberationUseCase::new(Arc::new(gateway)).with_logger(logger.clone());

        let events: Vec<DeliberationEvent> = use_case
            .stream(input(ConvergencePolicy::default()))
            .collect()
            .await;

        assert_eq!(*logger.types.lock().unwrap(), event_types(&events));
    }

    // ==================== Cancellation ====================

    #[tokio::test]
    async fn test_cancelled_before_start() {
        let token = CancellationToken::new();
        token.cancel();
        let gateway = Arc::new(all_members(ScriptedGateway::new(), 1));
        let use_case = RunDeliberationUseCase::new(Arc::clone(&gateway)).with_cancellation(token);

        let error = use_case
            .execute(input(ConvergencePolicy::default()))
            .await
            .unwrap_err();

        assert!(error.is_cancelled());
        assert_eq!(gateway.call_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_while_waiting_on_a_call() {
        let models = council();
        let gateway = all_members(ScriptedGateway::new(), 1)
            .delay(&models[1], Duration::from_secs(3600));
        let token = CancellationToken::new();
        let use_case = RunDeliberationUseCase::new(Arc::new(gateway))
            .with_cancellation(token.clone());

        let canceller = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            token.cancel();
        });

        let events: Vec<DeliberationEvent> = use_case
            .stream(input(ConvergencePolicy::default()))
            .collect()
            .await;
        canceller.await.unwrap();

        let types = event_types(&events);
        assert_eq!(types[types.len() - 2..], ["error", "stream_complete"]);
        let DeliberationEvent::Error(failure) = &events[events.len() - 2] else {
            panic!("expected an error event");
        };
        assert_eq!(failure.kind, TurnFailureKind::Cancelled);
        // The first member answered before the cancellation
        assert_eq!(
            types.iter().filter(|t| **t == "model_response_complete").count(),
            1
        );
    }
}
