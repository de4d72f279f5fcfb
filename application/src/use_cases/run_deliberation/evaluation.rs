//! Chairman evaluation of a round.

use super::dispatch::ModelClient;
use crate::ports::llm_gateway::{GatewayError, LlmGateway};
use council_domain::{
    ChairmanAssessment, ConvergencePolicy, Model, ModelResponse, PromptTemplate, parse_assessment,
};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Errors from the chairman's evaluation call
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EvaluatorError {
    #[error("chairman call failed: {0}")]
    CallFailed(#[from] GatewayError),

    #[error("{0}")]
    Unparsable(String),
}

/// Invokes the chairman once per round and enforces its verdict
pub struct ConvergenceEvaluator<G: LlmGateway + 'static> {
    client: ModelClient<G>,
    chairman: Model,
    policy: ConvergencePolicy,
}

impl<G: LlmGateway + 'static> ConvergenceEvaluator<G> {
    pub fn new(client: ModelClient<G>, chairman: Model, policy: ConvergencePolicy) -> Self {
        Self {
            client,
            chairman,
            policy,
        }
    }

    pub fn chairman(&self) -> &Model {
        &self.chairman
    }

    /// Evaluate one round.
    ///
    /// `previous` is the assessment of the prior round (absent for round 1)
    /// and becomes the comparison context of the prompt.
    pub async fn evaluate(
        &self,
        question: &str,
        responses: &[ModelResponse],
        round: u32,
        previous: Option<&ChairmanAssessment>,
    ) -> Result<ChairmanAssessment, EvaluatorError> {
        let prompt = PromptTemplate::chairman_prompt(question, responses, round, previous);
        debug!(
            "Chairman prompt for round {} is {} characters",
            round,
            prompt.len()
        );

        let raw = self.client.invoke(&self.chairman, &prompt).await?;
        let claim = parse_assessment(&raw).map_err(EvaluatorError::Unparsable)?;
        let assessment = ChairmanAssessment::enforce(claim, &self.policy);

        if assessment.was_corrected() {
            warn!(
                "Round {}: chairman claimed converged={} at score {:.2}; enforced converged={}",
                round,
                assessment.claimed_converged,
                assessment.stability_score,
                assessment.is_converged
            );
        }
        info!(
            "Round {} evaluated: score {:.2}, converged {}",
            round, assessment.stability_score, assessment.is_converged
        );

        Ok(assessment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use council_domain::AssessmentCorrection;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    struct FixedGateway {
        reply: Result<String, GatewayError>,
        prompts: Mutex<Vec<String>>,
    }

    impl FixedGateway {
        fn new(reply: Result<String, GatewayError>) -> Self {
            Self {
                reply,
                prompts: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl LlmGateway for FixedGateway {
        async fn complete(&self, _model: &Model, prompt: &str) -> Result<String, GatewayError> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            self.reply.clone()
        }
    }

    fn evaluator(gateway: Arc<FixedGateway>) -> ConvergenceEvaluator<FixedGateway> {
        ConvergenceEvaluator::new(
            ModelClient::new(gateway, Duration::from_secs(5)),
            Model::Glm45Air,
            ConvergencePolicy::default(),
        )
    }

    #[tokio::test]
    async fn test_low_score_claim_is_overridden() {
        let gateway = Arc::new(FixedGateway::new(Ok(r#"{
            "stability_score": 0.6, "is_converged": true,
            "consensus_points": ["A"], "conflict_points": ["B"],
            "explanation": "close", "final_integrated_conclusion": "Done"
        }"#
        .to_string())));
        let assessment = evaluator(gateway).evaluate("Q", &[], 1, None).await.unwrap();

        assert!(!assessment.is_converged);
        assert_eq!(
            assessment.correction,
            Some(AssessmentCorrection::BelowThreshold { threshold: 0.85 })
        );
        assert!(!assessment.next_questions().is_empty());
    }

    #[tokio::test]
    async fn test_unparsable_reply_is_an_error() {
        let gateway = Arc::new(FixedGateway::new(Ok("I cannot decide.".to_string())));
        let error = evaluator(gateway).evaluate("Q", &[], 1, None).await.unwrap_err();
        assert!(matches!(error, EvaluatorError::Unparsable(_)));
    }

    #[tokio::test]
    async fn test_call_failure_is_an_error() {
        let gateway = Arc::new(FixedGateway::new(Err(GatewayError::RequestFailed(
            "503".to_string(),
        ))));
        let error = evaluator(gateway).evaluate("Q", &[], 1, None).await.unwrap_err();
        assert_eq!(
            error,
            EvaluatorError::CallFailed(GatewayError::RequestFailed("503".to_string()))
        );
    }

    #[tokio::test]
    async fn test_previous_assessment_becomes_comparison_context() {
        let reply = r#"{"stability_score": 0.9, "is_converged": true,
            "final_integrated_conclusion": "Done"}"#;
        let gateway = Arc::new(FixedGateway::new(Ok(reply.to_string())));
        let evaluator = evaluator(Arc::clone(&gateway));

        let first = evaluator.evaluate("Q", &[], 1, None).await.unwrap();
        evaluator.evaluate("Q", &[], 2, Some(&first)).await.unwrap();

        let prompts = gateway.prompts.lock().unwrap();
        assert!(!prompts[0].contains("Previous stability score"));
        assert!(prompts[1].contains("Previous stability score: 0.90"));
    }
}
