//! Domain layer for llm-council
//!
//! This crate contains the core business logic, entities, and value objects.
//! It has no dependencies on infrastructure or presentation concerns.
//!
//! # Core Concepts
//!
//! ## Council
//!
//! A council of models deliberates on one question over several rounds:
//!
//! - **Divergent round** (round 1): members speak in turn, each seeing the
//!   exact views of those before it
//! - **Convergent rounds** (2+): members answer the chairman's questions in
//!   parallel
//!
//! ## Chairman
//!
//! After every round the chairman scores how stable the discussion is. A
//! converged verdict only stands when the score meets the threshold; see
//! [`ChairmanAssessment::enforce`].

pub mod config;
pub mod conversation;
pub mod core;
pub mod deliberation;
pub mod prompt;

// Re-export commonly used types
pub use config::{ConfigIssue, ConfigIssueCode, OutputFormat, Severity};
pub use conversation::{Conversation, Message};
pub use core::{error::DomainError, model::Model, question::Question};
pub use deliberation::{
    assessment::{
        AssessmentCorrection, ChairmanAssessment, DimensionScores, NO_CONVERGENCE_NOTICE,
        RawAssessment,
    },
    entities::{
        CallFailure, DeliberationResult, FinalResult, Metadata, Phase, Round, Termination,
    },
    event::{DeliberationEvent, TurnFailure, TurnFailureKind},
    model_config::ModelConfig,
    parsing::{parse_assessment, strip_code_fence, validate_response},
    policy::{ConvergencePolicy, DEFAULT_MAX_ROUNDS, DEFAULT_THRESHOLD, HighScorePolicy},
    response::{ConflictAnalysis, ConsensusAnalysis, ModelResponse, ParsedResponse, StructuredResponse},
    state::{DeliberationState, Transition},
};
pub use prompt::PromptTemplate;
