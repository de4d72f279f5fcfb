//! Application layer for llm-council
//!
//! This crate contains the deliberation use case, port definitions, and
//! application configuration. It depends only on the domain layer.

pub mod config;
pub mod ports;
pub mod use_cases;

// Re-export commonly used types
pub use config::{CouncilConfig, DeliberationParams};
pub use ports::{
    conversation_logger::{ConversationEvent, ConversationLogger, NoConversationLogger},
    llm_gateway::{GatewayError, LlmGateway},
    progress::{NoProgress, ProgressNotifier},
};
pub use use_cases::run_deliberation::{
    ConvergenceEvaluator, DeliberationStream, EvaluatorError, ModelClient, RunDeliberationError,
    RunDeliberationInput, RunDeliberationUseCase,
};
