//! LLM Gateway port
//!
//! Defines the interface for communicating with generative-model providers.

use async_trait::async_trait;
use council_domain::Model;
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur during LLM gateway operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GatewayError {
    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Model not available: {0}")]
    ModelNotAvailable(String),

    #[error("Request failed: {0}")]
    RequestFailed(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Timed out after {}s", .0.as_secs())]
    Timeout(Duration),

    #[error("Other error: {0}")]
    Other(String),
}

impl GatewayError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, GatewayError::Timeout(_))
    }
}

/// Gateway for LLM communication
///
/// This port defines how the application layer reaches a model endpoint: one
/// prompt in, one completion out. Timeouts are applied by the caller
/// ([`ModelClient`](crate::use_cases::run_deliberation::ModelClient)), so
/// implementations may block for as long as the transport allows.
/// Implementations (adapters) live in the infrastructure layer.
#[async_trait]
pub trait LlmGateway: Send + Sync {
    /// Send a single-turn prompt to `model` and return the completion text.
    async fn complete(&self, model: &Model, prompt: &str) -> Result<String, GatewayError>;
}
