//! OpenRouter-compatible chat completions gateway
//!
//! Sends each prompt as a single user message and returns the first choice's
//! content. Any endpoint speaking the OpenAI chat completions dialect works
//! when `base_url` points at it.

use crate::config::FileProviderConfig;
use async_trait::async_trait;
use council_application::ports::llm_gateway::{GatewayError, LlmGateway};
use council_domain::Model;
use council_domain::core::string::truncate;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Longest error body kept in a [`GatewayError`]
const MAX_ERROR_BODY: usize = 500;

// ==================== Wire Types ====================

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 1],
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    message: String,
}

// ==================== Gateway ====================

/// [`LlmGateway`] over HTTP with a bearer API key
pub struct OpenRouterGateway {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl OpenRouterGateway {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Result<Self, GatewayError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("llm-council/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| GatewayError::Other(format!("could not build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.into(),
            api_key: api_key.into(),
        })
    }

    /// Build the gateway from the `[provider]` section.
    ///
    /// Fails with [`GatewayError::AuthenticationFailed`] when no API key can
    /// be resolved, before any request is made.
    pub fn from_config(config: &FileProviderConfig) -> Result<Self, GatewayError> {
        let api_key = config.resolve_api_key().ok_or_else(|| {
            GatewayError::AuthenticationFailed(format!(
                "no API key configured; set {} or provider.api_key",
                config.api_key_env
            ))
        })?;
        Self::new(&config.base_url, api_key)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl LlmGateway for OpenRouterGateway {
    async fn complete(&self, model: &Model, prompt: &str) -> Result<String, GatewayError> {
        let request = ChatRequest {
            model: model.as_str(),
            messages: [ChatMessage {
                role: "user",
                content: prompt,
            }],
        };

        debug!("POST {} model={} prompt_len={}", self.base_url, model, prompt.len());

        let response = self
            .client
            .post(&self.base_url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        let body = response.text().await.map_err(transport_error)?;

        if !status.is_success() {
            warn!("Model {} returned HTTP {}", model, status.as_u16());
            return Err(status_error(status, model, &body));
        }

        extract_content(&body)
    }
}

// ==================== Response Handling ====================

fn transport_error(e: reqwest::Error) -> GatewayError {
    if e.is_connect() {
        GatewayError::ConnectionError(e.to_string())
    } else {
        GatewayError::RequestFailed(e.to_string())
    }
}

/// Map a non-success HTTP status to a gateway error.
fn status_error(status: StatusCode, model: &Model, body: &str) -> GatewayError {
    let detail = api_error_message(body).unwrap_or_else(|| truncate(body, MAX_ERROR_BODY));
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            GatewayError::AuthenticationFailed(detail)
        }
        StatusCode::NOT_FOUND => GatewayError::ModelNotAvailable(format!("{model}: {detail}")),
        _ => GatewayError::RequestFailed(format!("HTTP {}: {}", status.as_u16(), detail)),
    }
}

/// First choice's content from a chat completions body.
///
/// Some providers report upstream failures with a 200 status and an
/// `error` object; those are treated as failed requests.
fn extract_content(body: &str) -> Result<String, GatewayError> {
    let parsed: ChatResponse = serde_json::from_str(body).map_err(|e| {
        GatewayError::InvalidResponse(format!("{e}: {}", truncate(body, MAX_ERROR_BODY)))
    })?;

    if let Some(error) = parsed.error {
        return Err(GatewayError::RequestFailed(error.message));
    }

    parsed
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .filter(|content| !content.trim().is_empty())
        .ok_or_else(|| GatewayError::InvalidResponse("response has no content".to_string()))
}

fn api_error_message(body: &str) -> Option<String> {
    serde_json::from_str::<ChatResponse>(body)
        .ok()
        .and_then(|r| r.error)
        .map(|e| e.message)
}
