//! Ordered progress events of a deliberation turn.
//!
//! A turn emits:
//!
//! ```text
//! initializing
//! round_start(1) -> model_response_complete* -> round_complete(1)
//! round_start(2) -> ...                      -> round_complete(2)
//! ...
//! complete(result) | error(failure)
//! stream_complete
//! ```
//!
//! `model_response_complete` events arrive in completion order; the frozen
//! [`Round`] carried by `round_complete` lists responses in dispatch order.
//! Every event serializes as `{"type": ..., "data": {...}}`.

use super::entities::{DeliberationResult, Phase, Round};
use super::response::ParsedResponse;
use crate::core::{model::Model, question::Question};
use serde::{Deserialize, Serialize};

/// A single externally consumable progress event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum DeliberationEvent {
    Initializing {
        question: Question,
        council: Vec<Model>,
        chairman: Model,
        threshold: f64,
        max_rounds: u32,
    },
    RoundStart {
        round: u32,
        phase: Phase,
    },
    ModelResponseComplete {
        round: u32,
        model: Model,
        response: String,
        parsed: ParsedResponse,
        /// Successful responses received so far in this round
        completed_count: usize,
        /// Size of the council roster
        total_count: usize,
    },
    ModelCallFailed {
        round: u32,
        model: Model,
        reason: String,
        completed_count: usize,
        total_count: usize,
    },
    RoundComplete(Round),
    Complete(DeliberationResult),
    Error(TurnFailure),
    StreamComplete,
}

impl DeliberationEvent {
    /// The `type` tag this event serializes with.
    pub fn event_type(&self) -> &'static str {
        match self {
            DeliberationEvent::Initializing { .. } => "initializing",
            DeliberationEvent::RoundStart { .. } => "round_start",
            DeliberationEvent::ModelResponseComplete { .. } => "model_response_complete",
            DeliberationEvent::ModelCallFailed { .. } => "model_call_failed",
            DeliberationEvent::RoundComplete(_) => "round_complete",
            DeliberationEvent::Complete(_) => "complete",
            DeliberationEvent::Error(_) => "error",
            DeliberationEvent::StreamComplete => "stream_complete",
        }
    }

    /// Whether this event ends the turn (`complete` or `error`).
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            DeliberationEvent::Complete(_) | DeliberationEvent::Error(_)
        )
    }
}

/// Category of a fatal turn error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnFailureKind {
    InvalidConfig,
    AllCallsFailed,
    EvaluatorFailure,
    Cancelled,
    /// The turn stopped without reaching a terminal state
    StreamClosed,
}

impl TurnFailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TurnFailureKind::InvalidConfig => "invalid_config",
            TurnFailureKind::AllCallsFailed => "all_calls_failed",
            TurnFailureKind::EvaluatorFailure => "evaluator_failure",
            TurnFailureKind::Cancelled => "cancelled",
            TurnFailureKind::StreamClosed => "stream_closed",
        }
    }
}

impl std::fmt::Display for TurnFailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Payload of the `error` event.
///
/// Completed rounds were already emitted as `round_complete` events, so they
/// travel with the value but are not serialized again. The round that was in
/// progress when the turn failed is serialized when present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurnFailure {
    pub kind: TurnFailureKind,
    pub message: String,
    /// Round in progress when the turn failed
    pub round: Option<u32>,
    #[serde(skip)]
    pub completed_rounds: Vec<Round>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub partial_round: Option<Round>,
}

impl TurnFailure {
    pub fn new(kind: TurnFailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            round: None,
            completed_rounds: Vec::new(),
            partial_round: None,
        }
    }

    pub fn in_round(mut self, round: u32) -> Self {
        self.round = Some(round);
        self
    }

    pub fn with_rounds(mut self, completed: Vec<Round>, partial: Option<Round>) -> Self {
        self.completed_rounds = completed;
        self.partial_round = partial;
        self
    }
}
