//! Port for structured conversation logging.
//!
//! Defines the [`ConversationLogger`] trait for recording deliberation events
//! (round starts, council responses, chairman assessments, the final result)
//! to a structured transcript.
//!
//! This is separate from `tracing`-based operation logs: tracing handles
//! human-readable diagnostic messages, while this port captures the full
//! deliberation transcript in a machine-readable format (JSONL).

use council_domain::DeliberationEvent;
use serde_json::Value;

/// A structured conversation event for logging.
///
/// Each event has a type string and a JSON payload containing event-specific
/// fields. The timestamp is added by the logger when the record is written.
pub struct ConversationEvent {
    /// Event type identifier (e.g., "round_start", "model_response_complete").
    pub event_type: &'static str,
    /// JSON payload with event-specific data.
    pub payload: Value,
    /// Set when this event closes a round or the turn; loggers persist
    /// everything up to and including it.
    pub checkpoint: bool,
}

impl ConversationEvent {
    pub fn new(event_type: &'static str, payload: Value) -> Self {
        Self {
            event_type,
            payload,
            checkpoint: false,
        }
    }

    pub fn as_checkpoint(mut self) -> Self {
        self.checkpoint = true;
        self
    }
}

impl From<&DeliberationEvent> for ConversationEvent {
    fn from(event: &DeliberationEvent) -> Self {
        // The payload is the event's `data` object (absent for stream_complete)
        let payload = serde_json::to_value(event)
            .ok()
            .and_then(|mut value| value.get_mut("data").map(Value::take))
            .unwrap_or(Value::Null);
        let logged = Self::new(event.event_type(), payload);
        match event {
            DeliberationEvent::RoundComplete(_) | DeliberationEvent::StreamComplete => {
                logged.as_checkpoint()
            }
            _ if event.is_terminal() => logged.as_checkpoint(),
            _ => logged,
        }
    }
}

/// Port for logging conversation events to a structured log.
///
/// Implementations write each event as a single record (e.g., one JSONL line).
/// The `log` method is synchronous and non-fallible: logging failures must not
/// disturb a running deliberation.
pub trait ConversationLogger: Send + Sync {
    /// Record a conversation event.
    fn log(&self, event: ConversationEvent);
}

/// No-op implementation for tests and when logging is disabled.
pub struct NoConversationLogger;

impl ConversationLogger for NoConversationLogger {
    fn log(&self, _event: ConversationEvent) {}
}
