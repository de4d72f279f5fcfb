//! Conversation domain entities

use crate::deliberation::entities::{DeliberationResult, FinalResult, Metadata, Round};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A message in a conversation (Entity)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum Message {
    User {
        content: String,
    },
    /// A finalized deliberation turn
    Assistant {
        all_rounds: Vec<Round>,
        final_result: Option<FinalResult>,
        metadata: Metadata,
    },
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Message::User {
            content: content.into(),
        }
    }

    pub fn is_user(&self) -> bool {
        matches!(self, Message::User { .. })
    }
}

impl From<DeliberationResult> for Message {
    fn from(result: DeliberationResult) -> Self {
        Message::Assistant {
            all_rounds: result.all_rounds,
            final_result: result.final_result,
            metadata: result.metadata,
        }
    }
}

/// An append-only conversation (Entity)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conversation {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub messages: Vec<Message>,
}

impl Conversation {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            messages: Vec::new(),
        }
    }

    pub fn append_user(&mut self, content: impl Into<String>) {
        self.messages.push(Message::user(content));
    }

    /// Append a finalized turn as an assistant message.
    pub fn append_turn(&mut self, result: DeliberationResult) {
        self.messages.push(result.into());
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

impl Default for Conversation {
    fn default() -> Self {
        Self::new()
    }
}
