//! Conversation records
//!
//! The orchestrator only appends finalized turns; storage belongs to
//! whatever collaborator persists these records.

pub mod entities;

pub use entities::{Conversation, Message};
