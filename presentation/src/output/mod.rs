//! Rendering of deliberation results and events

pub mod console;
pub mod events;
pub mod formatter;
