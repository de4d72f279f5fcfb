//! Deliberation subdomain.
//!
//! A turn runs one divergent round followed by convergent rounds until the
//! chairman declares convergence (backed by its score) or the round ceiling
//! is reached.
//!
//! - [`entities`]: rounds, final result and metadata
//! - [`response`]: council member responses and their parsed form
//! - [`assessment`]: chairman verdicts and threshold enforcement
//! - [`parsing`]: reading structured model output
//! - [`policy`]: threshold, round ceiling, high-score policy
//! - [`state`]: per-turn state machine
//! - [`event`]: the ordered progress event stream

pub mod assessment;
pub mod entities;
pub mod event;
pub mod model_config;
pub mod parsing;
pub mod policy;
pub mod response;
pub mod state;
