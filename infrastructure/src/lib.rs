//! Infrastructure layer for llm-council
//!
//! This crate contains adapters that implement the ports defined in the
//! application layer: the HTTP model gateway, configuration file loading and
//! the JSONL transcript logger.

pub mod config;
pub mod logging;
pub mod providers;

// Re-export commonly used types
pub use config::{
    ConfigLoader, ConfigValidationError, FileConfig, FileConvergenceConfig, FileCouncilConfig,
    FileLoggingConfig, FileOutputConfig, FileProviderConfig,
};
pub use logging::JsonlConversationLogger;
pub use providers::OpenRouterGateway;
