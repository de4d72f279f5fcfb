//! Application-level configuration.
//!
//! This module provides configuration types that control how use cases behave:
//!
//! - [`DeliberationParams`]: external call bounds (council and chairman timeouts)
//! - [`CouncilConfig`]: container for models, convergence policy and parameters

pub mod council_config;
pub mod deliberation_params;

pub use council_config::CouncilConfig;
pub use deliberation_params::DeliberationParams;
