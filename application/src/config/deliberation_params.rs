//! Deliberation parameters: call timeouts.
//!
//! [`DeliberationParams`] groups the static parameters that bound external
//! calls in [`RunDeliberationUseCase`](crate::use_cases::run_deliberation::RunDeliberationUseCase).
//! These are application-layer concerns, not domain policy.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default timeout for one council member call
pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(120);

/// Default timeout for one chairman evaluation call
pub const DEFAULT_CHAIRMAN_TIMEOUT: Duration = Duration::from_secs(180);

/// External call bounds for a deliberation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliberationParams {
    /// Timeout applied to every council member call.
    pub call_timeout: Duration,
    /// Timeout applied to the chairman's evaluation call.
    pub chairman_timeout: Duration,
}

impl Default for DeliberationParams {
    fn default() -> Self {
        Self {
            call_timeout: DEFAULT_CALL_TIMEOUT,
            chairman_timeout: DEFAULT_CHAIRMAN_TIMEOUT,
        }
    }
}

impl DeliberationParams {
    // ==================== Builder Methods ====================

    pub fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = timeout;
        self
    }

    pub fn with_chairman_timeout(mut self, timeout: Duration) -> Self {
        self.chairman_timeout = timeout;
        self
    }
}
