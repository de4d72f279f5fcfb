//! Uniform call contract to model endpoints.
//!
//! [`ModelClient::invoke`] performs one call bounded by a timeout.
//! [`ModelClient::spawn_batch`] dispatches many calls concurrently and hands
//! back each settled call in completion order, tagged with its input index;
//! [`ModelClient::invoke_batch`] drains a batch into results aligned to input
//! order. A failing call never aborts its siblings.

use crate::ports::llm_gateway::{GatewayError, LlmGateway};
use council_domain::Model;
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;
use tracing::{debug, warn};

/// Result of one model call
pub type CallOutcome = Result<String, GatewayError>;

/// One call of a batch that has settled
#[derive(Debug)]
pub struct Settled {
    /// Position of the request in the batch input
    pub index: usize,
    pub model: Model,
    pub outcome: CallOutcome,
}

/// Timeout-bounded access to a gateway
pub struct ModelClient<G: LlmGateway + 'static> {
    gateway: Arc<G>,
    timeout: Duration,
}

impl<G: LlmGateway + 'static> Clone for ModelClient<G> {
    fn clone(&self) -> Self {
        Self {
            gateway: Arc::clone(&self.gateway),
            timeout: self.timeout,
        }
    }
}

impl<G: LlmGateway + 'static> ModelClient<G> {
    pub fn new(gateway: Arc<G>, timeout: Duration) -> Self {
        Self { gateway, timeout }
    }

    /// Call one model. A timeout is reported like any transport failure.
    pub async fn invoke(&self, model: &Model, prompt: &str) -> CallOutcome {
        Self::call(&self.gateway, model, prompt, self.timeout).await
    }

    /// Dispatch every request concurrently.
    pub fn spawn_batch(&self, requests: Vec<(Model, String)>) -> Batch {
        let total = requests.len();
        let mut join_set = JoinSet::new();

        for (index, (model, prompt)) in requests.into_iter().enumerate() {
            let gateway = Arc::clone(&self.gateway);
            let timeout = self.timeout;

            join_set.spawn(async move {
                let call = Self::call(&gateway, &model, &prompt, timeout);
                let outcome = AssertUnwindSafe(call)
                    .catch_unwind()
                    .await
                    .unwrap_or_else(|_| Err(GatewayError::Other("model call panicked".to_string())));
                Settled {
                    index,
                    model,
                    outcome,
                }
            });
        }

        debug!("Dispatched batch of {} calls", total);
        Batch { join_set, total }
    }

    /// Dispatch every request concurrently and wait for all of them.
    ///
    /// Results are aligned to the input order, not arrival order.
    pub async fn invoke_batch(&self, requests: Vec<(Model, String)>) -> Vec<CallOutcome> {
        let mut batch = self.spawn_batch(requests);
        let mut slots: Vec<Option<CallOutcome>> = (0..batch.len()).map(|_| None).collect();

        while let Some(settled) = batch.next_settled().await {
            slots[settled.index] = Some(settled.outcome);
        }

        slots
            .into_iter()
            .map(|slot| {
                slot.unwrap_or_else(|| Err(GatewayError::Other("call did not settle".to_string())))
            })
            .collect()
    }

    async fn call(gateway: &G, model: &Model, prompt: &str, timeout: Duration) -> CallOutcome {
        match tokio::time::timeout(timeout, gateway.complete(model, prompt)).await {
            Ok(result) => result,
            Err(_) => {
                warn!("Model {} timed out after {:?}", model, timeout);
                Err(GatewayError::Timeout(timeout))
            }
        }
    }
}

/// In-flight batch of calls
///
/// Dropping the batch aborts calls that have not settled yet.
pub struct Batch {
    join_set: JoinSet<Settled>,
    total: usize,
}

impl Batch {
    /// Number of dispatched calls
    pub fn len(&self) -> usize {
        self.total
    }

    pub fn is_empty(&self) -> bool {
        self.total == 0
    }

    /// Wait for the next call to settle; `None` once all have.
    pub async fn next_settled(&mut self) -> Option<Settled> {
        loop {
            match self.join_set.join_next().await? {
                Ok(settled) => return Some(settled),
                Err(e) => {
                    // Only reachable if a task was aborted externally
                    warn!("Task join error: {}", e);
                }
            }
        }
    }
}
