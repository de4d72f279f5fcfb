//! Model provider adapters implementing the [`LlmGateway`](council_application::LlmGateway) port.

mod openrouter;

pub use openrouter::OpenRouterGateway;
