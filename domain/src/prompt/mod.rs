//! Prompt domain
//!
//! Templates for generating prompts at each stage of a deliberation:
//! the divergent chain, convergent rounds and the chairman's evaluation.

mod template;

pub use template::PromptTemplate;
