//! Output formatter trait

use council_domain::DeliberationResult;

/// Trait for formatting deliberation results
pub trait OutputFormatter {
    /// Format every round, response and assessment
    fn format(&self, result: &DeliberationResult) -> String;

    /// Format as JSON
    fn format_json(&self, result: &DeliberationResult) -> String;

    /// Format the final answer only (concise output)
    fn format_synthesis_only(&self, result: &DeliberationResult) -> String;
}
