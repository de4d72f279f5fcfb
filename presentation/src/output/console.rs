//! Console output formatter for deliberation results

use crate::output::formatter::OutputFormatter;
use colored::Colorize;
use council_application::RunDeliberationError;
use council_domain::core::string::preview;
use council_domain::{
    AssessmentCorrection, ChairmanAssessment, DeliberationResult, Model, ParsedResponse, Round,
    Termination,
};

/// Longest raw-text preview shown for an unstructured response
const RAW_PREVIEW_CHARS: usize = 600;

/// Formats deliberation results for console display
pub struct ConsoleFormatter;

impl ConsoleFormatter {
    /// Format the complete deliberation
    pub fn format(result: &DeliberationResult) -> String {
        let mut output = String::new();

        // Header
        output.push_str(&Self::header("LLM Council Deliberation"));
        output.push('\n');

        output.push_str(&format!(
            "{} {}\n\n",
            "Question:".cyan().bold(),
            result.question
        ));
        output.push_str(&format!(
            "{} {}\n",
            "Council:".cyan().bold(),
            Self::join_models(&result.council)
        ));
        output.push_str(&format!(
            "{} {}\n",
            "Chairman:".cyan().bold(),
            result.chairman
        ));

        for round in &result.all_rounds {
            output.push_str(&Self::format_round(round));
        }

        output.push_str(&Self::section_header("Final Answer"));
        output.push_str(&format!("{}\n\n", Self::status_line(result)));
        match result.final_text() {
            Some(text) => output.push_str(&format!("{}\n", text)),
            None => output.push_str(&format!("{}\n", "(no final answer)".dimmed())),
        }

        output.push_str(&Self::footer());

        output
    }

    /// Format one round: responses, failures and the chairman's assessment
    pub fn format_round(round: &Round) -> String {
        let mut output = Self::section_header(&format!(
            "Round {}: {}",
            round.index,
            round.phase.display_name()
        ));

        for response in &round.responses {
            output.push_str(&format!(
                "\n{}\n",
                format!("── {} ──", response.model).yellow().bold()
            ));
            match &response.parsed {
                ParsedResponse::Valid(record) => {
                    output.push_str(&format!("{}\n", record.summary));
                    for viewpoint in &record.viewpoints {
                        output.push_str(&format!("  * {}\n", viewpoint));
                    }
                    if !record.final_answer_candidate.trim().is_empty() {
                        output.push_str(&format!(
                            "  {} {}\n",
                            "Candidate:".dimmed(),
                            record.final_answer_candidate
                        ));
                    }
                }
                ParsedResponse::Fallback => {
                    output.push_str(&format!(
                        "{}\n{}\n",
                        "(unstructured reply)".dimmed(),
                        preview(&response.response, RAW_PREVIEW_CHARS)
                    ));
                }
            }
        }

        for failure in &round.failures {
            output.push_str(&format!(
                "\n{}\nError: {}\n",
                format!("── {} ──", failure.model).red().bold(),
                failure.reason
            ));
        }

        if let Some(assessment) = &round.chairman_assessment {
            output.push_str(&Self::format_assessment(assessment));
        }

        output
    }

    /// Format the chairman's assessment of a round
    pub fn format_assessment(assessment: &ChairmanAssessment) -> String {
        let mut output = String::new();

        let verdict = if assessment.is_converged {
            "converged".green().bold()
        } else {
            "not converged".yellow().bold()
        };
        output.push_str(&format!(
            "\n{} stability {:.2}, {}\n",
            "Chairman:".cyan().bold(),
            assessment.stability_score,
            verdict
        ));

        match assessment.correction {
            Some(AssessmentCorrection::BelowThreshold { threshold }) => {
                output.push_str(&format!(
                    "  {}\n",
                    format!(
                        "Chairman claimed convergence below the {:.2} threshold; overridden",
                        threshold
                    )
                    .red()
                ));
            }
            Some(AssessmentCorrection::ForcedConvergence { threshold }) => {
                output.push_str(&format!(
                    "  {}\n",
                    format!(
                        "Score meets the {:.2} threshold; convergence forced by policy",
                        threshold
                    )
                    .yellow()
                ));
            }
            None => {}
        }

        if !assessment.explanation.is_empty() {
            output.push_str(&format!("{}\n", Self::indent(&assessment.explanation, "  ")));
        }

        Self::push_points(
            &mut output,
            &"Consensus:".green().bold().to_string(),
            &assessment.consensus_points,
        );
        Self::push_points(
            &mut output,
            &"Conflicts:".yellow().bold().to_string(),
            &assessment.conflict_points,
        );
        Self::push_points(
            &mut output,
            &"Next questions:".cyan().bold().to_string(),
            assessment.next_questions(),
        );

        output
    }

    /// Format as JSON
    pub fn format_json(result: &DeliberationResult) -> String {
        serde_json::to_string_pretty(result).unwrap_or_else(|_| "{}".to_string())
    }

    /// Format the final answer only (concise output)
    pub fn format_synthesis_only(result: &DeliberationResult) -> String {
        let mut output = String::new();

        output.push_str(&format!(
            "{}\n\n",
            "=== LLM Council Conclusion ===".cyan().bold()
        ));

        output.push_str(&format!("{} {}\n\n", "Q:".bold(), result.question));

        output.push_str(&format!(
            "{} {}\n",
            "Council consulted:".dimmed(),
            Self::join_models(&result.council)
        ));
        output.push_str(&format!("{}\n\n", Self::status_line(result).dimmed()));

        match result.final_text() {
            Some(text) => output.push_str(text),
            None => output.push_str("(no final answer)"),
        }
        output.push('\n');

        output
    }

    /// Format a failed turn, including whatever rounds completed
    pub fn format_failure(error: &RunDeliberationError) -> String {
        let mut output = format!("{} {}\n", "Deliberation failed:".red().bold(), error);

        let completed = error.completed_rounds();
        if !completed.is_empty() {
            output.push_str(&format!(
                "{}\n",
                format!("{} round(s) completed before the failure", completed.len()).dimmed()
            ));
            for round in completed {
                output.push_str(&Self::format_round(round));
            }
        }

        if let RunDeliberationError::EvaluatorFailed {
            partial_round: Some(round),
            ..
        } = error
        {
            output.push_str(&format!(
                "\n{}\n",
                "Responses gathered before the chairman failed:".yellow()
            ));
            output.push_str(&Self::format_round(round));
        }

        output
    }

    fn status_line(result: &DeliberationResult) -> String {
        let metadata = &result.metadata;
        match (metadata.termination, metadata.converged_round) {
            (Termination::Converged, Some(round)) => format!(
                "Converged in round {} (threshold {:.2})",
                round, metadata.threshold
            ),
            _ => format!(
                "Round ceiling reached after {} round(s) without convergence; best-effort answer",
                metadata.rounds_completed
            ),
        }
    }

    fn push_points(output: &mut String, label: &str, points: &[String]) {
        if points.is_empty() {
            return;
        }
        output.push_str(&format!("{}\n", label));
        for point in points {
            output.push_str(&format!("  * {}\n", point));
        }
    }

    fn join_models(models: &[Model]) -> String {
        models
            .iter()
            .map(|m| m.to_string())
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn header(title: &str) -> String {
        let line = "=".repeat(60);
        format!("{}\n{:^60}\n{}", line.cyan(), title.bold(), line.cyan())
    }

    fn section_header(title: &str) -> String {
        format!("\n{}\n{}\n", title.cyan().bold(), "-".repeat(40))
    }

    fn footer() -> String {
        format!("\n{}\n", "=".repeat(60).cyan())
    }

    /// Indent a multi-line string
    pub fn indent(text: &str, prefix: &str) -> String {
        text.lines()
            .map(|line| format!("{}{}", prefix, line))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl OutputFormatter for ConsoleFormatter {
    fn format(&self, result: &DeliberationResult) -> String {
        Self::format(result)
    }

    fn format_json(&self, result: &DeliberationResult) -> String {
        Self::format_json(result)
    }

    fn format_synthesis_only(&self, result: &DeliberationResult) -> String {
        Self::format_synthesis_only(result)
    }
}
