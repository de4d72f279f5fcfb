//! Progress reporting for deliberation execution

use colored::Colorize;
use council_application::ports::progress::ProgressNotifier;
use council_domain::{DeliberationResult, Model, Phase, Round, TurnFailure};
use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::sync::Mutex;

/// Reports progress during a deliberation with one bar per round
pub struct ProgressReporter {
    multi: MultiProgress,
    council_size: Mutex<usize>,
    round_bar: Mutex<Option<ProgressBar>>,
}

impl ProgressReporter {
    pub fn new() -> Self {
        Self::with_multi(MultiProgress::new())
    }

    /// Reporter that tracks state without drawing anything
    pub fn hidden() -> Self {
        Self::with_multi(MultiProgress::with_draw_target(ProgressDrawTarget::hidden()))
    }

    fn with_multi(multi: MultiProgress) -> Self {
        Self {
            multi,
            council_size: Mutex::new(0),
            round_bar: Mutex::new(None),
        }
    }

    fn round_style() -> ProgressStyle {
        ProgressStyle::default_bar()
            .template("{spinner:.green} {prefix:.bold.cyan} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=>-")
    }

    fn round_label(round: u32, phase: Phase) -> String {
        format!("Round {} ({})", round, phase.display_name())
    }

    fn council_size(&self) -> usize {
        self.council_size.lock().map(|size| *size).unwrap_or(0)
    }

    /// Position and length of the active round bar
    pub fn active_round(&self) -> Option<(u64, u64)> {
        let guard = self.round_bar.lock().ok()?;
        guard
            .as_ref()
            .map(|pb| (pb.position(), pb.length().unwrap_or(0)))
    }
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressNotifier for ProgressReporter {
    fn on_turn_start(&self, council: &[Model], _chairman: &Model) {
        if let Ok(mut size) = self.council_size.lock() {
            *size = council.len();
        }
    }

    fn on_round_start(&self, round: u32, phase: Phase) {
        let pb = self.multi.add(ProgressBar::new(self.council_size() as u64));
        pb.set_style(Self::round_style());
        pb.set_prefix(Self::round_label(round, phase));
        pb.set_message("Waiting for the council...");

        if let Ok(mut bar) = self.round_bar.lock() {
            *bar = Some(pb);
        }
    }

    fn on_model_complete(&self, _round: u32, model: &Model, success: bool) {
        let Ok(bar) = self.round_bar.lock() else {
            return;
        };
        if let Some(pb) = bar.as_ref() {
            pb.inc(1);
            if pb.length().is_some_and(|len| pb.position() >= len) {
                pb.set_message("Chairman is evaluating...".to_string());
            } else if success {
                pb.set_message(format!("{} {}", "v".green(), model));
            } else {
                pb.set_message(format!("{} {}", "x".red(), model));
            }
        }
    }

    fn on_round_complete(&self, round: &Round) {
        let Ok(mut bar) = self.round_bar.lock() else {
            return;
        };
        if let Some(pb) = bar.take() {
            let message = match &round.chairman_assessment {
                Some(a) if a.is_converged => {
                    format!("stability {:.2}, {}", a.stability_score, "converged".green())
                }
                Some(a) => format!(
                    "stability {:.2}, {}",
                    a.stability_score,
                    "continuing".yellow()
                ),
                None => "complete".to_string(),
            };
            pb.finish_with_message(message);
        }
    }

    fn on_turn_complete(&self, _result: &DeliberationResult) {
        let _ = self.multi.clear();
    }

    fn on_turn_failed(&self, failure: &TurnFailure) {
        if let Ok(mut bar) = self.round_bar.lock()
            && let Some(pb) = bar.take()
        {
            pb.abandon_with_message(format!("{} {}", "failed:".red(), failure.kind));
        }
    }
}

/// Simple text-based progress (no fancy UI), written to stderr
pub struct SimpleProgress;

impl ProgressNotifier for SimpleProgress {
    fn on_round_start(&self, round: u32, phase: Phase) {
        eprintln!(
            "{} {}",
            "->".cyan(),
            ProgressReporter::round_label(round, phase).bold()
        );
    }

    fn on_model_complete(&self, _round: u32, model: &Model, success: bool) {
        if success {
            eprintln!("  {} {}", "v".green(), model);
        } else {
            eprintln!("  {} {} (failed)", "x".red(), model);
        }
    }

    fn on_round_complete(&self, round: &Round) {
        if let Some(a) = &round.chairman_assessment {
            eprintln!(
                "  {} stability {:.2}, converged {}",
                "chairman:".cyan(),
                a.stability_score,
                a.is_converged
            );
        }
        eprintln!();
    }
}
