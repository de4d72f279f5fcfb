//! CLI entrypoint for LLM Council
//!
//! This is the main binary that wires together all layers using
//! dependency injection.

use anyhow::{Context, Result, anyhow, bail};
use clap::Parser;
use colored::Colorize;
use council_application::{
    ConversationLogger, NoProgress, ProgressNotifier, RunDeliberationError, RunDeliberationInput,
    RunDeliberationUseCase,
};
use council_domain::{
    Conversation, DeliberationEvent, DeliberationResult, HighScorePolicy, OutputFormat, Question,
    TurnFailureKind,
};
use council_infrastructure::{ConfigLoader, FileConfig, JsonlConversationLogger, OpenRouterGateway};
use council_presentation::{Cli, ConsoleFormatter, EventLineWriter, ProgressReporter};
use futures::StreamExt;
use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Exit code for a turn interrupted with Ctrl-C
const EXIT_CANCELLED: u8 = 130;

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // Held for the process lifetime so buffered file logs are flushed
    let _log_guard = init_logging(cli.verbose, cli.log_dir.as_deref())?;

    if cli.show_config {
        ConfigLoader::print_config_sources(cli.config.as_deref());
        return Ok(ExitCode::SUCCESS);
    }

    info!("Starting LLM Council");

    // === Configuration ===
    let mut file_config = if cli.no_config {
        ConfigLoader::load_defaults()
    } else {
        ConfigLoader::load(cli.config.as_deref())
            .map_err(|e| anyhow!("failed to load configuration: {e}"))?
    };
    apply_cli_overrides(&mut file_config, &cli);

    let issues = file_config.validate();
    for issue in issues.iter().filter(|i| !i.is_error()) {
        eprintln!("{} {}", "warning:".yellow().bold(), issue.message);
    }
    let council_config = file_config.to_council_config()?;

    let format = cli
        .output_format()
        .or(file_config.output.parse_format().0)
        .unwrap_or_default();
    if !file_config.output.color {
        colored::control::set_override(false);
    }

    let question = match cli.question.as_deref().and_then(Question::try_new) {
        Some(q) => q,
        None => bail!("A question is required, e.g. llm-council \"How should we store energy?\""),
    };

    // === Dependency Injection ===
    let gateway = Arc::new(
        OpenRouterGateway::from_config(&file_config.provider)
            .context("could not set up the model provider")?,
    );

    let cancellation = CancellationToken::new();
    spawn_ctrl_c_handler(cancellation.clone());

    let mut conversation = Conversation::new();
    conversation.append_user(question.content());

    let mut use_case = RunDeliberationUseCase::new(gateway).with_cancellation(cancellation);
    let transcript_dir = cli
        .transcript
        .clone()
        .or_else(|| file_config.logging.transcript_dir());
    if let Some(dir) = transcript_dir {
        match JsonlConversationLogger::for_conversation(&dir, &conversation) {
            Some(logger) => {
                info!("Writing transcript to {}", logger.path().display());
                let logger: Arc<dyn ConversationLogger> = Arc::new(logger);
                use_case = use_case.with_logger(logger);
            }
            None => warn!("Transcript disabled: could not write to {}", dir.display()),
        }
    }

    let input = council_config.to_input(question);

    let outcome = match format {
        OutputFormat::Events => run_events(&use_case, input).await?,
        _ => run_console(&use_case, input, format, cli.quiet).await,
    };

    match outcome {
        Ok(result) => {
            conversation.append_turn(result);
            debug!(
                "Conversation {} now holds {} messages",
                conversation.id,
                conversation.len()
            );
            Ok(ExitCode::SUCCESS)
        }
        Err(error) if error.is_cancelled() => {
            eprintln!("{}", "Deliberation cancelled".yellow());
            Ok(ExitCode::from(EXIT_CANCELLED))
        }
        Err(_) => Ok(ExitCode::FAILURE),
    }
}

/// Install the tracing subscriber: stderr always, plus a daily-rolling file
/// when `log_dir` is given. `RUST_LOG` overrides the `-v` level.
fn init_logging(verbose: u8, log_dir: Option<&Path>) -> Result<Option<WorkerGuard>> {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace", // -vvv or more
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false);

    let (file_layer, guard) = match log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("could not create log directory {}", dir.display()))?;
            let appender = tracing_appender::rolling::daily(dir, "llm-council.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer().with_writer(writer).with_ansi(false);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer)
        .init();

    Ok(guard)
}

/// CLI flags take precedence over every configuration source.
fn apply_cli_overrides(config: &mut FileConfig, cli: &Cli) {
    if !cli.model.is_empty() {
        config.council.models = Some(cli.model.clone());
    }
    if let Some(chairman) = &cli.chairman {
        config.council.chairman = Some(chairman.clone());
    }
    if let Some(threshold) = cli.threshold {
        config.convergence.threshold = threshold;
    }
    if let Some(max_rounds) = cli.max_rounds {
        config.convergence.max_rounds = max_rounds;
    }
    if let Some(timeout) = cli.timeout {
        config.provider.timeout_secs = timeout;
    }
    if cli.force_convergence {
        config.convergence.high_score_policy = HighScorePolicy::ForceConvergence.to_string();
    }
}

fn spawn_ctrl_c_handler(token: CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, cancelling deliberation");
            token.cancel();
        }
    });
}

/// Print every event as one JSON line on stdout.
async fn run_events(
    use_case: &RunDeliberationUseCase<OpenRouterGateway>,
    input: RunDeliberationInput,
) -> Result<Result<DeliberationResult, RunDeliberationError>> {
    let stdout = std::io::stdout();
    let mut writer = EventLineWriter::new(stdout.lock());
    let mut events = use_case.stream(input);
    let mut outcome = Err(RunDeliberationError::StreamClosed);

    while let Some(event) = events.next().await {
        writer
            .write_event(&event)
            .context("could not write event to stdout")?;
        match event {
            DeliberationEvent::Complete(result) => outcome = Ok(result),
            DeliberationEvent::Error(failure) => {
                if failure.kind == TurnFailureKind::Cancelled {
                    info!("Deliberation cancelled");
                }
                outcome = Err(failure.into());
            }
            _ => {}
        }
    }

    Ok(outcome)
}

/// Run with a progress display and print the formatted result.
async fn run_console(
    use_case: &RunDeliberationUseCase<OpenRouterGateway>,
    input: RunDeliberationInput,
    format: OutputFormat,
    quiet: bool,
) -> Result<DeliberationResult, RunDeliberationError> {
    let show_progress = !quiet && !format.is_machine_readable();

    if show_progress {
        print_header(&input);
    }

    let progress: Box<dyn ProgressNotifier> = if show_progress {
        Box::new(ProgressReporter::new())
    } else {
        Box::new(NoProgress)
    };

    let outcome = use_case
        .execute_with_progress(input, progress.as_ref())
        .await;

    match &outcome {
        Ok(result) => {
            let output = match format {
                OutputFormat::Full => ConsoleFormatter::format(result),
                OutputFormat::Json => ConsoleFormatter::format_json(result),
                _ => ConsoleFormatter::format_synthesis_only(result),
            };
            println!("{}", output);
        }
        Err(error) if !error.is_cancelled() => {
            eprintln!("{}", ConsoleFormatter::format_failure(error));
        }
        Err(_) => {}
    }

    outcome
}

fn print_header(input: &RunDeliberationInput) {
    eprintln!();
    eprintln!("+============================================================+");
    eprintln!("|                  LLM Council Deliberation                  |");
    eprintln!("+============================================================+");
    eprintln!();
    eprintln!("Question: {}", input.question);
    eprintln!(
        "Council:  {}",
        input
            .models
            .council
            .iter()
            .map(|m| m.to_string())
            .collect::<Vec<_>>()
            .join(", ")
    );
    eprintln!("Chairman: {}", input.models.chairman);
    eprintln!(
        "Converge at stability >= {:.2}, at most {} rounds",
        input.policy.threshold(),
        input.policy.max_rounds()
    );
    eprintln!();
}
