//! CLI command definitions

use clap::{Parser, ValueEnum};
use council_domain::OutputFormat as DomainOutputFormat;
use std::path::PathBuf;

/// Output format for deliberation results
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Every round, response and assessment
    Full,
    /// Only the final answer
    Synthesis,
    /// The aggregated result as one JSON document
    Json,
    /// One JSON event per line as the deliberation progresses
    Events,
}

impl From<OutputFormat> for DomainOutputFormat {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Full => DomainOutputFormat::Full,
            OutputFormat::Synthesis => DomainOutputFormat::Synthesis,
            OutputFormat::Json => DomainOutputFormat::Json,
            OutputFormat::Events => DomainOutputFormat::Events,
        }
    }
}

/// CLI arguments for llm-council
#[derive(Parser, Debug)]
#[command(name = "llm-council")]
#[command(author, version, about = "LLM Council - models deliberate over rounds until a chairman declares convergence")]
#[command(long_about = r#"
LLM Council puts one question to a council of models and lets them deliberate.

Round 1 (divergent): members answer in turn; each sees the views before it.
Rounds 2+ (convergent): members answer the chairman's open questions in parallel.
After every round the chairman scores how stable the discussion is. The turn
ends when the score reaches the threshold or the round ceiling is hit.

Configuration is merged from (lowest to highest priority):
1. Built-in defaults
2. ~/.config/llm-council/config.toml          Global config
3. ./council.toml or ./.council.toml         Project-level config
4. --config <path>                           Explicit config file
5. COUNCIL_<SECTION>__<KEY>                  Environment variables
6. Command-line flags

Example:
  llm-council "How should a small city store renewable energy?"
  llm-council -m openai/gpt-5.1 -m anthropic/claude-sonnet-4.5 --chairman openai/gpt-5.1 "..."
  llm-council --output events "..." > turn.jsonl
"#)]
pub struct Cli {
    /// The question to put to the council
    pub question: Option<String>,

    /// Council member (can be specified multiple times; order is speaking order)
    #[arg(short, long, value_name = "MODEL")]
    pub model: Vec<String>,

    /// Model that evaluates each round and writes the final answer
    #[arg(long, value_name = "MODEL")]
    pub chairman: Option<String>,

    /// Minimum stability score for convergence, in (0, 1]
    #[arg(long, value_name = "SCORE")]
    pub threshold: Option<f64>,

    /// Round ceiling, divergent round included
    #[arg(long, value_name = "N")]
    pub max_rounds: Option<u32>,

    /// Timeout for each council call, in seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Treat a passing score as converged even if the chairman disagrees
    #[arg(long)]
    pub force_convergence: bool,

    /// Output format (defaults to the configured format, then "synthesis")
    #[arg(short, long, value_enum)]
    pub output: Option<OutputFormat>,

    /// Verbosity level (-v = info, -vv = debug, -vvv = trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress progress indicators
    #[arg(short, long)]
    pub quiet: bool,

    /// Path to configuration file
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Disable loading of configuration files
    #[arg(long)]
    pub no_config: bool,

    /// Show configuration file locations and exit
    #[arg(long)]
    pub show_config: bool,

    /// Also write diagnostic logs to a daily-rolling file in this directory
    #[arg(long, value_name = "DIR")]
    pub log_dir: Option<PathBuf>,

    /// Write the deliberation transcript (JSONL) into this directory
    #[arg(long, value_name = "DIR")]
    pub transcript: Option<PathBuf>,
}

impl Cli {
    /// Output format chosen on the command line, if any
    pub fn output_format(&self) -> Option<DomainOutputFormat> {
        self.output.map(Into::into)
    }
}
