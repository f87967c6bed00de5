//! CLI command definitions

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Output format for council results
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Answer, confidence, agreement map, model responses and trace
    Full,
    /// Only the final answer
    Answer,
    /// The whole run state as JSON
    Json,
}

impl From<OutputFormat> for council_domain::OutputFormat {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Full => council_domain::OutputFormat::Full,
            OutputFormat::Answer => council_domain::OutputFormat::Answer,
            OutputFormat::Json => council_domain::OutputFormat::Json,
        }
    }
}

/// Subcommands that inspect state instead of running a council
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// List saved conversations, newest first
    History {
        /// Show at most this many entries
        #[arg(short, long, value_name = "N")]
        limit: Option<usize>,
    },
    /// Show a saved conversation
    Show {
        /// Conversation id as printed by `history`
        id: String,
    },
    /// Show which providers have credentials and their models
    Providers,
}

/// CLI arguments for consensus-council
#[derive(Parser, Debug)]
#[command(name = "consensus-council")]
#[command(author, version, about = "Ask several LLMs, cross-check their claims, get one answer")]
#[command(long_about = r#"
consensus-council asks several LLMs the same question and builds one answer
with a confidence score out of what they agree on.

The run has nine stages:
1. Normalize the query and infer its constraints
2. Lock the constraints behind a hash
3. Query up to four models in parallel
4. Extract atomic claims from every answer
5. Let models review each other's answers anonymously
6. Cluster claims by topic
7. Score each cluster's confidence
8. Have a chairman model synthesize the final answer
9. Save the conversation

API keys are read from the config file or from OPENROUTER_API_KEY,
GROQ_API_KEY and OPENAI_API_KEY. Without any key the run still completes
with deterministic fallbacks.

Configuration files are loaded from (in priority order):
1. --config <path>     Explicit config file
2. ./council.toml      Project-level config
3. ~/.config/consensus-council/config.toml   Global config

Example:
  consensus-council "What's the best way to handle errors in Rust?"
  consensus-council -n 2 -o answer "Build a React app"
  consensus-council history
  consensus-council show 1b4e28ba-2fa1-11d2-883f-0016d3cca427
"#)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// The question to ask the council
    pub query: Option<String>,

    /// Number of models to query (clamped to 1-4)
    #[arg(short = 'n', long, value_name = "COUNT")]
    pub model_count: Option<usize>,

    /// Provider for normalization, review and synthesis (openrouter, groq, openai)
    #[arg(short, long, value_name = "PROVIDER")]
    pub provider: Option<String>,

    /// Output format
    #[arg(short, long, value_enum)]
    pub output: Option<OutputFormat>,

    /// Verbosity level (-v = info, -vv = debug, -vvv = trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress progress indicators
    #[arg(short, long)]
    pub quiet: bool,

    /// Do not save the conversation
    #[arg(long)]
    pub no_save: bool,

    /// Path to configuration file
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Disable loading of configuration files
    #[arg(long, global = true)]
    pub no_config: bool,

    /// Show configuration file locations and exit
    #[arg(long)]
    pub show_config: bool,
}

impl Cli {
    /// The query with surrounding whitespace removed, `None` when absent or
    /// blank.
    pub fn query_text(&self) -> Option<&str> {
        self.query.as_deref().map(str::trim).filter(|q| !q.is_empty())
    }
}
