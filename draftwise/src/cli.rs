use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Draftwise: let an LLM draft, title and summarize emails.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Directory holding persistent state (options, cached conversations, exchange logs).
    #[arg(long, global = true, env = "DRAFTWISE_STATE_DIR", default_value = ".draftwise")]
    pub state_dir: PathBuf,

    /// JSON file with option overrides, layered over the stored options.
    #[arg(long, global = true)]
    pub options: Option<PathBuf>,

    /// Chat-completions endpoint URL.
    #[arg(long, global = true, env = "DRAFTWISE_MODEL")]
    pub model: Option<String>,

    /// Bearer token for the endpoint.
    #[arg(long, global = true, env = "DRAFTWISE_API_TOKEN", hide_env_values = true)]
    pub api_token: Option<String>,

    /// Record every LLM request/response pair under `<state-dir>/exchanges`.
    #[arg(long, global = true)]
    pub log_exchanges: bool,

    /// Increase verbosity (use multiple times for more).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors.
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate the body (and a missing subject) of a draft.
    Compose(DraftArgs),
    /// Prepend a summary of the conversation quoted in a reply draft.
    Summarize(DraftArgs),
    /// Print the effective options.
    Options,
}

#[derive(Args, Debug)]
pub struct DraftArgs {
    /// Draft file: compose details, identities and sent history as JSON.
    /// The result is written back to the same file.
    #[arg(long, short)]
    pub draft: PathBuf,

    /// Tab id the draft is presented under. Cached conversations are keyed by it.
    #[arg(long, default_value_t = 1)]
    pub tab_id: u32,
}
