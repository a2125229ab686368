use anyhow::Result;
use clap::Parser;
use draftwise::cli::{Cli, Commands};
use draftwise::{commands, AppContext};
use draftwise_core::action::Action;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet);

    let cx = AppContext::from_cli(&cli).await?;

    match cli.command {
        Commands::Compose(args) => commands::handle_draft_action(Action::Compose, args, &cx).await,
        Commands::Summarize(args) => commands::handle_draft_action(Action::Summarize, args, &cx).await,
        Commands::Options => commands::handle_options(&cx).await,
    }
}

/// `RUST_LOG` wins over the verbosity flags.
fn init_tracing(verbose: u8, quiet: bool) {
    let level = match (quiet, verbose) {
        (true, _) => "error",
        (false, 0) => "warn",
        (false, 1) => "info",
        (false, 2) => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_timer(tracing_subscriber::fmt::time::uptime())
        .with_target(verbose > 2)
        .init();
}
