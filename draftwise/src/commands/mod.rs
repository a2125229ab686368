use std::sync::Arc;

use anyhow::Result;
use console::style;
use draftwise_core::action::{Action, ActionError, Dispatcher};
use draftwise_core::host::{Tab, TabId};
use draftwise_core::options::OptionsProvider;
use draftwise_extensions::llm::HttpLlmConnection;
use tracing::{info, warn};

use crate::cli::DraftArgs;
use crate::host::{DraftFile, FileHost};
use crate::options::display_options;
use crate::AppContext;

// --- Handler Functions ---

/// Runs compose or summarize against a draft file and writes the result back.
pub async fn handle_draft_action(action: Action, args: DraftArgs, cx: &AppContext) -> Result<()> {
    let draft = DraftFile::load(&args.draft).await?;
    let tab_id = TabId(args.tab_id);
    let tab = Tab::with_id(tab_id);

    let file_host = Arc::new(FileHost::new(tab_id, draft).quiet(cx.quiet));
    let mut connection = HttpLlmConnection::new()?;
    if let Some(dir) = &cx.exchange_dir {
        connection = connection.exchange_log(dir);
    }
    let dispatcher = Arc::new(Dispatcher::new(
        file_host.host(),
        Arc::new(connection),
        cx.options.clone(),
        file_host.clone(),
        cx.store.clone(),
    ));

    dispatcher.on_startup().await;
    dispatcher.on_tab_created(&tab).await?;

    let outcome = run_interruptible(&dispatcher, action, &tab).await?;

    // Closing the "window" drops its cached conversation.
    dispatcher.on_tab_removed(tab_id).await?;

    match outcome {
        Ok(()) => {
            file_host.draft().save(&args.draft).await?;
            if !cx.quiet {
                eprintln!("{} {} written to {}", style("✓").green(), action, args.draft.display());
            }
            Ok(())
        }
        Err(e) if e.is_user_cancellation() => {
            if !cx.quiet {
                eprintln!("{} {} cancelled, draft left unchanged", style("✗").yellow(), action);
            }
            Ok(())
        }
        // Already shown to the user as a notification.
        Err(_) => anyhow::bail!("{action} failed"),
    }
}

/// Races the action against Ctrl-C, which triggers the cancel action.
async fn run_interruptible(
    dispatcher: &Arc<Dispatcher>,
    action: Action,
    tab: &Tab,
) -> Result<Result<(), ActionError>> {
    let mut task = {
        let dispatcher = dispatcher.clone();
        let tab = tab.clone();
        tokio::spawn(async move { dispatcher.execute_llm_action(action, &tab).await })
    };

    tokio::select! {
        joined = &mut task => return Ok(joined?),
        interrupt = tokio::signal::ctrl_c() => {
            if let Err(e) = interrupt {
                warn!(error = %e, "Could not listen for Ctrl-C.");
            } else {
                info!("Interrupted, cancelling request.");
                dispatcher.execute_llm_action(Action::Cancel, tab).await?;
            }
        }
    }
    Ok(task.await?)
}

pub async fn handle_options(cx: &AppContext) -> Result<()> {
    let options = cx.options.current_options().await?;
    println!("{}", display_options(&options)?);
    Ok(())
}
