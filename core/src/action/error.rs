use thiserror::Error;

use crate::chat::LlmError;
use crate::host::{HostError, TabId};
use crate::options::OptionsError;
use crate::prompt::PromptError;
use crate::storage::StoreError;

/// Failure of a user-facing action. Displayed verbatim in notifications.
#[derive(Error, Debug)]
pub enum ActionError {
    /// The LLM answered the compose request with an error payload.
    #[error("LLM responded with an error: {0}")]
    Upstream(String),

    /// The LLM answered the summarize request with an error payload.
    #[error("LLM while attempting to summarize responded with an error: {0}")]
    SummaryUpstream(String),

    /// The completion carried no choices.
    #[error("LLM returned a completion without any choices")]
    EmptyCompletion,

    #[error("No tab id found")]
    MissingTabId,

    /// The compose window refers to an identity the host does not know.
    #[error("Could not find an identity for ID '{0}'")]
    IdentityNotFound(String),

    /// A second action was requested while one is still running.
    #[error("A request is already running in tab {0}")]
    AlreadyRunning(TabId),

    #[error(transparent)]
    Prompt(#[from] PromptError),

    #[error(transparent)]
    Llm(#[from] LlmError),

    #[error(transparent)]
    Host(#[from] HostError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Options(#[from] OptionsError),
}

impl ActionError {
    /// Whether the action ended because the user cancelled it.
    pub fn is_user_cancellation(&self) -> bool {
        matches!(self, ActionError::Llm(error) if error.is_cancelled())
    }
}
