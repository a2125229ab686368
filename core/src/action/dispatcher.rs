use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, info, instrument, warn};

use crate::cancel::CancellationSignal;
use crate::chat::{LlmConnection, LlmMessage, LlmResponse, TextCompletion};
use crate::conversation::OriginalConversationCache;
use crate::host::{ComposeDetails, ComposeDetailsUpdate, Host, Identity, Tab, TabId};
use crate::keep_alive::KeepAlive;
use crate::mail::{first_recipient_address, text_to_html, SentMessageSource};
use crate::notify::Notifier;
use crate::options::{OptionsProvider, PluginOptions};
use crate::prompt::{
    build_email_generation_context, build_email_generation_prompt, build_subject_generation_context,
    build_subject_generation_prompt, build_summary_prompt_and_context, DraftState,
};
use crate::request::RequestStatusRegistry;
use crate::storage::KeyValueStore;
use crate::ui::UiSync;

use super::{Action, ActionError};

/// Runs the user-facing actions against one host.
///
/// Constructed once at startup and shared; all state lives in the registry,
/// the conversation cache and the host.
pub struct Dispatcher {
    pub(super) host: Host,
    connection: Arc<dyn LlmConnection>,
    options: Arc<dyn OptionsProvider>,
    history: Arc<dyn SentMessageSource>,
    pub(super) conversations: OriginalConversationCache,
    pub(super) registry: RequestStatusRegistry,
    pub(super) ui: UiSync,
    notifier: Notifier,
    pub(super) keep_alive: KeepAlive,
}

impl Dispatcher {
    pub fn new(
        host: Host,
        connection: Arc<dyn LlmConnection>,
        options: Arc<dyn OptionsProvider>,
        history: Arc<dyn SentMessageSource>,
        conversation_store: Arc<dyn KeyValueStore>,
    ) -> Self {
        Self {
            ui: UiSync::new(&host),
            notifier: Notifier::new(Arc::clone(&host.notifications)),
            keep_alive: KeepAlive::new(Arc::clone(&host.alarms)),
            conversations: OriginalConversationCache::new(conversation_store),
            registry: RequestStatusRegistry::new(),
            host,
            connection,
            options,
            history,
        }
    }

    /// Overrides how long error notifications stay visible.
    #[must_use]
    pub fn notification_delay(mut self, delay: Duration) -> Self {
        self.notifier = self.notifier.delay(delay);
        self
    }

    pub fn registry(&self) -> &RequestStatusRegistry {
        &self.registry
    }

    pub fn conversations(&self) -> &OriginalConversationCache {
        &self.conversations
    }

    // --- Entry Point ---

    /// Runs `action` for `tab`. Compose and summarize run inside the busy
    /// envelope; cancel aborts the tab's request, if any.
    ///
    /// Errors are returned after they have been surfaced to the user.
    #[instrument(skip(self, tab), fields(tab_id = ?tab.id))]
    pub async fn execute_llm_action(&self, action: Action, tab: &Tab) -> Result<(), ActionError> {
        match action {
            Action::Cancel => {
                if let Some(tab_id) = tab.id {
                    self.registry.abort(tab_id);
                }
                Ok(())
            }
            Action::Compose | Action::Summarize => {
                let tab_id = tab.id.ok_or(ActionError::MissingTabId)?;
                self.with_busy_ui(tab_id, action).await
            }
        }
    }

    /// Busy envelope: mark running, show busy UI, run, notify on failure,
    /// then restore the UI and drop the registry entry whatever happened.
    async fn with_busy_ui(&self, tab_id: TabId, action: Action) -> Result<(), ActionError> {
        let Some(signal) = self.registry.begin(tab_id) else {
            warn!(%tab_id, %action, "A request is already running in this tab, ignoring.");
            return Err(ActionError::AlreadyRunning(tab_id));
        };
        self.keep_alive.start().await;
        self.ui.enter_busy(tab_id).await;

        let result = match action {
            Action::Compose => self.compose(tab_id, &signal).await,
            Action::Summarize => match self.conversations.get(tab_id).await {
                Ok(previous) => self.summarize(tab_id, previous.as_deref(), &signal).await,
                Err(e) => Err(e.into()),
            },
            Action::Cancel => Ok(()),
        };

        match &result {
            Ok(()) => info!(%tab_id, %action, "Action completed."),
            Err(e) if e.is_user_cancellation() => info!(%tab_id, %action, "Action cancelled by user."),
            Err(e) => {
                error!(%tab_id, %action, error = %e, "Action failed.");
                self.notifier.error(&e.to_string()).await;
            }
        }

        self.ui.leave_busy(tab_id).await;
        self.keep_alive.stop().await;
        self.registry.delete_request_status(tab_id);
        result
    }

    // --- Actions ---

    /// Generates the email body (and a subject, if the draft has none) and
    /// writes it into the compose window.
    #[instrument(skip(self, signal))]
    pub async fn compose(&self, tab_id: TabId, signal: &CancellationSignal) -> Result<(), ActionError> {
        let details = self.host.compose.get_compose_details(tab_id).await?;

        let history = match first_recipient_address(&details.to) {
            Some(recipient) => self.history.sent_messages(&recipient).await?,
            None => Vec::new(),
        };
        debug!(history = history.len(), "Loaded sent-mail history.");

        let options = self.options.current_options().await?;
        let signature = self.signature_of(&details).await?;
        let draft = DraftState::new(details.plain_text_body.clone(), signature);
        let previous = self.conversations.get(tab_id).await?;

        let context = build_email_generation_context(&history, &options);
        let prompt = build_email_generation_prompt(&draft, previous.as_deref());

        if details.subject.trim().is_empty() {
            let messages = [
                build_subject_generation_context(&history, &options),
                build_subject_generation_prompt(&draft, None),
            ];
            self.generate_subject(tab_id, &messages, &options, signal).await?;
        }

        match self.connection.send(&[context, prompt], &options, signal).await? {
            LlmResponse::Completion(completion) => self.write_composed_body(tab_id, &completion).await,
            LlmResponse::Error(upstream) => Err(ActionError::Upstream(upstream.error.message)),
        }
    }

    /// Best effort: only cancellation escapes, every other failure is logged.
    async fn generate_subject(
        &self,
        tab_id: TabId,
        messages: &[LlmMessage],
        options: &PluginOptions,
        signal: &CancellationSignal,
    ) -> Result<(), ActionError> {
        let completion = match self.connection.send(messages, options, signal).await {
            Ok(LlmResponse::Completion(completion)) => completion,
            Ok(LlmResponse::Error(upstream)) => {
                warn!(message = %upstream.error.message, "Subject request answered with an error.");
                return Ok(());
            }
            Err(e) if e.is_cancelled() => return Err(e.into()),
            Err(e) => {
                warn!(error = %e, "Subject request failed.");
                return Ok(());
            }
        };
        let Some(subject) = completion.first_content() else {
            warn!("Subject completion had no choices.");
            return Ok(());
        };
        let update = ComposeDetailsUpdate {
            subject: Some(subject.trim().to_string()),
            ..Default::default()
        };
        if let Err(e) = self.host.compose.set_compose_details(tab_id, update).await {
            warn!(error = %e, "Could not set generated subject.");
        }
        Ok(())
    }

    async fn write_composed_body(&self, tab_id: TabId, completion: &TextCompletion) -> Result<(), ActionError> {
        let content = completion.first_content().ok_or(ActionError::EmptyCompletion)?;

        // Re-read: the window may have changed while the request was running.
        let details = self.host.compose.get_compose_details(tab_id).await?;
        let identity = self.require_identity(&details).await?;
        let signature = Some(identity.signature.as_str()).filter(|s| !s.is_empty());
        let original = self.conversations.get(tab_id).await?;

        let generated = match signature {
            Some(signature) => content.replacen(signature, "", 1),
            None => content.to_string(),
        };
        let mut email = generated.trim_start().to_string();
        match (original.as_deref(), signature) {
            (Some(original), _) => {
                email.push_str("\n\n");
                email.push_str(original);
            }
            (None, Some(signature)) => {
                email.push_str("\n\n--\n");
                email.push_str(signature);
            }
            (None, None) => {}
        }

        let update = if details.is_plain_text {
            ComposeDetailsUpdate {
                plain_text_body: Some(email),
                ..Default::default()
            }
        } else {
            ComposeDetailsUpdate {
                body: Some(text_to_html(&email)),
                ..Default::default()
            }
        };
        self.host.compose.set_compose_details(tab_id, update).await?;
        Ok(())
    }

    /// Summarizes `previous_conversation` and puts the summary above it.
    #[instrument(skip(self, previous_conversation, signal))]
    pub async fn summarize(
        &self,
        tab_id: TabId,
        previous_conversation: Option<&str>,
        signal: &CancellationSignal,
    ) -> Result<(), ActionError> {
        let messages = build_summary_prompt_and_context(previous_conversation)?;
        let previous = previous_conversation.unwrap_or_default();
        let options = self.options.current_options().await?;

        match self.connection.send(&messages, &options, signal).await? {
            LlmResponse::Completion(completion) => {
                let summary = completion.first_content().ok_or(ActionError::EmptyCompletion)?;
                let update = ComposeDetailsUpdate {
                    plain_text_body: Some(format!("{summary}\n\n\n\n{previous}")),
                    ..Default::default()
                };
                self.host.compose.set_compose_details(tab_id, update).await?;
                Ok(())
            }
            LlmResponse::Error(upstream) => Err(ActionError::SummaryUpstream(upstream.error.message)),
        }
    }

    // --- Identities ---

    async fn signature_of(&self, details: &ComposeDetails) -> Result<Option<String>, ActionError> {
        let Some(identity_id) = details.identity_id.as_deref() else {
            return Ok(None);
        };
        let identity = self.host.identities.get_identity(identity_id).await?;
        Ok(identity.map(|identity| identity.signature).filter(|s| !s.is_empty()))
    }

    async fn require_identity(&self, details: &ComposeDetails) -> Result<Identity, ActionError> {
        let identity_id = details.identity_id.clone().unwrap_or_default();
        if identity_id.is_empty() {
            return Err(ActionError::IdentityNotFound(identity_id));
        }
        let identity = self.host.identities.get_identity(&identity_id).await?;
        identity.ok_or(ActionError::IdentityNotFound(identity_id))
    }
}
