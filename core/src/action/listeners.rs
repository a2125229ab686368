//! Host event handlers.

use tracing::{debug, error, instrument, warn};

use crate::host::{Tab, TabId};

use super::{Action, ActionError, Dispatcher};

impl Dispatcher {
    /// Toolbar button: cancels a running request, otherwise composes.
    #[instrument(skip(self, tab), fields(tab_id = ?tab.id))]
    pub async fn on_compose_action_clicked(&self, tab: &Tab) -> Result<(), ActionError> {
        let tab_id = tab.id.ok_or(ActionError::MissingTabId)?;
        if self.registry.is_running(tab_id) {
            debug!("Button clicked while busy, cancelling.");
            return self.execute_llm_action(Action::Cancel, tab).await;
        }
        self.execute_llm_action(Action::Compose, tab).await
    }

    /// Keyboard command.
    #[instrument(skip(self, tab), fields(tab_id = ?tab.id))]
    pub async fn on_command(&self, command: &str, tab: &Tab) -> Result<(), ActionError> {
        match command.parse::<Action>() {
            Ok(action) => self.execute_llm_action(action, tab).await,
            Err(e) => {
                warn!(error = %e, "Ignoring command.");
                Ok(())
            }
        }
    }

    /// Menu click. Clicks without a tab id are logged and ignored.
    #[instrument(skip(self, tab))]
    pub async fn on_menu_clicked(&self, menu_item_id: &str, tab: Option<&Tab>) -> Result<(), ActionError> {
        let Some(tab) = tab.filter(|tab| tab.id.is_some()) else {
            error!("No tab id found, ignoring \"{menu_item_id}\" menu click");
            return Ok(());
        };
        match menu_item_id.parse::<Action>() {
            Ok(action) => self.execute_llm_action(action, tab).await,
            Err(e) => {
                warn!(error = %e, "Ignoring menu click.");
                Ok(())
            }
        }
    }

    /// New compose window: capture the original conversation and update the
    /// summarize entry.
    #[instrument(skip(self, tab), fields(tab_id = ?tab.id))]
    pub async fn on_tab_created(&self, tab: &Tab) -> Result<(), ActionError> {
        let Some(tab_id) = tab.id else {
            debug!("Created tab has no id.");
            return Ok(());
        };
        let details = self.host.compose.get_compose_details(tab_id).await?;
        self.conversations.store_original_reply_text(tab_id, &details).await?;
        self.ui.update_summarize_entry(tab_id).await;
        Ok(())
    }

    /// Closed compose window: cancel its request and forget its conversation.
    #[instrument(skip(self))]
    pub async fn on_tab_removed(&self, tab_id: TabId) -> Result<(), ActionError> {
        self.registry.abort(tab_id);
        self.conversations.delete(tab_id).await?;
        Ok(())
    }

    pub fn on_alarm(&self, name: &str) -> bool {
        self.keep_alive.handle_alarm(name)
    }

    /// Installs the default menu.
    pub async fn on_startup(&self) {
        self.ui.show_default_menu(true).await;
    }
}
