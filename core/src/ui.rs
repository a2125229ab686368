//! Reflects the request state of a tab onto the compose button and menu.
//!
//! Every host call made here is best-effort: failures are logged and never
//! change the outcome of the action being performed.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, info, instrument, warn};

use crate::action::Action;
use crate::host::{ComposeActionApi, ComposeApi, ComposeType, CommandApi, Host, HostError, IconPaths, MenuApi, MenuEntry, TabId};

pub const LOADING_ICON: (u32, &str) = (32, "icons/loader-32px.gif");
pub const DEFAULT_ICON: (u32, &str) = (64, "icons/icon-64px.png");
pub const CANCEL_TITLE: &str = "Cancel Request";
pub const MENU_CONTEXT: &str = "compose_action_menu";

fn icon(entry: (u32, &str)) -> IconPaths {
    IconPaths::from([(entry.0, entry.1.to_string())])
}

fn menu_entry(action: Action, title: &str) -> MenuEntry {
    MenuEntry {
        id: action.as_str().to_string(),
        title: title.to_string(),
        contexts: vec![MENU_CONTEXT.to_string()],
        enabled: true,
    }
}

/// Menu shown while idle: summarize, then compose.
pub fn default_menu_entries(summarize_enabled: bool) -> Vec<MenuEntry> {
    let mut summarize = menu_entry(Action::Summarize, "Summarize");
    summarize.enabled = summarize_enabled;
    vec![summarize, menu_entry(Action::Compose, "Compose")]
}

pub fn cancel_menu_entry() -> MenuEntry {
    menu_entry(Action::Cancel, CANCEL_TITLE)
}

fn log_failure(operation: &str, result: Result<(), HostError>) {
    if let Err(error) = result {
        warn!(operation, %error, "UI update failed.");
    }
}

pub struct UiSync {
    compose: Arc<dyn ComposeApi>,
    compose_action: Arc<dyn ComposeActionApi>,
    menus: Arc<dyn MenuApi>,
    commands: Arc<dyn CommandApi>,
}

impl UiSync {
    pub fn new(host: &Host) -> Self {
        Self {
            compose: Arc::clone(&host.compose),
            compose_action: Arc::clone(&host.compose_action),
            menus: Arc::clone(&host.menus),
            commands: Arc::clone(&host.commands),
        }
    }

    /// Busy presentation: loading icon, cancel title, cancel-only menu.
    #[instrument(skip(self))]
    pub async fn enter_busy(&self, tab_id: TabId) {
        if self.compose_action.supports_per_tab_disable() {
            log_failure("disable", self.compose_action.disable(tab_id).await);
        }
        log_failure("set_icon", self.compose_action.set_icon(tab_id, &icon(LOADING_ICON)).await);
        log_failure("set_title", self.compose_action.set_title(tab_id, CANCEL_TITLE).await);
        self.show_cancel_menu().await;
    }

    /// Idle presentation: default icon and title, default menu.
    #[instrument(skip(self))]
    pub async fn leave_busy(&self, tab_id: TabId) {
        log_failure("set_icon", self.compose_action.set_icon(tab_id, &icon(DEFAULT_ICON)).await);
        let title = self.compose_action.default_title();
        log_failure("set_title", self.compose_action.set_title(tab_id, &title).await);
        log_failure("enable", self.compose_action.enable(tab_id).await);
        let summarize_enabled = self.is_reply(tab_id).await;
        self.show_default_menu(summarize_enabled).await;
    }

    pub async fn show_cancel_menu(&self) {
        debug!("Replacing menu with cancel entry.");
        log_failure("remove_all", self.menus.remove_all().await);
        let shortcuts = self.shortcuts().await;
        self.add_menu_entry(cancel_menu_entry(), &shortcuts).await;
    }

    pub async fn show_default_menu(&self, summarize_enabled: bool) {
        debug!(summarize_enabled, "Rebuilding default menu.");
        log_failure("remove_all", self.menus.remove_all().await);
        let shortcuts = self.shortcuts().await;
        for entry in default_menu_entries(summarize_enabled) {
            self.add_menu_entry(entry, &shortcuts).await;
        }
    }

    /// Enables the summarize entry only for reply windows.
    pub async fn update_summarize_entry(&self, tab_id: TabId) {
        let enabled = self.is_reply(tab_id).await;
        log_failure("set_enabled", self.menus.set_enabled(Action::Summarize.as_str(), enabled).await);
    }

    async fn is_reply(&self, tab_id: TabId) -> bool {
        match self.compose.get_compose_details(tab_id).await {
            Ok(details) => details.compose_type == ComposeType::Reply,
            Err(error) => {
                warn!(%tab_id, %error, "Could not read compose type.");
                false
            }
        }
    }

    async fn shortcuts(&self) -> HashMap<String, String> {
        match self.commands.shortcuts().await {
            Ok(commands) => commands
                .into_iter()
                .filter_map(|command| command.shortcut.filter(|s| !s.is_empty()).map(|s| (command.name, s)))
                .collect(),
            Err(error) => {
                warn!(%error, "Could not read keyboard shortcuts.");
                HashMap::new()
            }
        }
    }

    async fn add_menu_entry(&self, mut entry: MenuEntry, shortcuts: &HashMap<String, String>) {
        if let Some(shortcut) = shortcuts.get(&entry.id) {
            entry.title = format!("{} ({shortcut})", entry.title);
        }
        match self.menus.create(&entry).await {
            Ok(()) => debug!(id = %entry.id, title = %entry.title, "Menu entry created."),
            Err(HostError::AlreadyExists(id)) => info!(%id, "Menu entry exists already and was not added again."),
            Err(error) => warn!(id = %entry.id, %error, "Failed to create menu entry."),
        }
    }
}
