//! A headless host: one compose window backed by a JSON draft file.

use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use anyhow::Context;
use async_trait::async_trait;
use console::style;
use draftwise_core::host::{
    AlarmApi, CommandApi, CommandShortcut, ComposeActionApi, ComposeApi, ComposeDetails, ComposeDetailsUpdate,
    Host, HostError, IconPaths, Identity, IdentityApi, MenuApi, MenuEntry, NotificationApi, TabId,
};
use draftwise_core::mail::SentMessageSource;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

pub const DEFAULT_TITLE: &str = "Draftwise";

/// On-disk draft: the compose window plus what the mail client would know.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct DraftFile {
    pub details: ComposeDetails,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub identities: Vec<Identity>,
    /// Bodies of earlier mails sent to the recipient, newest first.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub sent: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub shortcuts: Vec<CommandShortcut>,
}

impl DraftFile {
    pub async fn load(path: &Path) -> anyhow::Result<Self> {
        let text = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read draft file {}", path.display()))?;
        serde_json::from_str(&text).with_context(|| format!("Malformed draft file {}", path.display()))
    }

    pub async fn save(&self, path: &Path) -> anyhow::Result<()> {
        let text = serde_json::to_string_pretty(self)?;
        tokio::fs::write(path, text)
            .await
            .with_context(|| format!("Failed to write draft file {}", path.display()))
    }
}

#[derive(Debug, Default)]
struct WindowState {
    enabled: bool,
    title: String,
    menu: Vec<MenuEntry>,
}

/// Host with a single compose window at `tab_id`.
pub struct FileHost {
    tab_id: TabId,
    draft: Mutex<DraftFile>,
    window: Mutex<WindowState>,
    next_notification: AtomicU64,
    quiet: bool,
}

impl FileHost {
    pub fn new(tab_id: TabId, draft: DraftFile) -> Self {
        Self {
            tab_id,
            draft: Mutex::new(draft),
            window: Mutex::new(WindowState {
                enabled: true,
                title: DEFAULT_TITLE.to_string(),
                menu: Vec::new(),
            }),
            next_notification: AtomicU64::new(1),
            quiet: false,
        }
    }

    /// Suppresses progress output; notifications still reach stderr.
    #[must_use]
    pub fn quiet(mut self, quiet: bool) -> Self {
        self.quiet = quiet;
        self
    }

    pub fn host(self: &Arc<Self>) -> Host {
        Host {
            compose: self.clone(),
            identities: self.clone(),
            notifications: self.clone(),
            compose_action: self.clone(),
            menus: self.clone(),
            commands: self.clone(),
            alarms: self.clone(),
        }
    }

    pub fn draft(&self) -> DraftFile {
        self.draft.lock().clone()
    }

    pub fn menu_ids(&self) -> Vec<String> {
        self.window.lock().menu.iter().map(|entry| entry.id.clone()).collect()
    }

    pub fn is_enabled(&self) -> bool {
        self.window.lock().enabled
    }

    pub fn title(&self) -> String {
        self.window.lock().title.clone()
    }

    fn check_tab(&self, tab_id: TabId) -> Result<(), HostError> {
        if tab_id == self.tab_id {
            Ok(())
        } else {
            Err(HostError::UnknownTab(tab_id))
        }
    }

    fn progress(&self, message: &str) {
        if !self.quiet {
            eprintln!("{} {}", style("›").dim(), style(message).dim());
        }
    }
}

#[async_trait]
impl ComposeApi for FileHost {
    async fn get_compose_details(&self, tab_id: TabId) -> Result<ComposeDetails, HostError> {
        self.check_tab(tab_id)?;
        Ok(self.draft.lock().details.clone())
    }

    async fn set_compose_details(&self, tab_id: TabId, update: ComposeDetailsUpdate) -> Result<(), HostError> {
        self.check_tab(tab_id)?;
        let mut draft = self.draft.lock();
        if let Some(subject) = update.subject {
            self.progress(&format!("Subject: {subject}"));
            draft.details.subject = subject;
        }
        if let Some(body) = update.plain_text_body {
            draft.details.plain_text_body = body;
        }
        if let Some(body) = update.body {
            draft.details.body = Some(body);
        }
        Ok(())
    }
}

#[async_trait]
impl IdentityApi for FileHost {
    async fn get_identity(&self, identity_id: &str) -> Result<Option<Identity>, HostError> {
        Ok(self.draft.lock().identities.iter().find(|identity| identity.id == identity_id).cloned())
    }
}

#[async_trait]
impl NotificationApi for FileHost {
    async fn create_notification(&self, title: &str, message: &str) -> Result<String, HostError> {
        let id = self.next_notification.fetch_add(1, Ordering::Relaxed);
        eprintln!("{} {}", style(format!("{title}:")).red().bold(), message);
        Ok(format!("notification-{id}"))
    }

    async fn clear_notification(&self, notification_id: &str) -> Result<(), HostError> {
        debug!(notification_id, "Notification cleared.");
        Ok(())
    }
}

#[async_trait]
impl ComposeActionApi for FileHost {
    async fn set_icon(&self, tab_id: TabId, icons: &IconPaths) -> Result<(), HostError> {
        self.check_tab(tab_id)?;
        debug!(?icons, "Icon changed.");
        Ok(())
    }

    async fn set_title(&self, tab_id: TabId, title: &str) -> Result<(), HostError> {
        self.check_tab(tab_id)?;
        let mut window = self.window.lock();
        if window.title != title {
            self.progress(title);
            window.title = title.to_string();
        }
        Ok(())
    }

    async fn enable(&self, tab_id: TabId) -> Result<(), HostError> {
        self.check_tab(tab_id)?;
        self.window.lock().enabled = true;
        Ok(())
    }

    async fn disable(&self, tab_id: TabId) -> Result<(), HostError> {
        self.check_tab(tab_id)?;
        self.window.lock().enabled = false;
        Ok(())
    }

    fn supports_per_tab_disable(&self) -> bool {
        true
    }

    fn default_title(&self) -> String {
        DEFAULT_TITLE.to_string()
    }
}

#[async_trait]
impl MenuApi for FileHost {
    async fn remove_all(&self) -> Result<(), HostError> {
        self.window.lock().menu.clear();
        Ok(())
    }

    async fn create(&self, entry: &MenuEntry) -> Result<(), HostError> {
        let mut window = self.window.lock();
        if window.menu.iter().any(|existing| existing.id == entry.id) {
            return Err(HostError::AlreadyExists(entry.id.clone()));
        }
        window.menu.push(entry.clone());
        Ok(())
    }

    async fn set_enabled(&self, entry_id: &str, enabled: bool) -> Result<(), HostError> {
        let mut window = self.window.lock();
        let entry = window
            .menu
            .iter_mut()
            .find(|entry| entry.id == entry_id)
            .ok_or_else(|| HostError::Api(format!("No menu entry '{entry_id}'")))?;
        entry.enabled = enabled;
        Ok(())
    }
}

#[async_trait]
impl CommandApi for FileHost {
    async fn shortcuts(&self) -> Result<Vec<CommandShortcut>, HostError> {
        Ok(self.draft.lock().shortcuts.clone())
    }
}

#[async_trait]
impl AlarmApi for FileHost {
    async fn create_alarm(&self, name: &str, period_minutes: f64) -> Result<(), HostError> {
        debug!(name, period_minutes, "Alarm created.");
        Ok(())
    }

    async fn clear_alarm(&self, name: &str) -> Result<(), HostError> {
        debug!(name, "Alarm cleared.");
        Ok(())
    }
}

#[async_trait]
impl SentMessageSource for FileHost {
    async fn sent_messages(&self, recipient: &str) -> Result<Vec<String>, HostError> {
        let sent = self.draft.lock().sent.clone();
        info!(recipient, count = sent.len(), "Using sent history from draft file.");
        Ok(sent)
    }
}
