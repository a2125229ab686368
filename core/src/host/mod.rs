//! Capability surface of the mail client hosting the add-on.
//!
//! Everything here is consumed, never implemented, by the core. A runtime
//! binding (or the command-line host, or a test fake) provides the
//! implementations.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

// --- Tabs & Compose Windows ---

/// Identifier of a composer tab.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct TabId(pub u32);

impl fmt::Display for TabId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<u32> for TabId {
    fn from(id: u32) -> Self {
        TabId(id)
    }
}

/// A host tab as delivered with events. The id may be missing.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Tab {
    #[serde(default)]
    pub id: Option<TabId>,
    #[serde(default)]
    pub window_id: Option<u32>,
}

impl Tab {
    pub fn with_id(id: impl Into<TabId>) -> Self {
        Self {
            id: Some(id.into()),
            window_id: None,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ComposeType {
    #[default]
    New,
    Reply,
    Forward,
    Draft,
    Redirect,
    Template,
}

/// State of an open compose window.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct ComposeDetails {
    pub to: Vec<String>,
    pub subject: String,
    pub plain_text_body: String,
    /// HTML body, present when the window is in HTML mode.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    pub identity_id: Option<String>,
    #[serde(rename = "type")]
    pub compose_type: ComposeType,
    pub is_plain_text: bool,
}

/// Partial update of a compose window. `None` fields are left untouched.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ComposeDetailsUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plain_text_body: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
}

/// A sender persona.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct Identity {
    pub id: String,
    pub name: String,
    pub email: String,
    pub signature: String,
}

// --- Menus, Icons & Commands ---

/// Icon paths keyed by pixel size.
pub type IconPaths = BTreeMap<u32, String>;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct MenuEntry {
    pub id: String,
    pub title: String,
    pub contexts: Vec<String>,
    pub enabled: bool,
}

/// A keyboard command as configured by the user.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct CommandShortcut {
    pub name: String,
    #[serde(default)]
    pub shortcut: Option<String>,
}

// --- Mailbox ---

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct MailAccount {
    pub id: String,
    pub name: String,
    pub folders: Vec<MailFolder>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct MailFolder {
    pub account_id: String,
    pub path: String,
    pub name: String,
    /// Special folder role such as `sent` or `inbox`.
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

/// Filter for [`MailboxApi::query_messages`].
#[derive(Debug, Clone, PartialEq)]
pub struct MessageQuery {
    pub recipients: String,
    pub folder: MailFolder,
    pub from_me: bool,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct MessageHeader {
    pub id: u64,
    /// Milliseconds since the Unix epoch.
    pub date: i64,
    pub subject: String,
}

/// One node of a MIME tree.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct MessagePart {
    pub content_type: String,
    pub body: Option<String>,
    pub parts: Vec<MessagePart>,
}

// --- Errors ---

#[derive(Error, Debug)]
pub enum HostError {
    /// A menu entry with the same id is already registered.
    #[error("Menu entry '{0}' already exists")]
    AlreadyExists(String),

    /// The requested tab is unknown to the host.
    #[error("No compose window for tab {0}")]
    UnknownTab(TabId),

    #[error("Host API call failed: {0}")]
    Api(String),

    #[error("Host I/O error: {0}")]
    Io(#[from] std::io::Error),
}

// --- Capability Traits ---

#[async_trait]
pub trait ComposeApi: Send + Sync {
    async fn get_compose_details(&self, tab_id: TabId) -> Result<ComposeDetails, HostError>;
    async fn set_compose_details(&self, tab_id: TabId, update: ComposeDetailsUpdate) -> Result<(), HostError>;
}

#[async_trait]
pub trait IdentityApi: Send + Sync {
    async fn get_identity(&self, identity_id: &str) -> Result<Option<Identity>, HostError>;
}

#[async_trait]
pub trait NotificationApi: Send + Sync {
    /// Shows a basic notification and returns its id.
    async fn create_notification(&self, title: &str, message: &str) -> Result<String, HostError>;
    async fn clear_notification(&self, notification_id: &str) -> Result<(), HostError>;
}

/// The compose-window toolbar button.
#[async_trait]
pub trait ComposeActionApi: Send + Sync {
    async fn set_icon(&self, tab_id: TabId, icons: &IconPaths) -> Result<(), HostError>;
    async fn set_title(&self, tab_id: TabId, title: &str) -> Result<(), HostError>;
    async fn enable(&self, tab_id: TabId) -> Result<(), HostError>;
    async fn disable(&self, tab_id: TabId) -> Result<(), HostError>;

    /// Whether the button can be disabled for a single tab.
    fn supports_per_tab_disable(&self) -> bool {
        false
    }

    /// Button title declared in the add-on manifest.
    fn default_title(&self) -> String;
}

#[async_trait]
pub trait MenuApi: Send + Sync {
    async fn remove_all(&self) -> Result<(), HostError>;
    async fn create(&self, entry: &MenuEntry) -> Result<(), HostError>;
    async fn set_enabled(&self, entry_id: &str, enabled: bool) -> Result<(), HostError>;
}

#[async_trait]
pub trait CommandApi: Send + Sync {
    async fn shortcuts(&self) -> Result<Vec<CommandShortcut>, HostError>;
}

#[async_trait]
pub trait AlarmApi: Send + Sync {
    async fn create_alarm(&self, name: &str, period_minutes: f64) -> Result<(), HostError>;
    async fn clear_alarm(&self, name: &str) -> Result<(), HostError>;
}

#[async_trait]
pub trait MailboxApi: Send + Sync {
    async fn accounts(&self) -> Result<Vec<MailAccount>, HostError>;
    async fn query_messages(&self, query: &MessageQuery) -> Result<Vec<MessageHeader>, HostError>;
    async fn full_message(&self, message_id: u64) -> Result<MessagePart, HostError>;
}

/// Bundle of the host capabilities used by the dispatcher and UI layer.
#[derive(Clone)]
pub struct Host {
    pub compose: Arc<dyn ComposeApi>,
    pub identities: Arc<dyn IdentityApi>,
    pub notifications: Arc<dyn NotificationApi>,
    pub compose_action: Arc<dyn ComposeActionApi>,
    pub menus: Arc<dyn MenuApi>,
    pub commands: Arc<dyn CommandApi>,
    pub alarms: Arc<dyn AlarmApi>,
}
