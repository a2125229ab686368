#![allow(dead_code)]

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::Notify;

use draftwise_core::action::Dispatcher;
use draftwise_core::cancel::CancellationSignal;
use draftwise_core::chat::{
    require_model, Choice, ChoiceMessage, LlmConnection, LlmError, LlmMessage, LlmResponse, LlmRole, TextCompletion,
    UpstreamError,
};
use draftwise_core::host::{
    AlarmApi, CommandApi, CommandShortcut, ComposeActionApi, ComposeApi, ComposeDetails, ComposeDetailsUpdate,
    ComposeType, Host, HostError, IconPaths, Identity, IdentityApi, MenuApi, MenuEntry, NotificationApi, TabId,
};
use draftwise_core::mail::SentMessageSource;
use draftwise_core::options::{FixedOptions, PluginOptions};
use draftwise_core::storage::MemoryStore;

pub const MODEL_URL: &str = "http://llm.test/v1/chat/completions";
pub const DEFAULT_TITLE: &str = "Draftwise";

pub fn setup_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

// --- Fake Host ---

#[derive(Default)]
pub struct FakeHost {
    pub tabs: Mutex<HashMap<TabId, ComposeDetails>>,
    pub identities: Mutex<HashMap<String, Identity>>,
    pub updates: Mutex<Vec<(TabId, ComposeDetailsUpdate)>>,
    pub icons: Mutex<HashMap<TabId, IconPaths>>,
    pub titles: Mutex<HashMap<TabId, String>>,
    pub disabled: Mutex<HashSet<TabId>>,
    pub menu: Mutex<Vec<MenuEntry>>,
    pub shortcuts: Mutex<Vec<CommandShortcut>>,
    pub notifications: Mutex<Vec<(String, String)>>,
    pub cleared_notifications: Mutex<Vec<String>>,
    pub alarms: Mutex<Vec<String>>,
    pub alarm_log: Mutex<Vec<String>>,
    pub per_tab_disable: AtomicBool,
    pub fail_ui: AtomicBool,
}

impl FakeHost {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
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

    pub fn open_tab(&self, tab_id: u32, details: ComposeDetails) {
        self.tabs.lock().insert(TabId(tab_id), details);
    }

    pub fn add_identity(&self, id: &str, signature: &str) {
        self.identities.lock().insert(
            id.to_string(),
            Identity {
                id: id.to_string(),
                name: "Jane Doe".into(),
                email: "jane@example.com".into(),
                signature: signature.to_string(),
            },
        );
    }

    pub fn details(&self, tab_id: u32) -> ComposeDetails {
        self.tabs.lock().get(&TabId(tab_id)).cloned().unwrap_or_default()
    }

    pub fn menu_ids(&self) -> Vec<String> {
        self.menu.lock().iter().map(|entry| entry.id.clone()).collect()
    }

    pub fn menu_entry(&self, id: &str) -> Option<MenuEntry> {
        self.menu.lock().iter().find(|entry| entry.id == id).cloned()
    }

    pub fn icon(&self, tab_id: u32) -> Option<IconPaths> {
        self.icons.lock().get(&TabId(tab_id)).cloned()
    }

    pub fn title(&self, tab_id: u32) -> Option<String> {
        self.titles.lock().get(&TabId(tab_id)).cloned()
    }

    fn ui_call(&self) -> Result<(), HostError> {
        if self.fail_ui.load(Ordering::SeqCst) {
            Err(HostError::Api("UI is unavailable".into()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl ComposeApi for FakeHost {
    async fn get_compose_details(&self, tab_id: TabId) -> Result<ComposeDetails, HostError> {
        self.tabs.lock().get(&tab_id).cloned().ok_or(HostError::UnknownTab(tab_id))
    }

    async fn set_compose_details(&self, tab_id: TabId, update: ComposeDetailsUpdate) -> Result<(), HostError> {
        let mut tabs = self.tabs.lock();
        let details = tabs.get_mut(&tab_id).ok_or(HostError::UnknownTab(tab_id))?;
        if let Some(subject) = &update.subject {
            details.subject = subject.clone();
        }
        if let Some(body) = &update.plain_text_body {
            details.plain_text_body = body.clone();
        }
        if let Some(body) = &update.body {
            details.body = Some(body.clone());
        }
        self.updates.lock().push((tab_id, update));
        Ok(())
    }
}

#[async_trait]
impl IdentityApi for FakeHost {
    async fn get_identity(&self, identity_id: &str) -> Result<Option<Identity>, HostError> {
        Ok(self.identities.lock().get(identity_id).cloned())
    }
}

#[async_trait]
impl NotificationApi for FakeHost {
    async fn create_notification(&self, title: &str, message: &str) -> Result<String, HostError> {
        let mut notifications = self.notifications.lock();
        notifications.push((title.to_string(), message.to_string()));
        Ok(format!("notification-{}", notifications.len()))
    }

    async fn clear_notification(&self, notification_id: &str) -> Result<(), HostError> {
        self.cleared_notifications.lock().push(notification_id.to_string());
        Ok(())
    }
}

#[async_trait]
impl ComposeActionApi for FakeHost {
    async fn set_icon(&self, tab_id: TabId, icons: &IconPaths) -> Result<(), HostError> {
        self.ui_call()?;
        self.icons.lock().insert(tab_id, icons.clone());
        Ok(())
    }

    async fn set_title(&self, tab_id: TabId, title: &str) -> Result<(), HostError> {
        self.ui_call()?;
        self.titles.lock().insert(tab_id, title.to_string());
        Ok(())
    }

    async fn enable(&self, tab_id: TabId) -> Result<(), HostError> {
        self.ui_call()?;
        self.disabled.lock().remove(&tab_id);
        Ok(())
    }

    async fn disable(&self, tab_id: TabId) -> Result<(), HostError> {
        self.ui_call()?;
        self.disabled.lock().insert(tab_id);
        Ok(())
    }

    fn supports_per_tab_disable(&self) -> bool {
        self.per_tab_disable.load(Ordering::SeqCst)
    }

    fn default_title(&self) -> String {
        DEFAULT_TITLE.to_string()
    }
}

#[async_trait]
impl MenuApi for FakeHost {
    async fn remove_all(&self) -> Result<(), HostError> {
        self.ui_call()?;
        self.menu.lock().clear();
        Ok(())
    }

    async fn create(&self, entry: &MenuEntry) -> Result<(), HostError> {
        self.ui_call()?;
        let mut menu = self.menu.lock();
        if menu.iter().any(|existing| existing.id == entry.id) {
            return Err(HostError::AlreadyExists(entry.id.clone()));
        }
        menu.push(entry.clone());
        Ok(())
    }

    async fn set_enabled(&self, entry_id: &str, enabled: bool) -> Result<(), HostError> {
        self.ui_call()?;
        let mut menu = self.menu.lock();
        let entry = menu
            .iter_mut()
            .find(|entry| entry.id == entry_id)
            .ok_or_else(|| HostError::Api(format!("no menu entry '{entry_id}'")))?;
        entry.enabled = enabled;
        Ok(())
    }
}

#[async_trait]
impl CommandApi for FakeHost {
    async fn shortcuts(&self) -> Result<Vec<CommandShortcut>, HostError> {
        Ok(self.shortcuts.lock().clone())
    }
}

#[async_trait]
impl AlarmApi for FakeHost {
    async fn create_alarm(&self, name: &str, _period_minutes: f64) -> Result<(), HostError> {
        self.alarms.lock().push(name.to_string());
        self.alarm_log.lock().push(format!("create {name}"));
        Ok(())
    }

    async fn clear_alarm(&self, name: &str) -> Result<(), HostError> {
        self.alarms.lock().retain(|alarm| alarm != name);
        self.alarm_log.lock().push(format!("clear {name}"));
        Ok(())
    }
}

// --- Scripted LLM Connection ---

pub enum Reply {
    Completion(String),
    Upstream(String),
    Network(String),
    /// Never answers; resolves only through cancellation.
    Pending,
}

pub fn completion(text: &str) -> TextCompletion {
    TextCompletion {
        id: "chatcmpl-test".into(),
        created: Some(1_700_000_000),
        model: "test-model".into(),
        object: Some("chat.completion".into()),
        system_fingerprint: None,
        choices: vec![Choice {
            index: 0,
            message: ChoiceMessage {
                role: LlmRole::Assistant,
                content: text.to_string(),
            },
            finish_reason: Some("stop".into()),
        }],
        usage: None,
    }
}

#[derive(Default)]
pub struct ScriptedConnection {
    replies: Mutex<VecDeque<Reply>>,
    pub requests: Mutex<Vec<Vec<LlmMessage>>>,
    pub started: Notify,
}

impl ScriptedConnection {
    pub fn new(replies: impl IntoIterator<Item = Reply>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.into_iter().collect()),
            ..Default::default()
        })
    }

    pub fn requests(&self) -> Vec<Vec<LlmMessage>> {
        self.requests.lock().clone()
    }
}

#[async_trait]
impl LlmConnection for ScriptedConnection {
    async fn send(
        &self,
        messages: &[LlmMessage],
        options: &PluginOptions,
        signal: &CancellationSignal,
    ) -> Result<LlmResponse, LlmError> {
        require_model(options)?;
        self.requests.lock().push(messages.to_vec());
        self.started.notify_one();

        let reply = self.replies.lock().pop_front();
        match reply {
            Some(Reply::Completion(text)) => Ok(LlmResponse::Completion(completion(&text))),
            Some(Reply::Upstream(message)) => {
                let mut error = UpstreamError::default();
                error.error.message = message;
                Ok(LlmResponse::Error(error))
            }
            Some(Reply::Network(message)) => Err(LlmError::Network(message.into())),
            Some(Reply::Pending) => {
                signal.cancelled().await;
                Err(LlmError::Cancelled {
                    reason: signal.reason().unwrap_or_default(),
                })
            }
            None => Err(LlmError::Network("script exhausted".into())),
        }
    }
}

// --- Sent-Mail History ---

#[derive(Default)]
pub struct StaticHistory {
    pub messages: Vec<String>,
    pub recipients: Mutex<Vec<String>>,
}

#[async_trait]
impl SentMessageSource for StaticHistory {
    async fn sent_messages(&self, recipient: &str) -> Result<Vec<String>, HostError> {
        self.recipients.lock().push(recipient.to_string());
        Ok(self.messages.clone())
    }
}

// --- Harness ---

pub struct Harness {
    pub host: Arc<FakeHost>,
    pub connection: Arc<ScriptedConnection>,
    pub history: Arc<StaticHistory>,
    pub store: Arc<MemoryStore>,
    pub dispatcher: Dispatcher,
}

pub fn options() -> PluginOptions {
    PluginOptions {
        model: MODEL_URL.to_string(),
        ..Default::default()
    }
}

impl Harness {
    pub fn new(replies: impl IntoIterator<Item = Reply>) -> Self {
        Self::build(options(), Vec::new(), replies)
    }

    pub fn build(options: PluginOptions, history: Vec<String>, replies: impl IntoIterator<Item = Reply>) -> Self {
        setup_tracing();
        let host = FakeHost::new();
        let connection = ScriptedConnection::new(replies);
        let history = Arc::new(StaticHistory {
            messages: history,
            ..Default::default()
        });
        let store = Arc::new(MemoryStore::new());
        let dispatcher = Dispatcher::new(
            host.host(),
            connection.clone(),
            Arc::new(FixedOptions(options)),
            history.clone(),
            store.clone(),
        );
        Self {
            host,
            connection,
            history,
            store,
            dispatcher,
        }
    }
}

pub fn draft(body: &str, subject: &str, compose_type: ComposeType) -> ComposeDetails {
    ComposeDetails {
        to: Vec::new(),
        subject: subject.to_string(),
        plain_text_body: body.to_string(),
        body: None,
        identity_id: Some("id1".into()),
        compose_type,
        is_plain_text: true,
    }
}
