use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use thiserror::Error;
use tracing::{debug, instrument};

use crate::storage::{KeyValueStore, StoreError};

/// Storage key of the user options in the synced namespace.
pub const OPTIONS_STORAGE_KEY: &str = "options";

pub const DEFAULT_LLM_CONTEXT: &str = "You are an AI language model asked to write an email.\n\
The email should be concise.\n\
In the reply, just include the email itself, no need to include the original text from the user.\n\
Do not include the email subject in your reply.\n";

/// User-configurable settings, re-read on every action.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct PluginOptions {
    /// Endpoint URL of the chat-completions API.
    pub model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_token: Option<String>,
    pub context_window: u32,
    pub include_recent_mails: bool,
    /// Generation parameters spread verbatim into the request body.
    pub params: Map<String, Value>,
    #[serde(rename = "llmContext")]
    pub llm_context: String,
}

impl Default for PluginOptions {
    fn default() -> Self {
        Self {
            model: String::new(),
            api_token: None,
            context_window: 4096,
            include_recent_mails: true,
            params: default_params(),
            llm_context: DEFAULT_LLM_CONTEXT.to_string(),
        }
    }
}

pub fn default_params() -> Map<String, Value> {
    [
        ("best_of", json!(1)),
        ("decoder_input_details", json!(true)),
        ("max_new_tokens", json!(2000)),
        ("repetition_penalty", json!(1.03)),
        ("return_full_text", json!(false)),
        ("temperature", json!(0.2)),
        ("top_k", json!(10)),
        ("top_p", json!(0.95)),
        ("typical_p", json!(0.95)),
        ("use_cache", json!(true)),
        ("watermark", json!(true)),
    ]
    .into_iter()
    .map(|(key, value)| (key.to_string(), value))
    .collect()
}

impl PluginOptions {
    /// Merges stored options over the defaults.
    ///
    /// Top-level fields replace their default. `params` is merged key by key;
    /// a stored `null` removes the default parameter.
    pub fn from_stored(stored: Value) -> Result<Self, OptionsError> {
        let mut stored = match stored {
            Value::Object(map) => map,
            Value::Null => Map::new(),
            other => return Err(OptionsError::NotAnObject(other.to_string())),
        };
        let overrides = stored.remove("params");
        let mut options: PluginOptions = serde_json::from_value(Value::Object(stored))?;
        match overrides {
            Some(Value::Object(overrides)) => {
                for (key, value) in overrides {
                    if value.is_null() {
                        options.params.remove(&key);
                    } else {
                        options.params.insert(key, value);
                    }
                }
            }
            Some(Value::Null) | None => {}
            Some(other) => return Err(OptionsError::NotAnObject(other.to_string())),
        }
        Ok(options)
    }

    /// The API token, if one is configured and not blank.
    pub fn api_token(&self) -> Option<&str> {
        self.api_token.as_deref().map(str::trim).filter(|token| !token.is_empty())
    }
}

#[derive(Error, Debug)]
pub enum OptionsError {
    #[error("Failed to load options: {0}")]
    Store(#[from] StoreError),

    #[error("Stored options are malformed: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("Stored options must be a JSON object, found {0}")]
    NotAnObject(String),
}

/// Accessor for the current options.
#[async_trait]
pub trait OptionsProvider: Send + Sync {
    async fn current_options(&self) -> Result<PluginOptions, OptionsError>;
}

/// Options read from a [`KeyValueStore`] on every call.
pub struct StoredOptions {
    store: Arc<dyn KeyValueStore>,
}

impl StoredOptions {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    pub async fn save(&self, options: &PluginOptions) -> Result<(), OptionsError> {
        self.store.set(OPTIONS_STORAGE_KEY, serde_json::to_value(options)?).await?;
        Ok(())
    }
}

#[async_trait]
impl OptionsProvider for StoredOptions {
    #[instrument(skip(self))]
    async fn current_options(&self) -> Result<PluginOptions, OptionsError> {
        let stored = self.store.get(OPTIONS_STORAGE_KEY).await?;
        debug!(found = stored.is_some(), "Loaded stored options.");
        PluginOptions::from_stored(stored.unwrap_or(Value::Null))
    }
}

/// A fixed set of options.
pub struct FixedOptions(pub PluginOptions);

#[async_trait]
impl OptionsProvider for FixedOptions {
    async fn current_options(&self) -> Result<PluginOptions, OptionsError> {
        Ok(self.0.clone())
    }
}
