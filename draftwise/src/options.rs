use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use async_trait::async_trait;
use draftwise_core::options::{OptionsError, OptionsProvider, PluginOptions, OPTIONS_STORAGE_KEY};
use draftwise_core::storage::KeyValueStore;
use serde_json::{Map, Value};
use tracing::{debug, instrument};

/// Stored options with command-line overrides layered on top.
///
/// Overrides replace top-level fields; `params` overrides merge key by key and
/// a `null` parameter removes it.
pub struct LayeredOptions {
    store: Arc<dyn KeyValueStore>,
    overrides: Map<String, Value>,
}

impl LayeredOptions {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store,
            overrides: Map::new(),
        }
    }

    /// Adds the overrides found in a JSON options file.
    pub async fn with_file(mut self, path: &Path) -> anyhow::Result<Self> {
        let text = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read options file {}", path.display()))?;
        let value: Value =
            serde_json::from_str(&text).with_context(|| format!("Malformed options file {}", path.display()))?;
        let Value::Object(map) = value else {
            anyhow::bail!("Options file {} must contain a JSON object", path.display());
        };
        merge_into(&mut self.overrides, map);
        Ok(self)
    }

    #[must_use]
    pub fn with_override(mut self, key: &str, value: Option<String>) -> Self {
        if let Some(value) = value {
            self.overrides.insert(key.to_string(), Value::String(value));
        }
        self
    }
}

fn merge_into(target: &mut Map<String, Value>, overrides: Map<String, Value>) {
    for (key, value) in overrides {
        let is_params = key == "params";
        let slot = target.entry(key).or_insert(Value::Null);
        match (slot, value) {
            (Value::Object(existing), Value::Object(params)) if is_params => existing.extend(params),
            (slot, value) => *slot = value,
        }
    }
}

#[async_trait]
impl OptionsProvider for LayeredOptions {
    #[instrument(skip(self))]
    async fn current_options(&self) -> Result<PluginOptions, OptionsError> {
        let mut merged = match self.store.get(OPTIONS_STORAGE_KEY).await? {
            Some(Value::Object(stored)) => stored,
            Some(Value::Null) | None => Map::new(),
            Some(other) => return Err(OptionsError::NotAnObject(other.to_string())),
        };
        merge_into(&mut merged, self.overrides.clone());
        debug!(overrides = self.overrides.len(), "Layered options.");
        PluginOptions::from_stored(Value::Object(merged))
    }
}

/// Options as printed by `draftwise options`, with the token masked.
pub fn display_options(options: &PluginOptions) -> Result<String, serde_json::Error> {
    let mut value = serde_json::to_value(options)?;
    if let Some(token) = value.get_mut("api_token") {
        *token = Value::String("***".into());
    }
    serde_json::to_string_pretty(&value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use draftwise_core::storage::MemoryStore;
    use serde_json::json;

    fn store_with(stored: Value) -> Arc<dyn KeyValueStore> {
        Arc::new(MemoryStore::with_entries([(OPTIONS_STORAGE_KEY.to_string(), stored)]))
    }

    #[tokio::test]
    async fn flags_beat_stored_options() {
        let options = LayeredOptions::new(store_with(json!({"model": "http://stored", "context_window": 2048})))
            .with_override("model", Some("http://flag".into()))
            .with_override("api_token", None)
            .current_options()
            .await
            .unwrap();

        assert_eq!(options.model, "http://flag");
        assert_eq!(options.context_window, 2048);
        assert_eq!(options.api_token, None);
    }

    #[tokio::test]
    async fn params_merge_per_key() {
        let mut layered = LayeredOptions::new(store_with(json!({"params": {"temperature": 0.9, "top_k": 3}})));
        merge_into(
            &mut layered.overrides,
            json!({"params": {"temperature": 0.1, "watermark": null}})
                .as_object()
                .cloned()
                .unwrap(),
        );
        let options = layered.current_options().await.unwrap();

        assert_eq!(options.params["temperature"], json!(0.1));
        assert_eq!(options.params["top_k"], json!(3));
        assert!(!options.params.contains_key("watermark"));
        assert_eq!(options.params["best_of"], json!(1));
    }

    #[test]
    fn display_masks_token() {
        let options = PluginOptions {
            api_token: Some("secret".into()),
            ..PluginOptions::default()
        };
        let text = display_options(&options).unwrap();
        assert!(!text.contains("secret"));
        assert!(text.contains("***"));
    }
}
