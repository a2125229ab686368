use std::sync::Arc;

use serde_json::{Map, Value};
use tokio::sync::Mutex;
use tracing::{debug, instrument, warn};

use crate::host::{ComposeDetails, ComposeType, TabId};
use crate::storage::{KeyValueStore, StoreError};

/// Storage key holding the whole tab → conversation map.
pub const ORIGINAL_CONVERSATION_KEY: &str = "ORIGINAL_TAB_CONVERSATION";

/// Persistent per-tab capture of the text being replied to.
///
/// Each mutation rewrites the whole map. Mutations through one cache instance
/// are serialized, so concurrent tab events cannot lose each other's writes.
pub struct OriginalConversationCache {
    store: Arc<dyn KeyValueStore>,
    write_lock: Mutex<()>,
}

impl OriginalConversationCache {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store,
            write_lock: Mutex::new(()),
        }
    }

    async fn load(&self) -> Result<Map<String, Value>, StoreError> {
        match self.store.get(ORIGINAL_CONVERSATION_KEY).await? {
            Some(Value::Object(map)) => Ok(map),
            None | Some(Value::Null) => Ok(Map::new()),
            Some(other) => {
                warn!(found = %other, "Discarding malformed conversation cache.");
                Ok(Map::new())
            }
        }
    }

    async fn save(&self, map: Map<String, Value>) -> Result<(), StoreError> {
        self.store.set(ORIGINAL_CONVERSATION_KEY, Value::Object(map)).await
    }

    /// Captures the body of a freshly opened reply window.
    ///
    /// Stores the trimmed body (signature included) for reply windows with
    /// text; for any other window a stale entry is removed. Returns whether an
    /// entry was stored.
    #[instrument(skip(self, details), fields(compose_type = ?details.compose_type))]
    pub async fn store_original_reply_text(&self, tab_id: TabId, details: &ComposeDetails) -> Result<bool, StoreError> {
        let body = details.plain_text_body.trim();
        if details.compose_type != ComposeType::Reply || body.is_empty() {
            debug!("Not a reply with content, clearing any stale entry.");
            self.delete(tab_id).await?;
            return Ok(false);
        }

        let _guard = self.write_lock.lock().await;
        let mut map = self.load().await?;
        map.insert(tab_id.to_string(), Value::String(body.to_string()));
        self.save(map).await?;
        debug!(len = body.len(), "Stored original conversation.");
        Ok(true)
    }

    pub async fn get(&self, tab_id: TabId) -> Result<Option<String>, StoreError> {
        let map = self.load().await?;
        Ok(map.get(&tab_id.to_string()).and_then(Value::as_str).map(str::to_string))
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, tab_id: TabId) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;
        let mut map = self.load().await?;
        if map.remove(&tab_id.to_string()).is_some() {
            self.save(map).await?;
            debug!("Removed original conversation.");
        }
        Ok(())
    }

    pub async fn clear(&self) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;
        self.store.remove(ORIGINAL_CONVERSATION_KEY).await
    }
}
