use std::collections::HashMap;

use parking_lot::Mutex;
use tracing::{debug, trace};

use crate::cancel::{CancellationHandle, CancellationSignal};
use crate::host::TabId;

/// Reason recorded when the user cancels the request of a tab.
pub fn user_cancellation_reason(tab_id: TabId) -> String {
    format!("User cancelled request in tab {tab_id}")
}

/// Tracking entry of one tab. Absence from the registry means idle.
#[derive(Debug, Clone)]
pub struct RequestStatus {
    pub tab_id: TabId,
    pub is_running: bool,
    pub cancellation: CancellationHandle,
}

impl RequestStatus {
    fn new(tab_id: TabId) -> Self {
        Self {
            tab_id,
            is_running: false,
            cancellation: CancellationHandle::new(),
        }
    }
}

/// Per-tab request state: whether an LLM action runs, and how to cancel it.
#[derive(Debug, Default)]
pub struct RequestStatusRegistry {
    statuses: Mutex<HashMap<TabId, RequestStatus>>,
}

impl RequestStatusRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the entry of `tab_id`, creating an idle one if needed.
    pub fn get_request_status(&self, tab_id: TabId) -> RequestStatus {
        self.statuses
            .lock()
            .entry(tab_id)
            .or_insert_with(|| RequestStatus::new(tab_id))
            .clone()
    }

    /// Marks the tab as running and returns the signal bound to this run.
    /// Returns `None` if the tab is already running.
    pub fn begin(&self, tab_id: TabId) -> Option<CancellationSignal> {
        let mut statuses = self.statuses.lock();
        let status = statuses.entry(tab_id).or_insert_with(|| RequestStatus::new(tab_id));
        if status.is_running {
            return None;
        }
        if status.cancellation.is_cancelled() {
            status.cancellation = CancellationHandle::new();
        }
        status.is_running = true;
        trace!(%tab_id, "Request started.");
        Some(status.cancellation.signal())
    }

    pub fn is_running(&self, tab_id: TabId) -> bool {
        self.statuses.lock().get(&tab_id).is_some_and(|status| status.is_running)
    }

    pub fn abort_signal(&self, tab_id: TabId) -> CancellationSignal {
        self.get_request_status(tab_id).cancellation.signal()
    }

    /// Cancels the tab's running request. Idle tabs are left untouched.
    /// Returns whether a request was cancelled by this call.
    pub fn abort(&self, tab_id: TabId) -> bool {
        let handle = self
            .statuses
            .lock()
            .get(&tab_id)
            .filter(|status| status.is_running)
            .map(|status| status.cancellation.clone());
        match handle {
            Some(handle) => {
                let cancelled = handle.cancel(user_cancellation_reason(tab_id));
                debug!(%tab_id, cancelled, "Abort requested.");
                cancelled
            }
            None => {
                debug!(%tab_id, "Abort requested for idle tab, ignoring.");
                false
            }
        }
    }

    /// Removes the tab's entry. Returns whether one existed.
    pub fn delete_request_status(&self, tab_id: TabId) -> bool {
        self.statuses.lock().remove(&tab_id).is_some()
    }

    pub fn active_tabs(&self) -> Vec<TabId> {
        let mut tabs: Vec<_> = self.statuses.lock().keys().copied().collect();
        tabs.sort();
        tabs
    }
}
