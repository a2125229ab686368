use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::host::AlarmApi;

pub const KEEP_ALIVE_ALARM: &str = "llm-keep-alive";
/// Roughly 24 seconds, below the host's idle-suspension threshold.
pub const KEEP_ALIVE_PERIOD_MINUTES: f64 = 0.4;

/// Keeps the background runtime awake while LLM requests are in flight.
///
/// Reference counted: the alarm is created by the first `start` and cleared
/// when the last matching `stop` runs.
pub struct KeepAlive {
    alarms: Arc<dyn AlarmApi>,
    active: Mutex<usize>,
}

impl KeepAlive {
    pub fn new(alarms: Arc<dyn AlarmApi>) -> Self {
        Self {
            alarms,
            active: Mutex::new(0),
        }
    }

    pub async fn start(&self) {
        let first = {
            let mut active = self.active.lock();
            *active += 1;
            *active == 1
        };
        if first {
            info!("Starting keep-alive alarm for long-running LLM request.");
            if let Err(error) = self.alarms.create_alarm(KEEP_ALIVE_ALARM, KEEP_ALIVE_PERIOD_MINUTES).await {
                warn!(%error, "Could not create keep-alive alarm.");
            }
        }
    }

    pub async fn stop(&self) {
        let last = {
            let mut active = self.active.lock();
            *active = active.saturating_sub(1);
            *active == 0
        };
        if last {
            info!("Stopping keep-alive alarm, no active LLM requests.");
            if let Err(error) = self.alarms.clear_alarm(KEEP_ALIVE_ALARM).await {
                warn!(%error, "Could not clear keep-alive alarm.");
            }
        }
    }

    pub fn active_requests(&self) -> usize {
        *self.active.lock()
    }

    /// Alarm listener. Returns whether the alarm was the keep-alive one.
    pub fn handle_alarm(&self, name: &str) -> bool {
        if name == KEEP_ALIVE_ALARM {
            debug!(active = self.active_requests(), "Keep-alive heartbeat.");
            true
        } else {
            false
        }
    }
}
