use std::sync::{Arc, OnceLock};

use tokio_util::sync::CancellationToken;

/// Owning side of a cancellation context.
///
/// Cancelling records a reason and wakes every [`CancellationSignal`] derived
/// from this handle. Only the first reason is kept; later calls are no-ops.
#[derive(Debug, Clone, Default)]
pub struct CancellationHandle {
    token: CancellationToken,
    reason: Arc<OnceLock<String>>,
}

impl CancellationHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation. Returns `true` if this call was the one that
    /// cancelled the handle.
    pub fn cancel(&self, reason: impl Into<String>) -> bool {
        // Reason must be visible before any waiter wakes up.
        let first = self.reason.set(reason.into()).is_ok();
        self.token.cancel();
        first
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    pub fn signal(&self) -> CancellationSignal {
        CancellationSignal {
            token: self.token.clone(),
            reason: Arc::clone(&self.reason),
        }
    }
}

/// Observing side of a cancellation context, passed into anything that can
/// suspend on I/O.
#[derive(Debug, Clone)]
pub struct CancellationSignal {
    token: CancellationToken,
    reason: Arc<OnceLock<String>>,
}

impl CancellationSignal {
    /// A signal that is never cancelled.
    pub fn never() -> Self {
        CancellationHandle::new().signal()
    }

    /// Completes once cancellation has been requested.
    pub async fn cancelled(&self) {
        self.token.cancelled().await
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    pub fn reason(&self) -> Option<String> {
        self.reason.get().cloned()
    }
}
