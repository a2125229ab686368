use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use crate::host::NotificationApi;

pub const ERROR_TITLE: &str = "Draftwise Error";
pub const DEFAULT_NOTIFICATION_DELAY: Duration = Duration::from_secs(30);

/// Shows notifications that clear themselves after a delay.
#[derive(Clone)]
pub struct Notifier {
    notifications: Arc<dyn NotificationApi>,
    delay: Duration,
}

impl Notifier {
    pub fn new(notifications: Arc<dyn NotificationApi>) -> Self {
        Self {
            notifications,
            delay: DEFAULT_NOTIFICATION_DELAY,
        }
    }

    #[must_use]
    pub fn delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Shows a notification and schedules its removal. Failures are logged.
    pub async fn timed_notification(&self, title: &str, message: &str) {
        let id = match self.notifications.create_notification(title, message).await {
            Ok(id) => id,
            Err(error) => {
                warn!(%error, title, message, "Could not show notification.");
                return;
            }
        };
        debug!(%id, delay = ?self.delay, "Notification shown.");

        let notifications = Arc::clone(&self.notifications);
        let delay = self.delay;
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if let Err(error) = notifications.clear_notification(&id).await {
                warn!(%id, %error, "Could not clear notification.");
            }
        });
    }

    pub async fn error(&self, message: &str) {
        self.timed_notification(ERROR_TITLE, message).await
    }
}
