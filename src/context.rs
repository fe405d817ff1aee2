use log::{error, info, warn};
use std::sync::Arc;

use crate::backend::PayoutSource;
use crate::config::{Config, MonitorConfig};
use crate::services::notification_handler::{NotificationType, Notifier};
use crate::storage::{AutoModeRepository, LedgerRepository, SubscriberRepository};

/// Everything a poll cycle or bot handler needs, passed explicitly.
pub struct AppContext {
    pub backend: Arc<dyn PayoutSource>,
    pub notifier: Arc<dyn Notifier>,
    pub ledger: LedgerRepository,
    pub subscribers: SubscriberRepository,
    pub auto_mode: AutoModeRepository,
    pub monitor: MonitorConfig,
}

impl AppContext {
    pub fn from_config(
        config: &Config,
        backend: Arc<dyn PayoutSource>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            backend,
            notifier,
            ledger: LedgerRepository::new(config.storage.processed_path()),
            subscribers: SubscriberRepository::new(config.storage.users_path()),
            auto_mode: AutoModeRepository::new(config.storage.auto_mode_path()),
            monitor: config.monitor.clone(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.monitor.pending_capacity
    }

    /// Send to every subscriber, pausing between sends. Returns how many
    /// deliveries succeeded; failures are logged and skipped.
    pub async fn broadcast(&self, notification: &NotificationType) -> usize {
        let subscribers = match self.subscribers.all().await {
            Ok(ids) => ids,
            Err(e) => {
                error!("Failed to load subscribers: {}", e);
                return 0;
            }
        };
        if subscribers.is_empty() {
            warn!("No users registered for notifications");
            return 0;
        }

        let mut delivered = 0;
        for (i, chat_id) in subscribers.into_iter().enumerate() {
            if i > 0 {
                tokio::time::sleep(self.monitor.notify_delay()).await;
            }
            match self.notifier.notify(chat_id, notification).await {
                Ok(()) => delivered += 1,
                Err(e) => error!("Error sending message to {}: {}", chat_id, e),
            }
        }
        info!("Broadcast delivered to {} chats", delivered);
        delivered
    }
}
