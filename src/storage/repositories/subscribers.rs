use crate::storage::JsonFile;
use anyhow::Result;
use log::info;
use std::collections::BTreeSet;
use std::path::Path;

/// Telegram chat ids of operators subscribed to notifications.
#[derive(Debug, Clone)]
pub struct SubscriberRepository {
    file: JsonFile,
}

impl SubscriberRepository {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            file: JsonFile::new(path),
        }
    }

    pub async fn all(&self) -> Result<Vec<i64>> {
        let ids: BTreeSet<i64> = self.file.load().await?;
        Ok(ids.into_iter().collect())
    }

    pub async fn add(&self, user_id: i64) -> Result<()> {
        let mut ids: BTreeSet<i64> = self.file.load().await?;
        if ids.insert(user_id) {
            self.file.save(&ids).await?;
            info!("Subscribed user {}", user_id);
        }
        Ok(())
    }

    pub async fn remove(&self, user_id: i64) -> Result<()> {
        let mut ids: BTreeSet<i64> = self.file.load().await?;
        if ids.remove(&user_id) {
            self.file.save(&ids).await?;
            info!("Unsubscribed user {}", user_id);
        }
        Ok(())
    }
}
