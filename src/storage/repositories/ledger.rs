use crate::storage::JsonFile;
use anyhow::Result;
use log::{debug, info};
use std::collections::HashSet;
use std::path::Path;

/// Processed-payout ledger. Ids are only ever added, never pruned.
#[derive(Debug, Clone)]
pub struct LedgerRepository {
    file: JsonFile,
}

impl LedgerRepository {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            file: JsonFile::new(path),
        }
    }

    pub async fn load(&self) -> Result<HashSet<String>> {
        self.file.load().await
    }

    pub async fn contains(&self, id: &str) -> Result<bool> {
        Ok(self.load().await?.contains(id))
    }

    pub async fn count(&self) -> Result<usize> {
        Ok(self.load().await?.len())
    }

    /// Record `id` as handled. Returns `false` if it was already present,
    /// in which case the file is left untouched.
    pub async fn mark_processed(&self, id: &str) -> Result<bool> {
        let mut ids = self.load().await?;
        if !ids.insert(id.to_string()) {
            debug!("Payout {} already in ledger", id);
            return Ok(false);
        }
        let mut sorted: Vec<&String> = ids.iter().collect();
        sorted.sort();
        self.file.save(&sorted).await?;
        info!("Payout {} marked as processed ({} total)", id, ids.len());
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mark_processed_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = LedgerRepository::new(dir.path().join("processed_uuids.json"));

        assert!(ledger.mark_processed("A").await.unwrap());
        assert!(!ledger.mark_processed("A").await.unwrap());
        assert!(ledger.mark_processed("B").await.unwrap());

        assert_eq!(ledger.count().await.unwrap(), 2);
        assert!(ledger.contains("A").await.unwrap());
        assert!(!ledger.contains("C").await.unwrap());
    }

    #[tokio::test]
    async fn test_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("processed_uuids.json");
        LedgerRepository::new(&path).mark_processed("A").await.unwrap();

        let reopened = LedgerRepository::new(&path);
        assert!(reopened.contains("A").await.unwrap());
    }

    #[tokio::test]
    async fn test_reads_plain_json_array() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("processed_uuids.json");
        std::fs::write(&path, r#"["x", "y"]"#).unwrap();

        let ledger = LedgerRepository::new(&path);
        assert_eq!(ledger.count().await.unwrap(), 2);
    }
}
