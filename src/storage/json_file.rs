use anyhow::{Context, Result};
use log::debug;
use serde::{de::DeserializeOwned, Serialize};
use std::path::{Path, PathBuf};

/// A single JSON document on disk, read and rewritten whole.
///
/// There is no locking: two writers interleaving load-modify-save will lose
/// one of the updates (last writer wins).
#[derive(Debug, Clone)]
pub struct JsonFile {
    path: PathBuf,
}

impl JsonFile {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the document, or `T::default()` if the file does not exist yet.
    pub async fn load<T: DeserializeOwned + Default>(&self) -> Result<T> {
        if !tokio::fs::try_exists(&self.path).await.unwrap_or(false) {
            debug!("{} does not exist, starting empty", self.path.display());
            return Ok(T::default());
        }
        let contents = tokio::fs::read_to_string(&self.path)
            .await
            .with_context(|| format!("reading {}", self.path.display()))?;
        let value = serde_json::from_str(&contents)
            .with_context(|| format!("parsing {}", self.path.display()))?;
        Ok(value)
    }

    pub async fn save<T: Serialize>(&self, value: &T) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        let contents = serde_json::to_string_pretty(value)?;
        tokio::fs::write(&self.path, contents)
            .await
            .with_context(|| format!("writing {}", self.path.display()))?;
        Ok(())
    }
}
