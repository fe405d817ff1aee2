use crate::models::AutoModeConfig;
use crate::storage::JsonFile;
use anyhow::{anyhow, Result};
use log::info;
use std::path::Path;

/// Automatic-mode setting, a singleton record.
#[derive(Debug, Clone)]
pub struct AutoModeRepository {
    file: JsonFile,
}

impl AutoModeRepository {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            file: JsonFile::new(path),
        }
    }

    pub async fn get(&self) -> Result<AutoModeConfig> {
        self.file.load().await
    }

    pub async fn set(&self, config: AutoModeConfig) -> Result<()> {
        self.file.save(&config).await?;
        info!("Automatic mode set to {}", config);
        Ok(())
    }

    /// Flip on/off. A configured range is kept across the round trip.
    pub async fn toggle(&self) -> Result<AutoModeConfig> {
        let next = match self.get().await? {
            AutoModeConfig::Disabled => match self.stored_range().await? {
                Some((min, max)) => AutoModeConfig::Ranged { min, max },
                None => AutoModeConfig::Unbounded,
            },
            AutoModeConfig::Unbounded => AutoModeConfig::Disabled,
            AutoModeConfig::Ranged { min, max } => {
                self.file
                    .save(&serde_json::json!({"enabled": false, "min": min, "max": max}))
                    .await?;
                info!("Automatic mode set to off");
                return Ok(AutoModeConfig::Disabled);
            }
        };
        self.set(next).await?;
        Ok(next)
    }

    /// Enable ranged mode with inclusive bounds.
    pub async fn set_range(&self, min: f64, max: f64) -> Result<AutoModeConfig> {
        if !min.is_finite() || !max.is_finite() || min < 0.0 || max < 0.0 {
            return Err(anyhow!("границы должны быть конечными неотрицательными числами"));
        }
        if min > max {
            return Err(anyhow!("минимум {} больше максимума {}", min, max));
        }
        let config = AutoModeConfig::Ranged { min, max };
        self.set(config).await?;
        Ok(config)
    }

    /// Drop the range but keep automatic mode enabled.
    pub async fn clear_range(&self) -> Result<AutoModeConfig> {
        self.set(AutoModeConfig::Unbounded).await?;
        Ok(AutoModeConfig::Unbounded)
    }

    async fn stored_range(&self) -> Result<Option<(f64, f64)>> {
        let raw: serde_json::Value = self.file.load().await?;
        Ok(match (raw["min"].as_f64(), raw["max"].as_f64()) {
            (Some(min), Some(max)) => Some((min, max)),
            _ => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn repo(dir: &tempfile::TempDir) -> AutoModeRepository {
        AutoModeRepository::new(dir.path().join("auto_mode.json"))
    }

    #[tokio::test]
    async fn test_defaults_to_disabled() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(repo(&dir).get().await.unwrap(), AutoModeConfig::Disabled);
    }

    #[tokio::test]
    async fn test_toggle_keeps_range() {
        let dir = tempfile::tempdir().unwrap();
        let repo = repo(&dir);

        assert_eq!(repo.toggle().await.unwrap(), AutoModeConfig::Unbounded);
        repo.set_range(5000.0, 10000.0).await.unwrap();
        assert_eq!(repo.toggle().await.unwrap(), AutoModeConfig::Disabled);
        assert_eq!(repo.get().await.unwrap(), AutoModeConfig::Disabled);
        assert_eq!(
            repo.toggle().await.unwrap(),
            AutoModeConfig::Ranged {
                min: 5000.0,
                max: 10000.0
            }
        );
    }

    #[tokio::test]
    async fn test_set_range_validates() {
        let dir = tempfile::tempdir().unwrap();
        let repo = repo(&dir);
        assert!(repo.set_range(10.0, 5.0).await.is_err());
        assert!(repo.set_range(-1.0, 5.0).await.is_err());
        assert!(repo.set_range(f64::NAN, 5.0).await.is_err());
        assert_eq!(repo.get().await.unwrap(), AutoModeConfig::Disabled);

        repo.set_range(1.0, 1.0).await.unwrap();
        assert_eq!(repo.clear_range().await.unwrap(), AutoModeConfig::Unbounded);
    }
}
