use anyhow::{anyhow, Result};
use log::{error, info};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::services::admission::DEFAULT_PENDING_CAPACITY;
use crate::services::intake::DEFAULT_RECENT_MINUTES;

pub const DEFAULT_CONFIG_PATH: &str = "config/config.toml";

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    pub backend: BackendConfig,
    pub telegram: TelegramConfig,
    #[serde(default)]
    pub monitor: MonitorConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct BackendConfig {
    pub url: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TelegramConfig {
    pub token: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct MonitorConfig {
    pub check_interval_secs: u64,
    pub recent_minutes: i64,
    pub pending_capacity: usize,
    pub notify_delay_ms: u64,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct StorageConfig {
    pub data_dir: String,
    pub processed_file: String,
    pub users_file: String,
    pub auto_mode_file: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend: BackendConfig {
                url: "http://localhost:3000".to_string(),
                timeout_secs: 10,
            },
            telegram: TelegramConfig { token: None },
            monitor: MonitorConfig::default(),
            storage: StorageConfig::default(),
        }
    }
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            check_interval_secs: 30,
            recent_minutes: DEFAULT_RECENT_MINUTES,
            pending_capacity: DEFAULT_PENDING_CAPACITY,
            notify_delay_ms: 100,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: ".".to_string(),
            processed_file: "processed_uuids.json".to_string(),
            users_file: "user_ids.json".to_string(),
            auto_mode_file: "auto_mode.json".to_string(),
        }
    }
}

impl BackendConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl MonitorConfig {
    pub fn check_interval(&self) -> Duration {
        Duration::from_secs(self.check_interval_secs)
    }

    pub fn recent_window(&self) -> chrono::Duration {
        chrono::Duration::minutes(self.recent_minutes)
    }

    pub fn notify_delay(&self) -> Duration {
        Duration::from_millis(self.notify_delay_ms)
    }
}

impl StorageConfig {
    pub fn processed_path(&self) -> PathBuf {
        Path::new(&self.data_dir).join(&self.processed_file)
    }

    pub fn users_path(&self) -> PathBuf {
        Path::new(&self.data_dir).join(&self.users_file)
    }

    pub fn auto_mode_path(&self) -> PathBuf {
        Path::new(&self.data_dir).join(&self.auto_mode_file)
    }
}

fn token_from_env() -> Option<String> {
    std::env::var("BOT_TOKEN")
        .or_else(|_| std::env::var("TELEGRAM_BOT_TOKEN"))
        .ok()
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        info!("Loading config from {}", path.display());
        match Self::load_from_file(path) {
            Ok(mut config) => {
                info!("Config loaded from file");
                if config.telegram.token.is_none() {
                    config.telegram.token = token_from_env();
                }
                config
            }
            Err(e) => {
                error!("Failed to load config from file: {}", e);
                info!("Falling back to environment variables or defaults");
                Self::from_env()
            }
        }
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        Ok(config)
    }

    pub fn from_env() -> Self {
        let mut config = Config::default();

        if let Ok(url) = std::env::var("BACKEND_URL") {
            config.backend.url = url;
        }

        if let Some(token) = token_from_env() {
            config.telegram.token = Some(token);
        }

        if let Ok(interval) = std::env::var("CHECK_INTERVAL_SECS") {
            if let Ok(secs) = interval.parse::<u64>() {
                config.monitor.check_interval_secs = secs;
            }
        }

        if let Ok(minutes) = std::env::var("RECENT_MINUTES") {
            if let Ok(minutes) = minutes.parse::<i64>() {
                config.monitor.recent_minutes = minutes;
            }
        }

        if let Ok(capacity) = std::env::var("PENDING_CAPACITY") {
            if let Ok(capacity) = capacity.parse::<usize>() {
                config.monitor.pending_capacity = capacity;
            }
        }

        if let Ok(dir) = std::env::var("DATA_DIR") {
            config.storage.data_dir = dir;
        }

        config
    }

    /// Startup checks. Failures here are the only fatal errors in the process.
    pub fn validate(&self) -> Result<()> {
        if self.backend.url.is_empty() {
            return Err(anyhow!("Backend URL not configured"));
        }
        url::Url::parse(&self.backend.url)
            .map_err(|e| anyhow!("Invalid backend URL {}: {}", self.backend.url, e))?;

        match &self.telegram.token {
            Some(token) if !token.is_empty() => {}
            _ => return Err(anyhow!("Telegram bot token not configured")),
        }

        if self.monitor.pending_capacity == 0 {
            return Err(anyhow!("Pending capacity must be at least 1"));
        }

        if self.monitor.check_interval_secs == 0 {
            return Err(anyhow!("Check interval must be at least 1 second"));
        }

        Ok(())
    }
}
