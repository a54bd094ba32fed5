//! Browser configuration

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use nimbus_ai::AiConfig;
use nimbus_storage::DEFAULT_QUOTA_BYTES;

use crate::error::CoreError;
use crate::Result;

/// Overrides the platform data directory when set
const DATA_DIR_VAR: &str = "NIMBUS_DATA_DIR";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Directory holding the database and config file
    pub data_dir: PathBuf,
    /// Path to the database file
    pub database_path: PathBuf,
    /// Total budget for stored entries; `None` disables the check
    #[serde(default = "default_quota")]
    pub storage_quota_bytes: Option<usize>,
    #[serde(default)]
    pub ai: AiConfig,
}

fn default_quota() -> Option<usize> {
    Some(DEFAULT_QUOTA_BYTES)
}

impl Config {
    pub fn new(data_dir: PathBuf) -> Self {
        Self {
            database_path: data_dir.join("nimbus.db"),
            data_dir,
            storage_quota_bytes: default_quota(),
            ai: AiConfig::default(),
        }
    }

    /// Defaults for this machine, with the AI key read from the environment.
    pub fn from_env() -> Self {
        let data_dir = std::env::var(DATA_DIR_VAR)
            .ok()
            .filter(|d| !d.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(Self::data_dir);

        Self {
            ai: AiConfig::from_env(),
            ..Self::new(data_dir)
        }
    }

    /// Read a JSON config file. The API key always comes from the environment.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let mut config: Config = serde_json::from_str(&raw)
            .map_err(|e| CoreError::Config(format!("{}: {}", path.display(), e)))?;
        config.ai.api_key = AiConfig::from_env().api_key;
        Ok(config)
    }

    pub fn data_dir() -> PathBuf {
        dirs::data_local_dir()
            .map(|d| d.join("Nimbus"))
            .unwrap_or_else(|| PathBuf::from(".nimbus"))
    }

    pub fn config_path(&self) -> PathBuf {
        self.data_dir.join("config.json")
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(Self::data_dir())
    }
}

// Platform data directory lookup
mod dirs {
    use std::path::PathBuf;

    pub fn data_local_dir() -> Option<PathBuf> {
        #[cfg(target_os = "windows")]
        {
            std::env::var("LOCALAPPDATA").ok().map(PathBuf::from)
        }
        #[cfg(target_os = "macos")]
        {
            std::env::var("HOME")
                .ok()
                .map(|h| PathBuf::from(h).join("Library/Application Support"))
        }
        #[cfg(target_os = "linux")]
        {
            std::env::var("XDG_DATA_HOME")
                .ok()
                .map(PathBuf::from)
                .or_else(|| {
                    std::env::var("HOME")
                        .ok()
                        .map(|h| PathBuf::from(h).join(".local/share"))
                })
        }
        #[cfg(not(any(target_os = "windows", target_os = "macos", target_os = "linux")))]
        {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths_follow_data_dir() {
        let config = Config::new(PathBuf::from("/tmp/nimbus-test"));
        assert_eq!(config.database_path, PathBuf::from("/tmp/nimbus-test/nimbus.db"));
        assert_eq!(config.config_path(), PathBuf::from("/tmp/nimbus-test/config.json"));
        assert_eq!(config.storage_quota_bytes, Some(DEFAULT_QUOTA_BYTES));
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let config: Config = serde_json::from_str(
            r#"{"data_dir":"/d","database_path":"/d/x.db","ai":{"max_poll_attempts":5}}"#,
        )
        .unwrap();
        assert_eq!(config.storage_quota_bytes, Some(DEFAULT_QUOTA_BYTES));
        assert_eq!(config.ai.max_poll_attempts, 5);
        assert_eq!(config.ai.chat_model, "gemini-2.5-flash");
    }
}
