//! Configuration management for loglane

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::logging::LOG_FILE_NAME;

/// Logger configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggerConfig {
    /// Whether logging is on at all (default: true)
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Level names to emit, e.g. ["INFO", "ERROR"]. Empty means every level.
    #[serde(default)]
    pub levels: Vec<String>,

    /// Prefix each message with the caller's location (default: false)
    #[serde(default)]
    pub print_call_site: bool,

    /// Directory holding the log file. `~` is expanded.
    #[serde(default = "default_log_dir")]
    pub log_dir: PathBuf,

    /// Log file name (default: "app_logs.txt")
    #[serde(default = "default_file_name")]
    pub file_name: String,

    /// Rotation threshold in megabytes (default: 5)
    #[serde(default = "default_max_file_size_mb")]
    pub max_file_size_mb: f64,
}

fn default_enabled() -> bool {
    true
}

fn default_log_dir() -> PathBuf {
    logs_dir()
}

fn default_file_name() -> String {
    LOG_FILE_NAME.to_string()
}

fn default_max_file_size_mb() -> f64 {
    5.0
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            levels: Vec::new(),
            print_call_site: false,
            log_dir: default_log_dir(),
            file_name: default_file_name(),
            max_file_size_mb: default_max_file_size_mb(),
        }
    }
}

impl LoggerConfig {
    /// Load configuration from the default file, or return default if not found
    pub fn load() -> Result<Self> {
        Self::load_from(&config_file_path())
    }

    /// Load configuration from `path`, or return default if not found
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path).context("Failed to read config file")?;
            toml::from_str(&content).context("Failed to parse config file")
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to the default file
    pub fn save(&self) -> Result<()> {
        self.save_to(&config_file_path())
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(path, content).context("Failed to write config file")?;
        Ok(())
    }

    /// Log directory with a leading `~` expanded
    pub fn resolved_log_dir(&self) -> PathBuf {
        let raw = self.log_dir.to_string_lossy();
        PathBuf::from(shellexpand::tilde(&raw).into_owned())
    }

    /// Rotation threshold in bytes
    pub fn max_file_bytes(&self) -> u64 {
        (self.max_file_size_mb.max(0.0) * 1024.0 * 1024.0) as u64
    }
}

/// Get the base configuration directory (~/.loglane)
/// Falls back to ./.loglane if home directory cannot be determined
pub fn config_dir() -> PathBuf {
    try_config_dir().unwrap_or_else(|| {
        tracing::warn!("Could not determine home directory, using current directory for config");
        PathBuf::from(".loglane")
    })
}

/// Try to get the base configuration directory, returning None if home dir is unavailable
pub fn try_config_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(".loglane"))
}

/// Get the path to the config file
pub fn config_file_path() -> PathBuf {
    config_dir().join("config.toml")
}

/// Get the path to the default logs directory
pub fn logs_dir() -> PathBuf {
    config_dir().join("logs")
}

/// Ensure the config directory and the configured log directory exist
pub fn ensure_directories(config: &LoggerConfig) -> Result<()> {
    std::fs::create_dir_all(config_dir()).context("Failed to create config directory")?;
    std::fs::create_dir_all(config.resolved_log_dir())
        .context("Failed to create logs directory")?;
    Ok(())
}
