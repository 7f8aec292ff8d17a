//! User configuration stored in `~/.momentum/config.json`.
//!
//! Every field has a serde default so a partial (or missing) file still
//! yields a usable config.

use std::fs;
use std::path::{Path, PathBuf};

use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::error::TrackerError;

const APP_DIR: &str = ".momentum";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// SQLite file backing the keyed store. Defaults to `~/.momentum/momentum.db`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub store_path: Option<PathBuf>,
    /// IANA timezone used to decide "today".
    #[serde(default = "default_timezone")]
    pub timezone: String,
    #[serde(default)]
    pub assistant: AssistantConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssistantConfig {
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_model")]
    pub model: String,
    /// Environment variable holding the API key. The key itself never lives in the file.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timezone() -> String {
    "UTC".to_string()
}

fn default_endpoint() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}

fn default_model() -> String {
    "gemini-2.5-flash".to_string()
}

fn default_api_key_env() -> String {
    "API_KEY".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            model: default_model(),
            api_key_env: default_api_key_env(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            store_path: None,
            timezone: default_timezone(),
            assistant: AssistantConfig::default(),
        }
    }
}

impl Config {
    /// Load from the canonical path, falling back to defaults when absent.
    pub fn load() -> Result<Self, TrackerError> {
        Self::load_from(&config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self, TrackerError> {
        if !path.exists() {
            log::info!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)
            .map_err(|e| TrackerError::Config(format!("Failed to read config: {}", e)))?;
        let config: Config = serde_json::from_str(&content)
            .map_err(|e| TrackerError::Config(format!("Failed to parse config: {}", e)))?;
        // Surface a bad timezone at load time rather than on first use.
        config.tz()?;
        Ok(config)
    }

    /// Write pretty JSON, creating the parent directory if needed.
    pub fn save_to(&self, path: &Path) -> Result<(), TrackerError> {
        if let Some(parent) = path.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent).map_err(|e| {
                    TrackerError::Config(format!("Failed to create config dir: {}", e))
                })?;
            }
        }
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| TrackerError::Config(format!("Serialize error: {}", e)))?;
        fs::write(path, content)
            .map_err(|e| TrackerError::Config(format!("Write error: {}", e)))
    }

    pub fn save(&self) -> Result<(), TrackerError> {
        self.save_to(&config_path()?)
    }

    pub fn tz(&self) -> Result<Tz, TrackerError> {
        self.timezone
            .parse::<Tz>()
            .map_err(|e| TrackerError::Config(format!("Unknown timezone {:?}: {}", self.timezone, e)))
    }

    /// Resolved store path (explicit or `~/.momentum/momentum.db`).
    pub fn resolved_store_path(&self) -> Result<PathBuf, TrackerError> {
        match &self.store_path {
            Some(path) => Ok(path.clone()),
            None => Ok(app_dir()?.join("momentum.db")),
        }
    }
}

fn app_dir() -> Result<PathBuf, TrackerError> {
    let home = dirs::home_dir()
        .ok_or_else(|| TrackerError::Config("Could not find home directory".to_string()))?;
    Ok(home.join(APP_DIR))
}

/// Get the canonical config file path (~/.momentum/config.json)
pub fn config_path() -> Result<PathBuf, TrackerError> {
    Ok(app_dir()?.join("config.json"))
}
