//! Configuration management

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use crate::application::errors::ConfigError;

/// Host configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct ZinciteConfig {
    pub name: String,
    pub version: String,
    /// Telegram bot token; the console transport is used when absent
    pub token: Option<String>,
    /// Chat that receives command error details
    pub owner_id: Option<String>,
    pub modules_path: PathBuf,
    pub command_prefix: String,
    /// Read host control commands (`stop`, `ping`) from stdin
    pub enable_console_reader: bool,
    pub poll_timeout_secs: u64,
}

impl Default for ZinciteConfig {
    fn default() -> Self {
        Self {
            name: "zincite".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            token: None,
            owner_id: None,
            modules_path: PathBuf::from("modules"),
            command_prefix: "/".to_string(),
            enable_console_reader: true,
            poll_timeout_secs: 30,
        }
    }
}

impl ZinciteConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(content)
            .map_err(|e| ConfigError::Parse(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_yaml(&self) -> Result<String, ConfigError> {
        serde_yaml::to_string(self)
            .map_err(|e| ConfigError::Parse(format!("Failed to serialize config: {}", e)))
    }

    /// Defaults with environment overrides applied
    pub fn load_env() -> Self {
        Self::default().with_env_overrides(|key| std::env::var(key).ok())
    }

    /// Apply `BOT_TOKEN`, `BOT_OWNER_ID` and `ZINCITE_MODULES` from `lookup`
    pub fn with_env_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(token) = lookup("BOT_TOKEN").filter(|t| !t.is_empty()) {
            self.token = Some(token);
        }

        if let Some(owner) = lookup("BOT_OWNER_ID").filter(|o| !o.is_empty()) {
            self.owner_id = Some(owner);
        }

        if let Some(dir) = lookup("ZINCITE_MODULES").filter(|d| !d.is_empty()) {
            self.modules_path = PathBuf::from(dir);
        }

        self
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.command_prefix.is_empty() {
            return Err(ConfigError::MissingField("command-prefix".to_string()));
        }
        Ok(())
    }

    /// First character of the command prefix
    pub fn prefix_char(&self) -> char {
        self.command_prefix.chars().next().unwrap_or('/')
    }
}
