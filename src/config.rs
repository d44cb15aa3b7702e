//! Configuration loading and management for wikinotes.
//!
//! Loads settings from `wikinotes.toml` with an environment variable override
//! for the wiki endpoint. Every field has a default, so the file is optional.

use crate::state::Theme;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

const CONFIG_FILE: &str = "wikinotes.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),
}

/// Wikipedia lookup settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WikiConfig {
    /// MediaWiki action API endpoint
    pub api_url: String,
    /// Maximum number of sentences requested per summary
    pub sentences: u32,
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
    /// Retries after a connect or timeout failure
    pub retries: usize,
}

/// PDF export settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// File name suggested by the save prompt
    pub default_file_name: String,
    pub font_size: f32,
    pub margin_mm: f32,
    pub line_height_mm: f32,
    /// Space kept free at the bottom of each page before breaking
    pub break_margin_mm: f32,
}

/// Terminal UI settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    pub theme: Theme,
}

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub wiki: WikiConfig,
    #[serde(default)]
    pub export: ExportConfig,
    #[serde(default)]
    pub ui: UiConfig,
}

impl Config {
    /// Load configuration from the default location (wikinotes.toml in cwd or home).
    /// Falls back to defaults when no file exists.
    pub fn load() -> Result<Self, ConfigError> {
        match Self::find_config_file() {
            Some(path) => Self::load_from(&path),
            None => {
                let mut config = Config::default();
                config.apply_env();
                Ok(config)
            }
        }
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config = Self::parse(&content)?;
        config.apply_env();
        Ok(config)
    }

    /// Parse configuration from TOML text
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    fn apply_env(&mut self) {
        if let Ok(url) = std::env::var("WIKINOTES_API_URL") {
            self.wiki.api_url = url;
        }
    }

    /// Find the config file in standard locations
    fn find_config_file() -> Option<PathBuf> {
        // Check current directory first
        let local_config = PathBuf::from(CONFIG_FILE);
        if local_config.exists() {
            return Some(local_config);
        }

        // Check home directory
        let home_config = dirs::home_dir()?
            .join(".config")
            .join("wikinotes")
            .join(CONFIG_FILE);
        home_config.exists().then_some(home_config)
    }
}

impl WikiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for WikiConfig {
    fn default() -> Self {
        Self {
            api_url: "https://en.wikipedia.org/w/api.php".to_string(),
            sentences: 5,
            timeout_secs: 30,
            retries: 2,
        }
    }
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            default_file_name: "BharatGPT_Notes.pdf".to_string(),
            font_size: 12.0,
            margin_mm: 10.0,
            line_height_mm: 7.0,
            break_margin_mm: 15.0,
        }
    }
}
