//! Configuration management for the CLI

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const DEFAULT_API_URL: &str = "http://localhost:8080";
const DEFAULT_MODEL_PATH: &str = "models/smart_hiring_rf.bin";

/// CLI configuration, read from `~/.config/hiring/config.json`
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    /// Server URL
    pub api_url: Option<String>,
    /// Model artifact used by local commands
    pub default_model_path: Option<PathBuf>,
}

impl Config {
    /// Load configuration from file; a missing file yields defaults
    pub fn load() -> Result<Self> {
        match Self::config_path() {
            Some(path) => Self::load_from(&path),
            None => Ok(Self::default()),
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path).context("Failed to read config file")?;
        serde_json::from_str(&content).context("Failed to parse config file")
    }

    fn config_path() -> Option<PathBuf> {
        dirs_next::home_dir().map(|home| home.join(".config").join("hiring").join("config.json"))
    }

    /// Command-line value, then config file, then the local default
    pub fn api_url(&self, override_url: Option<&str>) -> String {
        override_url
            .map(str::to_string)
            .or_else(|| self.api_url.clone())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string())
    }

    pub fn model_path(&self) -> PathBuf {
        self.default_model_path
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_MODEL_PATH))
    }
}
