//! Server configuration

use anyhow::{Context, Result};
use hiring_lib::SchemaKind;
use serde::Deserialize;
use std::path::PathBuf;

/// Server configuration, read from `HIRING_*` environment variables and an
/// optional `hiring-server` config file
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Instance name attached to structured log events
    #[serde(default = "default_instance_name")]
    pub instance_name: String,

    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_artifact_path")]
    pub artifact_path: PathBuf,

    /// Schema used when training on startup
    #[serde(default = "default_schema")]
    pub schema: SchemaKind,

    /// CSV of labeled rows used when training on startup
    #[serde(default)]
    pub training_data: Option<PathBuf>,

    #[serde(default)]
    pub train_on_startup: bool,

    /// Overrides the schema preset's tree count
    #[serde(default)]
    pub n_trees: Option<usize>,

    /// Answer with the heuristic score instead of 503 when no model is loaded
    #[serde(default)]
    pub fallback_on_unavailable: bool,
}

fn default_instance_name() -> String {
    std::env::var("HOSTNAME").unwrap_or_else(|_| "hiring-server".to_string())
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_artifact_path() -> PathBuf {
    PathBuf::from("models/smart_hiring_rf.bin")
}

fn default_schema() -> SchemaKind {
    SchemaKind::SmartHiring
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            instance_name: default_instance_name(),
            host: default_host(),
            port: default_port(),
            artifact_path: default_artifact_path(),
            schema: default_schema(),
            training_data: None,
            train_on_startup: false,
            n_trees: None,
            fallback_on_unavailable: false,
        }
    }
}

impl ServerConfig {
    /// Load configuration from the environment and the optional config file
    pub fn load() -> Result<Self> {
        config::Config::builder()
            .add_source(config::File::with_name("hiring-server").required(false))
            .add_source(config::Environment::with_prefix("HIRING").try_parsing(true))
            .build()
            .context("failed to read server configuration")?
            .try_deserialize()
            .context("invalid server configuration")
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
